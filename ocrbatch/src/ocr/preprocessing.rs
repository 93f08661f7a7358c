use crate::config::OcrConfig;
use image::{DynamicImage, GenericImageView, GrayImage, ImageFormat, ImageReader, ImageResult};

/// Contrast multiplier applied around the mean luminance before OCR.
pub const CONTRAST_FACTOR: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessOptions {
    pub max_image_dimension: u32,
}

impl From<&OcrConfig> for PreprocessOptions {
    fn from(config: &OcrConfig) -> Self {
        Self {
            max_image_dimension: config.max_image_dimension,
        }
    }
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self::from(&OcrConfig::default())
    }
}

/// Normalize image bytes for the OCR engine
///
/// Applies the following transformations:
/// 1. Decodes the image, guessing the format from its contents
/// 2. Resizes large images while maintaining aspect ratio
/// 3. Converts to single-channel luminance (drops alpha)
/// 4. Enhances contrast by [`CONTRAST_FACTOR`] around the mean luminance
///
/// # Returns
/// Processed image bytes as PNG, ready for the OCR engine
pub fn preprocess_image(bytes: &[u8], options: &PreprocessOptions) -> ImageResult<Vec<u8>> {
    let img = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let img = resize_if_needed(img, options.max_image_dimension);
    let gray = enhance_contrast(img.to_luma8(), CONTRAST_FACTOR);

    let mut output = Vec::new();
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)?;

    Ok(output)
}

/// Resize image if it exceeds maximum dimension while maintaining aspect ratio
///
/// Uses Lanczos3 filter for high-quality downscaling
fn resize_if_needed(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let (width, height) = img.dimensions();

    if max_dim == 0 || (width <= max_dim && height <= max_dim) {
        return img;
    }

    let ratio = if width > height {
        max_dim as f32 / width as f32
    } else {
        max_dim as f32 / height as f32
    };

    let new_width = ((width as f32 * ratio) as u32).max(1);
    let new_height = ((height as f32 * ratio) as u32).max(1);

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

/// Scale every pixel's distance from the mean luminance by `factor`.
///
/// A factor of 1.0 leaves the image unchanged, 0.0 yields a flat image of
/// the mean value. Results are clamped to 0..=255.
pub fn enhance_contrast(gray: GrayImage, factor: f32) -> GrayImage {
    let count = u64::from(gray.width()) * u64::from(gray.height());
    if count == 0 {
        return gray;
    }

    let sum: u64 = gray.pixels().map(|p| u64::from(p[0])).sum();
    let mean = ((sum + count / 2) / count) as f32;

    let mut out = gray;
    for pixel in out.pixels_mut() {
        let value = mean + factor * (f32::from(pixel[0]) - mean);
        pixel[0] = value.round().clamp(0.0, 255.0) as u8;
    }
    out
}
