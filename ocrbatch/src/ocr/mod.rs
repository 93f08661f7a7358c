//! OCR (Optical Character Recognition) Module
//!
//! Turns raw image bytes into recognized text.
//!
//! # Architecture
//!
//! - `OcrEngine` is the seam to the recognition capability itself; it
//!   receives normalized PNG bytes plus a language code
//! - `TesseractEngine` implements it with a local Tesseract install via leptess
//! - `preprocess_image` decodes, downscales, converts to luminance and boosts
//!   contrast around the mean luminance
//! - `OcrInvoker` runs preprocessing and the engine on the blocking thread
//!   pool and maps engine failures onto `OcrBatchError`
//!
//! # Usage
//!
//! ```rust,ignore
//! let invoker = OcrInvoker::new(Arc::new(TesseractEngine::new(None)), &config.ocr);
//! let text = invoker.recognize("scan.png", bytes, "eng").await?;
//! ```

mod engine;
mod invoker;
mod preprocessing;

pub use engine::{EngineFailure, OcrEngine, TesseractEngine};
pub use invoker::OcrInvoker;
pub use preprocessing::{enhance_contrast, preprocess_image, PreprocessOptions, CONTRAST_FACTOR};
