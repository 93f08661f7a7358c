//! Extension checks that run before any I/O.

pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "png", "bmp", "bpg"];

/// Inputs with this extension go through the external decoder first.
pub const SPECIAL_EXTENSION: &str = "bpg";

fn has_extension(path: &str, ext: &str) -> bool {
    let lower = path.to_lowercase();
    lower
        .strip_suffix(ext)
        .is_some_and(|stem| stem.ends_with('.'))
}

/// Whether `path` ends with one of the supported image extensions
/// (case-insensitive). Pure string check.
pub fn is_supported(path: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| has_extension(path, ext))
}

pub fn is_special_format(path: &str) -> bool {
    has_extension(path, SPECIAL_EXTENSION)
}
