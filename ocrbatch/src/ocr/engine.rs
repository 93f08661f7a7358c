use std::env;
use std::path::{Path, PathBuf};

use leptess::LepTess;
use thiserror::Error;
use tracing::debug;

/// Failure reported by an [`OcrEngine`]. The invoker attaches the input path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineFailure {
    #[error("{0}")]
    Missing(String),

    #[error("{0}")]
    Other(String),
}

/// The recognition capability: normalized image bytes plus a language code
/// in, text out. Implementations are called from the blocking thread pool and
/// may be shared by every worker at once.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8], language: &str) -> Result<String, EngineFailure>;
}

/// Local Tesseract backend.
///
/// A fresh `LepTess` handle is created per call because the language varies
/// per batch and handles are not shareable between threads.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    data_path: Option<String>,
}

/// Language loaded to tell a broken install from a missing language pack.
const BASELINE_LANGUAGE: &str = "eng";

fn create_tesseract(data_path: Option<&str>, language: &str) -> Result<LepTess, EngineFailure> {
    LepTess::new(data_path, language).map_err(|e| classify_init_failure(data_path, language, e))
}

/// The tessdata directory Tesseract will search: the configured path, else
/// `TESSDATA_PREFIX`. `None` means the library's compiled-in default.
fn tessdata_dir(data_path: Option<&str>) -> Option<PathBuf> {
    data_path
        .map(PathBuf::from)
        .or_else(|| env::var_os("TESSDATA_PREFIX").map(PathBuf::from))
        .filter(|dir| dir.is_dir())
}

/// Components of a `+`-joined language code with no `.traineddata` in `dir`.
fn missing_languages(dir: &Path, language: &str) -> Vec<String> {
    language
        .split('+')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .filter(|code| !dir.join(format!("{code}.traineddata")).is_file())
        .map(str::to_string)
        .collect()
}

/// An init failure is `Missing` only when Tesseract itself cannot start.
/// A bad or uninstalled language code on a working install is `Other`.
fn classify_init_failure(
    data_path: Option<&str>,
    language: &str,
    error: impl std::fmt::Display,
) -> EngineFailure {
    if let Some(dir) = tessdata_dir(data_path) {
        let missing = missing_languages(&dir, language);
        if !missing.is_empty() {
            return EngineFailure::Other(format!(
                "No language data for '{}' in {}",
                missing.join("+"),
                dir.display()
            ));
        }
    }

    if language != BASELINE_LANGUAGE && LepTess::new(data_path, BASELINE_LANGUAGE).is_ok() {
        return EngineFailure::Other(format!(
            "Tesseract could not load language '{language}': {error}"
        ));
    }

    EngineFailure::Missing(format!(
        "Tesseract could not be initialized for language '{language}': {error}"
    ))
}

impl TesseractEngine {
    pub fn new(data_path: Option<String>) -> Self {
        Self { data_path }
    }

    /// Load Tesseract with the data for `language` without recognizing
    /// anything, reporting why it could not be loaded.
    pub fn check(&self, language: &str) -> Result<(), EngineFailure> {
        create_tesseract(self.data_path.as_deref(), language).map(|_| ())
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &[u8], language: &str) -> Result<String, EngineFailure> {
        let mut lt = create_tesseract(self.data_path.as_deref(), language)?;
        lt.set_image_from_mem(image)
            .map_err(|e| EngineFailure::Other(format!("Failed to set image: {e}")))?;
        let text = lt
            .get_utf8_text()
            .map_err(|e| EngineFailure::Other(format!("Failed to extract text: {e}")))?;
        debug!(language, chars = text.len(), "Tesseract finished");
        Ok(text.trim().to_string())
    }
}
