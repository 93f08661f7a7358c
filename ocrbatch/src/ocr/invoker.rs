use std::sync::Arc;

use tracing::debug;

use crate::config::OcrConfig;
use crate::error::{OcrBatchError, Result};

use super::engine::{EngineFailure, OcrEngine};
use super::preprocessing::{preprocess_image, PreprocessOptions};

#[derive(Clone)]
pub struct OcrInvoker {
    engine: Arc<dyn OcrEngine>,
    options: PreprocessOptions,
}

impl OcrInvoker {
    pub fn new(engine: Arc<dyn OcrEngine>, config: &OcrConfig) -> Self {
        Self::with_options(engine, PreprocessOptions::from(config))
    }

    pub fn with_options(engine: Arc<dyn OcrEngine>, options: PreprocessOptions) -> Self {
        Self { engine, options }
    }

    /// Normalize `bytes` and run the engine for `language`.
    ///
    /// `path` is only used to label failures. Empty text is returned as-is;
    /// deciding what "no text" means is up to the caller.
    pub async fn recognize(&self, path: &str, bytes: Vec<u8>, language: &str) -> Result<String> {
        let engine = Arc::clone(&self.engine);
        let options = self.options;
        let owner = path.to_string();
        let language = language.to_string();

        debug!(path, language = %language, bytes = bytes.len(), "Running OCR");

        tokio::task::spawn_blocking(move || {
            let processed = preprocess_image(&bytes, &options).map_err(|e| OcrBatchError::Other {
                path: owner.clone(),
                message: format!("Failed to prepare image: {e}"),
            })?;

            engine
                .recognize(&processed, &language)
                .map_err(|failure| match failure {
                    EngineFailure::Missing(reason) => OcrBatchError::EngineMissing(reason),
                    EngineFailure::Other(message) => OcrBatchError::Other {
                        path: owner.clone(),
                        message,
                    },
                })
        })
        .await
        .map_err(|e| OcrBatchError::Other {
            path: path.to_string(),
            message: format!("OCR task panicked: {e}"),
        })?
    }
}
