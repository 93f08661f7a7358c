use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::RecognitionCache;
use crate::decoder::BpgDecoder;
use crate::error::{OcrBatchError, Result};
use crate::format::{is_special_format, is_supported};
use crate::ocr::OcrInvoker;
use crate::report::Outcome;

/// One unit of work: everything that happens to a single path.
#[async_trait]
pub trait RecognitionTask: Send + Sync {
    async fn process(&self, path: &str, language: &str) -> Outcome;
}

/// Format gate, cache, optional BPG decode, then OCR.
pub struct RecognitionPipeline {
    cache: RecognitionCache,
    invoker: OcrInvoker,
    decoder: BpgDecoder,
}

impl RecognitionPipeline {
    pub fn new(cache: RecognitionCache, invoker: OcrInvoker, decoder: BpgDecoder) -> Self {
        Self {
            cache,
            invoker,
            decoder,
        }
    }

    async fn recognize(&self, path: &str, language: &str) -> Result<String> {
        let artifact = if is_special_format(path) {
            Some(self.decoder.decode(path).await?)
        } else {
            None
        };
        let source = artifact
            .as_ref()
            .map_or_else(|| Path::new(path), |decoded| decoded.path());

        let bytes = tokio::fs::read(source)
            .await
            .map_err(|e| OcrBatchError::from_io(path, e))?;

        let text = self.invoker.recognize(path, bytes, language).await;
        drop(artifact);
        text
    }
}

#[async_trait]
impl RecognitionTask for RecognitionPipeline {
    async fn process(&self, path: &str, language: &str) -> Outcome {
        if !is_supported(path) {
            return Outcome::Failed(OcrBatchError::UnsupportedFormat {
                path: path.to_string(),
            });
        }

        let _slot = self.cache.lock_path(path).await;

        if let Some(text) = self.cache.get(path) {
            debug!(path, "Cache hit");
            return if text.trim().is_empty() {
                Outcome::NoText { cached: true }
            } else {
                Outcome::Recognized { text, cached: true }
            };
        }

        match self.recognize(path, language).await {
            Ok(text) => {
                self.cache.put(path, text.clone());
                if text.trim().is_empty() {
                    Outcome::NoText { cached: false }
                } else {
                    Outcome::Recognized {
                        text,
                        cached: false,
                    }
                }
            }
            Err(e) => {
                warn!(path, error = %e, "Recognition failed");
                Outcome::Failed(e)
            }
        }
    }
}
