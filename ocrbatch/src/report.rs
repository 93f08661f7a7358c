use std::fmt;

use serde::Serialize;

use crate::error::{ErrorKind, OcrBatchError};

/// What happened to one submitted path.
#[derive(Debug)]
pub enum Outcome {
    Recognized { text: String, cached: bool },
    NoText { cached: bool },
    Failed(OcrBatchError),
}

/// One report line per submitted path.
#[derive(Debug)]
pub struct ResultMessage {
    pub path: String,
    pub outcome: Outcome,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    path: &'a str,
    status: &'static str,
    cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ResultMessage {
    pub fn new(path: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            path: path.into(),
            outcome,
        }
    }

    pub fn failed(path: impl Into<String>, error: OcrBatchError) -> Self {
        Self::new(path, Outcome::Failed(error))
    }

    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Recognized { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::Recognized { cached: true, .. } | Outcome::NoText { cached: true }
        )
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            Outcome::Failed(e) => Some(e.kind()),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self.outcome {
            Outcome::Recognized { .. } => "recognized",
            Outcome::NoText { .. } => "no_text",
            Outcome::Failed(_) => "error",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let error = match &self.outcome {
            Outcome::Failed(e) => Some(e.to_string()),
            _ => None,
        };
        serde_json::to_string(&JsonReport {
            path: &self.path,
            status: self.status(),
            cached: self.is_cached(),
            text: self.text(),
            error_kind: self.error_kind(),
            error,
        })
    }
}

impl fmt::Display for ResultMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Recognized {
                text,
                cached: false,
            } => write!(f, "{} - recognized:\n{}", self.path, text),
            Outcome::Recognized { text, cached: true } => {
                write!(f, "{} - from cache:\n{}", self.path, text)
            }
            Outcome::NoText { .. } => write!(f, "{} - no text found", self.path),
            Outcome::Failed(e) => write!(f, "{} - error: {}", self.path, e),
        }
    }
}
