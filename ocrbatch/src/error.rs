use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrBatchError {
    #[error("unsupported format, only jpg, png, bmp and bpg are accepted")]
    UnsupportedFormat { path: String },

    #[error("file not found")]
    FileNotFound { path: String },

    #[error("permission denied")]
    PermissionDenied { path: String },

    #[error("{tool} is not installed or not usable: {reason}")]
    ToolMissing { tool: String, reason: String },

    #[error("BPG decode failed: {reason}")]
    DecodeFailed { path: String, reason: String },

    #[error("OCR engine unavailable: {0}")]
    EngineMissing(String),

    #[error("{message}")]
    Other { path: String, message: String },

    #[error("input path is neither a file nor a directory: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Report tag for a failed unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    UnsupportedFormat,
    FileNotFound,
    PermissionDenied,
    ToolMissing,
    DecodeFailed,
    EngineMissing,
    InvalidInput,
    Other,
}

impl OcrBatchError {
    /// Classify a failure to open or read an input image.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => OcrBatchError::FileNotFound {
                path: path.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => OcrBatchError::PermissionDenied {
                path: path.to_string(),
            },
            _ => OcrBatchError::Other {
                path: path.to_string(),
                message: err.to_string(),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OcrBatchError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            OcrBatchError::FileNotFound { .. } => ErrorKind::FileNotFound,
            OcrBatchError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            OcrBatchError::ToolMissing { .. } => ErrorKind::ToolMissing,
            OcrBatchError::DecodeFailed { .. } => ErrorKind::DecodeFailed,
            OcrBatchError::EngineMissing(_) => ErrorKind::EngineMissing,
            OcrBatchError::InvalidInput(_) => ErrorKind::InvalidInput,
            OcrBatchError::Other { .. } | OcrBatchError::Io(_) => ErrorKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, OcrBatchError>;
