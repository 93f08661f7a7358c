//! Bridge to the external `bpgdec` tool for BPG inputs.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::TempPath;
use tokio::process::Command;
use tracing::debug;

use crate::error::{OcrBatchError, Result};

/// A decoded PNG on disk, removed when dropped.
///
/// Owned by the unit of work that created it; never shared.
#[derive(Debug)]
pub struct TemporaryDecodedImage {
    path: TempPath,
}

impl TemporaryDecodedImage {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Clone)]
pub struct BpgDecoder {
    program: PathBuf,
    temp_dir: Option<PathBuf>,
}

impl BpgDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            temp_dir: None,
        }
    }

    /// Create decoded images under `dir` instead of the system temp dir.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }

    fn tool_missing(&self, reason: impl Into<String>) -> OcrBatchError {
        OcrBatchError::ToolMissing {
            tool: self.tool_name(),
            reason: reason.into(),
        }
    }

    /// Check that the decoder exists and answers `-h` successfully.
    pub async fn probe(&self) -> Result<()> {
        let status = Command::new(&self.program)
            .arg("-h")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| self.tool_missing(e.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            Err(self.tool_missing(format!("`-h` probe exited with {status}")))
        }
    }

    /// Decode `input` into a temporary PNG.
    ///
    /// The probe runs first so a missing tool never leaves a temporary file
    /// behind. On any failure the temporary file is already gone when this
    /// returns.
    pub async fn decode(&self, input: &str) -> Result<TemporaryDecodedImage> {
        self.probe().await?;

        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("ocrbatch-").suffix(".png");
            builder
        };
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| OcrBatchError::Other {
            path: input.to_string(),
            message: format!("Failed to create temporary file: {e}"),
        })?;
        let decoded = TemporaryDecodedImage {
            path: file.into_temp_path(),
        };

        debug!(input, output = %decoded.path().display(), "Running BPG decoder");

        let output = Command::new(&self.program)
            .arg("-o")
            .arg(decoded.path())
            .arg(input)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.tool_missing(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = match stderr.trim() {
                "" => format!("decoder exited with {}", output.status),
                detail => detail.to_string(),
            };
            return Err(OcrBatchError::DecodeFailed {
                path: input.to_string(),
                reason,
            });
        }

        Ok(decoded)
    }
}

impl Default for BpgDecoder {
    fn default() -> Self {
        Self::new("bpgdec")
    }
}
