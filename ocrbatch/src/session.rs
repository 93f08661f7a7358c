//! Command-line front end: turns user input into batches and prints reports.

use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use crate::dispatcher::Dispatcher;
use crate::error::{OcrBatchError, Result};
use crate::format::SUPPORTED_EXTENSIONS;
use crate::report::{Outcome, ResultMessage};
use crate::scan::collect_image_paths;
use crate::sink::ResultSink;

pub const QUIT_COMMAND: &str = "quit";

const SEPARATOR_WIDTH: usize = 50;

/// Strip whitespace and surrounding quotes, as left behind when a path is
/// pasted from a file manager.
pub fn normalize_input(line: &str) -> &str {
    line.trim().trim_matches(|c| c == '\'' || c == '"').trim()
}

/// Expand user input into the list of paths to submit.
///
/// A directory yields every supported image below it; a file is submitted
/// as-is (the format gate reports it if unsupported).
pub fn resolve_targets(input: &str) -> Result<Vec<String>> {
    let path = Path::new(input);
    if path.is_dir() {
        Ok(collect_image_paths(path)
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    } else if path.is_file() {
        Ok(vec![input.to_string()])
    } else {
        Err(OcrBatchError::InvalidInput(input.to_string()))
    }
}

pub fn print_banner<W: Write>(out: &mut W) -> std::io::Result<()> {
    let rule = "=".repeat(60);
    writeln!(out, "{rule}")?;
    writeln!(out, "ocrbatch - image text extraction")?;
    writeln!(out, "Supported formats: {}", SUPPORTED_EXTENSIONS.join(", "))?;
    writeln!(out, "Batch recognition with caching and a parallel worker pool")?;
    writeln!(out, "{rule}")?;
    writeln!(
        out,
        "Example: /home/user/image.jpg or a directory, '{QUIT_COMMAND}' to exit"
    )?;
    writeln!(out, "{rule}")?;
    Ok(())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    pub recognized: usize,
    pub cached: usize,
    pub no_text: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct BatchSummary {
    pub messages: Vec<ResultMessage>,
    pub elapsed: Duration,
}

#[derive(Serialize)]
struct JsonSummary {
    images: usize,
    elapsed_secs: f64,
    #[serde(flatten)]
    counts: BatchCounts,
}

impl BatchSummary {
    pub fn counts(&self) -> BatchCounts {
        let mut counts = BatchCounts::default();
        for message in &self.messages {
            if message.is_cached() {
                counts.cached += 1;
            }
            match message.outcome {
                Outcome::Recognized { cached: false, .. } => counts.recognized += 1,
                Outcome::NoText { .. } => counts.no_text += 1,
                Outcome::Failed(_) => counts.failed += 1,
                Outcome::Recognized { cached: true, .. } => {}
            }
        }
        counts
    }

    pub fn render<W: Write>(&self, out: &mut W, json: bool) -> Result<()> {
        let counts = self.counts();

        if json {
            for message in &self.messages {
                writeln!(out, "{}", message.to_json().map_err(std::io::Error::other)?)?;
            }
            let summary = JsonSummary {
                images: self.messages.len(),
                elapsed_secs: self.elapsed.as_secs_f64(),
                counts,
            };
            let line = serde_json::to_string(&summary).map_err(std::io::Error::other)?;
            writeln!(out, "{line}")?;
            return Ok(());
        }

        let separator = "-".repeat(SEPARATOR_WIDTH);
        for message in &self.messages {
            writeln!(out, "{message}")?;
            writeln!(out, "{separator}")?;
        }
        writeln!(
            out,
            "Processed {} image(s) in {:.2} s (recognized: {}, from cache: {}, no text: {}, failed: {})",
            self.messages.len(),
            self.elapsed.as_secs_f64(),
            counts.recognized,
            counts.cached,
            counts.no_text,
            counts.failed,
        )?;
        Ok(())
    }
}

pub struct Session {
    dispatcher: Dispatcher,
    default_language: String,
    json: bool,
}

impl Session {
    pub fn new(dispatcher: Dispatcher, default_language: impl Into<String>, json: bool) -> Self {
        Self {
            dispatcher,
            default_language: default_language.into(),
            json,
        }
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Run one batch and drain its results.
    pub async fn run_batch(&self, paths: Vec<String>, language: &str) -> BatchSummary {
        let mut sink = ResultSink::new();
        let started = Instant::now();
        self.dispatcher.run(paths, language, &sink).await;
        let messages = sink.drain_all();
        let elapsed = started.elapsed();

        info!(
            images = messages.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Batch complete"
        );
        BatchSummary { messages, elapsed }
    }

    /// Resolve `input`, process it and print the report.
    ///
    /// Returns `Ok(None)` when the input holds no supported images.
    pub async fn run_once<W: Write>(
        &self,
        input: &str,
        language: &str,
        out: &mut W,
    ) -> Result<Option<BatchSummary>> {
        let targets = resolve_targets(input)?;
        if targets.is_empty() {
            writeln!(out, "No supported image files found")?;
            return Ok(None);
        }

        if !self.json {
            writeln!(out, "Processing {} image file(s)...", targets.len())?;
        }
        let summary = self.run_batch(targets, language).await;
        summary.render(out, self.json)?;
        Ok(Some(summary))
    }

    /// Like [`Session::run_once`], but invalid input is printed as
    /// `Error: ...` instead of returned. Returns `false` for invalid input.
    pub async fn run_reported<W: Write>(
        &self,
        input: &str,
        language: &str,
        out: &mut W,
    ) -> Result<bool> {
        match self.run_once(input, language, out).await {
            Ok(_) => Ok(true),
            Err(e @ OcrBatchError::InvalidInput(_)) => {
                writeln!(out, "Error: {e}")?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Prompt for a path and a language until `quit` or end of input.
    ///
    /// Invalid paths are reported and the iteration is skipped.
    pub async fn run_interactive<R, W>(&self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();

        loop {
            write!(
                out,
                "Enter an image path or directory ('{QUIT_COMMAND}' to exit): "
            )?;
            out.flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            let target = normalize_input(&line);
            if target.eq_ignore_ascii_case(QUIT_COMMAND) {
                writeln!(out, "Exiting")?;
                break;
            }

            write!(
                out,
                "Recognition language (default '{}'): ",
                self.default_language
            )?;
            out.flush()?;
            let language = lines.next_line().await?.unwrap_or_default();
            let language = match language.trim() {
                "" => self.default_language.clone(),
                lang => lang.to_string(),
            };

            self.run_reported(target, &language, out).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_input_strips_quotes_and_space() {
        assert_eq!(normalize_input("  '/tmp/a b.png'  "), "/tmp/a b.png");
        assert_eq!(normalize_input("\"/tmp/x.jpg\"\n"), "/tmp/x.jpg");
        assert_eq!(normalize_input("quit"), "quit");
    }

    #[test]
    fn test_resolve_targets_invalid_path() {
        let err = resolve_targets("/definitely/not/a/real/path").unwrap_err();
        assert!(matches!(err, OcrBatchError::InvalidInput(_)));
    }

    #[test]
    fn test_resolve_targets_file_is_passed_through() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("note.txt");
        std::fs::write(&file, b"hi").unwrap();

        let input = file.to_string_lossy().into_owned();
        assert_eq!(resolve_targets(&input).unwrap(), vec![input.clone()]);
    }

    #[test]
    fn test_resolve_targets_directory_filters_formats() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("a.png"), b"x").unwrap();
        std::fs::write(temp.path().join("b.txt"), b"x").unwrap();

        let targets = resolve_targets(&temp.path().to_string_lossy()).unwrap();
        assert_eq!(targets.len(), 1);
        assert!(targets[0].ends_with("a.png"));
    }

    #[test]
    fn test_counts_and_text_render() {
        let summary = BatchSummary {
            messages: vec![
                ResultMessage::new(
                    "a.png",
                    Outcome::Recognized {
                        text: "HELLO".to_string(),
                        cached: false,
                    },
                ),
                ResultMessage::new(
                    "a.png",
                    Outcome::Recognized {
                        text: "HELLO".to_string(),
                        cached: true,
                    },
                ),
                ResultMessage::new("blank.png", Outcome::NoText { cached: false }),
                ResultMessage::failed(
                    "note.txt",
                    OcrBatchError::UnsupportedFormat {
                        path: "note.txt".to_string(),
                    },
                ),
            ],
            elapsed: Duration::from_millis(1500),
        };

        assert_eq!(
            summary.counts(),
            BatchCounts {
                recognized: 1,
                cached: 1,
                no_text: 1,
                failed: 1,
            }
        );

        let mut out = Vec::new();
        summary.render(&mut out, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("a.png - recognized:\nHELLO\n"));
        assert!(text.contains("a.png - from cache:\nHELLO\n"));
        assert!(text.ends_with(
            "Processed 4 image(s) in 1.50 s (recognized: 1, from cache: 1, no text: 1, failed: 1)\n"
        ));
    }

    #[test]
    fn test_json_render_one_line_per_message_plus_summary() {
        let summary = BatchSummary {
            messages: vec![ResultMessage::new(
                "blank.png",
                Outcome::NoText { cached: false },
            )],
            elapsed: Duration::from_secs(2),
        };

        let mut out = Vec::new();
        summary.render(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last["images"], 1);
        assert_eq!(last["no_text"], 1);
    }

    #[test]
    fn test_banner_lists_formats() {
        let mut out = Vec::new();
        print_banner(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("jpg, png, bmp, bpg"));
        assert!(text.contains("'quit'"));
    }
}
