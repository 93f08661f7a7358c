#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{GrayImage, Luma};
use ocrbatch::ocr::{EngineFailure, OcrEngine, OcrInvoker, PreprocessOptions};
use ocrbatch::{BpgDecoder, Dispatcher, RecognitionCache, RecognitionPipeline};

/// Stand-in for Tesseract: "reads" HELLO from any image containing dark
/// pixels and nothing from a blank one. Counts every invocation.
pub struct ScriptedEngine {
    calls: AtomicUsize,
    missing: bool,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            missing: false,
        }
    }

    pub fn missing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            missing: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for ScriptedEngine {
    fn recognize(&self, image: &[u8], _language: &str) -> Result<String, EngineFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.missing {
            return Err(EngineFailure::Missing("tesseract is not installed".to_string()));
        }
        let decoded = image::load_from_memory(image)
            .map_err(|e| EngineFailure::Other(e.to_string()))?
            .to_luma8();
        if decoded.pixels().any(|p| p[0] < 128) {
            Ok("HELLO".to_string())
        } else {
            Ok(String::new())
        }
    }
}

/// White square with a black block in the middle.
pub fn write_text_image(dir: &Path, name: &str) -> String {
    let mut img = GrayImage::from_pixel(64, 64, Luma([255]));
    for y in 22..42 {
        for x in 12..52 {
            img.put_pixel(x, y, Luma([0]));
        }
    }
    save(img, dir.join(name))
}

pub fn write_blank_image(dir: &Path, name: &str) -> String {
    save(GrayImage::from_pixel(64, 64, Luma([255])), dir.join(name))
}

fn save(img: GrayImage, path: PathBuf) -> String {
    img.save(&path)
        .unwrap_or_else(|e| panic!("Failed to write fixture '{}': {e}", path.display()));
    path.to_string_lossy().into_owned()
}

pub struct Harness {
    pub engine: Arc<ScriptedEngine>,
    pub cache: RecognitionCache,
    pub dispatcher: Dispatcher,
}

pub fn harness_with(engine: ScriptedEngine, decoder: BpgDecoder, workers: usize) -> Harness {
    let engine = Arc::new(engine);
    let cache = RecognitionCache::unbounded();
    let invoker = OcrInvoker::with_options(engine.clone(), PreprocessOptions::default());
    let pipeline = RecognitionPipeline::new(cache.clone(), invoker, decoder);
    Harness {
        engine,
        cache,
        dispatcher: Dispatcher::new(Arc::new(pipeline), workers),
    }
}

pub fn harness(workers: usize) -> Harness {
    harness_with(
        ScriptedEngine::new(),
        BpgDecoder::new("ocrbatch-no-such-decoder"),
        workers,
    )
}

#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
