use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocrbatch::config::{Config, LoggingConfig};
use ocrbatch::ocr::{EngineFailure, OcrInvoker, TesseractEngine};
use ocrbatch::session::{normalize_input, print_banner, Session};
use ocrbatch::{BpgDecoder, Dispatcher, RecognitionCache, RecognitionPipeline};

#[derive(Parser)]
#[command(name = "ocrbatch")]
#[command(about = "Extract text from jpg, png, bmp and bpg images with Tesseract")]
struct Args {
    /// Image file or directory to process once; omit for interactive mode
    path: Option<PathBuf>,

    /// Tesseract language code (overrides OCR_LANGUAGE)
    #[arg(short, long)]
    lang: Option<String>,

    /// Number of parallel workers (overrides OCR_WORKERS)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Path to the bpgdec executable (overrides BPG_DECODER)
    #[arg(long)]
    decoder: Option<String>,

    /// Print one JSON object per image instead of text reports
    #[arg(long)]
    json: bool,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ocrbatch=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Exit status of a one-shot run whose `PATH` is neither a file nor a directory.
const EXIT_INVALID_INPUT: u8 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    init_tracing(LoggingConfig::from_env().json);
    let mut config = Config::from_env();

    if let Some(lang) = args.lang.filter(|l| !l.trim().is_empty()) {
        config.ocr.language = lang;
    }
    if let Some(workers) = args.workers {
        config.dispatch.workers = workers.max(1);
    }
    if let Some(decoder) = args.decoder {
        config.decoder.program = decoder;
    }

    tracing::info!("Initializing OCR engine (language: {})...", config.ocr.language);
    let engine = TesseractEngine::new(config.ocr.tessdata_path.clone());
    match engine.check(&config.ocr.language) {
        Ok(()) => {}
        Err(EngineFailure::Missing(reason)) => {
            tracing::warn!("Tesseract unavailable, every image will report an engine error: {reason}");
        }
        Err(EngineFailure::Other(reason)) => {
            tracing::warn!("Default language is not usable: {reason}");
        }
    }

    let pipeline = RecognitionPipeline::new(
        RecognitionCache::new(config.cache.capacity),
        OcrInvoker::new(Arc::new(engine), &config.ocr),
        BpgDecoder::new(&config.decoder.program),
    );
    let dispatcher = Dispatcher::new(Arc::new(pipeline), config.dispatch.workers);
    tracing::info!("Worker pool size: {}", dispatcher.workers());

    let session = Session::new(dispatcher, config.ocr.language.clone(), args.json);
    let mut stdout = std::io::stdout();

    match args.path {
        Some(path) => {
            let input = path.to_string_lossy();
            let accepted = session
                .run_reported(normalize_input(&input), session.default_language(), &mut stdout)
                .await?;
            if !accepted {
                return Ok(ExitCode::from(EXIT_INVALID_INPUT));
            }
        }
        None => {
            print_banner(&mut stdout)?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            session.run_interactive(stdin, &mut stdout).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
