use std::env;

pub const DEFAULT_LANGUAGE: &str = "eng";

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ocr: OcrConfig,
    pub decoder: DecoderConfig,
    pub dispatch: DispatchConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub language: String,
    pub tessdata_path: Option<String>,
    pub max_image_dimension: u32,
}

#[derive(Debug, Clone)]
pub struct DecoderConfig {
    pub program: String,
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub workers: usize,
}

/// `capacity == 0` keeps every entry for the whole run.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub capacity: usize,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            tessdata_path: None,
            max_image_dimension: 4096,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrConfig {
                language: env::var("OCR_LANGUAGE")
                    .ok()
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                tessdata_path: env::var("OCR_TESSDATA_PATH").ok(),
                max_image_dimension: parse_env_or("OCR_MAX_DIMENSION", 4096),
            },
            decoder: DecoderConfig {
                program: env::var("BPG_DECODER").unwrap_or_else(|_| "bpgdec".to_string()),
            },
            dispatch: DispatchConfig {
                workers: parse_env_or("OCR_WORKERS", default_workers()).max(1),
            },
            cache: CacheConfig {
                capacity: parse_env_or("OCR_CACHE_CAPACITY", 0),
            },
            logging: LoggingConfig::from_env(),
        }
    }
}

impl LoggingConfig {
    /// Read on its own so the subscriber can exist before the rest of the
    /// configuration is parsed.
    pub fn from_env() -> Self {
        Self {
            json: env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
