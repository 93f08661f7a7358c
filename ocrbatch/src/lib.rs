pub mod cache;
pub mod config;
pub mod decoder;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod ocr;
pub mod pipeline;
pub mod report;
pub mod scan;
pub mod session;
pub mod sink;

pub use cache::{PathGuard, RecognitionCache};
pub use decoder::{BpgDecoder, TemporaryDecodedImage};
pub use dispatcher::Dispatcher;
pub use error::{ErrorKind, OcrBatchError, Result};
pub use pipeline::{RecognitionPipeline, RecognitionTask};
pub use report::{Outcome, ResultMessage};
pub use sink::{ResultSink, SinkProducer};
