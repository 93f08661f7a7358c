use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::error::OcrBatchError;
use crate::pipeline::RecognitionTask;
use crate::report::{Outcome, ResultMessage};
use crate::sink::{ResultSink, SinkProducer};

/// Fans paths out over a fixed number of long-lived workers.
///
/// Every submitted path produces exactly one message in the sink, including
/// paths whose unit of work panicked.
pub struct Dispatcher {
    task: Arc<dyn RecognitionTask>,
    workers: usize,
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn worker_loop(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
    task: Arc<dyn RecognitionTask>,
    language: Arc<str>,
    sink: SinkProducer,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(path) = next else { break };

        debug!(worker = id, path = %path, "Processing");
        let outcome = AssertUnwindSafe(task.process(&path, &language))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                let message = format!("unexpected failure: {}", panic_message(panic));
                warn!(worker = id, path = %path, "{}", message);
                Outcome::Failed(OcrBatchError::Other {
                    path: path.clone(),
                    message,
                })
            });

        sink.push(ResultMessage::new(path, outcome));
    }
    debug!(worker = id, "Worker finished");
}

impl Dispatcher {
    pub fn new(task: Arc<dyn RecognitionTask>, workers: usize) -> Self {
        Self {
            task,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every path and return once all of them have reported.
    pub async fn run(&self, paths: Vec<String>, language: &str, sink: &ResultSink) {
        if paths.is_empty() {
            return;
        }

        let pool_size = self.workers.min(paths.len());
        info!(
            images = paths.len(),
            workers = pool_size,
            language,
            "Dispatching batch"
        );

        let (tx, rx) = mpsc::channel::<String>(pool_size * 2);
        let queue = Arc::new(Mutex::new(rx));
        let language: Arc<str> = Arc::from(language);

        let handles: Vec<_> = (0..pool_size)
            .map(|id| {
                tokio::spawn(worker_loop(
                    id,
                    Arc::clone(&queue),
                    Arc::clone(&self.task),
                    Arc::clone(&language),
                    sink.producer(),
                ))
            })
            .collect();
        drop(queue);

        let mut pending = paths.into_iter();
        for path in pending.by_ref() {
            if let Err(mpsc::error::SendError(path)) = tx.send(path).await {
                sink.push(ResultMessage::failed(
                    path.clone(),
                    OcrBatchError::Other {
                        path,
                        message: "no worker left to process this image".to_string(),
                    },
                ));
                break;
            }
        }
        drop(tx);

        for path in pending {
            sink.push(ResultMessage::failed(
                path.clone(),
                OcrBatchError::Other {
                    path,
                    message: "no worker left to process this image".to_string(),
                },
            ));
        }

        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!(error = %e, "Worker task ended abnormally");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct EchoTask {
        active: AtomicUsize,
        peak: AtomicUsize,
    }

    impl EchoTask {
        fn new() -> Self {
            Self {
                active: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RecognitionTask for EchoTask {
        async fn process(&self, path: &str, language: &str) -> Outcome {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if path.starts_with("panic") {
                panic!("boom on {path}");
            }
            if path.starts_with("fail") {
                return Outcome::Failed(OcrBatchError::FileNotFound {
                    path: path.to_string(),
                });
            }
            Outcome::Recognized {
                text: format!("{path}:{language}"),
                cached: false,
            }
        }
    }

    fn paths(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{i}.png")).collect()
    }

    #[tokio::test]
    async fn test_empty_batch_yields_nothing() {
        let dispatcher = Dispatcher::new(Arc::new(EchoTask::new()), 4);
        let mut sink = ResultSink::new();
        dispatcher.run(vec![], "eng", &sink).await;
        assert!(sink.drain_all().is_empty());
    }

    #[tokio::test]
    async fn test_one_message_per_path() {
        for n in [1, 3, 17, 64] {
            let dispatcher = Dispatcher::new(Arc::new(EchoTask::new()), 4);
            let mut sink = ResultSink::new();
            dispatcher.run(paths(n), "eng", &sink).await;

            let drained = sink.drain_all();
            assert_eq!(drained.len(), n);
            let unique: HashSet<_> = drained.iter().map(|m| m.path.clone()).collect();
            assert_eq!(unique.len(), n);
        }
    }

    #[tokio::test]
    async fn test_language_reaches_every_unit() {
        let dispatcher = Dispatcher::new(Arc::new(EchoTask::new()), 2);
        let mut sink = ResultSink::new();
        dispatcher.run(paths(5), "fra", &sink).await;

        for message in sink.drain_all() {
            assert!(message.text().unwrap().ends_with(":fra"));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_size_is_bounded() {
        let task = Arc::new(EchoTask::new());
        let dispatcher = Dispatcher::new(task.clone(), 3);
        let mut sink = ResultSink::new();
        dispatcher.run(paths(30), "eng", &sink).await;

        assert_eq!(sink.drain_all().len(), 30);
        assert!(task.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_failures_and_panics_do_not_stop_siblings() {
        let dispatcher = Dispatcher::new(Arc::new(EchoTask::new()), 2);
        let mut sink = ResultSink::new();
        let batch = vec![
            "ok-1.png".to_string(),
            "panic-1.png".to_string(),
            "fail-1.png".to_string(),
            "ok-2.png".to_string(),
            "panic-2.png".to_string(),
            "ok-3.png".to_string(),
        ];
        dispatcher.run(batch, "eng", &sink).await;

        let drained = sink.drain_all();
        assert_eq!(drained.len(), 6);

        let recognized = drained.iter().filter(|m| m.text().is_some()).count();
        assert_eq!(recognized, 3);

        let panicked: Vec<_> = drained
            .iter()
            .filter(|m| m.path.starts_with("panic"))
            .collect();
        assert_eq!(panicked.len(), 2);
        for message in panicked {
            assert_eq!(message.error_kind(), Some(ErrorKind::Other));
            assert!(message.to_string().contains("boom on"));
        }

        let failed = drained
            .iter()
            .find(|m| m.path == "fail-1.png")
            .expect("failure reported");
        assert_eq!(failed.error_kind(), Some(ErrorKind::FileNotFound));
    }

    #[test]
    fn test_zero_workers_clamped() {
        let dispatcher = Dispatcher::new(Arc::new(EchoTask::new()), 0);
        assert_eq!(dispatcher.workers(), 1);
    }

    #[test]
    fn test_panic_message_variants() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42u8)), "unknown panic");
    }
}
