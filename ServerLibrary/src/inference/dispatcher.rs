use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use image::RgbImage;
use tokio::sync::{mpsc, oneshot};
use crate::inference::detector::Detector;
use crate::inference::utils::detection::Detection;
use crate::utils::logging::*;

pub const WORKER_COUNT: usize = 2; //fixed, not configurable
pub const DETECT_INPUT_SIZE: u32 = 640; //pixels

struct InferenceJob {
    image: RgbImage,
    input_size: u32,
    reply: oneshot::Sender<(Vec<Detection>, f64)>,
}

//Bounded pool of OS threads running the blocking predict call. Jobs queue
//FIFO when every worker is busy. No priority, no cancellation, no timeout:
//a hung predict call occupies its worker until it returns.
pub struct InferenceDispatcher {
    job_sender: Option<mpsc::UnboundedSender<InferenceJob>>,
    workers: Vec<JoinHandle<()>>,
}

impl InferenceDispatcher {
    pub fn new(detector: Arc<dyn Detector>) -> Self {
        let (job_sender, job_receiver) = mpsc::unbounded_channel();
        let job_receiver = Arc::new(Mutex::new(job_receiver));
        let workers = (0..WORKER_COUNT)
            .map(|worker_id| {
                let detector = detector.clone();
                let job_receiver = job_receiver.clone();
                thread::spawn(move || Self::worker_loop(worker_id, detector, job_receiver))
            })
            .collect();
        Self {
            job_sender: Some(job_sender),
            workers,
        }
    }

    //Suspends only the calling request. Adapter failures are deliberately
    //mapped to an empty detection list, indistinguishable from a clean
    //zero-detection result.
    pub async fn dispatch(&self, image: RgbImage, input_size: u32) -> (Vec<Detection>, f64) {
        let (reply_sender, reply_receiver) = oneshot::channel();
        let job = InferenceJob {
            image,
            input_size,
            reply: reply_sender,
        };
        let Some(job_sender) = self.job_sender.as_ref() else {
            return (Vec::new(), 0.0);
        };
        if job_sender.send(job).is_err() {
            return (Vec::new(), 0.0);
        }
        reply_receiver.await.unwrap_or((Vec::new(), 0.0))
    }

    fn worker_loop(worker_id: usize, detector: Arc<dyn Detector>, job_receiver: Arc<Mutex<mpsc::UnboundedReceiver<InferenceJob>>>) {
        loop {
            let job = match job_receiver.lock() {
                Ok(mut job_receiver) => job_receiver.blocking_recv(),
                Err(_) => break,
            };
            let Some(job) = job else {
                break;
            };
            let started = Instant::now();
            let detections = match detector.predict(&job.image, job.input_size) {
                Ok(detections) => detections,
                Err(err) => {
                    logging_warning!("Dispatcher", format!("Worker {worker_id} suppressed an adapter failure"), format!("Err: {err}"));
                    Vec::new()
                },
            };
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            //The requester may have disconnected. Nothing left to do with the result.
            let _ = job.reply.send((detections, elapsed_ms));
        }
    }
}

impl Drop for InferenceDispatcher {
    fn drop(&mut self) {
        self.job_sender.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::detector::AdapterError;

    struct FixedDetector {
        detections: Vec<Detection>,
    }

    impl Detector for FixedDetector {
        fn predict(&self, _image: &RgbImage, _input_size: u32) -> Result<Vec<Detection>, AdapterError> {
            Ok(self.detections.clone())
        }
    }

    struct FailingDetector;

    impl Detector for FailingDetector {
        fn predict(&self, _image: &RgbImage, _input_size: u32) -> Result<Vec<Detection>, AdapterError> {
            Err(AdapterError::UnexpectedOutput("Output shape [1, 2]".to_string()))
        }
    }

    fn blank_image() -> RgbImage {
        RgbImage::new(8, 8)
    }

    #[tokio::test]
    async fn dispatch_returns_detections_and_timing() {
        let detections = vec![Detection::new(1, 0.85, None)];
        let dispatcher = InferenceDispatcher::new(Arc::new(FixedDetector {
            detections: detections.clone(),
        }));
        let (result, elapsed_ms) = dispatcher.dispatch(blank_image(), DETECT_INPUT_SIZE).await;
        assert_eq!(result, detections);
        assert!(elapsed_ms >= 0.0);
    }

    #[tokio::test]
    async fn adapter_failure_becomes_empty_detection_list() {
        let dispatcher = InferenceDispatcher::new(Arc::new(FailingDetector));
        let (result, _) = dispatcher.dispatch(blank_image(), DETECT_INPUT_SIZE).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn concurrent_dispatches_all_complete() {
        let dispatcher = Arc::new(InferenceDispatcher::new(Arc::new(FixedDetector {
            detections: vec![Detection::new(0, 0.9, None)],
        })));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move {
                dispatcher.dispatch(blank_image(), DETECT_INPUT_SIZE).await
            }));
        }
        for handle in handles {
            let (result, _) = handle.await.unwrap();
            assert_eq!(result.len(), 1);
        }
    }

    #[test]
    fn drop_joins_the_worker_threads() {
        let dispatcher = InferenceDispatcher::new(Arc::new(FixedDetector {
            detections: Vec::new(),
        }));
        drop(dispatcher);
    }
}
