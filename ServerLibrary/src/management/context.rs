use std::sync::Arc;
use image::RgbImage;
use crate::inference::detector::Detector;
use crate::inference::dispatcher::{InferenceDispatcher, DETECT_INPUT_SIZE};
use crate::inference::utils::detection::Detection;
use crate::utils::config::Config;

//Read-only service state, built once during startup and injected into the
//request handlers. Replaces any notion of a process-global model object.
pub struct ServiceContext {
    pub config: Config,
    pub model: Option<ModelHandle>,
}

impl ServiceContext {
    pub fn new(config: Config, model: Option<ModelHandle>) -> Self {
        Self {
            config,
            model,
        }
    }
}

//Owns the loaded detector through its worker pool. Absent when the startup
//load failed; that state is fixed for the process lifetime.
pub struct ModelHandle {
    model_path: String,
    dispatcher: InferenceDispatcher,
}

impl ModelHandle {
    pub fn new(detector: Arc<dyn Detector>, model_path: String) -> Self {
        Self {
            model_path,
            dispatcher: InferenceDispatcher::new(detector),
        }
    }

    pub async fn detect(&self, image: RgbImage) -> (Vec<Detection>, f64) {
        self.dispatcher.dispatch(image, DETECT_INPUT_SIZE).await
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }
}
