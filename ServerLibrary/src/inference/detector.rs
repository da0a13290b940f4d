use image::RgbImage;
use thiserror::Error;
use crate::inference::utils::detection::Detection;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to load model: {0}")]
    Load(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Unexpected model output: {0}")]
    UnexpectedOutput(String),
}

//Seam between the service and the pretrained model. Implementations must be
//callable concurrently from multiple worker threads.
pub trait Detector: Send + Sync {
    fn predict(&self, image: &RgbImage, input_size: u32) -> Result<Vec<Detection>, AdapterError>;
}
