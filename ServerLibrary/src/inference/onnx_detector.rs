use std::fs;
use std::sync::Mutex;
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Value;
use crate::inference::detector::{AdapterError, Detector};
use crate::inference::utils::bounding_box::BoundingBox;
use crate::inference::utils::detection::Detection;
use crate::utils::logging::*;

const CONFIDENCE_THRESHOLD: f32 = 0.7;
const MAX_DETECTIONS: usize = 100;

//ONNX Runtime sessions are not shareable for mutable runs, so concurrent
//predict calls from the worker pool are serialized on the session lock.
pub struct OnnxDetector {
    session: Mutex<Session>,
}

impl OnnxDetector {
    pub fn load(model_path: &str, device: &str) -> Result<Self, AdapterError> {
        let mut builder = Session::builder()
            .and_then(|builder| builder.with_intra_threads(4))
            .map_err(|err| AdapterError::Load(err.to_string()))?;
        if device.eq_ignore_ascii_case("cuda") {
            //CUDA is optional. When registration fails the session stays on CPU.
            let cuda = CUDAExecutionProvider::default().build();
            match builder.clone().with_execution_providers([cuda]) {
                Ok(builder_with_cuda) => builder = builder_with_cuda,
                Err(_) => logging_warning!("Detector", "CUDA execution provider unavailable, staying on CPU"),
            }
        }
        let model_bytes = fs::read(model_path)
            .map_err(|err| AdapterError::Load(err.to_string()))?;
        let session = builder.commit_from_memory(&model_bytes)
            .map_err(|err| AdapterError::Load(err.to_string()))?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl Detector for OnnxDetector {
    fn predict(&self, image: &RgbImage, input_size: u32) -> Result<Vec<Detection>, AdapterError> {
        let imgsz = input_size as usize;
        let resized = image::imageops::resize(image, input_size, input_size, FilterType::Nearest);

        let mut input = vec![0_f32; 3 * imgsz * imgsz];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let offset = y as usize * imgsz + x as usize;
            input[offset] = pixel[0] as f32 / 255.0;
            input[imgsz * imgsz + offset] = pixel[1] as f32 / 255.0;
            input[2 * imgsz * imgsz + offset] = pixel[2] as f32 / 255.0;
        }
        let input_shape = vec![1_i64, 3, imgsz as i64, imgsz as i64];
        let input_tensor = Value::from_array((input_shape, input))
            .map_err(|err| AdapterError::Inference(err.to_string()))?;

        let mut session = self.session.lock()
            .map_err(|_| AdapterError::Inference("Session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|err| AdapterError::Inference(err.to_string()))?;
        let (output_shape, output_data) = outputs[0].try_extract_tensor::<f32>()
            .map_err(|err| AdapterError::UnexpectedOutput(err.to_string()))?;

        //Expected layout: [1, 4 + class count, candidates].
        let dims: Vec<usize> = output_shape.iter().map(|&dim| dim as usize).collect();
        if dims.len() != 3 || dims[0] != 1 || dims[1] < 5 {
            return Err(AdapterError::UnexpectedOutput(format!("Output shape {dims:?}")));
        }
        let view = ArrayViewD::from_shape(IxDyn(&dims), output_data)
            .map_err(|err| AdapterError::UnexpectedOutput(err.to_string()))?;
        let view = view.index_axis(Axis(0), 0);

        let candidates = view.shape()[1];
        let scale_x = image.width() as f32 / input_size as f32;
        let scale_y = image.height() as f32 / input_size as f32;
        let mut detections = Vec::new();
        for candidate in 0..candidates {
            let scores = view.slice(s![4.., candidate]);
            let Some((class_id, &confidence)) = scores
                .indexed_iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            else {
                continue;
            };
            if confidence < CONFIDENCE_THRESHOLD {
                continue;
            }
            let center_x = view[[0, candidate]];
            let center_y = view[[1, candidate]];
            let width = view[[2, candidate]];
            let height = view[[3, candidate]];
            detections.push(Detection::new(class_id as u32, confidence, Some(BoundingBox {
                x1: (center_x - width / 2.0) * scale_x,
                y1: (center_y - height / 2.0) * scale_y,
                x2: (center_x + width / 2.0) * scale_x,
                y2: (center_y + height / 2.0) * scale_y,
            })));
        }
        detections.sort_unstable_by(|a, b| b.confidence.total_cmp(&a.confidence));
        detections.truncate(MAX_DETECTIONS);
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reports_missing_model_file() {
        let result = OnnxDetector::load("does/not/exist.onnx", "cpu");
        assert!(matches!(result, Err(AdapterError::Load(_))));
    }
}
