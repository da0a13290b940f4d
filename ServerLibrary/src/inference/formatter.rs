use crate::inference::utils::detection::Detection;
use crate::inference::utils::prediction::Prediction;

pub const NO_DETECTION_LABEL: &str = "No detection";

//Total: out-of-range ids (or an absent name list) render as the numeric id.
pub fn resolve_label(class_id: u32, class_names: &[String]) -> String {
    class_names
        .get(class_id as usize)
        .cloned()
        .unwrap_or_else(|| class_id.to_string())
}

//Single-image path: one prediction per detection, or exactly one sentinel
//carrying the measured elapsed time when nothing was found.
pub fn format_detections(detections: &[Detection], class_names: &[String], model_version: &str, elapsed_ms: f64) -> Vec<Prediction> {
    if detections.is_empty() {
        return vec![no_detection(model_version, elapsed_ms)];
    }
    detections
        .iter()
        .map(|detection| Prediction {
            disease: resolve_label(detection.class_id, class_names),
            confidence: detection.confidence,
            model_version: model_version.to_string(),
            processing_time_ms: elapsed_ms,
        })
        .collect()
}

//Batch path: each image reduces to its highest-confidence detection.
pub fn reduce_best(detections: &[Detection], class_names: &[String], model_version: &str, elapsed_ms: f64) -> Prediction {
    match best_detection(detections) {
        Some(best) => Prediction {
            disease: resolve_label(best.class_id, class_names),
            confidence: best.confidence,
            model_version: model_version.to_string(),
            processing_time_ms: elapsed_ms,
        },
        None => no_detection(model_version, elapsed_ms),
    }
}

//Ties keep the first-seen detection.
pub fn best_detection(detections: &[Detection]) -> Option<&Detection> {
    let mut best: Option<&Detection> = None;
    for detection in detections {
        if best.map_or(true, |current| detection.confidence > current.confidence) {
            best = Some(detection);
        }
    }
    best
}

fn no_detection(model_version: &str, elapsed_ms: f64) -> Prediction {
    Prediction {
        disease: NO_DETECTION_LABEL.to_string(),
        confidence: 0.0,
        model_version: model_version.to_string(),
        processing_time_ms: elapsed_ms,
    }
}
