use serde::{Serialize, Deserialize};
use crate::inference::utils::bounding_box::BoundingBox;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub confidence: f32,
    pub bounding_box: Option<BoundingBox>,
}

impl Detection {
    pub fn new(class_id: u32, confidence: f32, bounding_box: Option<BoundingBox>) -> Self {
        Self {
            class_id,
            confidence,
            bounding_box,
        }
    }
}
