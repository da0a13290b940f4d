use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Prediction {
    pub disease: String,
    pub confidence: f32,
    pub model_version: String,
    pub processing_time_ms: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PredictResponse {
    pub predictions: Vec<Prediction>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthCheck {
    pub status: String,
    pub model_loaded: bool,
    pub model_path: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub detail: String,
}
