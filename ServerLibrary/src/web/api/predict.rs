use actix_multipart::{Field, Multipart};
use actix_web::{post, web, HttpRequest, HttpResponse, Scope};
use futures::{StreamExt, TryStreamExt};
use crate::inference::decoder::decode_image;
use crate::inference::formatter::{format_detections, reduce_best};
use crate::inference::utils::prediction::PredictResponse;
use crate::management::context::ServiceContext;
use crate::utils::api_error::ApiError;
use crate::utils::config::Config;
use crate::utils::logging::*;

pub const API_KEY_HEADER: &str = "X-API-Key";

pub fn initialize() -> Scope {
    web::scope("/predict")
        .service(predict)
        .service(predict_batch)
}

#[post("")]
async fn predict(request: HttpRequest, mut payload: Multipart, context: web::Data<ServiceContext>) -> Result<HttpResponse, ApiError> {
    verify_api_key(&request, &context.config)?;
    let model = context.model.as_ref().ok_or(ApiError::ModelNotLoaded)?;
    let upload = read_upload(&mut payload, "file").await?
        .ok_or_else(|| ApiError::InvalidPayload("Missing file field".to_string()))?;
    let image = decode_image(&upload.data, &upload.content_type)?;
    let (detections, elapsed_ms) = model.detect(image).await;
    let predictions = format_detections(&detections, &context.config.model_class_names, model.model_path(), elapsed_ms);
    logging_information!("Predict", format!("Predicted {} objects, time={:.1}ms", predictions.len(), elapsed_ms));
    Ok(HttpResponse::Ok().json(PredictResponse {
        predictions,
    }))
}

//Non-image and unreadable parts are skipped, not reported: the response
//carries one prediction per processed image only.
#[post("/batch")]
async fn predict_batch(request: HttpRequest, mut payload: Multipart, context: web::Data<ServiceContext>) -> Result<HttpResponse, ApiError> {
    verify_api_key(&request, &context.config)?;
    let model = context.model.as_ref().ok_or(ApiError::ModelNotLoaded)?;
    let mut predictions = Vec::new();
    let mut total_elapsed_ms = 0.0;
    while let Ok(Some(mut field)) = payload.try_next().await {
        let field_name = field.content_disposition()
            .and_then(|content_disposition| content_disposition.get_name())
            .map(str::to_string);
        if field_name.as_deref() != Some("files") {
            continue;
        }
        let content_type = declared_content_type(&field);
        let Ok(data) = read_field(&mut field).await else {
            continue;
        };
        let Ok(image) = decode_image(&data, &content_type) else {
            continue;
        };
        let (detections, elapsed_ms) = model.detect(image).await;
        total_elapsed_ms += elapsed_ms;
        predictions.push(reduce_best(&detections, &context.config.model_class_names, model.model_path(), elapsed_ms));
    }
    logging_information!("Predict", format!("Batch predicted {} images, time={total_elapsed_ms:.1}ms", predictions.len()));
    Ok(HttpResponse::Ok().json(PredictResponse {
        predictions,
    }))
}

fn verify_api_key(request: &HttpRequest, config: &Config) -> Result<(), ApiError> {
    if config.api_key.is_empty() {
        return Ok(());
    }
    let provided = request.headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided != Some(config.api_key.as_str()) {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

struct FileUpload {
    content_type: String,
    data: Vec<u8>,
}

async fn read_upload(payload: &mut Multipart, field_name: &str) -> Result<Option<FileUpload>, ApiError> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        let name = field.content_disposition()
            .and_then(|content_disposition| content_disposition.get_name())
            .map(str::to_string);
        if name.as_deref() != Some(field_name) {
            continue;
        }
        let content_type = declared_content_type(&field);
        let data = read_field(&mut field).await?;
        return Ok(Some(FileUpload {
            content_type,
            data,
        }));
    }
    Ok(None)
}

fn declared_content_type(field: &Field) -> String {
    field.content_type()
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

async fn read_field(field: &mut Field) -> Result<Vec<u8>, ApiError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|err| ApiError::InvalidPayload(err.to_string()))?;
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}
