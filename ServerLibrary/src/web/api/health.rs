use actix_web::{get, web, HttpResponse, Responder, Scope};
use crate::inference::utils::prediction::HealthCheck;
use crate::management::context::ServiceContext;

pub fn initialize() -> Scope {
    web::scope("/health")
        .service(health)
}

//No authentication: health must answer even when the model failed to load.
#[get("")]
async fn health(context: web::Data<ServiceContext>) -> impl Responder {
    HttpResponse::Ok().json(HealthCheck {
        status: "ok".to_string(),
        model_loaded: context.model.is_some(),
        model_path: context.config.model_path.clone(),
    })
}
