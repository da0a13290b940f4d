use std::sync::Arc;
use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use crate::management::context::{ModelHandle, ServiceContext};
use crate::inference::onnx_detector::OnnxDetector;
use crate::utils::config::Config;
use crate::utils::logging::*;
use crate::web::api::{health, predict};

pub struct Server;

impl Server {
    pub async fn run() {
        let config = Config::from_env();
        Logger::initialize(config.log_file.as_deref());
        logging_information!("Server", "Initializing");
        if !config.model_class_names.is_empty() && config.model_class_names.len() != config.model_num_classes {
            logging_warning!("Server", format!("Class name list has {} entries, expected {}", config.model_class_names.len(), config.model_num_classes));
        }

        let model = Self::load_model(&config);
        let context = web::Data::new(ServiceContext::new(config.clone(), model));

        let app_context = context.clone();
        let http_server = HttpServer::new(move || {
            App::new()
                .app_data(app_context.clone())
                .wrap(Self::cors_policy(&app_context.config))
                .service(health::initialize())
                .service(predict::initialize())
        }).bind((config.host.as_str(), config.port));
        let http_server = match http_server {
            Ok(http_server) => http_server,
            Err(err) => {
                logging_critical!("Server", format!("Failed to bind {}:{}", config.host, config.port), format!("Err: {err}"));
                return;
            },
        };
        logging_information!("Server", "Web service ready");
        logging_information!("Server", "Online now");
        if let Err(err) = http_server.run().await {
            logging_critical!("Server", "An error occurred while running the web service", format!("Err: {err}"));
        }
        logging_information!("Server", "Termination complete");
    }

    //Runs during startup only. A failed load is recorded and never retried:
    //prediction endpoints answer 503 while health keeps responding.
    fn load_model(config: &Config) -> Option<ModelHandle> {
        logging_information!("Server", format!("Loading model from {} on device={}", config.model_path, config.model_device));
        match OnnxDetector::load(&config.model_path, &config.model_device) {
            Ok(detector) => {
                logging_information!("Server", "Model loaded successfully");
                Some(ModelHandle::new(Arc::new(detector), config.model_path.clone()))
            },
            Err(err) => {
                logging_error!("Server", "Failed to load model during startup", format!("Err: {err}"));
                None
            },
        }
    }

    fn cors_policy(config: &Config) -> Cors {
        if config.allowed_origins.is_empty() {
            return Cors::permissive();
        }
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();
        for origin in &config.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
        cors
    }
}
