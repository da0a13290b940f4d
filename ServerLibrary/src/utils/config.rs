use std::env;
use std::str::FromStr;
use crate::utils::logging::*;

#[derive(Debug, Clone)]
pub struct Config {
    pub model_path: String, //filesystem path
    pub model_device: String, //"cpu" or "cuda"
    pub model_num_classes: usize, //count
    pub model_class_names: Vec<String>, //index = class id
    pub api_key: String, //empty disables the gate
    pub host: String, //bind address
    pub port: u16, //port
    pub allowed_origins: Vec<String>, //CORS origins
    pub log_file: Option<String>, //path
}

impl Config {
    //Read once at startup. Startup must not continue with a broken configuration.
    pub fn from_env() -> Self {
        let config = Self {
            model_path: env_string("MODEL_PATH", "runs/detect/train/weights/best.onnx"),
            model_device: env_string("MODEL_DEVICE", "cpu"),
            model_num_classes: env_parse("MODEL_NUM_CLASSES", 5_usize),
            model_class_names: parse_name_list(&env_string("MODEL_CLASS_NAMES", "")),
            api_key: env_string("API_KEY", "change_me"),
            host: env_string("HOST", "0.0.0.0"),
            port: env_parse("PORT", 8001_u16),
            allowed_origins: parse_origin_list(&env_string("ALLOWED_ORIGINS", "")),
            log_file: env::var("LOG_FILE").ok().filter(|path| !path.is_empty()),
        };
        if !Self::validate(&config) {
            logging_critical!("Config", "Invalid configuration");
            panic!("Invalid configuration");
        }
        config
    }

    pub fn validate(config: &Config) -> bool {
        Self::validate_port(config.port)
            && Self::validate_class_count(config.model_num_classes)
            && !config.model_path.is_empty()
    }

    fn validate_port(port: u16) -> bool {
        port != 0
    }

    fn validate_class_count(count: usize) -> bool {
        count >= 1
    }
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                logging_critical!("Config", format!("Unable to parse {name}"), format!("Value: {value}"));
                panic!("Unable to parse {name}");
            },
        },
        Err(_) => default,
    }
}

//Entries are trimmed but kept even when empty, so the list keeps its class-id indexing.
fn parse_name_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|name| name.trim().to_string()).collect()
}

fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
