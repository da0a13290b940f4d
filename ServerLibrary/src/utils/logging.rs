pub use crate::{logging_debug, logging_information, logging_warning, logging_error, logging_critical};

use colored::*;
use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use chrono::{DateTime, Local};
use lazy_static::lazy_static;

lazy_static! {
    static ref LOGGER: Mutex<Logger> = Mutex::new(Logger::new());
}

#[derive(Copy, Clone)]
pub enum LogLevel {
    Debug,
    Information,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn to_plain_string(&self) -> String {
        match self {
            LogLevel::Debug => "Debug      ".to_string(),
            LogLevel::Information => "Information".to_string(),
            LogLevel::Warning => "Warning    ".to_string(),
            LogLevel::Error => "Error      ".to_string(),
            LogLevel::Critical => "Critical   ".to_string(),
        }
    }

    pub fn to_colored_string(&self) -> ColoredString {
        match self {
            LogLevel::Debug => "Debug      ".to_string().bright_black(),
            LogLevel::Information => "Information".to_string().bright_blue(),
            LogLevel::Warning => "Warning    ".to_string().yellow(),
            LogLevel::Error => "Error      ".to_string().bright_red(),
            LogLevel::Critical => "Critical   ".to_string().bright_yellow(),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}

#[derive(Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub timestamp: DateTime<Local>,
    pub position: String,
    pub message: String,
    pub debug_info: String,
}

impl LogEntry {
    pub fn new<T: Into<String>, U: Into<String>, V: Into<String>>(level: LogLevel, position: T, message: U, debug_info: V) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            position: position.into(),
            message: message.into(),
            debug_info: debug_info.into(),
        }
    }

    pub fn to_plain_string(&self) -> String {
        let level = self.level.to_plain_string();
        let timestamp = self.timestamp.format("%Y/%m/%d %H:%M:%S").to_string();
        if self.debug_info.is_empty() {
            format!("[{}] {} {}: {}", level, timestamp, self.position, self.message)
        } else {
            format!("[{}] {} {}: {}\n{}", level, timestamp, self.position, self.message, self.debug_info)
        }
    }

    pub fn to_colored_string(&self) -> String {
        let level = self.level.to_colored_string();
        let timestamp = self.timestamp.format("%Y/%m/%d %H:%M:%S").to_string();
        let position = self.position.cyan();
        let message = self.message.white();
        if self.debug_info.is_empty() {
            format!("[{}] {} {}: {}", level, timestamp, position, message)
        } else {
            let debug_info = self.debug_info.bright_black();
            format!("[{}] {} {}: {}\n{}", level, timestamp, position, message, debug_info)
        }
    }
}

impl Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}

pub struct Logger {
    log_file: Option<File>,
}

impl Logger {
    fn new() -> Self {
        Self {
            log_file: None,
        }
    }

    pub fn initialize(log_file_path: Option<&str>) {
        let Some(path) = log_file_path else {
            return;
        };
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                let _ = fs::create_dir_all(parent);
            }
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                if let Ok(mut logger) = LOGGER.lock() {
                    logger.log_file = Some(file);
                }
            },
            Err(err) => {
                Self::add_system_log(LogLevel::Error, "Logger", format!("Cannot open log file {path}"), format!("Err: {err}"));
            },
        }
    }

    pub fn add_system_log<T: Into<String>, U: Into<String>, V: Into<String>>(level: LogLevel, position: T, message: U, debug_info: V) {
        let log_entry = LogEntry::new(level, position, message, debug_info);
        println!("{}", log_entry.to_colored_string());
        if let Ok(mut logger) = LOGGER.lock() {
            if let Some(file) = logger.log_file.as_mut() {
                let _ = writeln!(file, "{}", log_entry.to_plain_string());
            }
        }
    }
}

#[macro_export]
macro_rules! logging_debug {
    ($position:expr, $message:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Debug, $position, $message, format!("{}:{}", file!(), line!()))
    };
    ($position:expr, $message:expr, $debug_info:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Debug, $position, $message, format!("{}:{} {}", file!(), line!(), $debug_info))
    };
}

#[macro_export]
macro_rules! logging_information {
    ($position:expr, $message:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Information, $position, $message, "")
    };
    ($position:expr, $message:expr, $debug_info:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Information, $position, $message, format!("{}:{} {}", file!(), line!(), $debug_info))
    };
}

#[macro_export]
macro_rules! logging_warning {
    ($position:expr, $message:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Warning, $position, $message, format!("{}:{}", file!(), line!()))
    };
    ($position:expr, $message:expr, $debug_info:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Warning, $position, $message, format!("{}:{} {}", file!(), line!(), $debug_info))
    };
}

#[macro_export]
macro_rules! logging_error {
    ($position:expr, $message:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Error, $position, $message, format!("{}:{}", file!(), line!()))
    };
    ($position:expr, $message:expr, $debug_info:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Error, $position, $message, format!("{}:{} {}", file!(), line!(), $debug_info))
    };
}

#[macro_export]
macro_rules! logging_critical {
    ($position:expr, $message:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Critical, $position, $message, format!("{}:{}", file!(), line!()))
    };
    ($position:expr, $message:expr, $debug_info:expr) => {
        $crate::utils::logging::Logger::add_system_log($crate::utils::logging::LogLevel::Critical, $position, $message, format!("{}:{} {}", file!(), line!(), $debug_info))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_entry_contains_level_position_and_message() {
        let entry = LogEntry::new(LogLevel::Warning, "Dispatcher", "Adapter failure", "");
        let rendered = entry.to_plain_string();
        assert!(rendered.starts_with("[Warning    ]"));
        assert!(rendered.contains("Dispatcher: Adapter failure"));
    }

    #[test]
    fn debug_info_is_rendered_on_second_line() {
        let entry = LogEntry::new(LogLevel::Error, "Server", "Failed to load model", "Err: missing file");
        let rendered = entry.to_plain_string();
        let mut lines = rendered.lines();
        assert!(lines.next().is_some_and(|line| line.contains("Failed to load model")));
        assert_eq!(lines.next(), Some("Err: missing file"));
    }
}
