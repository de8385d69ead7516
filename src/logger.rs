use crate::config::AdaptConfig;
use crate::models::ModelCandidate;
use chrono::{DateTime, Utc};
use colored::*;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

static CONSOLE_LOGGER: Lazy<ConsoleLogger> = Lazy::new(ConsoleLogger::new);

pub fn init() -> Result<(), String> {
    init_with_config(LoggerConfig::default())
}

pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let max_level = config.min_level.to_level_filter();
    CONSOLE_LOGGER.update_config(config)?;

    log::set_logger(&*CONSOLE_LOGGER).map_err(|e| format!("Failed to set logger: {:?}", e))?;
    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn to_level(&self) -> Level {
        match self {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }

    pub fn to_level_filter(&self) -> LevelFilter {
        self.to_level().to_level_filter()
    }

    pub fn from_level(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

/// One emitted record, as written in JSON mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub module: String,
    pub file: String,
    pub line: u32,
    pub thread_id: String,
}

impl LogEntry {
    fn from_record(record: &Record) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: LogLevel::from_level(record.level()),
            message: record.args().to_string(),
            module: record.module_path().unwrap_or("unknown").to_string(),
            file: record.file().unwrap_or("unknown").to_string(),
            line: record.line().unwrap_or(0),
            thread_id: format!("{:?}", std::thread::current().id()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_thread_id: bool,
    pub show_file_location: bool,
    pub show_module: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file_path: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_thread_id: false,
            show_file_location: false,
            show_module: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file_path: None,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.show_colors = enabled;
        self
    }

    pub fn with_file_output(mut self, path: &str) -> Self {
        self.log_file_path = Some(path.to_string());
        self
    }

    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.output_json = enabled;
        self
    }

    pub fn production() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: false,
            show_emojis: false,
            output_json: true,
            log_file_path: Some("visualadapt.log".to_string()),
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_file_location: true,
            ..Default::default()
        }
    }
}

/// Writes to stderr, so stdout stays free for the prompt JSON.
pub struct ConsoleLogger {
    config: Mutex<LoggerConfig>,
    log_file: Mutex<Option<File>>,
}

impl ConsoleLogger {
    fn new() -> Self {
        Self {
            config: Mutex::new(LoggerConfig::default()),
            log_file: Mutex::new(None),
        }
    }

    fn update_config(&self, new_config: LoggerConfig) -> Result<(), String> {
        let file = match &new_config.log_file_path {
            Some(path) => Some(
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| format!("Failed to open log file {}: {}", path, e))?,
            ),
            None => None,
        };

        if let Ok(mut log_file) = self.log_file.lock() {
            *log_file = file;
        }
        if let Ok(mut config) = self.config.lock() {
            *config = new_config;
        }
        Ok(())
    }

    fn format_line(&self, entry: &LogEntry, config: &LoggerConfig) -> String {
        let paint = |text: String, color: Color| -> String {
            if config.show_colors {
                text.color(color).to_string()
            } else {
                text
            }
        };

        let mut output = String::new();
        let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
        output.push_str(&paint(timestamp, Color::BrightBlack));
        output.push(' ');

        let level = if config.show_emojis {
            format!("{} {}", entry.level.emoji(), entry.level.as_str())
        } else {
            entry.level.as_str().to_string()
        };
        output.push_str(&format!("[{}] ", paint(level, entry.level.color())));

        if config.show_module && !entry.module.is_empty() {
            output.push_str(&paint(entry.module.clone(), Color::BrightBlue));
            output.push_str("::");
        }

        output.push_str(&entry.message);

        if config.show_thread_id {
            output.push_str(&format!(" [thread:{}]", entry.thread_id));
        }

        if config.show_file_location {
            let location = format!("({}:{})", entry.file, entry.line);
            output.push(' ');
            output.push_str(&paint(location, Color::BrightBlack));
        }

        output
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        match self.config.lock() {
            Ok(config) => metadata.level() <= config.min_level.to_level(),
            Err(_) => true,
        }
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);
        let Ok(config) = self.config.lock() else {
            return;
        };

        let line = if config.output_json {
            serde_json::to_string(&entry).unwrap_or_default()
        } else {
            self.format_line(&entry, &config)
        };
        eprintln!("{}", line);

        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = writeln!(file, "{}", line);
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Ok(mut guard) = self.log_file.lock() {
            if let Some(file) = guard.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long a stage took when dropped.
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::info!("⏱️  {} finished in {}ms", self.name, self.elapsed().as_millis());
    }
}

pub fn timer(name: &str) -> Timer {
    Timer::new(name)
}

pub fn log_config_info(config: &AdaptConfig) {
    log::info!("⚙️  Configuration loaded:");
    log::info!("   API base: {}", config.api_base);
    log::info!(
        "   API key: {}",
        if config.api_key.is_some() { "✅" } else { "❌" }
    );
    log::info!("   Timeout: {}s", config.request_timeout.as_secs());
    log::info!("   Retry delay: {}ms", config.retry_delay.as_millis());
    if let Some(temperature) = config.temperature {
        log::info!("   Temperature: {}", temperature);
    }
}

pub fn log_candidates(label: &str, candidates: &[ModelCandidate]) {
    log::info!("📚 {} candidates:", label);
    for candidate in crate::models::candidate::ordered(candidates) {
        log::info!(
            "  {}. {} ({}{})",
            candidate.priority,
            candidate.identifier,
            candidate.endpoint.method(),
            if candidate.supports_system_instruction {
                ""
            } else {
                ", inline instruction"
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels() {
        assert_eq!(LogLevel::Info.as_str(), "INFO");
        assert_eq!(LogLevel::Error.emoji(), "❌");
        assert_eq!(LogLevel::Debug.color(), Color::Blue);
        assert_eq!(LogLevel::Warn.to_level_filter(), LevelFilter::Warn);
        assert_eq!(LogLevel::from_level(Level::Trace), LogLevel::Trace);
    }

    #[test]
    fn test_logger_config() {
        let config = LoggerConfig::development();
        assert_eq!(config.min_level, LogLevel::Debug);
        assert!(config.show_colors);

        let prod_config = LoggerConfig::production();
        assert!(!prod_config.show_colors);
        assert!(prod_config.output_json);
        assert!(prod_config.log_file_path.is_some());
    }

    #[test]
    fn test_plain_line_format() {
        let logger = ConsoleLogger::new();
        let config = LoggerConfig::new().with_colors(false);
        let entry = LogEntry {
            id: "id".into(),
            timestamp: Utc::now(),
            level: LogLevel::Warn,
            message: "Model gemini-pro failed".into(),
            module: "visualadapt::invoker".into(),
            file: "src/invoker.rs".into(),
            line: 7,
            thread_id: "main".into(),
        };
        let line = logger.format_line(&entry, &config);
        assert!(line.contains("[⚠️ WARN] visualadapt::invoker::Model gemini-pro failed"));
        assert!(!line.contains("src/invoker.rs"));
    }

    #[test]
    fn test_logger_initialization() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let config = LoggerConfig::development().with_file_output(path.to_str().unwrap());
        assert!(init_with_config(config).is_ok());
        log::info!("written to file");
        log::logger().flush();
        assert!(std::fs::read_to_string(&path).unwrap().contains("written to file"));
    }
}
