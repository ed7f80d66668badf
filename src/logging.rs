//! Structured logging for harness components.
//!
//! Provides level filtering, a default console printer, an optional external
//! sink for embedding the harness in other tooling, and an optional file sink
//! that persists one line per record under the configured logs directory.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience alias for external logging callbacks.
pub type LogSink = Arc<dyn Fn(&LogRecord) + Send + Sync + 'static>;

/// Log severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Info = 1,
    Debug = 2,
}

impl LogLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Parse a `LOG_LEVEL` setting value, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Some(LogLevel::Error),
            "INFO" => Some(LogLevel::Info),
            "DEBUG" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

/// Structured log entry shared with external sinks and the file writer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>, category: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            category,
        }
    }
}

/// Error surfaced while attaching a file sink.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create logs directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open log file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Default console printer used when no external sink is configured.
pub fn default_log_handler(record: &LogRecord) {
    let timestamp = record
        .timestamp
        .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    if let Some(category) = &record.category {
        println!(
            "[{}] {:<5} [{}] {}",
            timestamp,
            record.level.label(),
            category,
            record.message
        );
    } else {
        println!(
            "[{}] {:<5} {}",
            timestamp,
            record.level.label(),
            record.message
        );
    }
}

struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    fn write(&self, record: &LogRecord) {
        let timestamp = record
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        if let Ok(mut file) = self.file.lock() {
            // Log delivery must never fail a test; drop the line on IO errors.
            let _ = writeln!(
                file,
                "{} - {} - {}",
                timestamp,
                record.level.label(),
                record.message
            );
        }
    }
}

/// Harness logger with level filtering and pluggable sinks.
pub struct HarnessLogger {
    level: LogLevel,
    external_sink: Option<LogSink>,
    file_sink: Option<FileSink>,
}

impl fmt::Debug for HarnessLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessLogger")
            .field("level", &self.level)
            .field("external_sink", &self.external_sink.is_some())
            .field(
                "log_file",
                &self.file_sink.as_ref().map(|sink| sink.path.clone()),
            )
            .finish()
    }
}

impl HarnessLogger {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            external_sink: None,
            file_sink: None,
        }
    }

    /// Replace the console handler with an external callback.
    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.external_sink = Some(sink);
        self
    }

    /// Attach a file sink writing `test_log_<timestamp>.log` under `dir`.
    ///
    /// The directory is created if missing. Returns the logger so callers can
    /// keep building.
    pub fn with_log_file(mut self, dir: &Path) -> Result<Self, LoggingError> {
        fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("test_log_{stamp}.log"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| LoggingError::OpenFile {
                path: path.clone(),
                source,
            })?;
        self.file_sink = Some(FileSink {
            path,
            file: Mutex::new(file),
        });
        Ok(self)
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Path of the attached log file, if any.
    pub fn log_file(&self) -> Option<&Path> {
        self.file_sink.as_ref().map(|sink| sink.path.as_path())
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level == LogLevel::Error || level.as_u8() <= self.level.as_u8()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>, category: Option<&str>) {
        if !self.should_log(level) {
            return;
        }

        let record = LogRecord::new(level, message, category.map(|c| c.to_string()));

        if let Some(sink) = &self.file_sink {
            sink.write(&record);
        }

        match &self.external_sink {
            Some(sink) => sink(&record),
            None => default_log_handler(&record),
        }
    }

    pub fn error(&self, message: impl Into<String>, category: Option<&str>) {
        self.log(LogLevel::Error, message, category);
    }

    pub fn info(&self, message: impl Into<String>, category: Option<&str>) {
        self.log(LogLevel::Info, message, category);
    }

    pub fn debug(&self, message: impl Into<String>, category: Option<&str>) {
        self.log(LogLevel::Debug, message, category);
    }
}
