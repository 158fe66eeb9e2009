//! Console appender implementation

use crate::core::{Appender, LogEvent, LogLevel, Result};
use chrono::SecondsFormat;
use colored::Colorize;
use std::io::Write;

/// Line format written by [`ConsoleAppender`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleFormat {
    /// `[2025-01-08T10:30:45.123Z] [INFO ] app.http main - Request processed`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

pub struct ConsoleAppender {
    use_colors: bool,
    format: ConsoleFormat,
    all_to_stderr: bool,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            format: ConsoleFormat::Text,
            all_to_stderr: false,
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            ..Self::new()
        }
    }

    /// # Example
    ///
    /// ```
    /// use rust_log_router::appenders::{ConsoleAppender, ConsoleFormat};
    ///
    /// let appender = ConsoleAppender::new().with_format(ConsoleFormat::Json);
    /// ```
    #[must_use]
    pub fn with_format(mut self, format: ConsoleFormat) -> Self {
        self.format = format;
        self
    }

    /// Send every level to stderr instead of only Error and Fatal
    #[must_use]
    pub fn with_stderr(mut self, all_to_stderr: bool) -> Self {
        self.all_to_stderr = all_to_stderr;
        self
    }

    fn format_text(&self, event: &LogEvent) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", event.level.to_str())
                .color(event.level.color_code())
                .to_string()
        } else {
            format!("{:5}", event.level.to_str())
        };

        let mut line = format!(
            "[{}] [{}] {} {} - {}",
            event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            level_str,
            event.logger_name,
            event.thread_name.as_ref().unwrap_or(&event.thread_id),
            sanitize(&event.formatted_message())
        );

        if !event.properties.is_empty() {
            line.push(' ');
            line.push_str(&event.properties.format_fields());
        }
        if let Some(ref error) = event.exception {
            line.push_str(" | ");
            line.push_str(&sanitize(&error.to_string()));
        }
        line
    }

    fn format_json(&self, event: &LogEvent) -> Result<String> {
        let mut obj = serde_json::Map::new();
        obj.insert(
            "timestamp".to_string(),
            serde_json::Value::String(event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        obj.insert(
            "level".to_string(),
            serde_json::Value::String(event.level.to_str().to_string()),
        );
        obj.insert(
            "logger".to_string(),
            serde_json::Value::String(event.logger_name.clone()),
        );
        obj.insert(
            "message".to_string(),
            serde_json::Value::String(event.formatted_message()),
        );
        if !event.properties.is_empty() {
            obj.insert("properties".to_string(), event.properties.to_json_value());
        }
        if let Some(ref error) = event.exception {
            obj.insert(
                "exception".to_string(),
                serde_json::Value::String(error.to_string()),
            );
        }
        Ok(serde_json::to_string(&serde_json::Value::Object(obj))?)
    }
}

// Keep one event per line
fn sanitize(text: &str) -> String {
    text.replace('\r', "\\r").replace('\n', "\\n")
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, event: &LogEvent) -> Result<()> {
        let output = match self.format {
            ConsoleFormat::Text => self.format_text(event),
            ConsoleFormat::Json => self.format_json(event)?,
        };

        // Route Error and Fatal levels to stderr, others to stdout
        if self.all_to_stderr || matches!(event.level, LogLevel::Error | LogLevel::Fatal) {
            writeln!(std::io::stderr().lock(), "{}", output)?;
        } else {
            writeln!(std::io::stdout().lock(), "{}", output)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Flush both stdout and stderr since we write to both
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn kind_name(&self) -> &'static str {
        "Console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_line_is_single_line() {
        let appender = ConsoleAppender::with_colors(false);
        let event = LogEvent::new(LogLevel::Warn, "app.http", "first\nsecond")
            .with_property("status", 503i64);

        let line = appender.format_text(&event);
        assert!(!line.contains('\n'));
        assert!(line.contains("[WARN ]"));
        assert!(line.contains("app.http"));
        assert!(line.contains("first\\nsecond"));
        assert!(line.ends_with("status=503"));
    }

    #[test]
    fn test_json_line() {
        let appender = ConsoleAppender::new().with_format(ConsoleFormat::Json);
        let event = LogEvent::new(LogLevel::Info, "app", "user {0}").with_parameters(["bob"]);

        let line = appender.format_json(&event).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["message"], "user bob");
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["logger"], "app");
    }
}
