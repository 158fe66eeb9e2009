//! Log event structure

use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Events are shared read-only between every target they fan out to
pub type SharedEvent = Arc<LogEvent>;

/// Opaque culture/format settings handed through to sinks untouched
pub type FormatProvider = Arc<dyn Any + Send + Sync>;

pub type EventError = Arc<dyn std::error::Error + Send + Sync>;

static NEXT_SEQUENCE_ID: AtomicU64 = AtomicU64::new(1);

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
    static THREAD_NAME_CACHE: RefCell<Option<Option<String>>> = const { RefCell::new(None) };
}

fn get_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

fn get_thread_name() -> Option<String> {
    THREAD_NAME_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| std::thread::current().name().map(String::from))
            .clone()
    })
}

/// Where the logging call was made
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSite {
    pub member_name: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    /// Explicit class/module override; wins over anything derived from the location
    pub class_name: Option<String>,
}

impl CallSite {
    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            member_name: None,
            file: Some(location.file().to_string()),
            line: Some(location.line()),
            class_name: None,
        }
    }

    pub fn with_member(mut self, member_name: impl Into<String>) -> Self {
        self.member_name = Some(member_name.into());
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }
}

#[derive(Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub logger_name: String,
    /// Message template; `{0}`, `{1}` … refer to `parameters`
    pub message: String,
    pub parameters: Vec<FieldValue>,
    pub format_provider: Option<FormatProvider>,
    pub exception: Option<EventError>,
    pub timestamp: DateTime<Utc>,
    pub properties: LogContext,
    pub call_site: Option<CallSite>,
    pub sequence_id: u64,
    pub thread_id: String,
    pub thread_name: Option<String>,
}

impl LogEvent {
    pub fn new(level: LogLevel, logger_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            parameters: Vec::new(),
            format_provider: None,
            exception: None,
            timestamp: Utc::now(),
            properties: LogContext::new(),
            call_site: None,
            sequence_id: NEXT_SEQUENCE_ID.fetch_add(1, Ordering::Relaxed),
            thread_id: get_thread_id(),
            thread_name: get_thread_name(),
        }
    }

    pub fn with_parameters<I, V>(mut self, parameters: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        self.parameters = parameters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.properties.add_field(key, value);
        self
    }

    pub fn with_properties(mut self, properties: LogContext) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_exception<E>(mut self, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.exception = Some(Arc::new(error));
        self
    }

    pub fn with_format_provider(mut self, provider: FormatProvider) -> Self {
        self.format_provider = Some(provider);
        self
    }

    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Message with positional `{N}` placeholders substituted.
    ///
    /// Unknown indexes and unmatched braces are left as written.
    pub fn formatted_message(&self) -> String {
        if self.parameters.is_empty() {
            return self.message.clone();
        }

        let mut out = String::with_capacity(self.message.len() + 16);
        let mut rest = self.message.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let substituted = after.find('}').and_then(|close| {
                let index: usize = after[..close].trim().parse().ok()?;
                let value = self.parameters.get(index)?;
                Some((value.to_string(), close))
            });
            match substituted {
                Some((value, close)) => {
                    out.push_str(&value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl fmt::Debug for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEvent")
            .field("level", &self.level)
            .field("logger_name", &self.logger_name)
            .field("message", &self.message)
            .field("parameters", &self.parameters)
            .field("has_format_provider", &self.format_provider.is_some())
            .field("exception", &self.exception.as_ref().map(|e| e.to_string()))
            .field("timestamp", &self.timestamp)
            .field("properties", &self.properties)
            .field("call_site", &self.call_site)
            .field("sequence_id", &self.sequence_id)
            .finish()
    }
}
