//! Appender implementations

#[cfg(feature = "console")]
pub mod console;
pub mod memory;
pub mod method_call;
pub mod null;

#[cfg(feature = "console")]
pub use console::{ConsoleAppender, ConsoleFormat};
pub use memory::{MemoryAppender, MemoryHandle};
pub use method_call::MethodCallAppender;
pub use null::NullAppender;

pub use crate::core::Appender;
