//! Log level definitions and level sets

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal-ordered log level.
///
/// `Off` sorts above every real level and is never enabled; it is only used as a
/// threshold meaning "nothing passes".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    #[default]
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    Off = 6,
}

impl LogLevel {
    /// Lowest level that can be enabled
    pub const MIN: LogLevel = LogLevel::Trace;
    /// Highest level that can be enabled
    pub const MAX: LogLevel = LogLevel::Fatal;
    /// Number of levels that can be enabled (excludes `Off`)
    pub const COUNT: usize = 6;

    const ALL: [LogLevel; LogLevel::COUNT] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    #[inline]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(LogLevel::Trace),
            1 => Some(LogLevel::Debug),
            2 => Some(LogLevel::Info),
            3 => Some(LogLevel::Warn),
            4 => Some(LogLevel::Error),
            5 => Some(LogLevel::Fatal),
            6 => Some(LogLevel::Off),
            _ => None,
        }
    }

    /// Slot index for per-level tables; `None` for `Off`
    #[inline]
    pub(crate) fn index(self) -> Option<usize> {
        match self {
            LogLevel::Off => None,
            level => Some(level as usize),
        }
    }

    /// Iterate every level that can be enabled, lowest first
    pub fn all() -> impl DoubleEndedIterator<Item = LogLevel> {
        Self::ALL.into_iter()
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::Off => "OFF",
        }
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Trace => BrightBlack,
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal | LogLevel::Off => BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            "OFF" | "NONE" => Ok(LogLevel::Off),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Set of enabled levels, one bit per ordinal.
///
/// Range setters replace the whole set; use [`LevelSet::enable`] to build a
/// set cumulatively.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LevelSet(u8);

impl LevelSet {
    pub const fn empty() -> Self {
        LevelSet(0)
    }

    pub fn all() -> Self {
        Self::range(LogLevel::MIN, LogLevel::MAX)
    }

    /// Inclusive range; empty when `min > max` or `min` is `Off`
    pub fn range(min: LogLevel, max: LogLevel) -> Self {
        let mut set = Self::empty();
        for level in LogLevel::all() {
            if level >= min && level <= max {
                set.enable(level);
            }
        }
        set
    }

    pub fn only(level: LogLevel) -> Self {
        let mut set = Self::empty();
        set.enable(level);
        set
    }

    #[inline]
    pub fn contains(&self, level: LogLevel) -> bool {
        match level.index() {
            Some(idx) => self.0 & (1 << idx) != 0,
            None => false,
        }
    }

    pub fn enable(&mut self, level: LogLevel) {
        if let Some(idx) = level.index() {
            self.0 |= 1 << idx;
        }
    }

    pub fn disable(&mut self, level: LogLevel) {
        if let Some(idx) = level.index() {
            self.0 &= !(1 << idx);
        }
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Replace the set with the inclusive range `min..=max`
    pub fn set_range(&mut self, min: LogLevel, max: LogLevel) {
        *self = Self::range(min, max);
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = LogLevel> + '_ {
        LogLevel::all().filter(move |level| self.contains(*level))
    }

    pub fn min_level(&self) -> Option<LogLevel> {
        self.iter().next()
    }
}

impl fmt::Debug for LevelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<LogLevel> for LevelSet {
    fn from_iter<I: IntoIterator<Item = LogLevel>>(iter: I) -> Self {
        let mut set = LevelSet::empty();
        for level in iter {
            set.enable(level);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_roundtrip() {
        for level in LogLevel::all() {
            assert_eq!(LogLevel::from_ordinal(level.ordinal()), Some(level));
        }
        assert_eq!(LogLevel::from_ordinal(6), Some(LogLevel::Off));
        assert_eq!(LogLevel::from_ordinal(7), None);
    }

    #[test]
    fn test_off_is_never_contained() {
        let mut set = LevelSet::all();
        set.enable(LogLevel::Off);
        assert!(!set.contains(LogLevel::Off));
        assert_eq!(set.len(), LogLevel::COUNT);
    }

    #[test]
    fn test_range_replaces() {
        let mut set = LevelSet::only(LogLevel::Trace);
        set.set_range(LogLevel::Warn, LogLevel::MAX);
        assert!(!set.contains(LogLevel::Trace));
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![LogLevel::Warn, LogLevel::Error, LogLevel::Fatal]
        );
    }

    #[test]
    fn test_inverted_range_is_empty() {
        assert!(LevelSet::range(LogLevel::Error, LogLevel::Debug).is_empty());
        assert!(LevelSet::range(LogLevel::Off, LogLevel::MAX).is_empty());
    }

    #[test]
    fn test_parse() {
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("Off".parse::<LogLevel>(), Ok(LogLevel::Off));
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
