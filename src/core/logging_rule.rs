//! Logging rules: which loggers, which levels, which filters, which targets

use super::filter::{Filter, FilterResult};
use super::log_level::{LevelSet, LogLevel};
use crate::targets::TargetRef;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Logger-name glob. `*` matches any run of characters, `?` exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    All,
    Equals(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Wildcard(String),
}

impl NamePattern {
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if pattern.is_empty() || pattern.chars().all(|c| c == '*') {
            return NamePattern::All;
        }
        if pattern.contains('?') {
            return NamePattern::Wildcard(pattern.to_string());
        }

        let stars = pattern.matches('*').count();
        let leading = pattern.starts_with('*');
        let trailing = pattern.ends_with('*');
        match (stars, leading, trailing) {
            (0, _, _) => NamePattern::Equals(pattern.to_string()),
            (1, false, true) => NamePattern::StartsWith(pattern[..pattern.len() - 1].to_string()),
            (1, true, false) => NamePattern::EndsWith(pattern[1..].to_string()),
            (2, true, true) => NamePattern::Contains(pattern[1..pattern.len() - 1].to_string()),
            _ => NamePattern::Wildcard(pattern.to_string()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::All => true,
            NamePattern::Equals(s) => name == s,
            NamePattern::StartsWith(s) => name.starts_with(s.as_str()),
            NamePattern::EndsWith(s) => name.ends_with(s.as_str()),
            NamePattern::Contains(s) => name.contains(s.as_str()),
            NamePattern::Wildcard(p) => {
                let pattern: Vec<char> = p.chars().collect();
                let text: Vec<char> = name.chars().collect();
                wildcard_match(&pattern, &text)
            }
        }
    }
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamePattern::All => write!(f, "*"),
            NamePattern::Equals(s) => write!(f, "{}", s),
            NamePattern::StartsWith(s) => write!(f, "{}*", s),
            NamePattern::EndsWith(s) => write!(f, "*{}", s),
            NamePattern::Contains(s) => write!(f, "*{}*", s),
            NamePattern::Wildcard(p) => write!(f, "{}", p),
        }
    }
}

// Iterative glob match with single-star backtracking; `?` is one char
fn wildcard_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

/// Identity of a rule inside its configuration; survives moves within the rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(u64);

static NEXT_RULE_ID: AtomicU64 = AtomicU64::new(1);

impl RuleId {
    fn next() -> Self {
        RuleId(NEXT_RULE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone)]
pub struct LoggingRule {
    id: RuleId,
    pub name: Option<String>,
    pub pattern: NamePattern,
    pub levels: LevelSet,
    pub filters: Vec<Filter>,
    /// Result when every filter is neutral. Unused for a rule without filters.
    pub filter_default: FilterResult,
    /// Stop evaluating later rules once this one matches
    pub final_rule: bool,
    /// Below this level later rules are suppressed; at or above it they are re-enabled
    pub final_min_level: Option<LogLevel>,
    pub targets: Vec<TargetRef>,
}

impl LoggingRule {
    /// New rule matching `pattern` with every level enabled
    pub fn new(pattern: &str) -> Self {
        Self {
            id: RuleId::next(),
            name: None,
            pattern: NamePattern::parse(pattern),
            levels: LevelSet::all(),
            filters: Vec::new(),
            filter_default: FilterResult::Ignore,
            final_rule: false,
            final_min_level: None,
            targets: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn matches_logger(&self, logger_name: &str) -> bool {
        self.pattern.matches(logger_name)
    }

    #[inline]
    pub fn is_enabled_for(&self, level: LogLevel) -> bool {
        self.levels.contains(level)
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }
}

impl fmt::Debug for LoggingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingRule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("pattern", &self.pattern.to_string())
            .field("levels", &self.levels)
            .field("filters", &self.filters.len())
            .field("filter_default", &self.filter_default)
            .field("final_rule", &self.final_rule)
            .field("final_min_level", &self.final_min_level)
            .field(
                "targets",
                &self.targets.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_fast_paths() {
        assert_eq!(NamePattern::parse("*"), NamePattern::All);
        assert_eq!(NamePattern::parse("app"), NamePattern::Equals("app".into()));
        assert_eq!(
            NamePattern::parse("app.*"),
            NamePattern::StartsWith("app.".into())
        );
        assert_eq!(NamePattern::parse("*.db"), NamePattern::EndsWith(".db".into()));
        assert_eq!(NamePattern::parse("*http*"), NamePattern::Contains("http".into()));
        assert!(matches!(NamePattern::parse("a*b*c"), NamePattern::Wildcard(_)));
    }

    #[test]
    fn test_pattern_matching() {
        assert!(NamePattern::parse("app.*").matches("app.http"));
        assert!(!NamePattern::parse("app.*").matches("application"));
        assert!(NamePattern::parse("*.db").matches("orders.db"));
        assert!(NamePattern::parse("a*b*c").matches("axxbyyc"));
        assert!(!NamePattern::parse("a*b*c").matches("axxbyy"));
        assert!(NamePattern::parse("svc?").matches("svc1"));
        assert!(!NamePattern::parse("svc?").matches("svc12"));
        assert!(NamePattern::parse("").matches("anything"));
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        assert!(NamePattern::parse("svc?").matches("svcé"));
        assert!(NamePattern::parse("??.log").matches("日本.log"));
        assert!(!NamePattern::parse("svc?").matches("svcéé"));
        assert!(NamePattern::parse("*ü?").matches("grüß"));
    }

    #[test]
    fn test_new_rule_defaults() {
        let rule = LoggingRule::new("*");
        assert_eq!(rule.levels, LevelSet::all());
        assert_eq!(rule.filter_default, FilterResult::Ignore);
        assert!(!rule.final_rule);
        assert!(rule.targets.is_empty());
    }

    #[test]
    fn test_rule_ids_are_unique() {
        assert_ne!(LoggingRule::new("*").id(), LoggingRule::new("*").id());
    }
}
