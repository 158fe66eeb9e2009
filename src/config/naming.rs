//! Target name generation

use crate::targets::{Target, TargetRef};

/// Strip well-known type suffixes from a target type name.
///
/// `"AsyncWrapper"` → `"Async"`, `"FallbackGroup"` → `"Fallback"`,
/// `"ConsoleTarget"` → `"Console"`. Empty results become `"Unknown"`.
pub fn short_display_name(type_name: &str) -> String {
    let mut name = type_name.trim();
    for suffix in ["TargetWrapper", "Wrapper", "GroupTarget", "Group", "Target"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped;
        }
    }
    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name.to_string()
    }
}

/// Name for `target` that no other registered target uses.
///
/// Starts from the target's own name, or its kind's short name when unnamed,
/// appends `_suffix` when given, then `_1`, `_2`, … until free. `target`
/// itself being registered under the candidate does not count as a clash.
pub fn ensure_unique_name<'a, I>(existing: I, target: &Target, suffix: Option<&str>) -> String
where
    I: IntoIterator<Item = &'a TargetRef>,
    I::IntoIter: Clone,
{
    let existing = existing.into_iter();
    let mut base = match target.name() {
        Some(name) if !name.is_empty() => name,
        _ => target.kind().display_name(),
    };
    if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
        base = format!("{}_{}", base, suffix);
    }

    let is_free = |candidate: &str| {
        existing.clone().all(|other| {
            std::ptr::eq(other.as_ref(), target) || other.name().as_deref() != Some(candidate)
        })
    };

    let mut candidate = base.clone();
    let mut index = 0u32;
    while !is_free(&candidate) {
        index += 1;
        candidate = format!("{}_{}", base, index);
    }
    candidate
}
