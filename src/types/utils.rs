//! Shared helpers for enum serialization and tolerant row decoding.

use crate::types::{CommitStatus, EventLevel, PlanStatus, PlanStrategy};
use serde::Serialize;
use std::fmt::Display;

// =============================================================================
// Type Parsing
// =============================================================================

/// Trait for parsing strings into enum types with a default fallback.
/// Used for deserializing database values where invalid strings should fall back gracefully.
/// Logs a warning when an invalid value is encountered.
pub trait ParseWithDefault: Sized {
    /// The name of this type for logging purposes.
    fn type_name() -> &'static str;

    /// The default value to use when parsing fails.
    fn default_value() -> Self;

    /// Try to parse the string, returning None if invalid.
    fn try_parse(s: &str) -> Option<Self>;

    /// Parse a string into this type, returning a default value if parsing fails.
    fn parse_or_default(s: &str) -> Self {
        match Self::try_parse(s) {
            Some(v) => v,
            None => {
                tracing::warn!("Invalid {} value '{}', using default", Self::type_name(), s);
                Self::default_value()
            }
        }
    }
}

impl ParseWithDefault for CommitStatus {
    fn type_name() -> &'static str {
        "CommitStatus"
    }

    // Unknown rows are treated as unfinished so they get picked up again.
    fn default_value() -> Self {
        CommitStatus::Pending
    }

    fn try_parse(s: &str) -> Option<Self> {
        CommitStatus::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

impl ParseWithDefault for PlanStatus {
    fn type_name() -> &'static str {
        "PlanStatus"
    }

    fn default_value() -> Self {
        PlanStatus::Planned
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(PlanStatus::Planned),
            "applied" => Some(PlanStatus::Applied),
            "failed" => Some(PlanStatus::Failed),
            "unchanged" => Some(PlanStatus::Unchanged),
            _ => None,
        }
    }
}

impl ParseWithDefault for PlanStrategy {
    fn type_name() -> &'static str {
        "PlanStrategy"
    }

    fn default_value() -> Self {
        PlanStrategy::Inferred
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s {
            "mapping" => Some(PlanStrategy::Mapping),
            "comment" => Some(PlanStrategy::Comment),
            "inferred" => Some(PlanStrategy::Inferred),
            _ => None,
        }
    }
}

impl ParseWithDefault for EventLevel {
    fn type_name() -> &'static str {
        "EventLevel"
    }

    fn default_value() -> Self {
        EventLevel::Info
    }

    fn try_parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(EventLevel::Info),
            "warn" => Some(EventLevel::Warn),
            "error" => Some(EventLevel::Error),
            _ => None,
        }
    }
}

/// Serialize an enum to its serde string representation (without quotes).
pub fn enum_to_str<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}

/// Filter an iterator of Results, logging discarded errors at warn level.
pub fn log_filter_warn<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}
