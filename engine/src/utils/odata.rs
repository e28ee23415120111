//! OData literal helpers
//!
//! Every function returns `None` when the raw text is not a valid literal of
//! the requested kind, so callers can drop the condition instead of emitting
//! an invalid `$filter`.

use chrono::{DateTime, NaiveDate};
use uuid::Uuid;

/// Quote a string literal, doubling embedded single quotes.
///
/// ```
/// use querydeck_engine::utils::odata::quote_string;
///
/// assert_eq!(quote_string("O'Brien"), "'O''Brien'");
/// ```
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Numeric literal: `-?digits(.digits)?`, emitted as typed (trimmed).
///
/// A leading `+`, a bare `.5` or a trailing `5.` is not a valid OData number.
pub fn number_literal(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());

    if !digits(whole) || fraction.is_some_and(|f| !digits(f)) {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(trimmed.to_string()),
        _ => None,
    }
}

/// Property path: `/`-separated segments of `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Attribute and column names are emitted unquoted, so anything else is
/// rejected before it reaches a query.
pub fn is_property_path(name: &str) -> bool {
    name.split('/').all(|segment| {
        let mut chars = segment.chars();
        chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Boolean literal: `true`/`false` (case-insensitive), also `1`/`0`.
pub fn boolean_literal(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some("true"),
        "false" | "0" => Some("false"),
        _ => None,
    }
}

/// Date/time literal: RFC 3339 timestamp or `YYYY-MM-DD` date, unquoted.
pub fn datetime_literal(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if DateTime::parse_from_rfc3339(trimmed).is_ok()
        || NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok()
    {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// GUID literal: hyphenated lowercase form, unquoted. Braces are accepted.
pub fn guid_literal(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_start_matches('{').trim_end_matches('}');
    Uuid::parse_str(trimmed)
        .ok()
        .map(|id| id.hyphenated().to_string())
}

/// Navigation value property for a lookup attribute (`_name_value`).
pub fn lookup_value_property(attribute: &str) -> String {
    if attribute.starts_with('_') && attribute.ends_with("_value") {
        attribute.to_string()
    } else {
        format!("_{}_value", attribute)
    }
}
