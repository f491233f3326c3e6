//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Date part of a backend timestamp (`2025-03-01T12:00:00Z` → `2025-03-01`).
///
/// Usage in templates: `{{ order.created_at|date_only }}`
#[askama::filter_fn]
pub fn date_only(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    Ok(text
        .split(['T', ' '])
        .next()
        .unwrap_or_default()
        .to_string())
}
