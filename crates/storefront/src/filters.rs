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

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Lowercases a label and capitalizes its first letter ("CASH ON DELIVERY"
/// becomes "Cash on delivery").
///
/// Usage in templates: `{{ order.payment_method|sentence_case }}`
#[askama::filter_fn]
pub fn sentence_case(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let lower = value.to_string().to_lowercase();
    let mut chars = lower.chars();
    Ok(chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    }))
}
