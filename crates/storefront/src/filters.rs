//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Public URL of an item image stored under the upload directory.
///
/// Usage in templates: `{{ item.filename|image_url }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn image_url(filename: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("/static/images/{filename}"))
}
