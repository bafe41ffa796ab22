pub mod playlists;
pub mod tags;
pub mod users;
pub mod videos;

use crate::error::{ApiError, ApiResult};

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_USERNAME_LENGTH: usize = 50;
pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_VIDEO_TITLE_LENGTH: usize = 200;
pub const MAX_TIKTOK_ID_LENGTH: usize = 100;

/// Trims `value` and rejects it when empty or longer than `max` characters.
fn required(field: &str, value: &str, max: usize) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required.", field)));
    }
    if value.chars().count() > max {
        return Err(ApiError::BadRequest(format!(
            "{} may be at most {} characters.",
            field, max
        )));
    }
    Ok(value.to_string())
}

/// Blank optional text counts as absent.
fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Normalizes a field that an update may clear: blank text clears like `null`.
fn clearable(value: Option<Option<String>>) -> Option<Option<String>> {
    value.map(|v| optional(v.as_deref()))
}

fn username(value: &str) -> ApiResult<String> {
    let value = required("Username", value, MAX_USERNAME_LENGTH)?;
    if value.chars().count() < MIN_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username must be at least {} characters long.",
            MIN_USERNAME_LENGTH
        )));
    }
    Ok(value)
}

/// Checks the address shape and lower-cases the domain part.
fn email(value: &str) -> ApiResult<String> {
    let invalid = || ApiError::BadRequest("You must provide a valid email.".to_string());
    let value = value.trim();
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || value.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(format!("{}@{}", local, domain.to_lowercase()))
}

fn http_url(field: &str, value: &str) -> ApiResult<String> {
    let value = value.trim();
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(value.to_string()),
        _ => Err(ApiError::BadRequest(format!("{} must be a valid URL.", field))),
    }
}

/// Video id from a TikTok link such as `https://www.tiktok.com/@user/video/7234...?lang=en`.
fn tiktok_id_from_url(url: &str) -> Option<String> {
    let (_, tail) = url.split_once("/video/")?;
    let id: String = tail
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    (!id.is_empty()).then_some(id)
}
