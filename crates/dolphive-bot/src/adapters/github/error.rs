//! GitHub response classification
//!
//! Maps a failed HTTP response onto the [`StoreError`] taxonomy the retry
//! policy understands.

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;

use dolphive::StoreError;

const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Error body returned by the GitHub REST API
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
}

impl ApiErrorBody {
    pub(crate) fn parse(body: &str) -> String {
        serde_json::from_str::<ApiErrorBody>(body)
            .map(|b| b.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body.trim().to_string())
    }
}

/// Classify a non-success response. `now_epoch` is the current Unix time in
/// seconds, used to turn `x-ratelimit-reset` into a delay.
pub(crate) fn classify(
    status: StatusCode,
    headers: &HeaderMap,
    message: String,
    path: &str,
    now_epoch: i64,
) -> StoreError {
    let secondary = message.to_lowercase().contains("secondary rate limit");
    let code = status.as_u16();

    match code {
        404 => StoreError::NotFound(path.to_string()),
        409 => StoreError::Conflict {
            path: path.to_string(),
            message,
        },
        422 => StoreError::Unprocessable {
            path: path.to_string(),
            message,
        },
        429 => StoreError::RateLimited {
            retry_after: resume_delay(headers, now_epoch),
            secondary,
        },
        403 if secondary => StoreError::RateLimited {
            retry_after: retry_after_header(headers),
            secondary: true,
        },
        403 if header_str(headers, RATE_LIMIT_REMAINING) == Some("0") => StoreError::RateLimited {
            retry_after: resume_delay(headers, now_epoch),
            secondary: false,
        },
        500..=599 => StoreError::Server {
            status: code,
            message,
        },
        _ => StoreError::Api {
            status: code,
            message,
        },
    }
}

/// Classify a transport-level failure
pub(crate) fn transport(err: reqwest::Error) -> StoreError {
    if err.is_decode() {
        StoreError::Decode(err.to_string())
    } else {
        StoreError::Network(err.to_string())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

/// `Retry-After` in seconds, fractions allowed
fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    header_str(headers, RETRY_AFTER.as_str())
        .and_then(|v| v.parse::<f64>().ok())
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// `Retry-After`, else the distance to `x-ratelimit-reset`
fn resume_delay(headers: &HeaderMap, now_epoch: i64) -> Option<Duration> {
    retry_after_header(headers).or_else(|| {
        header_str(headers, RATE_LIMIT_RESET)
            .and_then(|v| v.parse::<i64>().ok())
            .map(|reset| Duration::from_secs((reset - now_epoch).max(0) as u64))
    })
}
