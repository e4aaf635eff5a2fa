//! Retry policy for upstream requests.

use std::time::Duration;

use rand::Rng;
use reqwest::{Response, StatusCode};

/// Attempts per request, including the first.
pub const MAX_ATTEMPTS: u32 = 5;

const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Whether a response status warrants another attempt.
pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

/// Exponential backoff with jitter: `min(60s, 1s * 2^attempt + [0, 1s))`.
pub fn backoff_delay(attempt: u32) -> Duration {
    let base = BASE_DELAY
        .checked_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
        .unwrap_or(MAX_DELAY);
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..1000));
    (base + jitter).min(MAX_DELAY)
}

/// The server-directed delay, when the response carries `Retry-After`.
/// Takes precedence over the backoff formula, capped at the same maximum.
pub fn retry_after(response: &Response) -> Option<Duration> {
    let seconds = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()?;
    if seconds < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(seconds).min(MAX_DELAY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable(StatusCode::REQUEST_TIMEOUT));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn backoff_grows_and_caps() {
        for attempt in 0..8 {
            let delay = backoff_delay(attempt);
            let floor = Duration::from_secs(1 << attempt.min(6));
            assert!(delay <= MAX_DELAY);
            if floor < MAX_DELAY {
                assert!(delay >= floor, "attempt {attempt}: {delay:?} < {floor:?}");
            }
        }
        assert_eq!(backoff_delay(30), MAX_DELAY);
    }
}
