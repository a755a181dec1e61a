//! Retry hints from provider response headers.

use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Seconds a provider asked us to wait, from its `Retry-After` header.
///
/// Accepts both delay-seconds and HTTP-date forms. Dates in the past yield
/// zero.
///
/// # Example
///
/// ```
/// use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
/// use storyloom_rate_limit::retry_after_secs;
///
/// let mut headers = HeaderMap::new();
/// headers.insert(RETRY_AFTER, HeaderValue::from_static("12"));
/// assert_eq!(retry_after_secs(&headers), Some(12));
///
/// assert_eq!(retry_after_secs(&HeaderMap::new()), None);
/// ```
pub fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(secs);
    }
    let when = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delta = when.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(delta.num_seconds().max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_http_date_in_past_is_zero() {
        let mut headers = HeaderMap::new();
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_secs(&headers), Some(0));
    }

    #[test]
    fn test_garbage_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(retry_after_secs(&headers), None);
    }
}
