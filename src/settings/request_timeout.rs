use crate::error::{Error, Result};
use std::time::Duration;

pub const MIN_TIMEOUT_SECS: u64 = 5;
pub const MAX_TIMEOUT_SECS: u64 = 3600;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default per-request timeout handed to the HTTP transport.
pub fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
}

/// Parses a timeout in whole seconds, clamped to [MIN, MAX].
pub fn parse_request_timeout(raw: &str) -> Result<Duration> {
    let parsed = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| Error::validation(format!("invalid request timeout value {raw:?}: {e}")))?;
    Ok(Duration::from_secs(
        parsed.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_clamps() {
        assert_eq!(parse_request_timeout("60").unwrap(), Duration::from_secs(60));
        assert_eq!(
            parse_request_timeout(" 1 ").unwrap(),
            Duration::from_secs(MIN_TIMEOUT_SECS)
        );
        assert_eq!(
            parse_request_timeout("999999").unwrap(),
            Duration::from_secs(MAX_TIMEOUT_SECS)
        );
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_request_timeout("soon").unwrap_err();
        assert_eq!(err.code_str(), "invalid_input");
    }
}
