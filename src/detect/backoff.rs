//! Cool-down policy for failed uploads.
//!
//! Failed uploads are never retried: the next sampler tick simply produces a
//! fresher frame. Failures that point at an overloaded or unreachable
//! service additionally keep the upload gate closed for a while.

use std::time::Duration;

use super::client::DetectError;

/// Cool-down after the client gave up waiting (2 seconds).
pub const DEFAULT_TIMEOUT_COOLDOWN: Duration = Duration::from_millis(2000);

/// Cool-down after a 5xx response (1 second).
pub const DEFAULT_SERVER_ERROR_COOLDOWN: Duration = Duration::from_millis(1000);

/// How long the gate stays closed after each kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    pub after_timeout: Duration,
    pub after_server_error: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            after_timeout: DEFAULT_TIMEOUT_COOLDOWN,
            after_server_error: DEFAULT_SERVER_ERROR_COOLDOWN,
        }
    }
}

impl CooldownPolicy {
    /// Cool-down owed for a failed upload, if any.
    ///
    /// Only timeouts and 5xx responses shed load. Payload and format
    /// rejections, other 4xx, and network failures reopen the gate at once.
    pub fn cooldown_for(&self, error: &DetectError) -> Option<Duration> {
        match error {
            DetectError::Timeout(_) => Some(self.after_timeout),
            DetectError::Server { .. } => Some(self.after_server_error),
            _ => None,
        }
    }
}

/// Log a failed upload at the level its category deserves.
pub fn log_failure(error: &DetectError) {
    match error {
        DetectError::Timeout(_) => {
            log::warn!("Detection request timed out - service may be overloaded")
        }
        DetectError::Server { status, .. } => log::warn!("Detection service error ({})", status),
        DetectError::PayloadTooLarge(_) => log::warn!("Frame rejected as too large: {}", error),
        DetectError::BadRequest(_) => log::warn!("Frame rejected as invalid image: {}", error),
        DetectError::Network(_) => log::warn!("Network error: {}", error),
        _ => log::warn!("Detection request failed: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cooldowns() {
        let policy = CooldownPolicy::default();
        assert_eq!(policy.after_timeout, Duration::from_millis(2000));
        assert_eq!(policy.after_server_error, Duration::from_millis(1000));
    }

    #[test]
    fn test_timeout_cools_down() {
        let policy = CooldownPolicy::default();
        let error = DetectError::Timeout(Duration::from_secs(3));
        assert_eq!(policy.cooldown_for(&error), Some(DEFAULT_TIMEOUT_COOLDOWN));
    }

    #[test]
    fn test_server_error_cools_down() {
        let policy = CooldownPolicy::default();
        let error = DetectError::Server {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert_eq!(
            policy.cooldown_for(&error),
            Some(DEFAULT_SERVER_ERROR_COOLDOWN)
        );
    }

    #[test]
    fn test_client_errors_do_not_cool_down() {
        let policy = CooldownPolicy::default();
        assert_eq!(
            policy.cooldown_for(&DetectError::PayloadTooLarge("2MB".to_string())),
            None
        );
        assert_eq!(
            policy.cooldown_for(&DetectError::BadRequest("not an image".to_string())),
            None
        );
        assert_eq!(
            policy.cooldown_for(&DetectError::Rejected {
                status: 404,
                message: String::new()
            }),
            None
        );
    }

    #[test]
    fn test_custom_policy() {
        let policy = CooldownPolicy {
            after_timeout: Duration::from_millis(50),
            after_server_error: Duration::ZERO,
        };
        assert_eq!(
            policy.cooldown_for(&DetectError::Timeout(Duration::from_millis(10))),
            Some(Duration::from_millis(50))
        );
    }
}
