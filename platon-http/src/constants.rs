//! HTTP-specific constants for the Platon gateway.

use std::time::Duration;

pub use platon::query::FORM_CONTENT_TYPE;

/// `User-Agent` sent with every gateway request.
pub const CLIENT_USER_AGENT: &str = concat!("platon-http/", env!("CARGO_PKG_VERSION"));

/// Request timeout applied unless overridden.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!(CLIENT_USER_AGENT.starts_with("platon-http/"));
        assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(30));
        assert_eq!(FORM_CONTENT_TYPE, "application/x-www-form-urlencoded");
    }
}
