use crate::domain::order::TimeInForce;
use crate::error::ValidationError;

/// Adapter configuration.
///
/// Credentials are optional; public endpoints work without them and private
/// endpoints fail locally with an argument error before any network call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    pub api_key: Option<String>,
    pub secret: Option<String>,
    /// Applied to limit orders when the caller does not override it.
    pub default_time_in_force: TimeInForce,
    /// Maximum tolerated timestamp staleness accepted by the venue.
    pub recv_window_ms: u64,
    /// When enabled, signed-request timestamps subtract a cached clock-skew
    /// offset measured once against the venue server time.
    pub adjust_for_clock_skew: bool,
    /// Fetching open orders without a symbol is expensive on most venues.
    pub warn_on_open_orders_without_symbol: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            secret: None,
            default_time_in_force: TimeInForce::Gtc,
            recv_window_ms: 5_000,
            adjust_for_clock_skew: false,
            warn_on_open_orders_without_symbol: true,
        }
    }
}

impl ExchangeConfig {
    pub fn with_credentials(mut self, api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self.secret = Some(secret.into());
        self
    }

    pub fn with_default_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.default_time_in_force = time_in_force;
        self
    }

    pub fn with_recv_window_ms(mut self, recv_window_ms: u64) -> Self {
        self.recv_window_ms = recv_window_ms;
        self
    }

    pub fn with_clock_skew_adjustment(mut self, enabled: bool) -> Self {
        self.adjust_for_clock_skew = enabled;
        self
    }

    pub fn with_open_orders_warning(mut self, enabled: bool) -> Self {
        self.warn_on_open_orders_without_symbol = enabled;
        self
    }

    /// Both halves of the credential pair, or a local validation error.
    pub fn credentials(&self) -> Result<(&str, &str), ValidationError> {
        match (self.api_key.as_deref(), self.secret.as_deref()) {
            (Some(api_key), Some(secret)) if !api_key.is_empty() && !secret.is_empty() => {
                Ok((api_key, secret))
            }
            _ => Err(ValidationError::MissingCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_venue_expectations() {
        let config = ExchangeConfig::default();
        assert_eq!(config.default_time_in_force, TimeInForce::Gtc);
        assert_eq!(config.recv_window_ms, 5_000);
        assert!(!config.adjust_for_clock_skew);
        assert!(config.warn_on_open_orders_without_symbol);
    }

    #[test]
    fn missing_credentials_fail_locally() {
        let config = ExchangeConfig::default();
        assert!(matches!(
            config.credentials(),
            Err(ValidationError::MissingCredentials)
        ));

        let configured = ExchangeConfig::default().with_credentials("key", "secret");
        let (api_key, secret) = configured.credentials().expect("credentials present");
        assert_eq!(api_key, "key");
        assert_eq!(secret, "secret");
    }
}
