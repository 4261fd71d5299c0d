use std::fmt::{Display, Formatter};

use thiserror::Error;

/// Local argument-validation errors raised before any network call.
///
/// Callers should not retry these; the request never left the process.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("symbol is required for this operation")]
    MissingSymbol,
    #[error("price is required for {order_type} orders")]
    MissingPrice { order_type: String },
    #[error("unknown market symbol '{symbol}'")]
    UnknownMarket { symbol: String },
    #[error("invalid timeframe '{value}'")]
    InvalidTimeframe { value: String },
    #[error("api key and secret are required for private endpoints")]
    MissingCredentials,
    #[error("amount must be positive, got {value}")]
    NonPositiveAmount { value: f64 },
}

/// Error taxonomy shared by every venue adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing credentials, invalid signature.
    Authentication,
    /// Request timestamp rejected (outside the receive window).
    InvalidNonce,
    /// Order parameters rejected by the venue's filters.
    InvalidOrder,
    /// Balance too low for the requested action.
    InsufficientFunds,
    /// Referenced order id does not exist on the venue.
    OrderNotFound,
    /// Venue down or unreachable; retryable.
    Unavailable,
    /// HTTP 418/429 or an explicit rate-limit rejection; retryable.
    RateLimited,
    /// Generic venue-reported failure.
    Exchange,
    /// Local argument validation failed before any network call.
    Argument,
    /// Response payload was missing a required field or malformed.
    Data,
}

/// Structured adapter error carrying the taxonomy kind plus the originating
/// operation and, where available, the raw venue payload for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeError {
    kind: ErrorKind,
    message: String,
    retryable: bool,
    operation: Option<String>,
    payload: Option<String>,
}

impl ExchangeError {
    fn new(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            operation: None,
            payload: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message, false)
    }

    pub fn invalid_nonce(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidNonce, message, false)
    }

    pub fn invalid_order(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOrder, message, false)
    }

    pub fn insufficient_funds(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientFunds, message, false)
    }

    pub fn order_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OrderNotFound, message, false)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message, true)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message, true)
    }

    pub fn exchange(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Exchange, message, false)
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Argument, message, false)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Data, message, false)
    }

    /// Attach the operation (and symbol/order id) that raised this error.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Attach the raw venue response body for diagnostics.
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ErrorKind::Authentication => "exchange.authentication",
            ErrorKind::InvalidNonce => "exchange.invalid_nonce",
            ErrorKind::InvalidOrder => "exchange.invalid_order",
            ErrorKind::InsufficientFunds => "exchange.insufficient_funds",
            ErrorKind::OrderNotFound => "exchange.order_not_found",
            ErrorKind::Unavailable => "exchange.unavailable",
            ErrorKind::RateLimited => "exchange.rate_limited",
            ErrorKind::Exchange => "exchange.error",
            ErrorKind::Argument => "exchange.argument",
            ErrorKind::Data => "exchange.data",
        }
    }
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.operation {
            Some(operation) => write!(f, "{}: {} ({})", operation, self.message, self.code()),
            None => write!(f, "{} ({})", self.message, self.code()),
        }
    }
}

impl std::error::Error for ExchangeError {}

impl From<ValidationError> for ExchangeError {
    fn from(error: ValidationError) -> Self {
        Self::argument(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_kinds_are_marked() {
        assert!(ExchangeError::rate_limited("slow down").retryable());
        assert!(ExchangeError::unavailable("maintenance").retryable());
        assert!(!ExchangeError::invalid_order("bad qty").retryable());
        assert!(!ExchangeError::authentication("bad key").retryable());
    }

    #[test]
    fn display_includes_operation_context() {
        let error = ExchangeError::order_not_found("no such order")
            .with_operation("cancel_order BTC/USDT #42");
        let rendered = error.to_string();
        assert!(rendered.contains("cancel_order BTC/USDT #42"));
        assert!(rendered.contains("exchange.order_not_found"));
    }

    #[test]
    fn validation_errors_map_to_argument_kind() {
        let error = ExchangeError::from(ValidationError::MissingSymbol);
        assert_eq!(error.kind(), ErrorKind::Argument);
        assert!(!error.retryable());
    }
}
