//! Venue error classification.
//!
//! Turns HTTP status, raw body, and the venue's `{code, msg}` envelope into
//! the shared [`ExchangeError`] taxonomy. Classification runs once per
//! response, before any normalizer sees the payload.

use serde::Deserialize;

use crate::error::ExchangeError;

/// Body substrings that identify order-filter violations regardless of the
/// exact status code, as long as the request failed.
const INVALID_ORDER_MARKERS: [&str; 3] = [
    "Price * QTY is zero or less",
    "LOT_SIZE",
    "PRICE_FILTER",
];

#[derive(Debug, Deserialize)]
struct RawErrorEnvelope {
    code: Option<i64>,
    msg: Option<String>,
    success: Option<bool>,
}

/// Classify a venue response.
///
/// Returns `None` for responses that should pass through to normalization.
/// Precedence: rate-limit statuses, then known body substrings, then the
/// structured envelope (including one level of nested JSON-encoded error),
/// then a status-based fallback for unmatched failures.
pub(crate) fn classify_response(status: u16, body: &str) -> Option<ExchangeError> {
    // 418 is the venue's IP-ban teapot; both are retryable after backoff,
    // whatever the body says.
    if status == 418 || status == 429 {
        return Some(
            ExchangeError::rate_limited(format!("venue rate limit hit (HTTP {status})"))
                .with_payload(body),
        );
    }

    // Substring markers only apply to failed requests; a healthy instrument
    // listing legitimately contains "LOT_SIZE".
    if status >= 400 {
        for marker in INVALID_ORDER_MARKERS {
            if body.contains(marker) {
                return Some(
                    ExchangeError::invalid_order(format!("order violates venue filter: {marker}"))
                        .with_payload(body),
                );
            }
        }
    }

    let envelope = match serde_json::from_str::<RawErrorEnvelope>(body) {
        Ok(envelope) => envelope,
        Err(_) => return fallback_for_status(status, body),
    };

    // Some venue gateways wrap the real error as a JSON string inside `msg`
    // of a success:false envelope. Unwrap one level and retry the tables; on
    // parse failure fall through with the original message.
    if envelope.success == Some(false) {
        if let Some(nested) = envelope
            .msg
            .as_deref()
            .and_then(|msg| serde_json::from_str::<RawErrorEnvelope>(msg).ok())
        {
            if let Some(error) = classify_envelope(&nested, body) {
                return Some(error);
            }
        }
    }

    if let Some(error) = classify_envelope(&envelope, body) {
        return Some(error);
    }

    if envelope.success == Some(false) {
        return Some(
            ExchangeError::exchange("venue reported failure without a recognized message")
                .with_payload(body),
        );
    }

    fallback_for_status(status, body)
}

fn classify_envelope(envelope: &RawErrorEnvelope, body: &str) -> Option<ExchangeError> {
    if let Some(error) = envelope.msg.as_deref().and_then(classify_message) {
        return Some(error.with_payload(body));
    }
    if let Some(error) = envelope.code.and_then(classify_code) {
        let error = match &envelope.msg {
            Some(msg) if !msg.is_empty() => {
                rebuild_with_message(error, msg)
            }
            _ => error,
        };
        return Some(error.with_payload(body));
    }
    None
}

/// Exact-match table over venue message strings.
fn classify_message(message: &str) -> Option<ExchangeError> {
    let error = match message {
        "Account has insufficient balance for requested action." => {
            ExchangeError::insufficient_funds(message)
        }
        "Order would trigger immediately." => ExchangeError::invalid_order(message),
        "Stop price would trigger immediately." => ExchangeError::invalid_order(message),
        "Unknown order sent." | "Order does not exist." => ExchangeError::order_not_found(message),
        "API-key format invalid." => ExchangeError::authentication(message),
        "Signature for this request is not valid." => ExchangeError::authentication(message),
        "Invalid API-key, IP, or permissions for action." => {
            ExchangeError::authentication(message)
        }
        "Timestamp for this request is outside of the recvWindow." => {
            ExchangeError::invalid_nonce(message)
        }
        "Timestamp for this request was 1000ms ahead of the server's time." => {
            ExchangeError::invalid_nonce(message)
        }
        "Rest API trading is not enabled." | "Market is closed." => {
            ExchangeError::unavailable(message)
        }
        "Too many requests." | "Way too many requests; IP banned until further notice." => {
            ExchangeError::rate_limited(message)
        }
        _ => return None,
    };
    Some(error)
}

/// Exact-match table over venue numeric error codes.
fn classify_code(code: i64) -> Option<ExchangeError> {
    let message = format!("venue error code {code}");
    let error = match code {
        -1000 | -1001 => ExchangeError::unavailable(message),
        -1003 => ExchangeError::rate_limited(message),
        -1013 | -1100 | -2010 => ExchangeError::invalid_order(message),
        -1021 => ExchangeError::invalid_nonce(message),
        -1022 | -2014 | -2015 => ExchangeError::authentication(message),
        -2011 | -2013 => ExchangeError::order_not_found(message),
        _ => return None,
    };
    Some(error)
}

fn rebuild_with_message(error: ExchangeError, message: &str) -> ExchangeError {
    use crate::error::ErrorKind;
    match error.kind() {
        ErrorKind::Authentication => ExchangeError::authentication(message),
        ErrorKind::InvalidNonce => ExchangeError::invalid_nonce(message),
        ErrorKind::InvalidOrder => ExchangeError::invalid_order(message),
        ErrorKind::InsufficientFunds => ExchangeError::insufficient_funds(message),
        ErrorKind::OrderNotFound => ExchangeError::order_not_found(message),
        ErrorKind::Unavailable => ExchangeError::unavailable(message),
        ErrorKind::RateLimited => ExchangeError::rate_limited(message),
        _ => error,
    }
}

fn fallback_for_status(status: u16, body: &str) -> Option<ExchangeError> {
    match status {
        200..=299 => None,
        401 | 403 => Some(
            ExchangeError::authentication(format!("venue rejected credentials (HTTP {status})"))
                .with_payload(body),
        ),
        500..=599 => Some(
            ExchangeError::unavailable(format!("venue returned HTTP {status}")).with_payload(body),
        ),
        _ => Some(
            ExchangeError::exchange(format!("venue returned HTTP {status}")).with_payload(body),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn http_429_is_rate_limited_regardless_of_body() {
        let error = classify_response(429, "{\"ok\":true}").expect("must classify");
        assert_eq!(error.kind(), ErrorKind::RateLimited);
        assert!(error.retryable());

        let teapot = classify_response(418, "").expect("must classify");
        assert_eq!(teapot.kind(), ErrorKind::RateLimited);
    }

    #[test]
    fn filter_violation_substrings_win_over_structured_body() {
        let body = "{\"code\":-1010,\"msg\":\"Filter failure: PRICE_FILTER\"}";
        let error = classify_response(400, body).expect("must classify");
        assert_eq!(error.kind(), ErrorKind::InvalidOrder);

        let zero_cost = classify_response(500, "Price * QTY is zero or less").expect("classify");
        assert_eq!(zero_cost.kind(), ErrorKind::InvalidOrder);
    }

    #[test]
    fn lot_size_in_healthy_listing_is_not_an_error() {
        let body = "{\"symbols\":[{\"filters\":[{\"filterType\":\"LOT_SIZE\"}]}]}";
        assert!(classify_response(200, body).is_none());
    }

    #[test]
    fn known_codes_map_to_taxonomy() {
        let cases = [
            (-1021, ErrorKind::InvalidNonce),
            (-1022, ErrorKind::Authentication),
            (-2010, ErrorKind::InvalidOrder),
            (-2013, ErrorKind::OrderNotFound),
            (-1003, ErrorKind::RateLimited),
            (-1000, ErrorKind::Unavailable),
        ];
        for (code, kind) in cases {
            let body = format!("{{\"code\":{code},\"msg\":\"x\"}}");
            let error = classify_response(400, &body).expect("must classify");
            assert_eq!(error.kind(), kind, "code {code}");
        }
    }

    #[test]
    fn known_messages_map_to_taxonomy() {
        let body = "{\"code\":-2010,\"msg\":\"Account has insufficient balance for requested action.\"}";
        let error = classify_response(400, body).expect("must classify");
        assert_eq!(error.kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn nested_json_encoded_error_is_unwrapped() {
        let body = "{\"success\":false,\"msg\":\"{\\\"code\\\":-2013,\\\"msg\\\":\\\"Order does not exist.\\\"}\"}";
        let error = classify_response(200, body).expect("must classify");
        assert_eq!(error.kind(), ErrorKind::OrderNotFound);
    }

    #[test]
    fn unmatched_success_false_yields_generic_error_with_payload() {
        let body = "{\"success\":false,\"msg\":\"please try again later-ish\"}";
        let error = classify_response(200, body).expect("must classify");
        assert_eq!(error.kind(), ErrorKind::Exchange);
        assert_eq!(error.payload(), Some(body));
    }

    #[test]
    fn unmatched_2xx_passes_through() {
        assert!(classify_response(200, "{\"serverTime\":123}").is_none());
        assert!(classify_response(200, "[]").is_none());
    }

    #[test]
    fn status_fallbacks_apply_when_nothing_matches() {
        assert_eq!(
            classify_response(503, "maintenance").expect("classify").kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            classify_response(401, "denied").expect("classify").kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            classify_response(400, "bad").expect("classify").kind(),
            ErrorKind::Exchange
        );
    }
}
