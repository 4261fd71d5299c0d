use serde::{Deserialize, Serialize};

use crate::domain::models::{Fee, Trade};

/// Canonical order status.
///
/// The venue's raw values map through a closed table; anything outside it
/// passes through as `Other` so newly introduced venue statuses degrade
/// gracefully instead of crashing normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
    Canceling,
    Rejected,
    Expired,
    #[serde(untagged)]
    Other(String),
}

impl OrderStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "NEW" | "PARTIALLY_FILLED" => Self::Open,
            "FILLED" => Self::Closed,
            "CANCELED" => Self::Canceled,
            "PENDING_CANCEL" => Self::Canceling,
            "REJECTED" => Self::Rejected,
            "EXPIRED" => Self::Expired,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Canceled => "canceled",
            Self::Canceling => "canceling",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
            Self::Other(value) => value,
        }
    }

    /// Closed, canceled, rejected, and expired orders never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Closed | Self::Canceled | Self::Rejected | Self::Expired
        )
    }
}

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Venue request parameter form.
    pub const fn as_venue_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Order type. Unknown venue types pass through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Limit,
    Market,
    #[serde(untagged)]
    Other(String),
}

impl OrderType {
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "LIMIT" => Self::Limit,
            "MARKET" => Self::Market,
            _ => Self::Other(raw.to_ascii_lowercase()),
        }
    }

    pub fn as_venue_str(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
            Self::Other(value) => value,
        }
    }
}

/// Time-in-force accepted by the venue for limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    #[serde(rename = "GTC")]
    Gtc,
    #[serde(rename = "IOC")]
    Ioc,
    #[serde(rename = "FOK")]
    Fok,
}

impl TimeInForce {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gtc => "GTC",
            Self::Ioc => "IOC",
            Self::Fok => "FOK",
        }
    }

    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "GTC" => Some(Self::Gtc),
            "IOC" => Some(Self::Ioc),
            "FOK" => Some(Self::Fok),
            _ => None,
        }
    }
}

/// Canonical order snapshot.
///
/// Orders move through states on the venue, but each fetch yields an
/// independent snapshot; no long-lived mutable order object exists here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub client_order_id: Option<String>,
    pub timestamp: Option<i64>,
    pub symbol: String,
    pub order_type: OrderType,
    pub side: OrderSide,
    pub time_in_force: Option<TimeInForce>,
    pub price: Option<f64>,
    pub amount: f64,
    pub filled: f64,
    /// `max(amount - filled, 0)`; never negative even on inconsistent data.
    pub remaining: f64,
    /// Cumulative quote-currency cost; equals the fill sum when fills exist.
    pub cost: f64,
    /// `cost / filled` when filled is nonzero.
    pub average: Option<f64>,
    pub status: OrderStatus,
    pub fee: Option<Fee>,
    pub trades: Vec<Trade>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_is_total_and_stable() {
        let cases = [
            ("NEW", OrderStatus::Open),
            ("PARTIALLY_FILLED", OrderStatus::Open),
            ("FILLED", OrderStatus::Closed),
            ("CANCELED", OrderStatus::Canceled),
            ("PENDING_CANCEL", OrderStatus::Canceling),
            ("REJECTED", OrderStatus::Rejected),
            ("EXPIRED", OrderStatus::Expired),
        ];
        for (raw, expected) in cases {
            assert_eq!(OrderStatus::from_raw(raw), expected, "raw status {raw}");
        }
    }

    #[test]
    fn unrecognized_status_passes_through_unchanged() {
        let status = OrderStatus::from_raw("EXPIRED_IN_MATCH");
        assert_eq!(status, OrderStatus::Other(String::from("EXPIRED_IN_MATCH")));
        assert_eq!(status.as_str(), "EXPIRED_IN_MATCH");
        assert!(!status.is_terminal());
    }

    #[test]
    fn terminal_statuses_are_flagged() {
        assert!(OrderStatus::Closed.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(!OrderStatus::Open.is_terminal());
        assert!(!OrderStatus::Canceling.is_terminal());
    }
}
