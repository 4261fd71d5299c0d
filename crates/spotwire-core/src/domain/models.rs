use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Trade aggressor direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
    Unknown,
}

impl TradeSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Unknown => "unknown",
        }
    }
}

/// Role of our order in a trade: aggressor (taker) or resting (maker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TakerOrMaker {
    Taker,
    Maker,
    Unknown,
}

/// Fee role used by the pre-trade fee estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeRole {
    Maker,
    Taker,
}

impl FeeRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Maker => "maker",
            Self::Taker => "taker",
        }
    }
}

/// Fee attached to a trade or order, or quoted pre-trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub role: Option<FeeRole>,
    pub currency: Option<String>,
    pub rate: Option<f64>,
    pub cost: f64,
}

/// Point-in-time market snapshot. Ephemeral, never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    /// Venue event time in epoch milliseconds.
    pub timestamp: Option<i64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub bid: Option<f64>,
    pub bid_volume: Option<f64>,
    pub ask: Option<f64>,
    pub ask_volume: Option<f64>,
    pub vwap: Option<f64>,
    pub open: Option<f64>,
    /// Last traded price.
    pub close: Option<f64>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub percentage: Option<f64>,
    /// `(open + close) / 2` when both are present, else `None`.
    pub average: Option<f64>,
    pub base_volume: Option<f64>,
    pub quote_volume: Option<f64>,
}

/// A single executed trade, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Option<String>,
    pub timestamp: Option<i64>,
    pub symbol: String,
    pub order_id: Option<String>,
    pub side: TradeSide,
    pub taker_or_maker: TakerOrMaker,
    pub price: f64,
    pub amount: f64,
    /// `price * amount` in the quote currency.
    pub cost: f64,
    pub fee: Option<Fee>,
}

/// One price level of an order book side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: f64,
    pub amount: f64,
}

/// Order book snapshot in venue ordering (best-first); never re-sorted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    /// Venue last-update id; monotonically increasing, used by callers for
    /// staleness detection.
    pub nonce: u64,
}

/// Positional OHLCV candle: `[timestamp, open, high, low, close, volume]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Per-currency account balance entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub free: f64,
    pub used: f64,
}

impl BalanceEntry {
    pub fn total(self) -> f64 {
        self.free + self.used
    }
}

/// Account balances keyed by normalized currency code.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Balances {
    pub entries: BTreeMap<String, BalanceEntry>,
}

impl Balances {
    pub fn get(&self, currency: &str) -> Option<BalanceEntry> {
        self.entries.get(&currency.to_ascii_uppercase()).copied()
    }
}

/// Venue-wide default maker/taker rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingFees {
    pub maker: f64,
    pub taker: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_lookup_is_case_insensitive() {
        let mut balances = Balances::default();
        balances.entries.insert(
            String::from("BTC"),
            BalanceEntry {
                free: 1.5,
                used: 0.5,
            },
        );

        let entry = balances.get("btc").expect("entry should resolve");
        assert_eq!(entry.total(), 2.0);
        assert!(balances.get("ETH").is_none());
    }
}
