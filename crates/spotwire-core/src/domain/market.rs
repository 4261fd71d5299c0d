use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Venue market category.
///
/// Derived from the venue's raw market-type string, lower-cased. `"leverage"`
/// is a legacy alias for margin. Unknown values pass through verbatim so new
/// venue categories degrade gracefully instead of failing catalog builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Spot,
    Margin,
    #[serde(untagged)]
    Other(String),
}

impl MarketType {
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "spot" => Self::Spot,
            "margin" | "leverage" => Self::Margin,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Spot => "spot",
            Self::Margin => "margin",
            Self::Other(value) => value,
        }
    }
}

/// Inclusive bound pair used by market limits. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MinMax {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MinMax {
    pub const fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }
}

/// Order-size constraints for one market.
///
/// `market` is a separate band for market orders, which some venues quantize
/// differently than limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketLimits {
    pub amount: MinMax,
    pub price: MinMax,
    pub cost: MinMax,
    pub market: MinMax,
}

/// Canonical instrument metadata built once per catalog refresh.
///
/// `symbol` is the venue-agnostic `BASE/QUOTE` form; `id` is the venue's own
/// identifier. Precision fields are non-negative decimal digit counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub market_type: MarketType,
    pub active: bool,
    pub price_precision: u32,
    pub amount_precision: u32,
    pub limits: MarketLimits,
    /// Static fee rates used for pre-trade fee estimates.
    pub maker: f64,
    pub taker: f64,
    /// Original venue payload, kept for diagnostics.
    pub raw: Value,
}

/// Canonical `BASE/QUOTE` symbol from normalized currency codes.
pub fn canonical_symbol(base: &str, quote: &str) -> String {
    format!("{base}/{quote}")
}

/// Normalize a venue currency code to its canonical uppercase form.
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
