use std::collections::HashMap;

use crate::domain::market::Market;

/// Immutable market snapshot, keyed by both venue id and canonical symbol.
///
/// Built once per refresh; adapters hold it behind an `Arc` and replace the
/// whole snapshot on reload, so concurrent readers never observe a partial
/// catalog.
#[derive(Debug, Default)]
pub struct MarketCatalog {
    markets: Vec<Market>,
    by_id: HashMap<String, usize>,
    by_symbol: HashMap<String, usize>,
}

impl MarketCatalog {
    pub fn new(markets: Vec<Market>) -> Self {
        let mut by_id = HashMap::with_capacity(markets.len());
        let mut by_symbol = HashMap::with_capacity(markets.len());
        for (index, market) in markets.iter().enumerate() {
            by_id.insert(market.id.clone(), index);
            by_symbol.insert(market.symbol.clone(), index);
        }
        Self {
            markets,
            by_id,
            by_symbol,
        }
    }

    pub fn by_id(&self, id: &str) -> Option<&Market> {
        self.by_id.get(id).map(|&index| &self.markets[index])
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&Market> {
        self.by_symbol.get(symbol).map(|&index| &self.markets[index])
    }

    /// Resolve a caller-supplied identifier: canonical symbol first, venue id
    /// as a fallback.
    pub fn resolve(&self, symbol_or_id: &str) -> Option<&Market> {
        self.by_symbol(symbol_or_id)
            .or_else(|| self.by_id(symbol_or_id))
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.markets.iter().map(|market| market.symbol.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{MarketLimits, MarketType};
    use serde_json::json;

    fn market(id: &str, symbol: &str, base: &str, quote: &str) -> Market {
        Market {
            id: id.to_owned(),
            symbol: symbol.to_owned(),
            base: base.to_owned(),
            quote: quote.to_owned(),
            market_type: MarketType::Spot,
            active: true,
            price_precision: 2,
            amount_precision: 6,
            limits: MarketLimits::default(),
            maker: 0.001,
            taker: 0.001,
            raw: json!({}),
        }
    }

    #[test]
    fn looks_up_by_id_and_symbol() {
        let catalog = MarketCatalog::new(vec![
            market("BTCUSDT", "BTC/USDT", "BTC", "USDT"),
            market("ETHUSDT", "ETH/USDT", "ETH", "USDT"),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.by_id("BTCUSDT").map(|m| m.symbol.as_str()),
            Some("BTC/USDT")
        );
        assert_eq!(
            catalog.by_symbol("ETH/USDT").map(|m| m.id.as_str()),
            Some("ETHUSDT")
        );
        assert!(catalog.by_id("BTC/USDT").is_none());
    }

    #[test]
    fn resolve_prefers_symbol_then_falls_back_to_id() {
        let catalog = MarketCatalog::new(vec![market("BTCUSDT", "BTC/USDT", "BTC", "USDT")]);
        assert!(catalog.resolve("BTC/USDT").is_some());
        assert!(catalog.resolve("BTCUSDT").is_some());
        assert!(catalog.resolve("DOGE/USDT").is_none());
    }
}
