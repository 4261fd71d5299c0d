//! Pre-trade fee estimation from static per-market rates.

use crate::domain::market::Market;
use crate::domain::models::{Fee, FeeRole};
use crate::domain::order::OrderSide;
use crate::num::round_to_precision;

/// Estimate the fee for a prospective trade.
///
/// A sell earns quote currency, so its fee is quoted in the quote currency
/// and rounded to the market's price precision. A buy earns base currency,
/// so its fee is quoted in base and rounded to the amount precision. Rates
/// come from the market's static maker/taker schedule; this is a pre-trade
/// estimate, never a post-trade reconciliation.
pub fn calculate_fee(
    market: &Market,
    side: OrderSide,
    amount: f64,
    price: f64,
    role: FeeRole,
) -> Fee {
    let rate = match role {
        FeeRole::Maker => market.maker,
        FeeRole::Taker => market.taker,
    };

    let (currency, cost) = match side {
        OrderSide::Sell => (
            market.quote.clone(),
            round_to_precision(amount * rate * price, market.price_precision),
        ),
        OrderSide::Buy => (
            market.base.clone(),
            round_to_precision(amount * rate, market.amount_precision),
        ),
    };

    Fee {
        role: Some(role),
        currency: Some(currency),
        rate: Some(rate),
        cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{MarketLimits, MarketType};
    use serde_json::json;

    fn market() -> Market {
        Market {
            id: String::from("BTCUSDT"),
            symbol: String::from("BTC/USDT"),
            base: String::from("BTC"),
            quote: String::from("USDT"),
            market_type: MarketType::Spot,
            active: true,
            price_precision: 2,
            amount_precision: 6,
            limits: MarketLimits::default(),
            maker: 0.001,
            taker: 0.002,
            raw: json!({}),
        }
    }

    #[test]
    fn sell_fee_is_quoted_in_quote_currency() {
        let fee = calculate_fee(&market(), OrderSide::Sell, 0.5, 30_000.0, FeeRole::Taker);
        assert_eq!(fee.currency.as_deref(), Some("USDT"));
        assert_eq!(fee.rate, Some(0.002));
        // 0.5 * 0.002 * 30000 = 30.0, rounded to price precision 2
        assert_eq!(fee.cost, 30.0);
    }

    #[test]
    fn buy_fee_is_quoted_in_base_currency() {
        let fee = calculate_fee(&market(), OrderSide::Buy, 0.5, 30_000.0, FeeRole::Maker);
        assert_eq!(fee.currency.as_deref(), Some("BTC"));
        assert_eq!(fee.rate, Some(0.001));
        // 0.5 * 0.001 = 0.0005, rounded to amount precision 6
        assert_eq!(fee.cost, 0.0005);
    }

    #[test]
    fn fee_cost_rounds_to_market_precision() {
        let fee = calculate_fee(&market(), OrderSide::Sell, 0.333, 10_001.01, FeeRole::Taker);
        // raw cost 6.66067266.. rounds to 2 decimals
        assert_eq!(fee.cost, 6.66);
    }
}
