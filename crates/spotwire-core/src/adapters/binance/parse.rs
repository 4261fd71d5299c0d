//! Raw payload shapes and normalization into the canonical data model.
//!
//! Every venue payload deserializes into a typed raw struct at this boundary;
//! normalizers are pure functions of a raw value plus a read-only catalog
//! reference and never re-validate business-error conditions (classification
//! already ran).

use serde::Deserialize;
use serde_json::Value;

use crate::catalog::MarketCatalog;
use crate::domain::market::{canonical_symbol, normalize_currency, Market, MarketLimits, MarketType, MinMax};
use crate::domain::models::{
    Balances, BalanceEntry, BookLevel, Candle, Fee, OrderBook, TakerOrMaker, Ticker, Trade,
    TradeSide, TradingFees,
};
use crate::domain::order::{Order, OrderSide, OrderStatus, OrderType, TimeInForce};
use crate::error::ExchangeError;
use crate::num::precision_from_string;

/// Default fee rate applied until the account schedule is known.
const DEFAULT_FEE_RATE: f64 = 0.001;

fn parse_f64(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_f64(text),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Instrument listing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSymbol {
    symbol: String,
    status: String,
    base_asset: String,
    #[serde(default)]
    base_asset_precision: Option<u32>,
    quote_asset: String,
    #[serde(default)]
    quote_precision: Option<u32>,
    #[serde(default, rename = "type")]
    market_type: Option<String>,
    #[serde(default)]
    filters: Vec<RawFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
enum RawFilter {
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    Price {
        min_price: String,
        max_price: String,
        tick_size: String,
    },
    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize {
        min_qty: String,
        max_qty: String,
        step_size: String,
    },
    #[serde(rename = "MARKET_LOT_SIZE", rename_all = "camelCase")]
    MarketLotSize {
        min_qty: String,
        max_qty: String,
    },
    #[serde(rename = "MIN_NOTIONAL", rename_all = "camelCase")]
    MinNotional { min_notional: String },
    #[serde(other)]
    Other,
}

/// Build the market list from a raw instrument listing.
///
/// An absent `symbols` field is a data error; an empty list is a valid (if
/// surprising) listing and yields an empty catalog.
pub(crate) fn parse_markets(raw: &Value) -> Result<Vec<Market>, ExchangeError> {
    let listing = raw
        .get("symbols")
        .filter(|value| !value.is_null())
        .ok_or_else(|| {
            ExchangeError::data("instrument listing is missing the 'symbols' field")
        })?;
    let entries = listing.as_array().ok_or_else(|| {
        ExchangeError::data("instrument listing 'symbols' field is not an array")
    })?;

    entries.iter().map(parse_market).collect()
}

fn parse_market(raw: &Value) -> Result<Market, ExchangeError> {
    let entry: RawSymbol = serde_json::from_value(raw.clone())
        .map_err(|error| ExchangeError::data(format!("malformed instrument entry: {error}")))?;

    let base = normalize_currency(&entry.base_asset);
    let quote = normalize_currency(&entry.quote_asset);
    // A venue id that already carries a slash is taken verbatim.
    let symbol = if entry.symbol.contains('/') {
        entry.symbol.clone()
    } else {
        canonical_symbol(&base, &quote)
    };

    let mut amount_precision = entry.base_asset_precision.unwrap_or(8);
    let mut price_precision = entry.quote_precision.unwrap_or(8);

    let mut limits = MarketLimits {
        amount: MinMax::new(Some(10_f64.powi(-(amount_precision as i32))), None),
        // Documented venue quirk: the default cost floor is the negated
        // log10 of the amount digit count, not of a price. Kept verbatim
        // for compatibility with the venue's own behavior.
        cost: MinMax::new(Some(-(amount_precision as f64).log10()), None),
        ..MarketLimits::default()
    };

    for filter in &entry.filters {
        match filter {
            RawFilter::Price {
                min_price,
                max_price,
                tick_size,
            } => {
                limits.price.min = parse_f64(min_price);
                // The venue uses an exact zero to mean "unbounded".
                limits.price.max = parse_f64(max_price).filter(|&max| max != 0.0);
                price_precision = precision_from_string(tick_size);
            }
            RawFilter::LotSize {
                min_qty,
                max_qty,
                step_size,
            } => {
                amount_precision = precision_from_string(step_size);
                limits.amount.min = parse_f64(min_qty);
                limits.amount.max = parse_f64(max_qty);
            }
            RawFilter::MarketLotSize { min_qty, max_qty } => {
                limits.market.min = parse_f64(min_qty);
                limits.market.max = parse_f64(max_qty);
            }
            RawFilter::MinNotional { min_notional } => {
                limits.cost.min = parse_f64(min_notional);
            }
            RawFilter::Other => {}
        }
    }

    Ok(Market {
        id: entry.symbol,
        symbol,
        base,
        quote,
        market_type: MarketType::from_raw(entry.market_type.as_deref().unwrap_or("spot")),
        active: entry.status == "TRADING",
        price_precision,
        amount_precision,
        limits,
        maker: DEFAULT_FEE_RATE,
        taker: DEFAULT_FEE_RATE,
        raw: raw.clone(),
    })
}

// ---------------------------------------------------------------------------
// Symbol resolution
// ---------------------------------------------------------------------------

/// Resolve a venue id against the catalog, degrading gracefully.
///
/// Exact catalog lookup first; ids carrying a slash are split and normalized
/// leg by leg; anything else falls back to the raw id so symbols missing from
/// the current catalog snapshot still normalize.
pub(crate) fn resolve_symbol(id: &str, catalog: &MarketCatalog) -> String {
    if let Some(market) = catalog.by_id(id) {
        return market.symbol.clone();
    }
    if let Some((base, quote)) = id.split_once('/') {
        return canonical_symbol(&normalize_currency(base), &normalize_currency(quote));
    }
    id.to_owned()
}

// ---------------------------------------------------------------------------
// Order book
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrderBook {
    last_update_id: u64,
    #[serde(default)]
    bids: Vec<(String, String)>,
    #[serde(default)]
    asks: Vec<(String, String)>,
}

/// Parse an order book snapshot, trusting venue ordering.
pub(crate) fn parse_order_book(raw: &Value, symbol: &str) -> Result<OrderBook, ExchangeError> {
    let book: RawOrderBook = serde_json::from_value(raw.clone())
        .map_err(|error| ExchangeError::data(format!("malformed order book: {error}")))?;

    let parse_side = |levels: Vec<(String, String)>| {
        levels
            .into_iter()
            .filter_map(|(price, amount)| {
                Some(BookLevel {
                    price: parse_f64(&price)?,
                    amount: parse_f64(&amount)?,
                })
            })
            .collect::<Vec<_>>()
    };

    Ok(OrderBook {
        symbol: symbol.to_owned(),
        bids: parse_side(book.bids),
        asks: parse_side(book.asks),
        nonce: book.last_update_id,
    })
}

// ---------------------------------------------------------------------------
// Ticker
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTicker {
    symbol: String,
    #[serde(default)]
    price_change: Option<String>,
    #[serde(default)]
    price_change_percent: Option<String>,
    #[serde(default)]
    weighted_avg_price: Option<String>,
    #[serde(default)]
    prev_close_price: Option<String>,
    #[serde(default)]
    last_price: Option<String>,
    #[serde(default)]
    bid_price: Option<String>,
    #[serde(default)]
    bid_qty: Option<String>,
    #[serde(default)]
    ask_price: Option<String>,
    #[serde(default)]
    ask_qty: Option<String>,
    #[serde(default)]
    open_price: Option<String>,
    #[serde(default)]
    high_price: Option<String>,
    #[serde(default)]
    low_price: Option<String>,
    #[serde(default)]
    volume: Option<String>,
    #[serde(default)]
    quote_volume: Option<String>,
    #[serde(default)]
    close_time: Option<i64>,
}

pub(crate) fn parse_ticker(raw: &Value, catalog: &MarketCatalog) -> Result<Ticker, ExchangeError> {
    let ticker: RawTicker = serde_json::from_value(raw.clone())
        .map_err(|error| ExchangeError::data(format!("malformed ticker: {error}")))?;

    let open = ticker.open_price.as_deref().and_then(parse_f64);
    let close = ticker.last_price.as_deref().and_then(parse_f64);
    let average = match (open, close) {
        (Some(open), Some(close)) => Some((open + close) / 2.0),
        _ => None,
    };

    Ok(Ticker {
        symbol: resolve_symbol(&ticker.symbol, catalog),
        timestamp: ticker.close_time,
        high: ticker.high_price.as_deref().and_then(parse_f64),
        low: ticker.low_price.as_deref().and_then(parse_f64),
        bid: ticker.bid_price.as_deref().and_then(parse_f64),
        bid_volume: ticker.bid_qty.as_deref().and_then(parse_f64),
        ask: ticker.ask_price.as_deref().and_then(parse_f64),
        ask_volume: ticker.ask_qty.as_deref().and_then(parse_f64),
        vwap: ticker.weighted_avg_price.as_deref().and_then(parse_f64),
        open,
        close,
        previous_close: ticker.prev_close_price.as_deref().and_then(parse_f64),
        change: ticker.price_change.as_deref().and_then(parse_f64),
        percentage: ticker.price_change_percent.as_deref().and_then(parse_f64),
        average,
        base_volume: ticker.volume.as_deref().and_then(parse_f64),
        quote_volume: ticker.quote_volume.as_deref().and_then(parse_f64),
    })
}

// ---------------------------------------------------------------------------
// Candles
// ---------------------------------------------------------------------------

/// Positional extraction of the fixed `[ts, o, h, l, c, v]` prefix.
///
/// The venue appends further columns (close time, trade count, ...) but never
/// reorders the first six, so index-based access is deliberate design.
pub(crate) fn parse_candle(row: &Value) -> Result<Candle, ExchangeError> {
    let columns = row
        .as_array()
        .filter(|columns| columns.len() >= 6)
        .ok_or_else(|| ExchangeError::data("candle row is not a 6-column array"))?;

    let extract = |index: usize| {
        value_to_f64(&columns[index])
            .ok_or_else(|| ExchangeError::data(format!("candle column {index} is not numeric")))
    };

    Ok(Candle {
        timestamp: columns[0]
            .as_i64()
            .ok_or_else(|| ExchangeError::data("candle timestamp is not an integer"))?,
        open: extract(1)?,
        high: extract(2)?,
        low: extract(3)?,
        close: extract(4)?,
        volume: extract(5)?,
    })
}

// ---------------------------------------------------------------------------
// Trades
// ---------------------------------------------------------------------------

/// Side information resolved once at the deserialization boundary.
///
/// The venue reports trade direction through whichever of three optional
/// boolean fields its endpoint carries; variant order encodes the inference
/// priority. The `m`/`isBuyerMaker` flags mark the maker side, so the
/// reported (taker) trade inverts them: a true flag means the aggressor sold
/// into a resting buy. `isBuyer` speaks about our own account directly.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTradeSideInfo {
    Aggressor {
        m: bool,
    },
    BuyerMaker {
        #[serde(rename = "isBuyerMaker")]
        is_buyer_maker: bool,
    },
    Buyer {
        #[serde(rename = "isBuyer")]
        is_buyer: bool,
        #[serde(default, rename = "isMaker")]
        is_maker: Option<bool>,
    },
    Unspecified {},
}

impl RawTradeSideInfo {
    pub(crate) fn side(&self) -> TradeSide {
        match self {
            Self::Aggressor { m } | Self::BuyerMaker { is_buyer_maker: m } => {
                if *m {
                    TradeSide::Sell
                } else {
                    TradeSide::Buy
                }
            }
            Self::Buyer { is_buyer, .. } => {
                if *is_buyer {
                    TradeSide::Buy
                } else {
                    TradeSide::Sell
                }
            }
            Self::Unspecified {} => TradeSide::Unknown,
        }
    }

    fn taker_or_maker(&self) -> TakerOrMaker {
        match self {
            Self::Buyer {
                is_maker: Some(true),
                ..
            } => TakerOrMaker::Maker,
            Self::Buyer {
                is_maker: Some(false),
                ..
            } => TakerOrMaker::Taker,
            _ => TakerOrMaker::Unknown,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTrade {
    #[serde(default, alias = "a")]
    id: Option<u64>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    order_id: Option<u64>,
    #[serde(default, alias = "T")]
    time: Option<i64>,
    #[serde(default, alias = "p")]
    price: Option<String>,
    #[serde(default, alias = "q")]
    qty: Option<String>,
    #[serde(default)]
    commission: Option<String>,
    #[serde(default)]
    commission_asset: Option<String>,
    #[serde(flatten)]
    side_info: RawTradeSideInfo,
}

pub(crate) fn parse_trade(
    raw: &Value,
    fallback_symbol: &str,
    catalog: &MarketCatalog,
) -> Result<Trade, ExchangeError> {
    let trade: RawTrade = serde_json::from_value(raw.clone())
        .map_err(|error| ExchangeError::data(format!("malformed trade: {error}")))?;

    let price = trade
        .price
        .as_deref()
        .and_then(parse_f64)
        .ok_or_else(|| ExchangeError::data("trade is missing a numeric price"))?;
    let amount = trade
        .qty
        .as_deref()
        .and_then(parse_f64)
        .ok_or_else(|| ExchangeError::data("trade is missing a numeric quantity"))?;

    let symbol = match &trade.symbol {
        Some(id) => resolve_symbol(id, catalog),
        None => fallback_symbol.to_owned(),
    };

    let fee = trade.commission.as_deref().and_then(parse_f64).map(|cost| Fee {
        role: None,
        currency: trade.commission_asset.as_deref().map(normalize_currency),
        rate: None,
        cost,
    });

    Ok(Trade {
        id: trade.id.map(|id| id.to_string()),
        timestamp: trade.time,
        symbol,
        order_id: trade.order_id.map(|id| id.to_string()),
        side: trade.side_info.side(),
        taker_or_maker: trade.side_info.taker_or_maker(),
        price,
        amount,
        cost: price * amount,
        fee,
    })
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFill {
    price: String,
    qty: String,
    #[serde(default)]
    commission: Option<String>,
    #[serde(default)]
    commission_asset: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrder {
    #[serde(default)]
    symbol: Option<String>,
    order_id: u64,
    #[serde(default)]
    client_order_id: Option<String>,
    #[serde(default, alias = "transactTime", alias = "updateTime")]
    time: Option<i64>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    orig_qty: Option<String>,
    #[serde(default)]
    executed_qty: Option<String>,
    #[serde(default)]
    cummulative_quote_qty: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    time_in_force: Option<String>,
    #[serde(default, rename = "type")]
    order_type: Option<String>,
    side: String,
    #[serde(default)]
    fills: Vec<RawFill>,
}

pub(crate) fn parse_order(
    raw: &Value,
    fallback_symbol: &str,
    catalog: &MarketCatalog,
) -> Result<Order, ExchangeError> {
    let order: RawOrder = serde_json::from_value(raw.clone())
        .map_err(|error| ExchangeError::data(format!("malformed order: {error}")))?;

    let symbol = match &order.symbol {
        Some(id) => resolve_symbol(id, catalog),
        None => fallback_symbol.to_owned(),
    };

    let side = match order.side.as_str() {
        "BUY" => OrderSide::Buy,
        "SELL" => OrderSide::Sell,
        other => {
            return Err(ExchangeError::data(format!("unrecognized order side '{other}'")));
        }
    };

    let order_type = OrderType::from_raw(order.order_type.as_deref().unwrap_or("limit"));
    let amount = order.orig_qty.as_deref().and_then(parse_f64).unwrap_or(0.0);
    let filled = order
        .executed_qty
        .as_deref()
        .and_then(parse_f64)
        .unwrap_or(0.0);
    // Upstream data can momentarily report filled > amount; never go negative.
    let remaining = (amount - filled).max(0.0);

    let mut cost = order
        .cummulative_quote_qty
        .as_deref()
        .and_then(parse_f64)
        .unwrap_or(0.0);

    // Fill aggregation: accumulate cost and fee by summation; the fee
    // currency comes from the first fill (fills within one order are assumed
    // single-currency).
    let mut fee: Option<Fee> = None;
    let mut trades = Vec::with_capacity(order.fills.len());
    if !order.fills.is_empty() {
        let mut fills_cost = 0.0;
        for fill in &order.fills {
            let price = fill.price.as_str();
            let price = parse_f64(price)
                .ok_or_else(|| ExchangeError::data("order fill is missing a numeric price"))?;
            let quantity = parse_f64(&fill.qty)
                .ok_or_else(|| ExchangeError::data("order fill is missing a numeric quantity"))?;
            let fill_cost = price * quantity;
            fills_cost += fill_cost;

            let fill_fee_cost = fill.commission.as_deref().and_then(parse_f64);
            if let Some(fill_fee_cost) = fill_fee_cost {
                match &mut fee {
                    Some(aggregate) => aggregate.cost += fill_fee_cost,
                    None => {
                        fee = Some(Fee {
                            role: None,
                            currency: fill.commission_asset.as_deref().map(normalize_currency),
                            rate: None,
                            cost: fill_fee_cost,
                        })
                    }
                }
            }

            trades.push(Trade {
                id: None,
                timestamp: order.time,
                symbol: symbol.clone(),
                order_id: Some(order.order_id.to_string()),
                side: match side {
                    OrderSide::Buy => TradeSide::Buy,
                    OrderSide::Sell => TradeSide::Sell,
                },
                taker_or_maker: TakerOrMaker::Unknown,
                price,
                amount: quantity,
                cost: fill_cost,
                fee: fill_fee_cost.map(|cost| Fee {
                    role: None,
                    currency: fill.commission_asset.as_deref().map(normalize_currency),
                    rate: None,
                    cost,
                }),
            });
        }
        cost = fills_cost;
    }

    let mut price = order.price.as_deref().and_then(parse_f64).filter(|&p| p > 0.0);
    // Market orders report price 0; back-fill a usable reference price from
    // the realized average when possible.
    if price.is_none() && cost > 0.0 && filled > 0.0 {
        price = Some(cost / filled);
    }

    let average = if filled > 0.0 { Some(cost / filled) } else { None };

    Ok(Order {
        id: order.order_id.to_string(),
        client_order_id: order.client_order_id,
        timestamp: order.time,
        symbol,
        order_type,
        side,
        time_in_force: order.time_in_force.as_deref().and_then(TimeInForce::from_raw),
        price,
        amount,
        filled,
        remaining,
        cost,
        average,
        status: order
            .status
            .as_deref()
            .map(OrderStatus::from_raw)
            .unwrap_or(OrderStatus::Open),
        fee,
        trades,
    })
}

// ---------------------------------------------------------------------------
// Balances and fees
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBalance {
    asset: String,
    free: String,
    locked: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAccount {
    #[serde(default)]
    balances: Option<Vec<RawBalance>>,
    #[serde(default)]
    maker_commission: Option<i64>,
    #[serde(default)]
    taker_commission: Option<i64>,
}

pub(crate) fn parse_balances(raw: &Value) -> Result<Balances, ExchangeError> {
    let account: RawAccount = serde_json::from_value(raw.clone())
        .map_err(|error| ExchangeError::data(format!("malformed account payload: {error}")))?;
    let entries = account
        .balances
        .ok_or_else(|| ExchangeError::data("account payload is missing the 'balances' field"))?;

    let mut balances = Balances::default();
    for entry in entries {
        balances.entries.insert(
            normalize_currency(&entry.asset),
            BalanceEntry {
                free: parse_f64(&entry.free).unwrap_or(0.0),
                used: parse_f64(&entry.locked).unwrap_or(0.0),
            },
        );
    }
    Ok(balances)
}

/// Account-level commission schedule in basis points, converted to rates.
pub(crate) fn parse_trading_fees(raw: &Value) -> Result<TradingFees, ExchangeError> {
    let account: RawAccount = serde_json::from_value(raw.clone())
        .map_err(|error| ExchangeError::data(format!("malformed account payload: {error}")))?;

    match (account.maker_commission, account.taker_commission) {
        (Some(maker), Some(taker)) => Ok(TradingFees {
            maker: maker as f64 / 10_000.0,
            taker: taker as f64 / 10_000.0,
        }),
        _ => Err(ExchangeError::data(
            "account payload is missing commission fields",
        )),
    }
}
