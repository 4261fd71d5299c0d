//! Binance spot REST adapter.
//!
//! Normalizes the venue's REST API onto the canonical data model: market
//! catalog building, public market data, and signed account/trading
//! endpoints. Transport is abstracted behind [`HttpClient`], the wall clock
//! behind [`Clock`], so every code path here is testable offline.

mod classify;
mod parse;

use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

use crate::catalog::MarketCatalog;
use crate::config::ExchangeConfig;
use crate::domain::market::Market;
use crate::domain::models::{Balances, Candle, Fee, FeeRole, OrderBook, Ticker, Trade, TradingFees};
use crate::domain::order::{Order, OrderSide, OrderType};
use crate::domain::timeframe::Timeframe;
use crate::error::{ExchangeError, ValidationError};
use crate::fees;
use crate::http_client::{HttpAuth, HttpClient, HttpMethod, HttpRequest, NoopHttpClient};
use crate::num::truncate_to_precision;
use crate::signer::{encode_params, signed_query, Clock, ClockSkew, SystemClock};

use classify::classify_response;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";
const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Spot REST adapter for the Binance venue.
///
/// The market catalog is an immutable snapshot behind a lock; `load_markets`
/// replaces the whole `Arc` on refresh so concurrent readers never observe a
/// half-built catalog.
pub struct BinanceAdapter {
    config: ExchangeConfig,
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    base_url: String,
    catalog: RwLock<Option<Arc<MarketCatalog>>>,
    clock_skew: ClockSkew,
}

impl Default for BinanceAdapter {
    fn default() -> Self {
        Self {
            config: ExchangeConfig::default(),
            http_client: Arc::new(NoopHttpClient),
            clock: Arc::new(SystemClock),
            base_url: String::from(DEFAULT_BASE_URL),
            catalog: RwLock::new(None),
            clock_skew: ClockSkew::default(),
        }
    }
}

impl BinanceAdapter {
    pub fn new(config: ExchangeConfig, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http_client,
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Point the adapter at a different gateway, e.g. the venue's testnet.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// The current catalog snapshot, if one has been loaded.
    pub fn catalog(&self) -> Option<Arc<MarketCatalog>> {
        self.catalog
            .read()
            .expect("catalog lock poisoned")
            .clone()
    }

    // -----------------------------------------------------------------------
    // Markets
    // -----------------------------------------------------------------------

    /// Load the market catalog, reusing the cached snapshot unless `reload`
    /// is set.
    pub async fn load_markets(&self, reload: bool) -> Result<Arc<MarketCatalog>, ExchangeError> {
        if !reload {
            if let Some(catalog) = self.catalog() {
                return Ok(catalog);
            }
        }

        let payload = self
            .public_request("/api/v3/exchangeInfo", &[], "load_markets")
            .await?;
        let markets =
            parse::parse_markets(&payload).map_err(|error| error.with_operation("load_markets"))?;
        let catalog = Arc::new(MarketCatalog::new(markets));

        debug!(markets = catalog.len(), "market catalog refreshed");
        *self.catalog.write().expect("catalog lock poisoned") = Some(catalog.clone());
        Ok(catalog)
    }

    /// Always fetches a fresh instrument listing.
    pub async fn fetch_markets(&self) -> Result<Vec<Market>, ExchangeError> {
        let catalog = self.load_markets(true).await?;
        Ok(catalog.markets().to_vec())
    }

    // -----------------------------------------------------------------------
    // Clock
    // -----------------------------------------------------------------------

    /// Venue server time in epoch milliseconds.
    pub async fn fetch_time(&self) -> Result<i64, ExchangeError> {
        let payload = self.public_request("/api/v3/time", &[], "fetch_time").await?;
        payload
            .get("serverTime")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                ExchangeError::data("time payload is missing 'serverTime'")
                    .with_operation("fetch_time")
            })
    }

    /// Measure (or return the cached) local-minus-server clock offset.
    ///
    /// `force` drops the cached value and re-measures against the venue.
    pub async fn sync_clock(&self, force: bool) -> Result<i64, ExchangeError> {
        if force {
            self.clock_skew.invalidate();
        } else if let Some(offset) = self.clock_skew.offset_ms() {
            return Ok(offset);
        }

        let local = self.clock.now_millis();
        let server = self.fetch_time().await?;
        self.clock_skew.record(local, server);
        Ok(local - server)
    }

    // -----------------------------------------------------------------------
    // Public market data
    // -----------------------------------------------------------------------

    pub async fn fetch_ticker(&self, symbol: &str) -> Result<Ticker, ExchangeError> {
        let catalog = self.load_markets(false).await?;
        let market = resolve_market(&catalog, symbol)?;
        let params = [("symbol", market.id.clone())];
        let payload = self
            .public_request("/api/v3/ticker/24hr", &params, "fetch_ticker")
            .await?;
        parse::parse_ticker(&payload, &catalog).map_err(|error| error.with_operation("fetch_ticker"))
    }

    /// All 24h tickers in one call, optionally post-filtered to a symbol set.
    ///
    /// The filter is applied locally after normalization; the venue call is
    /// the same either way.
    pub async fn fetch_tickers(
        &self,
        symbols: Option<&[&str]>,
    ) -> Result<Vec<Ticker>, ExchangeError> {
        let catalog = self.load_markets(false).await?;
        let payload = self
            .public_request("/api/v3/ticker/24hr", &[], "fetch_tickers")
            .await?;
        let rows = payload.as_array().ok_or_else(|| {
            ExchangeError::data("ticker listing is not an array").with_operation("fetch_tickers")
        })?;
        let mut tickers = rows
            .iter()
            .map(|row| {
                parse::parse_ticker(row, &catalog)
                    .map_err(|error| error.with_operation("fetch_tickers"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(symbols) = symbols {
            let wanted: Vec<String> = symbols
                .iter()
                .map(|symbol| match catalog.resolve(symbol) {
                    Some(market) => market.symbol.clone(),
                    None => (*symbol).to_owned(),
                })
                .collect();
            tickers.retain(|ticker| wanted.iter().any(|symbol| symbol == &ticker.symbol));
        }
        Ok(tickers)
    }

    pub async fn fetch_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError> {
        let catalog = self.load_markets(false).await?;
        let market = resolve_market(&catalog, symbol)?;

        let mut params = vec![("symbol", market.id.clone())];
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        let payload = self
            .public_request("/api/v3/depth", &params, "fetch_order_book")
            .await?;
        parse::parse_order_book(&payload, &market.symbol)
            .map_err(|error| error.with_operation("fetch_order_book"))
    }

    pub async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let catalog = self.load_markets(false).await?;
        let market = resolve_market(&catalog, symbol)?;

        let mut params = vec![
            ("symbol", market.id.clone()),
            ("interval", timeframe.as_str().to_owned()),
        ];
        if let Some(since) = since {
            params.push(("startTime", since.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }

        let payload = self
            .public_request("/api/v3/klines", &params, "fetch_ohlcv")
            .await?;
        let rows = payload.as_array().ok_or_else(|| {
            ExchangeError::data("candle listing is not an array").with_operation("fetch_ohlcv")
        })?;
        rows.iter()
            .map(|row| {
                parse::parse_candle(row).map_err(|error| error.with_operation("fetch_ohlcv"))
            })
            .collect()
    }

    /// Recent public trades, from the aggregated-trade feed.
    pub async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let catalog = self.load_markets(false).await?;
        let market = resolve_market(&catalog, symbol)?;

        let mut params = vec![("symbol", market.id.clone())];
        if let Some(since) = since {
            params.push(("startTime", since.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        let payload = self
            .public_request("/api/v3/aggTrades", &params, "fetch_trades")
            .await?;
        let rows = payload.as_array().ok_or_else(|| {
            ExchangeError::data("trade listing is not an array").with_operation("fetch_trades")
        })?;
        rows.iter()
            .map(|row| {
                parse::parse_trade(row, &market.symbol, &catalog)
                    .map_err(|error| error.with_operation("fetch_trades"))
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Account
    // -----------------------------------------------------------------------

    pub async fn fetch_balance(&self) -> Result<Balances, ExchangeError> {
        let payload = self
            .private_request(HttpMethod::Get, "/api/v3/account", &[], "fetch_balance")
            .await?;
        parse::parse_balances(&payload).map_err(|error| error.with_operation("fetch_balance"))
    }

    /// Account-level maker/taker rates, from the same account endpoint.
    pub async fn fetch_trading_fees(&self) -> Result<TradingFees, ExchangeError> {
        let payload = self
            .private_request(HttpMethod::Get, "/api/v3/account", &[], "fetch_trading_fees")
            .await?;
        parse::parse_trading_fees(&payload)
            .map_err(|error| error.with_operation("fetch_trading_fees"))
    }

    // -----------------------------------------------------------------------
    // Trading
    // -----------------------------------------------------------------------

    pub async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: f64,
        price: Option<f64>,
        client_order_id: Option<&str>,
    ) -> Result<Order, ExchangeError> {
        if amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount { value: amount }.into());
        }

        let catalog = self.load_markets(false).await?;
        let market = resolve_market(&catalog, symbol)?;

        let mut params = vec![
            ("symbol", market.id.clone()),
            ("side", side.as_venue_str().to_owned()),
            ("type", order_type.as_venue_str()),
            ("quantity", format_decimal(amount, market.amount_precision)),
        ];

        // Market orders execute at whatever the book offers; everything else
        // needs an explicit price and a time-in-force.
        if order_type != OrderType::Market {
            let price = price.ok_or_else(|| ValidationError::MissingPrice {
                order_type: order_type.as_str().to_owned(),
            })?;
            params.push(("price", format_decimal(price, market.price_precision)));
            params.push((
                "timeInForce",
                self.config.default_time_in_force.as_str().to_owned(),
            ));
        }

        if let Some(client_order_id) = client_order_id {
            params.push(("newClientOrderId", client_order_id.to_owned()));
        }

        let payload = self
            .private_request(HttpMethod::Post, "/api/v3/order", &params, "create_order")
            .await?;
        parse::parse_order(&payload, &market.symbol, &catalog)
            .map_err(|error| error.with_operation("create_order"))
    }

    pub async fn create_limit_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        price: f64,
    ) -> Result<Order, ExchangeError> {
        self.create_order(symbol, OrderType::Limit, side, amount, Some(price), None)
            .await
    }

    pub async fn create_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
    ) -> Result<Order, ExchangeError> {
        self.create_order(symbol, OrderType::Market, side, amount, None, None)
            .await
    }

    pub async fn cancel_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let catalog = self.load_markets(false).await?;
        let market = resolve_market(&catalog, symbol)?;

        let params = [
            ("symbol", market.id.clone()),
            ("orderId", id.to_owned()),
        ];
        let payload = self
            .private_request(HttpMethod::Delete, "/api/v3/order", &params, "cancel_order")
            .await?;
        parse::parse_order(&payload, &market.symbol, &catalog)
            .map_err(|error| error.with_operation("cancel_order"))
    }

    pub async fn fetch_order(&self, id: &str, symbol: &str) -> Result<Order, ExchangeError> {
        let catalog = self.load_markets(false).await?;
        let market = resolve_market(&catalog, symbol)?;

        let params = [
            ("symbol", market.id.clone()),
            ("orderId", id.to_owned()),
        ];
        let payload = self
            .private_request(HttpMethod::Get, "/api/v3/order", &params, "fetch_order")
            .await?;
        parse::parse_order(&payload, &market.symbol, &catalog)
            .map_err(|error| error.with_operation("fetch_order"))
    }

    /// Open orders, optionally scoped to one symbol.
    ///
    /// The unscoped form scans every market server-side and carries a much
    /// heavier rate-limit weight.
    pub async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<Order>, ExchangeError> {
        let catalog = self.load_markets(false).await?;

        let mut params = Vec::new();
        let fallback_symbol = match symbol {
            Some(symbol) => {
                let market = resolve_market(&catalog, symbol)?;
                params.push(("symbol", market.id.clone()));
                market.symbol.clone()
            }
            None => {
                if self.config.warn_on_open_orders_without_symbol {
                    warn!(
                        "fetching open orders without a symbol is rate-limit expensive; \
                         pass a symbol or disable this warning in the config"
                    );
                }
                String::new()
            }
        };

        let payload = self
            .private_request(HttpMethod::Get, "/api/v3/openOrders", &params, "fetch_open_orders")
            .await?;
        let rows = payload.as_array().ok_or_else(|| {
            ExchangeError::data("open-order listing is not an array")
                .with_operation("fetch_open_orders")
        })?;
        let mut orders = rows
            .iter()
            .map(|row| {
                parse::parse_order(row, &fallback_symbol, &catalog)
                    .map_err(|error| error.with_operation("fetch_open_orders"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        // The venue endpoint takes neither a start time nor a limit; both are
        // applied locally.
        if let Some(since) = since {
            orders.retain(|order| order.timestamp.is_none_or(|timestamp| timestamp >= since));
        }
        if let Some(limit) = limit {
            orders.truncate(limit);
        }
        Ok(orders)
    }

    pub async fn fetch_my_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let catalog = self.load_markets(false).await?;
        let market = resolve_market(&catalog, symbol)?;

        let mut params = vec![("symbol", market.id.clone())];
        if let Some(since) = since {
            params.push(("startTime", since.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        let payload = self
            .private_request(HttpMethod::Get, "/api/v3/myTrades", &params, "fetch_my_trades")
            .await?;
        let rows = payload.as_array().ok_or_else(|| {
            ExchangeError::data("trade listing is not an array").with_operation("fetch_my_trades")
        })?;
        rows.iter()
            .map(|row| {
                parse::parse_trade(row, &market.symbol, &catalog)
                    .map_err(|error| error.with_operation("fetch_my_trades"))
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Fees
    // -----------------------------------------------------------------------

    /// Pre-trade fee estimate against the loaded catalog's static rates.
    pub fn calculate_fee(
        &self,
        symbol: &str,
        side: OrderSide,
        amount: f64,
        price: f64,
        role: FeeRole,
    ) -> Result<Fee, ExchangeError> {
        let catalog = self.catalog().ok_or_else(|| {
            ExchangeError::argument("market catalog not loaded; call load_markets first")
                .with_operation("calculate_fee")
        })?;
        let market = resolve_market(&catalog, symbol)?;
        Ok(fees::calculate_fee(market, side, amount, price, role))
    }

    // -----------------------------------------------------------------------
    // Transport plumbing
    // -----------------------------------------------------------------------

    async fn public_request(
        &self,
        path: &str,
        params: &[(&str, String)],
        operation: &str,
    ) -> Result<Value, ExchangeError> {
        let url = if params.is_empty() {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}{path}?{}", self.base_url, encode_params(params))
        };
        self.execute_and_classify(HttpRequest::get(url), operation)
            .await
    }

    async fn private_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(&str, String)],
        operation: &str,
    ) -> Result<Value, ExchangeError> {
        let (api_key, secret) = {
            let (api_key, secret) = self.config.credentials()?;
            (api_key.to_owned(), secret.to_owned())
        };

        let mut timestamp = self.clock.now_millis();
        if self.config.adjust_for_clock_skew {
            let offset = match self.clock_skew.offset_ms() {
                Some(offset) => offset,
                None => self.sync_clock(false).await?,
            };
            timestamp -= offset;
        }

        let query = signed_query(params, &secret, timestamp, self.config.recv_window_ms);
        let auth = HttpAuth::ApiKeyHeader {
            name: String::from(API_KEY_HEADER),
            value: api_key,
        };

        // Write methods carry the signed query as a form body; reads keep it
        // in the URL.
        let request = if method.is_write() {
            HttpRequest::new(method, format!("{}{path}", self.base_url)).with_form_body(query)
        } else {
            HttpRequest::new(method, format!("{}{path}?{query}", self.base_url))
        }
        .with_auth(&auth);

        self.execute_and_classify(request, operation).await
    }

    async fn execute_and_classify(
        &self,
        request: HttpRequest,
        operation: &str,
    ) -> Result<Value, ExchangeError> {
        debug!(operation, url = %request.url, "venue request");

        let response = self.http_client.execute(request).await.map_err(|error| {
            let message = format!("transport error: {}", error.message());
            let mapped = if error.retryable() {
                ExchangeError::unavailable(message)
            } else {
                ExchangeError::exchange(message)
            };
            mapped.with_operation(operation)
        })?;

        if let Some(error) = classify_response(response.status, &response.body) {
            return Err(error.with_operation(operation));
        }

        serde_json::from_str(&response.body).map_err(|error| {
            ExchangeError::data(format!("venue returned unparseable JSON: {error}"))
                .with_operation(operation)
        })
    }
}

fn resolve_market<'a>(
    catalog: &'a MarketCatalog,
    symbol: &str,
) -> Result<&'a Market, ExchangeError> {
    catalog.resolve(symbol).ok_or_else(|| {
        ExchangeError::from(ValidationError::UnknownMarket {
            symbol: symbol.to_owned(),
        })
    })
}

/// Format a value for a venue request parameter, truncated toward zero to the
/// market's precision. Truncation matters: rounding up an amount can breach
/// the caller's balance or the lot filter.
fn format_decimal(value: f64, precision: u32) -> String {
    format!(
        "{:.*}",
        precision as usize,
        truncate_to_precision(value, precision)
    )
}
