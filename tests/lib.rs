// Test library shared by the adapter behavior suites.
pub use spotwire_core::{
    BinanceAdapter, ErrorKind, ExchangeConfig, ExchangeError, FeeRole, HttpClient, HttpError,
    HttpMethod, HttpRequest, HttpResponse, OrderSide, OrderStatus, OrderType, TakerOrMaker,
    Timeframe, TradeSide,
};
pub use std::sync::Arc;

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

/// Two-market instrument listing used across the suites: BTC/USDT with the
/// full filter set, ETH/USDT with a zero (unbounded) max price and a halted
/// status.
pub const EXCHANGE_INFO: &str = r#"{
    "timezone": "UTC",
    "serverTime": 1700000000000,
    "symbols": [
        {
            "symbol": "BTCUSDT",
            "status": "TRADING",
            "baseAsset": "BTC",
            "baseAssetPrecision": 8,
            "quoteAsset": "USDT",
            "quotePrecision": 8,
            "filters": [
                {"filterType": "PRICE_FILTER", "minPrice": "0.01", "maxPrice": "1000000.00", "tickSize": "0.01"},
                {"filterType": "LOT_SIZE", "minQty": "0.00001000", "maxQty": "9000.00000000", "stepSize": "0.00001000"},
                {"filterType": "MARKET_LOT_SIZE", "minQty": "0.00000000", "maxQty": "120.00000000"},
                {"filterType": "MIN_NOTIONAL", "minNotional": "5.00000000"}
            ]
        },
        {
            "symbol": "ETHUSDT",
            "status": "BREAK",
            "baseAsset": "ETH",
            "baseAssetPrecision": 8,
            "quoteAsset": "USDT",
            "quotePrecision": 8,
            "filters": [
                {"filterType": "PRICE_FILTER", "minPrice": "0.01", "maxPrice": "0.00", "tickSize": "0.01"},
                {"filterType": "LOT_SIZE", "minQty": "0.00100000", "maxQty": "100000.00000000", "stepSize": "0.00100000"}
            ]
        }
    ]
}"#;

/// Scripted HTTP transport: pops one queued response per request and records
/// everything the adapter sends.
pub struct ScriptedHttpClient {
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    pub fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue where the first response is the instrument listing, as most
    /// adapter operations load the catalog first.
    pub fn with_catalog(mut responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
        responses.insert(0, Ok(HttpResponse::ok_json(EXCHANGE_INFO)));
        Self::new(responses)
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .clone()
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        self.requests
            .lock()
            .expect("request store should not be poisoned")
            .push(request);
        let response = self
            .responses
            .lock()
            .expect("response queue should not be poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::ok_json("{}")));
        Box::pin(async move { response })
    }
}

/// Adapter over a scripted transport, with the catalog listing queued first.
pub fn adapter_with_catalog(
    config: ExchangeConfig,
    responses: Vec<Result<HttpResponse, HttpError>>,
) -> (BinanceAdapter, Arc<ScriptedHttpClient>) {
    let client = Arc::new(ScriptedHttpClient::with_catalog(responses));
    (BinanceAdapter::new(config, client.clone()), client)
}
