//! # Spotwire Core
//!
//! Venue adapters and canonical domain types for the Spotwire spot-trading
//! toolkit.
//!
//! ## Overview
//!
//! This crate normalizes venue REST APIs onto a shared data model:
//!
//! - **Canonical domain models** for markets, tickers, trades, orders, and balances
//! - **Market catalog** with precision and limit derivation from venue filters
//! - **Signed-request construction** (HMAC-SHA256) for private endpoints
//! - **Error classification** from venue statuses, codes, and messages into a shared taxonomy
//! - **HTTP client abstraction** so every adapter path is testable offline
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Venue adapters (Binance spot) |
//! | [`catalog`] | Immutable market catalog snapshots |
//! | [`config`] | Adapter configuration and credentials |
//! | [`domain`] | Domain models (Market, Ticker, Trade, Order, ...) |
//! | [`error`] | Error taxonomy and validation errors |
//! | [`fees`] | Pre-trade fee estimation |
//! | [`http_client`] | HTTP client abstraction |
//! | [`num`] | Decimal precision helpers |
//! | [`signer`] | Request signing and clock-skew handling |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use spotwire_core::{BinanceAdapter, ExchangeConfig, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExchangeConfig::default().with_credentials("key", "secret");
//!     let adapter = BinanceAdapter::new(config, Arc::new(ReqwestHttpClient::new()));
//!
//!     let catalog = adapter.load_markets(false).await?;
//!     println!("{} markets listed", catalog.len());
//!
//!     let ticker = adapter.fetch_ticker("BTC/USDT").await?;
//!     println!("BTC/USDT last: {:?}", ticker.close);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result` types with structured errors:
//!
//! ```rust
//! use spotwire_core::{ErrorKind, ExchangeError};
//!
//! fn handle_error(error: ExchangeError) {
//!     match error.kind() {
//!         ErrorKind::RateLimited | ErrorKind::Unavailable => {
//!             // Retryable after backoff
//!         }
//!         ErrorKind::InvalidNonce => {
//!             // Re-sync the clock and retry
//!         }
//!         ErrorKind::Authentication => {
//!             // Report to user; never retry
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API secrets never appear in URLs, logs, or error payloads
//! - Signed requests carry the signature as the final query parameter
//! - Input validation happens locally before any network call

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod fees;
pub mod http_client;
pub mod num;
pub mod signer;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::BinanceAdapter;

// Catalog
pub use catalog::MarketCatalog;

// Configuration
pub use config::ExchangeConfig;

// Domain models
pub use domain::{
    Balances, BalanceEntry, BookLevel, Candle, Fee, FeeRole, Market, MarketLimits, MarketType,
    MinMax, Order, OrderBook, OrderSide, OrderStatus, OrderType, TakerOrMaker, Ticker,
    TimeInForce, Timeframe, Trade, TradeSide, TradingFees,
};

// Error types
pub use error::{ErrorKind, ExchangeError, ValidationError};

// Fee estimation
pub use fees::calculate_fee;

// HTTP abstraction
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};

// Signing and clocks
pub use signer::{Clock, ClockSkew, SystemClock};
