pub mod market;
pub mod models;
pub mod order;
pub mod timeframe;

pub use market::{Market, MarketLimits, MarketType, MinMax};
pub use models::{
    Balances, BalanceEntry, BookLevel, Candle, Fee, FeeRole, OrderBook, TakerOrMaker, Ticker,
    Trade, TradeSide, TradingFees,
};
pub use order::{Order, OrderSide, OrderStatus, OrderType, TimeInForce};
pub use timeframe::Timeframe;
