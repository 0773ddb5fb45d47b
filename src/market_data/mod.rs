pub mod candle;
pub mod candle_series;
pub mod mock_feed;
pub mod price_sync;

// Re-export the Candle struct for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::Candle;
pub use candle_series::CandleSeries;
pub use mock_feed::Timeframe;
pub use price_sync::LivePrice;
