pub mod environment;
pub mod episode;
pub mod ohlcv;
pub mod policy;
pub mod reward;
pub mod sentiment;
