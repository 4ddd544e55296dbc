pub mod artifacts;
pub mod market_data;
pub mod policies;
pub mod sentiment;
mod timestamps;
