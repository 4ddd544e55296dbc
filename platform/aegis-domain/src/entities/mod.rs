pub mod account;
pub mod metrics;
pub mod risk;
