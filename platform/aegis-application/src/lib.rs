pub mod batch;
pub mod config;
pub mod features;
pub mod policy;
pub mod reporting;
pub mod sentiment;
mod shared;
pub mod simulation;
pub mod synthetic;

pub use shared::{parse_duration_like, resolve_env_config};
