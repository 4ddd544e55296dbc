pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use error::{EnvError, RiskError};

pub fn engine_name() -> &'static str {
    "aegis"
}
