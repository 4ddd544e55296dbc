pub mod action;
pub mod bar;
pub mod market_series;
pub mod observation;
pub mod side;
pub mod sized_order;
pub mod step_info;
pub mod trade;
