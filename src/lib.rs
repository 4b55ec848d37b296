pub mod actions;
pub mod config;
pub mod error;
pub mod geo;
pub mod inquiry;
pub mod models;
pub mod store;
pub mod telemetry;
pub mod validation;

pub use actions::{ActionResult, Marketplace};
pub use config::AppConfig;
pub use error::MarketError;
