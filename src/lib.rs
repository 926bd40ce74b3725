//! Derived analytics over per-location groundwater prediction tables.
//!
//! - **risk**: RMSE/MAE risk classification and advisories
//! - **stats**: dashboard aggregates, district lookup and listings
//! - **sampler**: evenly spaced chart series with synthetic dates
//! - **extract**: location extraction from free text and chat context
//! - **store**: typed CSV tables behind a load-once cache

pub mod error;
pub mod extract;
pub mod models;
pub mod report;
pub mod risk;
pub mod sampler;
pub mod stats;
pub mod store;

pub use error::{AnalyticsError, Result};
pub use store::TableStore;
