//! keyhub-cloud: storefront service for the key marketplace
//!
//! - Serves the catalog through a cache-aside layer with scheduled refresh
//! - Runs checkout against the marketplace: reserve, confirm, wait for keys
//! - Accepts digest-verified marketplace notifications

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod orders;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use error::{BoxError, ServiceError, ServiceResult};
pub use state::AppState;
