//! Data models
//!
//! Shared between the marketplace client and the storefront service.
//! JSON field names are camelCase on every wire.

pub mod catalog;
pub mod order;
pub mod reservation;

// Re-exports
pub use catalog::*;
pub use order::*;
pub use reservation::*;
