//! Shared types for keyhub
//!
//! Common types used across the workspace: the unified error system, the
//! API response envelope, and the domain models exchanged between the
//! marketplace client and the storefront service.

pub mod error;
pub mod models;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};
