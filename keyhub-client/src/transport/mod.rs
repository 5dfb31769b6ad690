//! Marketplace transports
//!
//! [`MarketTransport`] is the seam between the typed client and the wire.
//! [`HttpTransport`] talks to the real marketplace; [`InMemoryMarketplace`]
//! simulates it in-process for local development and tests.

mod http;
mod memory;

pub use self::http::{API_KEY_HEADER, HttpTransport};
pub use self::memory::InMemoryMarketplace;

use crate::MarketResult;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

/// One marketplace call, independent of how it is carried
#[derive(Debug, Clone, PartialEq)]
pub struct MarketRequest {
    pub method: Method,
    /// Path segments below the API root, unencoded
    pub segments: Vec<String>,
    pub body: Option<Value>,
}

impl MarketRequest {
    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: Method::GET,
            segments: segments.into_iter().map(Into::into).collect(),
            body: None,
        }
    }

    pub fn post<I, S>(segments: I, body: Option<Value>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method: Method::POST,
            segments: segments.into_iter().map(Into::into).collect(),
            body,
        }
    }

    /// `/a/b/c` form, for logs
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

/// Carries a [`MarketRequest`] to the marketplace and returns the JSON body.
///
/// Implementations report every failure as [`crate::MarketError::Api`]; the
/// call deadline is enforced by [`crate::ReservationClient`], not here.
#[async_trait]
pub trait MarketTransport: Send + Sync {
    async fn send(&self, request: MarketRequest) -> MarketResult<Value>;
}
