//! HTTP transport against the marketplace REST API

use super::{MarketRequest, MarketTransport};
use crate::{MarketError, MarketResult};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Header carrying the marketplace API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Error body returned by the marketplace
#[derive(serde::Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Network transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> MarketResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            MarketError::Validation(format!("invalid marketplace url {base_url}: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MarketError::Validation(format!(
                "marketplace url {base_url} cannot carry paths"
            )));
        }

        // No overall request timeout here: the per-call deadline lives in ReservationClient.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn url(&self, segments: &[String]) -> MarketResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| MarketError::api(None, "marketplace url cannot carry paths"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn handle_response(response: reqwest::Response) -> MarketResult<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .ok()
                .and_then(|body| body.message.or(body.error))
                .unwrap_or_else(|| {
                    if text.trim().is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("unexpected status")
                            .to_string()
                    } else {
                        text
                    }
                });
            return Err(MarketError::Api {
                status: Some(status.as_u16()),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl MarketTransport for HttpTransport {
    async fn send(&self, request: MarketRequest) -> MarketResult<Value> {
        let url = self.url(&request.segments)?;
        let mut req = self
            .client
            .request(request.method, url)
            .header(API_KEY_HEADER, &self.api_key);
        if let Some(body) = &request.body {
            req = req.json(body);
        }
        let response = req.send().await?;
        Self::handle_response(response).await
    }
}
