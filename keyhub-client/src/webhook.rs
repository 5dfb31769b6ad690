//! Webhook digest verification
//!
//! The marketplace signs each notification with
//! `hex(sha256(canonical + secret))`, where `canonical` is every payload field
//! as `key=value`, sorted by key and joined with `&`. Both sides must agree on
//! the exact field set and ordering, so the payload is carried in an ordered
//! map rather than whatever order the JSON arrived in.

use crate::metrics::MetricsCollector;
use crate::{MarketError, MarketResult};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Header that may carry the digest
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
/// Body field that may carry the digest instead of the header
pub const SIGNATURE_FIELD: &str = "signature";

/// Webhook payload with deterministic (byte-wise) key order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookPayload(BTreeMap<String, Value>);

impl WebhookPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Anything else is rejected.
    pub fn from_value(value: Value) -> MarketResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(MarketError::Validation(format!(
                "webhook payload must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn from_slice(body: &[u8]) -> MarketResult<Self> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| MarketError::Validation(format!("webhook body is not JSON: {e}")))?;
        Self::from_value(value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `k1=v1&k2=v2&...` in key order
    pub fn canonical_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={}", render_value(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for WebhookPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Strings go in raw; everything else as compact JSON text
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Lowercase hex SHA-256 of the canonical string followed by the secret
pub fn compute_digest(payload: &WebhookPayload, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.canonical_string().as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// True iff `received_digest` is the digest of `payload` under `secret`
pub fn validate(payload: &WebhookPayload, received_digest: &str, secret: &str) -> bool {
    let expected = compute_digest(payload, secret);
    // Length leaks; content does not.
    expected
        .as_bytes()
        .ct_eq(received_digest.as_bytes())
        .into()
}

/// Validator bound to the shared secret
#[derive(Clone)]
pub struct WebhookValidator {
    secret: String,
    metrics: Arc<MetricsCollector>,
}

impl fmt::Debug for WebhookValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookValidator").finish_non_exhaustive()
    }
}

impl WebhookValidator {
    pub fn new(secret: impl Into<String>, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            secret: secret.into(),
            metrics,
        }
    }

    /// Check a digest and record the outcome
    pub fn validate(&self, payload: &WebhookPayload, received_digest: &str) -> bool {
        let valid = validate(payload, received_digest, &self.secret);
        self.metrics.record_webhook(valid);
        if !valid {
            tracing::warn!(
                target: "audit",
                fields = payload.0.len(),
                order_id = payload.get_str("orderId").unwrap_or("-"),
                "Webhook digest mismatch, notification rejected"
            );
        }
        valid
    }

    /// Like [`Self::validate`], but a missing or wrong digest is an error
    pub fn verify(&self, payload: &WebhookPayload, received_digest: Option<&str>) -> MarketResult<()> {
        let Some(digest) = received_digest.filter(|d| !d.is_empty()) else {
            self.metrics.record_webhook(false);
            tracing::warn!(target: "audit", "Webhook without digest rejected");
            return Err(MarketError::Validation("missing webhook digest".into()));
        };
        if self.validate(payload, digest) {
            Ok(())
        } else {
            Err(MarketError::Validation("webhook digest mismatch".into()))
        }
    }
}
