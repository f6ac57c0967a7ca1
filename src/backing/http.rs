//! HTTP backing store.
//!
//! Talks to a key-value service exposing `PUT /set`, `GET /get/{key}` and
//! `DELETE /del/{key}`, which is the surface this server itself serves for
//! its default cache. One instance can therefore back another.
//!
//! A 4xx answer (other than 404 on reads and deletes) is the peer refusing
//! that request, reported as [`BackingError::Rejected`]. Anything else
//! unexpected is a protocol error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use super::{BackingError, BackingStore};

#[derive(Serialize)]
struct SetBody<'a> {
    key: &'a str,
    value: &'a str,
    ttl: u64,
}

#[derive(Deserialize)]
struct GetBody {
    value: serde_json::Value,
}

/// reqwest client bound to one base URL.
#[derive(Debug, Clone)]
pub struct HttpBackingStore {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl HttpBackingStore {
    /// Builds a client for `base_url` with a per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackingError> {
        let base = Url::parse(base_url)
            .map_err(|e| BackingError::Connection(format!("invalid backing url {}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(BackingError::Connection(format!(
                "backing url cannot be a base: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackingError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            base,
            timeout,
        })
    }

    /// Appends path segments, percent-encoding the key.
    fn url(&self, segments: &[&str]) -> Result<Url, BackingError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackingError::Connection(format!("bad base url: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn transport(&self, err: reqwest::Error) -> BackingError {
        if err.is_timeout() {
            BackingError::Timeout(self.timeout)
        } else if err.is_decode() {
            BackingError::Protocol(err.to_string())
        } else {
            BackingError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl BackingStore for HttpBackingStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackingError> {
        let response = self
            .client
            .get(self.url(&["get", key])?)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: GetBody = response.json().await.map_err(|e| self.transport(e))?;
                match body.value {
                    serde_json::Value::String(text) => Ok(Some(text.into_bytes())),
                    other => Err(BackingError::Protocol(format!(
                        "expected string value, got {}",
                        other
                    ))),
                }
            }
            status => Err(unexpected("GET", status)),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> Result<(), BackingError> {
        let text = String::from_utf8(value)
            .map_err(|e| BackingError::Protocol(format!("value is not UTF-8: {}", e)))?;
        let body = SetBody {
            key,
            value: &text,
            ttl: ttl_secs,
        };

        let response = self
            .client
            .put(self.url(&["set"])?)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(unexpected("PUT", status)),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), BackingError> {
        let response = self
            .client
            .delete(self.url(&["del", key])?)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            status => Err(unexpected("DELETE", status)),
        }
    }
}

/// Classifies a status the caller did not handle.
fn unexpected(method: &str, status: StatusCode) -> BackingError {
    let message = format!("{} returned {}", method, status);
    match status {
        // The peer is struggling, not refusing
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => BackingError::Protocol(message),
        status if status.is_client_error() => BackingError::Rejected(message),
        _ => BackingError::Protocol(message),
    }
}
