//! # HTTP implementation of [`ClusterClient`] for the Nomad API.
//!
//! Issues `GET {addr}/v1/{kind}?index=N&wait=Xms[&stale=true]` and reads the
//! `X-Nomad-Index` response header as the listing's last index.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use super::{ClusterClient, Listing, QueryOptions, ResourceKind};
use crate::error::ClientError;

const INDEX_HEADER: &str = "X-Nomad-Index";
const TOKEN_HEADER: &str = "X-Nomad-Token";

/// Extra time granted on top of the server-side wait before the request times out.
const REQUEST_SLACK: Duration = Duration::from_secs(5);

/// Nomad API client over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpClient {
    /// Creates a client for `address` (e.g. `http://localhost:4646`).
    ///
    /// An empty `token` is treated as absent.
    pub fn new(address: &str, token: Option<&str>) -> Result<Self, ClientError> {
        let mut base = Url::parse(address).map_err(|e| ClientError::InvalidAddress {
            addr: address.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidAddress {
                addr: address.to_string(),
                reason: "not a base url".to_string(),
            });
        }
        // Url::join replaces the last segment unless the path ends with a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("nomad-event-logger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::InvalidAddress {
                addr: address.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            base,
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
        })
    }

    fn endpoint(&self, kind: ResourceKind) -> Result<Url, ClientError> {
        self.base
            .join(&format!("v1/{}", kind.path()))
            .map_err(|e| ClientError::InvalidAddress {
                addr: self.base.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Client-side timeout for a blocking query waiting up to `wait`.
///
/// The server may add up to `wait / 16` of jitter to the wait.
fn request_timeout(wait: Duration) -> Duration {
    wait.saturating_add(wait / 16).saturating_add(REQUEST_SLACK)
}

#[async_trait]
impl ClusterClient for HttpClient {
    async fn list(&self, kind: ResourceKind, query: &QueryOptions) -> Result<Listing, ClientError> {
        let url = self.endpoint(kind)?;
        let mut req = self
            .http
            .get(url)
            .query(&[
                ("index", query.wait_index.to_string()),
                ("wait", format!("{}ms", query.wait_time.as_millis())),
            ])
            .timeout(request_timeout(query.wait_time));
        if query.allow_stale {
            req = req.query(&[("stale", "true")]);
        }
        if let Some(token) = &self.token {
            req = req.header(TOKEN_HEADER, token);
        }

        let resp = req
            .send()
            .await
            .map_err(|source| ClientError::Http { kind, source })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                kind,
                status: status.as_u16(),
            });
        }

        let last_index = resp
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        let body = resp
            .bytes()
            .await
            .map_err(|source| ClientError::Http { kind, source })?;
        let records = decode_listing(kind, &body)?;
        debug!(%kind, last_index, records = records.len(), "list query returned");

        Ok(Listing {
            records,
            last_index,
        })
    }
}

/// Decodes a list body; `null` is an empty listing.
fn decode_listing(kind: ResourceKind, body: &[u8]) -> Result<Vec<Value>, ClientError> {
    serde_json::from_slice::<Option<Vec<Value>>>(body)
        .map(Option::unwrap_or_default)
        .map_err(|e| ClientError::Decode {
            kind,
            reason: e.to_string(),
        })
}
