// Legacy API HTTP client
//
// Wraps `reqwest::Client` with envelope unwrapping and the loose connection
// walker. Operations live in `listings.rs` and `tags.rs` as inherent methods
// so this file only deals with transport.

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};
use url::Url;

use super::models::{LegacyPage, LegacyResponse};
use crate::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the legacy query-graph endpoint.
///
/// Sends `{ operationName, variables }` and returns the `data` object with
/// the `errors` array already checked. Unauthenticated; identifies itself with
/// a client id and a per-client random device id.
pub struct LegacyClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl LegacyClient {
    pub fn new(endpoint: &str, client_id: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let id_value = HeaderValue::from_str(client_id).map_err(|e| Error::Legacy {
            message: format!("invalid client id header value: {e}"),
        })?;
        headers.insert("Client-Id", id_value);
        let device = uuid::Uuid::new_v4().simple().to_string();
        let device_value = HeaderValue::from_str(&device).map_err(|e| Error::Legacy {
            message: format!("invalid device id header value: {e}"),
        })?;
        headers.insert("X-Device-Id", device_value);

        Ok(Self {
            http: transport.build_client_with_headers(headers)?,
            endpoint: Url::parse(endpoint)?,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoint: &str) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Run a named operation and return its raw `data` object.
    pub(crate) async fn operation(&self, name: &str, variables: Value) -> Result<Value, Error> {
        debug!(operation = name, "POST {}", self.endpoint);

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(&json!({ "operationName": name, "variables": variables }))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: format!("{name}: request rejected"),
            });
        }
        let body = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::Legacy {
                message: format!("{name}: HTTP {status}"),
            });
        }

        let envelope: LegacyResponse =
            serde_json::from_str(&body).map_err(|e| Error::decode(&e, body.clone()))?;

        if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
            let message = errors
                .into_iter()
                .map(|e| e.message.unwrap_or_else(|| "unknown error".into()))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::Legacy { message });
        }

        envelope.data.ok_or_else(|| Error::Legacy {
            message: format!("{name}: response contained no data"),
        })
    }

    /// Run an operation and normalize the connection found at `path`.
    pub(crate) async fn page<T: DeserializeOwned>(
        &self,
        name: &str,
        variables: Value,
        path: &[&str],
    ) -> Result<LegacyPage<T>, Error> {
        let data = self.operation(name, variables).await?;
        Ok(extract_page(&data, path))
    }
}

/// Walk `path` into `data` and read the connection there.
///
/// A missing or null segment yields an empty terminal page. Nodes are read
/// from `edges[].node` or, failing that, a bare `items` array; nodes that
/// do not decode are skipped.
pub(crate) fn extract_page<T: DeserializeOwned>(data: &Value, path: &[&str]) -> LegacyPage<T> {
    let mut container = data;
    for segment in path {
        match container.get(segment) {
            Some(next) if !next.is_null() => container = next,
            _ => return LegacyPage::empty(),
        }
    }

    let mut items = Vec::new();
    let mut cursor = None;

    if let Some(edges) = container.get("edges").and_then(Value::as_array) {
        for edge in edges {
            if let Some(c) = edge
                .get("cursor")
                .and_then(Value::as_str)
                .filter(|c| !c.trim().is_empty())
            {
                cursor = Some(c.to_owned());
            }
            if let Some(node) = edge.get("node").filter(|n| !n.is_null()) {
                push_node(&mut items, node);
            }
        }
    } else if let Some(nodes) = container.get("items").and_then(Value::as_array) {
        for node in nodes.iter().filter(|n| !n.is_null()) {
            push_node(&mut items, node);
        }
    }

    if cursor.is_none() {
        cursor = container
            .get("cursor")
            .and_then(Value::as_str)
            .filter(|c| !c.trim().is_empty())
            .map(str::to_owned);
    }

    let has_next_page = container
        .get("pageInfo")
        .and_then(|p| p.get("hasNextPage"))
        .or_else(|| container.get("hasNextPage"))
        .and_then(Value::as_bool);

    LegacyPage {
        items,
        cursor,
        has_next_page,
    }
}

fn push_node<T: DeserializeOwned>(items: &mut Vec<T>, node: &Value) {
    match T::deserialize(node) {
        Ok(item) => items.push(item),
        Err(e) => warn!(error = %e, "skipping undecodable legacy node"),
    }
}
