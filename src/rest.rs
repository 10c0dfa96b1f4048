// REST resource client
//
// Sends confirmed edits as `PUT {api_url}/{resource}` with the payload fields
// as a JSON object. Requests run on the tokio runtime captured when the
// client is built; the result is handed to the payload's handler when the
// request finishes. Transport failures and non-2xx responses become error
// results so they reach the user through the same path as server errors.

use crate::resource::{EditRequestPayload, ResourceClient, ResourceRegistry, UpdateResult};
use std::time::Duration;
use tokio::runtime::Handle;

/// Errors raised while building a REST client
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("no tokio runtime is running; REST updates need one")]
    NoRuntime,
    #[error("invalid API url {url:?}: expected http:// or https://")]
    InvalidUrl { url: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Shared HTTP client for all resources of one API
#[derive(Clone, Debug)]
pub struct RestClient {
    http: reqwest::Client,
    api_url: String,
    runtime: Handle,
}

impl RestClient {
    /// Build a client rooted at `api_url`
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, RestError> {
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(RestError::InvalidUrl {
                url: api_url.to_string(),
            });
        }
        let runtime = Handle::try_current().map_err(|_| RestError::NoRuntime)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("og-editable/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            runtime,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Client for a single named resource
    pub fn resource(&self, name: &str) -> RestResource {
        RestResource {
            client: self.clone(),
            url: format!("{}/{}", self.api_url, name),
        }
    }

    /// Registry with one REST resource per name
    pub fn registry<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> ResourceRegistry {
        let mut registry = ResourceRegistry::new();
        for name in names {
            registry.register(name, std::sync::Arc::new(self.resource(name)));
        }
        registry
    }
}

/// One REST endpoint
#[derive(Clone, Debug)]
pub struct RestResource {
    client: RestClient,
    url: String,
}

impl RestResource {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ResourceClient for RestResource {
    fn put(&self, payload: EditRequestPayload) {
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => {
                payload.complete(UpdateResult::failed(format!(
                    "Could not encode update: {}",
                    e
                )));
                return;
            }
        };

        let http = self.client.http.clone();
        let url = self.url.clone();
        tracing::info!(url = %url, fields = payload.fields().len(), "Dispatching update");

        self.client.runtime.spawn(async move {
            let result = send_put(&http, &url, &body).await;
            if result.error {
                tracing::warn!(url = %url, message = %result.message, "Update failed");
            } else {
                tracing::debug!(url = %url, "Update accepted");
            }
            payload.complete(result);
        });
    }
}

async fn send_put(http: &reqwest::Client, url: &str, body: &serde_json::Value) -> UpdateResult {
    let response = match http.put(url).json(body).send().await {
        Ok(response) => response,
        Err(e) => return UpdateResult::failed(format!("Request to {} failed: {}", url, e)),
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        Err(e) => return UpdateResult::failed(format!("Could not read response: {}", e)),
    };
    let parsed = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .map(UpdateResult::from_value);

    if status.is_success() {
        return match parsed {
            Some(result) => result,
            None if text.is_empty() => UpdateResult::ok(serde_json::Value::Null),
            None => UpdateResult::ok(serde_json::Value::String(text)),
        };
    }

    // Prefer the server's own error message when it sent one
    match parsed {
        Some(result) if result.error && !result.message.is_empty() => result,
        _ if !text.trim().is_empty() => UpdateResult::failed(text),
        _ => UpdateResult::failed(status.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResultHandler;
    use axum::{http::StatusCode, routing::put, Json, Router};
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    async fn spawn_backend() -> SocketAddr {
        let app = Router::new()
            .route(
                "/positions",
                put(|Json(body): Json<Value>| async move { Json(json!({ "saved": body })) }),
            )
            .route(
                "/portfolios",
                put(|| async {
                    (
                        StatusCode::CONFLICT,
                        Json(json!({"error": true, "message": "conflict"})),
                    )
                }),
            )
            .route(
                "/trades",
                put(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "backend down") }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn payload_with_channel() -> (EditRequestPayload, mpsc::UnboundedReceiver<UpdateResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: ResultHandler = Arc::new(move |result: UpdateResult| {
            let _ = tx.send(result);
        });
        let mut payload = EditRequestPayload::new();
        payload.insert("node", "n1");
        payload.insert("name", "Bob");
        payload.set_handler(handler);
        (payload, rx)
    }

    #[test]
    fn test_new_requires_runtime() {
        let err = RestClient::new("http://localhost:1", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RestError::NoRuntime));
    }

    #[tokio::test]
    async fn test_new_rejects_non_http_url() {
        let err = RestClient::new("ftp://example.com", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RestError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_resource_url_joins_name() {
        let client = RestClient::new("http://localhost:8080/jax/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.resource("positions").url(),
            "http://localhost:8080/jax/positions"
        );
        let registry = client.registry(["positions", "portfolios"]);
        assert_eq!(registry.names(), vec!["portfolios", "positions"]);
    }

    #[tokio::test]
    async fn test_put_sends_fields_as_json() {
        let addr = spawn_backend().await;
        let client = RestClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let (payload, mut rx) = payload_with_channel();

        client.resource("positions").put(payload);
        let result = rx.recv().await.unwrap();

        assert!(!result.error);
        assert_eq!(result.data, json!({"saved": {"node": "n1", "name": "Bob"}}));
    }

    #[tokio::test]
    async fn test_put_reports_server_error_message() {
        let addr = spawn_backend().await;
        let client = RestClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();

        let (payload, mut rx) = payload_with_channel();
        client.resource("portfolios").put(payload);
        let result = rx.recv().await.unwrap();
        assert!(result.error);
        assert_eq!(result.message, "conflict");

        let (payload, mut rx) = payload_with_channel();
        client.resource("trades").put(payload);
        let result = rx.recv().await.unwrap();
        assert!(result.error);
        assert_eq!(result.message, "backend down");
    }

    #[tokio::test]
    async fn test_put_transport_failure_becomes_error_result() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RestClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let (payload, mut rx) = payload_with_channel();
        client.resource("positions").put(payload);

        let result = rx.recv().await.unwrap();
        assert!(result.error);
        assert!(result.message.contains("failed"), "{}", result.message);
    }
}
