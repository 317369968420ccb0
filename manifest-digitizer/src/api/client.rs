//! HTTP client for the compliance backend
//!
//! Failures never escape this module: they are logged and surface as
//! `None`, which callers treat as a definitive "no result".

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::models::{
    CreateFailure, CreatedRecord, Entity, EntityKind, parse_create_response, parse_entity_list,
};
use super::operations::{Collection, Method, Operation};

/// Request/response seam to the backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issue a raw request against `<base>/api<path>`
    ///
    /// Returns the decoded JSON body (`{}` for an empty body), or `None` on
    /// transport errors, non-2xx statuses and undecodable bodies.
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Option<Value>;

    async fn execute(&self, operation: &Operation) -> Option<Value> {
        self.request(operation.method(), &operation.path(), operation.body())
            .await
    }

    /// List a reference collection, canonicalizing every entry
    async fn list(&self, kind: EntityKind, offset: usize, limit: usize) -> Option<Vec<Entity>> {
        let response = self.execute(&Operation::list(kind, offset, limit)).await?;
        Some(parse_entity_list(kind, &response))
    }

    /// Create a record and unwrap the `{success, data}` envelope
    async fn create(
        &self,
        collection: Collection,
        data: Value,
    ) -> Result<CreatedRecord, CreateFailure> {
        let response = self.execute(&Operation::create(collection, data)).await;
        parse_create_response(response)
    }
}

/// reqwest-backed client
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

#[async_trait]
impl Backend for BackendClient {
    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Option<Value> {
        let url = self.url(path);

        let builder = match method {
            Method::Get => self.http.get(&url),
            Method::Post => match body {
                Some(body) => self.http.post(&url).json(body),
                None => self.http.post(&url),
            },
        };

        log::debug!("{} {}", method, url);

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                log::error!("API request failed: {} {} - {}", method, url, e);
                return None;
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                log::error!("API request failed: {} {} - {}", method, url, e);
                return None;
            }
        };

        if !status.is_success() {
            log::error!("API request failed: {} {} - HTTP {}", method, url, status);
            if !text.is_empty() {
                log::error!("Response: {}", text);
            }
            return None;
        }

        if text.trim().is_empty() {
            return Some(Value::Object(Default::default()));
        }

        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("API request failed: {} {} - invalid JSON: {}", method, url, e);
                log::error!("Response: {}", text);
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeBackend;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_url_is_trimmed() {
        let client = BackendClient::new("http://localhost:1234/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:1234");
        assert_eq!(client.url("/vessels/0/10"), "http://localhost:1234/api/vessels/0/10");
    }

    #[tokio::test]
    async fn test_list_canonicalizes_entities() {
        let backend = FakeBackend::new(|_, _, _| {
            Some(json!({"data": [{"ID": 3, "VesselName": "Sea Wolf"}]}))
        });

        let vessels = backend.list(EntityKind::Vessel, 0, 1000).await.unwrap();
        assert_eq!(vessels.len(), 1);
        assert_eq!(vessels[0].id.to_string(), "3");
        assert_eq!(backend.requests()[0].path, "/vessels/0/1000");
        assert_eq!(backend.requests()[0].method, Method::Get);
    }

    #[tokio::test]
    async fn test_list_propagates_absence() {
        let backend = FakeBackend::new(|_, _, _| None);
        assert!(backend.list(EntityKind::Person, 0, 5000).await.is_none());
    }

    #[tokio::test]
    async fn test_create_posts_body() {
        let backend = FakeBackend::new(|_, _, _| Some(json!({"success": true, "data": {"id": 8}})));

        let created = backend
            .create(Collection::Persons, json!({"name": "Ana"}))
            .await
            .unwrap();

        assert_eq!(created.id.map(|id| id.to_string()), Some("8".to_string()));
        assert_eq!(backend.posts_to("/persons"), vec![json!({"name": "Ana"})]);
    }

    #[tokio::test]
    async fn test_unreachable_backend_yields_none() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(client.request(Method::Get, "/vessels/0/1", None).await.is_none());
    }
}
