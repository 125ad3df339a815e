use crate::domain::ports::DatasetSource;
use crate::utils::error::{Result, TabularizeError};
use crate::utils::validation::redact_url;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Fetches datasets over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: Client,
    headers: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value> {
        let shown_url = redact_url(url);
        let fetch_error = |message: String| TabularizeError::FetchError {
            url: shown_url.clone(),
            message,
        };

        let mut request = self.client.get(url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!("📡 GET {}", shown_url);
        let response = request
            .send()
            .await
            .map_err(|e| fetch_error(format!("request failed: {}", e)))?;

        let status = response.status();
        tracing::debug!("📡 Response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            let message = if body.is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {} - {}", status, body)
            };
            tracing::error!("❌ Dataset fetch failed: {}", message);
            return Err(fetch_error(message));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| fetch_error(format!("response body is not valid JSON: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_json_success() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/items").header("x-api-key", "k");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!([{"id": 1}]));
        });

        let source = HttpSource::new()
            .with_headers(HashMap::from([("x-api-key".to_string(), "k".to_string())]))
            .with_timeout(Duration::from_secs(5));
        let body = source.fetch_json(&server.url("/items")).await.unwrap();

        api_mock.assert();
        assert_eq!(body, json!([{"id": 1}]));
    }

    #[tokio::test]
    async fn test_fetch_json_non_success_status() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/items");
            then.status(404).body("dataset not found");
        });

        let err = HttpSource::new()
            .fetch_json(&server.url("/items"))
            .await
            .unwrap_err();

        api_mock.assert();
        match err {
            TabularizeError::FetchError { message, .. } => {
                assert!(message.contains("404"));
                assert!(message.contains("dataset not found"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_json_invalid_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/items");
            then.status(200).body("<html>not json</html>");
        });

        let err = HttpSource::new()
            .fetch_json(&server.url("/items"))
            .await
            .unwrap_err();
        assert!(matches!(err, TabularizeError::FetchError { .. }));
    }

    #[tokio::test]
    async fn test_fetch_error_hides_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/items");
            then.status(401);
        });

        let err = HttpSource::new()
            .fetch_json(&server.url("/items?token=secret&format=json"))
            .await
            .unwrap_err();

        let text = err.to_string();
        assert!(!text.contains("secret"));
        assert!(text.contains("format=json"));
    }
}
