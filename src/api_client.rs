//! Client for the server's `/filters/*` endpoints.

use crate::config::{ApiSettings, EditorSettings, SourceType};
use crate::fields::FieldInfo;
use crate::validate::{ServerStatus, ServerValidation};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status} for {path}: {body}")]
    Status {
        status: StatusCode,
        path: String,
        body: String,
    },
    #[error("Failed to deserialize response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Body shared by `/filters/validate` and `/filters/test`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterRequest {
    pub filter_expression: String,
    pub source_type: SourceType,
    pub source_id: Option<String>,
    pub is_inverse: bool,
}

impl FilterRequest {
    pub fn new(expression: impl Into<String>, editor: &EditorSettings) -> Self {
        Self {
            filter_expression: expression.into(),
            source_type: editor.source_type,
            source_id: editor.source_id.clone(),
            is_inverse: editor.is_inverse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub is_valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub expression_tree: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResponse {
    pub is_valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub matched_count: u64,
    #[serde(default)]
    pub total_channels: u64,
    #[serde(default)]
    pub matching_channels: Vec<Value>,
    #[serde(default)]
    pub expression_tree: Option<Value>,
}

fn status_of(is_valid: bool, error: Option<String>) -> ServerStatus {
    if is_valid {
        ServerStatus::Confirmed
    } else {
        ServerStatus::Rejected {
            error: error.unwrap_or_else(|| "Rejected by server".to_string()),
        }
    }
}

impl From<ValidateResponse> for ServerValidation {
    fn from(response: ValidateResponse) -> Self {
        Self {
            status: status_of(response.is_valid, response.error),
            expression_tree: response.expression_tree,
            matched_count: None,
            total_channels: None,
        }
    }
}

impl From<TestResponse> for ServerValidation {
    fn from(response: TestResponse) -> Self {
        Self {
            status: status_of(response.is_valid, response.error),
            expression_tree: response.expression_tree,
            matched_count: Some(response.matched_count),
            total_channels: Some(response.total_channels),
        }
    }
}

/// The authoritative side of filter validation
#[async_trait]
pub trait FilterBackend: Send + Sync {
    /// The field catalog, in server order
    async fn fetch_fields(&self) -> Result<Vec<FieldInfo>, ApiError>;

    /// Structural and semantic validation without running a match
    async fn validate_expression(&self, request: &FilterRequest)
    -> Result<ValidateResponse, ApiError>;

    /// Run the expression against the selected source
    async fn test_expression(&self, request: &FilterRequest) -> Result<TestResponse, ApiError>;
}

pub struct HttpFilterBackend {
    client: Client,
    endpoint: String,
}

impl HttpFilterBackend {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        Self::decode(path, response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                path: path.to_string(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

#[async_trait]
impl FilterBackend for HttpFilterBackend {
    async fn fetch_fields(&self) -> Result<Vec<FieldInfo>, ApiError> {
        self.get("/filters/fields").await
    }

    async fn validate_expression(
        &self,
        request: &FilterRequest,
    ) -> Result<ValidateResponse, ApiError> {
        self.post("/filters/validate", request).await
    }

    async fn test_expression(&self, request: &FilterRequest) -> Result<TestResponse, ApiError> {
        self.post("/filters/test", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn backend(url: &str) -> HttpFilterBackend {
        HttpFilterBackend::new(&ApiSettings {
            endpoint: format!("{url}/"),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn request(expression: &str) -> FilterRequest {
        FilterRequest::new(expression, &EditorSettings::default())
    }

    #[tokio::test]
    async fn test_fetch_fields() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/filters/fields")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"name":"channel_name","display_name":"Channel Name","field_type":"string","nullable":false},
                    {"name":"tvg_id"}]"#,
            )
            .create_async()
            .await;

        let fields = backend(&server.url()).fetch_fields().await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].display_name, "Channel Name");
        assert_eq!(fields[1].field_type, "string");
    }

    #[tokio::test]
    async fn test_validate_sends_request_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/filters/validate")
            .match_body(Matcher::Json(json!({
                "filter_expression": "channel_name contains \"x\"",
                "source_type": "stream",
                "source_id": null,
                "is_inverse": false,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"is_valid":false,"error":"bad field"}"#)
            .create_async()
            .await;

        let response = backend(&server.url())
            .validate_expression(&request(r#"channel_name contains "x""#))
            .await
            .unwrap();
        mock.assert_async().await;

        let merged = ServerValidation::from(response);
        assert_eq!(
            merged.status,
            ServerStatus::Rejected {
                error: "bad field".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_test_endpoint_carries_counts() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/filters/test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"is_valid":true,"matched_count":3,"total_channels":120,
                    "matching_channels":[{"name":"BBC One"}],
                    "expression_tree":{"type":"condition","field":"channel_name","operator":"contains","value":"BBC"}}"#,
            )
            .create_async()
            .await;

        let response = backend(&server.url())
            .test_expression(&request(r#"channel_name contains "BBC""#))
            .await
            .unwrap();
        assert_eq!(response.matching_channels.len(), 1);

        let merged = ServerValidation::from(response);
        assert_eq!(merged.status, ServerStatus::Confirmed);
        assert_eq!(merged.matched_count, Some(3));
        assert_eq!(merged.total_channels, Some(120));
        assert!(merged.expression_tree.is_some());
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/filters/fields")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let err = backend(&server.url()).fetch_fields().await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE));
        assert!(err.to_string().contains("maintenance"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/filters/validate")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = backend(&server.url())
            .validate_expression(&request("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
