use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::auth::AuthContext;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::services::multipart::{MultipartForm, PartValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartForm),
}

/// A fully resolved request, ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base, e.g. `/goals/add`
    pub path: String,
    /// Absolute URL (base + path), without the query string
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn multipart(&self) -> Option<&MultipartForm> {
        match &self.body {
            RequestBody::Multipart(form) => Some(form),
            _ => None,
        }
    }

    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Status and raw body of a response
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into [`ApiError::Status`]
    pub fn ensure_success(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Sends requests over the wire
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// Production transport backed by reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn multipart_form(form: MultipartForm) -> Result<reqwest::multipart::Form, ApiError> {
        let mut out = reqwest::multipart::Form::new();
        for part in form.into_parts() {
            out = match part.value {
                PartValue::Text(text) => out.text(part.name, text),
                PartValue::File(file) => {
                    let file_part = reqwest::multipart::Part::bytes(file.bytes)
                        .file_name(file.file_name)
                        .mime_str(&file.content_type)
                        .map_err(|e| {
                            ApiError::Transport(format!(
                                "invalid content type '{}': {}",
                                file.content_type, e
                            ))
                        })?;
                    out.part(part.name, file_part)
                }
            };
        }
        Ok(out)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(Self::multipart_form(form)?),
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Transport("request timed out".to_string())
            } else {
                ApiError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {}", e)))?;

        Ok(ApiResponse { status, body })
    }
}

/// API client for communicating with the finance backend
///
/// Every request is scoped to the signed-in user: the auth header is taken
/// from the [`AuthContext`] at send time, and requests fail with
/// [`ApiError::Unauthenticated`] before anything is sent when no session
/// exists. Non-2xx answers are returned as responses, callers decide with
/// [`ApiResponse::ensure_success`] whether that is an error.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    auth: AuthContext,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    /// Create a client talking to the configured API over HTTP
    pub fn new(config: &ClientConfig, auth: AuthContext) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::with_transport(config.api_url(), auth, Arc::new(transport)))
    }

    /// Create a client with a custom transport
    pub fn with_transport(
        base_url: impl Into<String>,
        auth: AuthContext,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            transport,
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ApiResponse, ApiError> {
        self.send(Method::Get, path, query, RequestBody::Empty).await
    }

    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send(Method::Post, path, &[], RequestBody::Json(value)).await
    }

    pub async fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResponse, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.send(Method::Put, path, &[], RequestBody::Json(value)).await
    }

    pub async fn post_multipart(&self, path: &str, form: MultipartForm) -> Result<ApiResponse, ApiError> {
        self.send(Method::Post, path, &[], RequestBody::Multipart(form)).await
    }

    pub async fn put_multipart(&self, path: &str, form: MultipartForm) -> Result<ApiResponse, ApiError> {
        self.send(Method::Put, path, &[], RequestBody::Multipart(form)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(Method::Delete, path, &[], RequestBody::Empty).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<ApiResponse, ApiError> {
        let headers = self.auth.auth_headers().await?;
        let request = ApiRequest {
            method,
            path: path.to_string(),
            url: format!("{}{}", self.base_url, path),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            headers,
            body,
        };

        debug!("{} {}", method.as_str(), request.url);
        let response = self.transport.send(request).await?;
        debug!("{} {} -> {}", method.as_str(), path, response.status);
        Ok(response)
    }
}
