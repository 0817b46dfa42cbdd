//! HTTP transport for the data client.
//!
//! This module provides the [`HttpTransport`] type, a thin wrapper over
//! `reqwest` that issues one request and returns a [`TransportResponse`]
//! carrying the status, status line, raw text, and JSON-parsed body.
//!
//! The transport decides only transport-level success: a non-2xx status is
//! returned as [`ClientError::Http`] with the full response preserved for
//! inspection. Envelope interpretation is the parser policy's job.

use std::collections::HashMap;

use serde_json::Value;

use crate::clients::errors::{ClientError, HttpFailure};
use crate::config::RequestOverrides;

/// HTTP methods supported by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for replacing resources.
    Put,
    /// HTTP PATCH method for partial updates.
    Patch,
    /// HTTP DELETE method for removing resources.
    Delete,
    /// HTTP OPTIONS method.
    Options,
}

impl Method {
    /// Returns the corresponding `reqwest` method.
    #[must_use]
    pub const fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Patch => write!(f, "PATCH"),
            Self::Delete => write!(f, "DELETE"),
            Self::Options => write!(f, "OPTIONS"),
        }
    }
}

/// A single outbound request.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    /// The fully composed URL (path segments and query already applied).
    pub url: String,
    /// The HTTP method.
    pub method: Method,
    /// Headers for this request (content type plus configured extras).
    pub headers: HashMap<String, String>,
    /// The request body, if any.
    pub body: Option<Value>,
}

/// A transport-successful (2xx) response.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: u16,
    /// The status-line reason phrase.
    pub status_text: String,
    /// The raw response body text.
    pub text: String,
    /// The body parsed as JSON, or `Value::Null` if unparsable.
    pub body: Value,
}

/// The HTTP transport collaborator.
///
/// One transport is owned per client instance. It performs no retries, no
/// caching, and enforces no timeout of its own; a timeout may be passed
/// through opaquely via [`RequestOverrides`].
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

// Verify HttpTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpTransport>();
};

impl HttpTransport {
    /// Creates a new transport.
    ///
    /// # Panics
    ///
    /// Panics if the underlying reqwest client cannot be created. This should
    /// only happen in extremely unusual circumstances (e.g., TLS
    /// initialization failure).
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }

    /// Sends one request and returns the parsed response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] for network-level failures and
    /// [`ClientError::Http`] for non-2xx responses.
    pub async fn send(
        &self,
        request: TransportRequest,
        overrides: &RequestOverrides,
    ) -> Result<TransportResponse, ClientError> {
        tracing::debug!(method = %request.method, url = %request.url, "dispatching request");

        let mut builder = self
            .client
            .request(request.method.as_reqwest(), &request.url);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        for (key, value) in &overrides.headers {
            builder = builder.header(key, value);
        }
        if let Some(timeout) = overrides.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            // JSON bodies serialize as-is; a string body is sent verbatim so
            // non-JSON content types can carry preformatted payloads.
            let payload = match body {
                Value::String(text) => text,
                other => other.to_string(),
            };
            builder = builder.body(payload);
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string();
        let success = response.status().is_success();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        if success {
            Ok(TransportResponse {
                status,
                status_text,
                text,
                body,
            })
        } else {
            Err(ClientError::Http(HttpFailure {
                status,
                status_text,
                text,
                body,
            }))
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}
