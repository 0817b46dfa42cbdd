//! Error types for the data client.
//!
//! This module contains the failure taxonomy shared by both client variants:
//!
//! - [`ClientError::Transport`]: network-level failures (DNS, connect, timeout)
//! - [`ClientError::Http`]: non-2xx responses, carrying the full response
//! - [`ClientError::Api`]: a 2xx response whose envelope `code` is not 200
//! - [`ClientError::Parse`]: the caller-supplied extractor produced no data
//!
//! It also provides [`error_message`], the human-readable message derivation
//! used to feed the `catch_msg` hook.
//!
//! # Example
//!
//! ```rust,ignore
//! match client.get_all().await {
//!     Ok(items) => println!("fetched {} items", items.len()),
//!     Err(ClientError::Api { code, msg, .. }) => {
//!         println!("API error {code}: {msg}");
//!     }
//!     Err(other) => println!("{}", error_message(&other)),
//! }
//! ```

use serde_json::Value;
use thiserror::Error;

/// Fallback message used when no more specific text can be derived.
pub const FALLBACK_MESSAGE: &str = "request failed, check network and retry";

/// Error returned when a request receives a non-2xx HTTP response.
///
/// The full response is preserved so callers (and the message derivation
/// chain) can inspect the body, raw text, and status line.
#[derive(Debug, Error)]
#[error("http status {status}: {status_text}")]
pub struct HttpFailure {
    /// The HTTP status code of the response.
    pub status: u16,
    /// The status-line reason phrase (e.g. "Not Found").
    pub status_text: String,
    /// The raw response body text.
    pub text: String,
    /// The response body parsed as JSON, or `Value::Null` if unparsable.
    pub body: Value,
}

/// Unified error type for all client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A network-level failure from the underlying transport.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A non-2xx HTTP response.
    #[error(transparent)]
    Http(#[from] HttpFailure),

    /// A transport-successful response whose envelope code is not 200.
    #[error("api error code {code}: {msg}")]
    Api {
        /// The envelope `code` field (0 when absent).
        code: i64,
        /// The envelope `msg` field (empty when absent).
        msg: String,
        /// The full envelope as received.
        envelope: Value,
    },

    /// The caller-supplied `parse_data` extractor yielded no data.
    #[error("response extraction produced no data")]
    Parse {
        /// The raw response payload that failed extraction.
        payload: Value,
    },
}

/// Returns the fixed message for well-known HTTP status codes.
#[must_use]
pub const fn status_message(status: u16) -> Option<&'static str> {
    match status {
        200 => Some("The server successfully returned the requested data."),
        201 => Some("Created or modified data successfully."),
        202 => Some("The request has been queued in the background."),
        204 => Some("Deleted data successfully."),
        400 => Some("The request had an error, please retry."),
        401 => Some("Not authorized (token, username, or password is wrong)."),
        403 => Some("Authorized, but access is forbidden."),
        404 => Some("The requested record does not exist."),
        406 => Some("The requested format is not available."),
        410 => Some("The requested resource was permanently deleted."),
        422 => Some("A validation error occurred while creating the object."),
        500 => Some("A server error occurred, please check the server."),
        502 => Some("Gateway error."),
        503 => Some("Service unavailable, the server is overloaded or down for maintenance."),
        504 => Some("Gateway timeout."),
        _ => None,
    }
}

/// Derives a human-readable message from a failure.
///
/// Derivation order: explicit `msg` field on the error payload, raw response
/// text, transport message, the fixed status-code table, status-line text,
/// and finally [`FALLBACK_MESSAGE`].
#[must_use]
pub fn error_message(error: &ClientError) -> String {
    match error {
        ClientError::Api { msg, envelope, .. } => {
            if !msg.is_empty() {
                return msg.clone();
            }
            if envelope.is_null() {
                FALLBACK_MESSAGE.to_string()
            } else {
                envelope.to_string()
            }
        }
        ClientError::Http(failure) => failure
            .body
            .get("msg")
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty())
            .map(str::to_string)
            .or_else(|| (!failure.text.is_empty()).then(|| failure.text.clone()))
            .or_else(|| status_message(failure.status).map(str::to_string))
            .or_else(|| (!failure.status_text.is_empty()).then(|| failure.status_text.clone()))
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        ClientError::Transport(source) => {
            let message = source.to_string();
            if message.is_empty() {
                FALLBACK_MESSAGE.to_string()
            } else {
                message
            }
        }
        ClientError::Parse { payload } => payload
            .get("msg")
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if payload.is_null() {
                    FALLBACK_MESSAGE.to_string()
                } else {
                    payload.to_string()
                }
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_uses_envelope_msg() {
        let error = ClientError::Api {
            code: 400,
            msg: "bad".to_string(),
            envelope: json!({"code": 400, "msg": "bad"}),
        };
        assert_eq!(error_message(&error), "bad");
    }

    #[test]
    fn test_api_error_without_msg_falls_back_to_envelope_text() {
        let error = ClientError::Api {
            code: 400,
            msg: String::new(),
            envelope: json!({"code": 400}),
        };
        assert_eq!(error_message(&error), r#"{"code":400}"#);
    }

    #[test]
    fn test_http_failure_prefers_body_msg() {
        let error = ClientError::Http(HttpFailure {
            status: 400,
            status_text: "Bad Request".to_string(),
            text: r#"{"msg":"broken"}"#.to_string(),
            body: json!({"msg": "broken"}),
        });
        assert_eq!(error_message(&error), "broken");
    }

    #[test]
    fn test_http_failure_falls_back_to_raw_text() {
        let error = ClientError::Http(HttpFailure {
            status: 400,
            status_text: "Bad Request".to_string(),
            text: "plain failure".to_string(),
            body: Value::Null,
        });
        assert_eq!(error_message(&error), "plain failure");
    }

    #[test]
    fn test_http_failure_falls_back_to_status_table() {
        let error = ClientError::Http(HttpFailure {
            status: 404,
            status_text: "Not Found".to_string(),
            text: String::new(),
            body: Value::Null,
        });
        assert_eq!(
            error_message(&error),
            "The requested record does not exist."
        );
    }

    #[test]
    fn test_http_failure_falls_back_to_status_line_then_fallback() {
        let unknown_status = ClientError::Http(HttpFailure {
            status: 418,
            status_text: "I'm a teapot".to_string(),
            text: String::new(),
            body: Value::Null,
        });
        assert_eq!(error_message(&unknown_status), "I'm a teapot");

        let bare = ClientError::Http(HttpFailure {
            status: 418,
            status_text: String::new(),
            text: String::new(),
            body: Value::Null,
        });
        assert_eq!(error_message(&bare), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_parse_error_prefers_payload_msg() {
        let error = ClientError::Parse {
            payload: json!({"msg": "server says no", "extra": 1}),
        };
        assert_eq!(error_message(&error), "server says no");
    }

    #[test]
    fn test_parse_error_without_msg_falls_back_to_payload_text() {
        let error = ClientError::Parse {
            payload: json!({"anything": true}),
        };
        assert_eq!(error_message(&error), r#"{"anything":true}"#);
    }

    #[test]
    fn test_parse_error_with_null_payload_uses_fallback() {
        let error = ClientError::Parse {
            payload: Value::Null,
        };
        assert_eq!(error_message(&error), FALLBACK_MESSAGE);
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ClientError::Parse {
            payload: Value::Null,
        };
        let _: &dyn std::error::Error = &error;
    }
}
