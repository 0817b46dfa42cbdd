//! Response interpretation policies.
//!
//! Both client variants share one engine and differ only in how a transport
//! response is interpreted. That difference is captured by the
//! [`ResponseParser`] trait with two implementations:
//!
//! - [`EnvelopeParser`]: assumes the conventional envelope
//!   `{code, msg, data: {results, sum, page, numpages, size, facet}}`.
//!   Success iff `code == 200`; item lists come from `data.results`; the
//!   stored raw state is `data` untouched.
//! - [`CustomParser`]: no envelope assumption. A caller-supplied
//!   `parse_data` extractor yields the item list; `None` is a failure with
//!   the raw response as payload. Without an extractor every response is
//!   treated as successful.
//!
//! Transport-level failures short-circuit before either policy runs.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::clients::errors::ClientError;
use crate::clients::transport::TransportResponse;

/// Extractor for the generic client: raw response body in, items out.
///
/// Returning `None` marks the response as a failure even though the
/// transport call itself succeeded.
pub type ParseDataFn = Arc<dyn Fn(&Value) -> Option<Vec<Value>> + Send + Sync>;

/// The raw page state a conventional client starts with (and falls back to
/// when a success envelope carries no `data`).
#[must_use]
pub fn initial_page_data() -> Value {
    json!({
        "numpages": 1,
        "sum": 0,
        "results": [],
        "facet": [],
        "page": 1,
        "size": 1
    })
}

/// Default load-more merge: incoming items appended after the previous ones.
#[must_use]
pub fn merge_for_load_more(mut previous: Vec<Value>, incoming: Vec<Value>) -> Vec<Value> {
    previous.extend(incoming);
    previous
}

/// A pluggable response-interpretation strategy.
pub trait ResponseParser: Send + Sync {
    /// Decides success or failure of a transport-successful response.
    ///
    /// # Errors
    ///
    /// Returns the policy's application-level failure when the response is
    /// not a success.
    fn check(&self, response: &TransportResponse) -> Result<(), ClientError>;

    /// Extracts the item list for a collection fetch.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Parse`] when extraction yields nothing.
    fn items(&self, response: &TransportResponse) -> Result<Vec<Value>, ClientError>;

    /// Returns the value stored as the raw envelope after a collection fetch.
    fn raw(&self, response: &TransportResponse) -> Value;

    /// Extracts the single item for a current-item fetch.
    fn current_item(&self, response: &TransportResponse) -> Option<Value>;
}

/// Policy for the conventional `{code, msg, data}` envelope.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvelopeParser;

impl ResponseParser for EnvelopeParser {
    fn check(&self, response: &TransportResponse) -> Result<(), ClientError> {
        let code = response.body.get("code").and_then(Value::as_i64);
        if code == Some(200) {
            return Ok(());
        }
        Err(ClientError::Api {
            code: code.unwrap_or_default(),
            msg: response
                .body
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            envelope: response.body.clone(),
        })
    }

    fn items(&self, response: &TransportResponse) -> Result<Vec<Value>, ClientError> {
        Ok(response
            .body
            .get("data")
            .and_then(|data| data.get("results"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    fn raw(&self, response: &TransportResponse) -> Value {
        response
            .body
            .get("data")
            .cloned()
            .unwrap_or_else(initial_page_data)
    }

    fn current_item(&self, response: &TransportResponse) -> Option<Value> {
        self.items(response).ok()?.into_iter().next()
    }
}

/// Policy for arbitrary response shapes via a caller-supplied extractor.
#[derive(Clone, Default)]
pub struct CustomParser {
    pub(crate) parse_data: Option<ParseDataFn>,
}

impl std::fmt::Debug for CustomParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomParser")
            .field("parse_data", &self.parse_data.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl CustomParser {
    /// Creates a policy with the given extractor.
    #[must_use]
    pub fn new(parse_data: Option<ParseDataFn>) -> Self {
        Self { parse_data }
    }
}

impl ResponseParser for CustomParser {
    // Single-shot verbs never apply the extractor; any 2xx response is a
    // success as-is.
    fn check(&self, _response: &TransportResponse) -> Result<(), ClientError> {
        Ok(())
    }

    fn items(&self, response: &TransportResponse) -> Result<Vec<Value>, ClientError> {
        match &self.parse_data {
            Some(parse) => parse(&response.body).ok_or_else(|| ClientError::Parse {
                payload: response.body.clone(),
            }),
            None => Ok(response
                .body
                .as_array()
                .cloned()
                .unwrap_or_default()),
        }
    }

    fn raw(&self, response: &TransportResponse) -> Value {
        response.body.clone()
    }

    fn current_item(&self, response: &TransportResponse) -> Option<Value> {
        if response.body.is_null() {
            None
        } else {
            Some(response.body.clone())
        }
    }
}
