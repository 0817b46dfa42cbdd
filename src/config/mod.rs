//! Configuration types for the data client.
//!
//! This module provides the option types used to construct and reconfigure
//! a client instance:
//!
//! - [`ClientOptions`]: a patch of option overrides, merged shallowly into
//!   the current configuration (at construction and via the `options` chain
//!   operator)
//! - [`Options`]: the resolved configuration a client runs with
//! - [`ContentType`]: the fixed set of supported request MIME types
//! - [`RequestOverrides`]: opaque pass-through settings for the transport
//!
//! # Example
//!
//! ```rust
//! use rest_data_client::{ClientOptions, ContentType};
//!
//! let options = ClientOptions::new()
//!     .content_type(ContentType::Json)
//!     .id_attribute("uuid")
//!     .add_back_slash(true)
//!     .catch_msg(|msg| eprintln!("{msg}"));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::{ClientError, Method};

/// Query parameters staged for the next collection fetch.
///
/// A `BTreeMap` keeps serialization order stable (sorted by key).
pub type Query = BTreeMap<String, String>;

/// Hook invoked with every request failure before it is re-raised.
pub type ErrorHook = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// Hook invoked with the derived human-readable message of every failure.
pub type MessageHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Request body MIME types supported by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ContentType {
    /// `application/json` (the default).
    #[default]
    Json,
    /// `application/x-www-form-urlencoded`.
    FormUrlEncoded,
    /// `multipart/form-data`.
    MultipartFormData,
    /// `text/plain`.
    TextPlain,
}

impl ContentType {
    /// Returns the MIME type string for this content type.
    #[must_use]
    pub const fn as_mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::MultipartFormData => "multipart/form-data",
            Self::TextPlain => "text/plain",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Opaque pass-through settings handed to the transport on every request.
///
/// The core never interprets these; timeouts in particular are a transport
/// concern, not something the client enforces.
#[derive(Clone, Debug, Default)]
pub struct RequestOverrides {
    /// Extra headers merged into every outbound request.
    pub headers: HashMap<String, String>,
    /// Per-request timeout, if any.
    pub timeout: Option<Duration>,
}

/// A shallow patch of client options.
///
/// Every field is optional; unset fields leave the current configuration
/// untouched. Used both at construction (merged into the defaults) and by
/// the `options` chain operator (merged into the current options).
#[derive(Clone, Default)]
pub struct ClientOptions {
    /// Methods this client is expected to use (informational).
    pub accept_methods: Option<Vec<Method>>,
    /// Request body content type.
    pub content_type: Option<ContentType>,
    /// Whether composed URLs are forced to end with a `/`.
    pub add_back_slash: Option<bool>,
    /// The item field used to match records in local mutations.
    pub id_attribute: Option<String>,
    /// Default page size for collection fetches.
    pub size: Option<u64>,
    /// Transport pass-through settings.
    pub request_overrides: Option<RequestOverrides>,
    /// Failure hook, replacing the default logging hook.
    pub catch_error: Option<ErrorHook>,
    /// Human-readable message hook (no default).
    pub catch_msg: Option<MessageHook>,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("accept_methods", &self.accept_methods)
            .field("content_type", &self.content_type)
            .field("add_back_slash", &self.add_back_slash)
            .field("id_attribute", &self.id_attribute)
            .field("size", &self.size)
            .field("request_overrides", &self.request_overrides)
            .field("catch_error", &self.catch_error.as_ref().map(|_| "<hook>"))
            .field("catch_msg", &self.catch_msg.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl ClientOptions {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the methods this client is expected to use (informational).
    #[must_use]
    pub fn accept_methods(mut self, methods: Vec<Method>) -> Self {
        self.accept_methods = Some(methods);
        self
    }

    /// Sets the request body content type.
    #[must_use]
    pub const fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Sets whether composed URLs are forced to end with a `/`.
    #[must_use]
    pub const fn add_back_slash(mut self, add: bool) -> Self {
        self.add_back_slash = Some(add);
        self
    }

    /// Sets the item field used to match records in local mutations.
    #[must_use]
    pub fn id_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.id_attribute = Some(attribute.into());
        self
    }

    /// Sets the default page size for collection fetches.
    #[must_use]
    pub const fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets transport pass-through settings.
    #[must_use]
    pub fn request_overrides(mut self, overrides: RequestOverrides) -> Self {
        self.request_overrides = Some(overrides);
        self
    }

    /// Sets the failure hook, replacing the default logging hook.
    #[must_use]
    pub fn catch_error(mut self, hook: impl Fn(&ClientError) + Send + Sync + 'static) -> Self {
        self.catch_error = Some(Arc::new(hook));
        self
    }

    /// Sets the human-readable message hook.
    #[must_use]
    pub fn catch_msg(mut self, hook: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.catch_msg = Some(Arc::new(hook));
        self
    }
}

/// The resolved configuration a client instance runs with.
#[derive(Clone, Debug)]
pub struct Options {
    /// Methods this client is expected to use (informational).
    pub accept_methods: Vec<Method>,
    /// Request body content type.
    pub content_type: ContentType,
    /// Whether composed URLs are forced to end with a `/`.
    pub add_back_slash: bool,
    /// The item field used to match records in local mutations.
    pub id_attribute: String,
    /// Transport pass-through settings.
    pub request_overrides: RequestOverrides,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            accept_methods: vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Patch,
                Method::Delete,
                Method::Options,
            ],
            content_type: ContentType::Json,
            add_back_slash: false,
            id_attribute: "id".to_string(),
            request_overrides: RequestOverrides::default(),
        }
    }
}

impl Options {
    /// Applies a patch, shallowly replacing only the fields it sets.
    ///
    /// The `size` and hook fields of the patch are owned by the client state
    /// and are applied there.
    pub fn merge(&mut self, patch: &ClientOptions) {
        if let Some(methods) = &patch.accept_methods {
            self.accept_methods = methods.clone();
        }
        if let Some(content_type) = patch.content_type {
            self.content_type = content_type;
        }
        if let Some(add) = patch.add_back_slash {
            self.add_back_slash = add;
        }
        if let Some(attribute) = &patch.id_attribute {
            self.id_attribute = attribute.clone();
        }
        if let Some(overrides) = &patch.request_overrides {
            self.request_overrides = overrides.clone();
        }
    }
}
