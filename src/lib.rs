//! Reactive REST data-access clients.
//!
//! This crate wraps a JSON REST endpoint in a stateful client that holds the
//! last-fetched collection, lets you mutate it locally without a round-trip,
//! and broadcasts every change on [watch channels](tokio::sync::watch) so
//! consumers can react to data, loading flags, and the current selection.
//!
//! Two variants share one engine:
//!
//! - [`DataClient`] for backends speaking the conventional
//!   `{code, msg, data: {results, sum, page, numpages, size}}` envelope,
//!   with pagination kept in sync.
//! - [`DataClientPro`] for arbitrary response shapes, with item extraction
//!   delegated to a caller-supplied function.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use rest_data_client::{ClientOptions, DataClient, Query};
//!
//! # async fn run() -> Result<(), rest_data_client::ClientError> {
//! let client = DataClient::new("https://example.com/api/objects/", ClientOptions::new());
//!
//! // GET /api/objects/?page=1&search=demo&size=10
//! let items = client
//!     .query(Query::from([("search".to_string(), "demo".to_string())]))
//!     .size(10)
//!     .get_all()
//!     .await?;
//!
//! // Watch the collection from elsewhere.
//! let mut data = client.subscribe_data();
//! tokio::spawn(async move {
//!     while data.changed().await.is_ok() {
//!         println!("{} items", data.borrow().len());
//!     }
//! });
//!
//! // Single-record verbs stage `id`/`path` for exactly one request.
//! let record = client.id("123").get().await?;
//! # let _ = (items, record);
//! # Ok(())
//! # }
//! ```
//!
//! Local mutations update the held collection and its envelope bookkeeping
//! without touching the network:
//!
//! ```rust
//! use rest_data_client::{ClientOptions, DataClient};
//! use serde_json::json;
//!
//! let client = DataClient::new("/api/objects/", ClientOptions::new());
//! client.append_local(json!({"id": "x"}));
//! client.id("x").patch_local(&json!({"starred": true}));
//! assert_eq!(client.get_data()[0]["starred"], json!(true));
//! ```
//!
//! # Failure handling
//!
//! Every failed request is reported to the configured `catch_error` hook
//! (default: a `tracing` error event) and, when set, to `catch_msg` with a
//! human-readable message derived by [`error_message`]. The error is then
//! returned to the caller; held data is never clobbered by a failure.

pub mod clients;
pub mod config;
pub mod url;

pub use clients::{
    error_message, initial_page_data, merge_for_load_more, status_message, Client, ClientError,
    CustomParser, DataClient, DataClientPro, EnvelopeParser, HttpFailure, HttpTransport, Method,
    ParseDataFn, ResponseParser, TransportRequest, TransportResponse, FALLBACK_MESSAGE,
};
pub use config::{
    ClientOptions, ContentType, ErrorHook, MessageHook, Options, Query, RequestOverrides,
};
pub use url::{append_query, url_join};
