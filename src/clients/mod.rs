//! The client engine and its two public variants.
//!
//! [`DataClient`] speaks the conventional `{code, msg, data}` envelope and
//! keeps pagination counters in sync; [`DataClientPro`] makes no assumption
//! about the response shape and delegates item extraction to the caller.
//! Both are the same engine, [`Client`], under different response policies.

pub mod core;
pub mod data_client;
pub mod errors;
pub mod pro_client;
pub mod response;
pub(crate) mod state;
pub mod transport;

pub use self::core::Client;
pub use data_client::DataClient;
pub use errors::{error_message, status_message, ClientError, HttpFailure, FALLBACK_MESSAGE};
pub use pro_client::DataClientPro;
pub use response::{
    initial_page_data, merge_for_load_more, CustomParser, EnvelopeParser, ParseDataFn,
    ResponseParser,
};
pub use transport::{HttpTransport, Method, TransportRequest, TransportResponse};
