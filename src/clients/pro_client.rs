//! The free-form client for non-conventional backends.

use std::sync::Arc;

use serde_json::Value;

use crate::clients::core::Client;
use crate::clients::errors::ClientError;
use crate::clients::response::CustomParser;
use crate::config::ClientOptions;

/// A client for backends with arbitrary response shapes.
///
/// No envelope is assumed: HTTP success is the only success criterion, the
/// whole response body is the raw data, and item extraction is delegated to
/// a caller-supplied function (see [`DataClientPro::with_parse_data`]).
/// Collection fetches send `page` only when one was staged.
///
/// # Example
///
/// ```rust,no_run
/// use rest_data_client::{ClientOptions, DataClientPro};
/// use serde_json::Value;
///
/// # async fn run() -> Result<(), rest_data_client::ClientError> {
/// let client = DataClientPro::with_parse_data(
///     "https://example.com/api/items",
///     ClientOptions::new(),
///     |body: &Value| body.get("items").and_then(Value::as_array).cloned(),
/// );
/// let items = client.get_all().await?;
/// println!("{} items", items.len());
/// # Ok(())
/// # }
/// ```
pub type DataClientPro = Client<CustomParser>;

impl DataClientPro {
    /// Creates a client with no extractor: a top-level JSON array is the
    /// item list, anything else yields an empty list.
    #[must_use]
    pub fn new(url: impl Into<String>, options: ClientOptions) -> Self {
        Self::with_initial(url, options, Vec::new())
    }

    /// Creates a client seeded with an initial collection, published to
    /// subscribers immediately. The raw data starts null.
    #[must_use]
    pub fn with_initial(
        url: impl Into<String>,
        options: ClientOptions,
        initial: Vec<Value>,
    ) -> Self {
        Self::with_parser(url, options, initial, Value::Null, CustomParser::new(None))
    }

    /// Creates a client with a caller-supplied extractor mapping the raw
    /// response body to the item list. Returning `None` marks the response
    /// as unparseable and fails the fetch.
    #[must_use]
    pub fn with_parse_data(
        url: impl Into<String>,
        options: ClientOptions,
        parse_data: impl Fn(&Value) -> Option<Vec<Value>> + Send + Sync + 'static,
    ) -> Self {
        Self::with_parser(
            url,
            options,
            Vec::new(),
            Value::Null,
            CustomParser::new(Some(Arc::new(parse_data))),
        )
    }

    /// Fetches the collection, replacing the held data.
    ///
    /// The whole response body is stored as the raw data and the extractor
    /// (when present) produces the items. No pagination counters exist here;
    /// `page` is sent only when staged.
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks. The held
    /// data is left as it was.
    pub async fn get_all(&self) -> Result<Vec<Value>, ClientError> {
        let (raw, items) = self.collection_request(false).await?;
        self.store_collection(raw, items.clone());
        Ok(items)
    }

    /// Replaces the held raw data wholesale, locally.
    ///
    /// The item list is untouched; raw and items are independent on this
    /// variant. JSON null is rejected as a no-op with no publish. Returns
    /// the (possibly unchanged) raw data.
    pub fn update_raw_data_local(&self, raw: Value) -> Value {
        if !raw.is_null() {
            self.replace_raw(raw);
            self.emit();
        }
        self.get_raw_data()
    }
}

// DataClientPro is shared across tasks by reference.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DataClientPro>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_raw_data_local_replaces_wholesale() {
        let client = DataClientPro::new("/api/items", ClientOptions::new());
        client.append_local(json!({"id": "a"}));
        let raw = client.update_raw_data_local(json!({"anything": true}));
        assert_eq!(raw, json!({"anything": true}));
        // Items are not coupled to raw on this variant.
        assert_eq!(client.get_data(), vec![json!({"id": "a"})]);
    }

    #[test]
    fn test_update_raw_data_local_null_is_a_noop() {
        let client = DataClientPro::new("/api/items", ClientOptions::new());
        let mut receiver = client.subscribe_raw_data();
        receiver.borrow_and_update();
        let unchanged = client.update_raw_data_local(Value::Null);
        assert_eq!(unchanged, Value::Null);
        assert!(!receiver.has_changed().unwrap());
    }

    #[test]
    fn test_initial_raw_is_null() {
        let client = DataClientPro::new("/api/items", ClientOptions::new());
        assert_eq!(client.get_raw_data(), Value::Null);
        assert!(client.get_data().is_empty());
    }
}
