//! The conventional-envelope client.

use serde_json::Value;

use crate::clients::core::Client;
use crate::clients::errors::ClientError;
use crate::clients::response::{initial_page_data, merge_for_load_more, EnvelopeParser};
use crate::config::ClientOptions;

/// A client for backends speaking the conventional envelope:
///
/// ```json
/// {
///   "code": 200,
///   "msg": "ok",
///   "data": { "results": [], "sum": 0, "page": 1, "numpages": 1, "size": 1 }
/// }
/// ```
///
/// An envelope `code` other than 200 is a failure even on an HTTP 2xx
/// response. Collection fetches keep the pagination counters in sync and
/// always send a `page` parameter.
///
/// # Example
///
/// ```rust,no_run
/// use rest_data_client::{ClientOptions, DataClient};
///
/// # async fn run() -> Result<(), rest_data_client::ClientError> {
/// let client = DataClient::new("https://example.com/api/objects/", ClientOptions::new());
/// let items = client.page(2).size(10).get_all().await?;
/// println!("{} items on page 2", items.len());
/// # Ok(())
/// # }
/// ```
pub type DataClient = Client<EnvelopeParser>;

impl DataClient {
    /// Creates a client with an empty initial collection.
    #[must_use]
    pub fn new(url: impl Into<String>, options: ClientOptions) -> Self {
        Self::with_initial(url, options, Vec::new())
    }

    /// Creates a client seeded with an initial collection, published to
    /// subscribers immediately.
    #[must_use]
    pub fn with_initial(
        url: impl Into<String>,
        options: ClientOptions,
        initial: Vec<Value>,
    ) -> Self {
        let mut raw = initial_page_data();
        if let Some(object) = raw.as_object_mut() {
            object.insert("results".to_string(), Value::Array(initial.clone()));
        }
        Client::with_parser(url, options, initial, raw, EnvelopeParser)
    }

    /// Fetches the collection, replacing the held data.
    ///
    /// Sends `page` (default 1) and `size`/sticky query parameters, stores
    /// the envelope `data` object and its `results`, syncs the pagination
    /// counters, and republishes.
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks. The held
    /// data is left as it was.
    pub async fn get_all(&self) -> Result<Vec<Value>, ClientError> {
        let (raw, items) = self.collection_request(true).await?;
        self.sync_counters(&raw);
        self.store_collection(raw, items.clone());
        Ok(items)
    }

    /// Fetches the collection and appends it to the held data (load-more).
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn get_more(&self) -> Result<Vec<Value>, ClientError> {
        self.get_more_with(merge_for_load_more).await
    }

    /// Fetches the collection and combines it with the held data using a
    /// caller-supplied merge (previous page, incoming page).
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn get_more_with<F>(&self, merge: F) -> Result<Vec<Value>, ClientError>
    where
        F: FnOnce(Vec<Value>, Vec<Value>) -> Vec<Value>,
    {
        let (mut raw, incoming) = self.collection_request(true).await?;
        self.sync_counters(&raw);
        let merged = merge(self.get_data(), incoming);
        if let Some(object) = raw.as_object_mut() {
            object.insert("results".to_string(), Value::Array(merged.clone()));
        }
        self.store_collection(raw, merged.clone());
        Ok(merged)
    }

    /// Merges an envelope-shaped object into the held raw data locally.
    ///
    /// Top-level fields are shallow-merged and the held items adopt the
    /// merged `results`. Input without a `results` array is rejected as a
    /// no-op with no publish. Returns the (possibly unchanged) raw data.
    pub fn update_raw_data_local(&self, raw: Value) -> Value {
        if raw.get("results").and_then(Value::as_array).is_some() {
            self.merge_raw_and_adopt_results(&raw);
            self.emit();
        }
        self.get_raw_data()
    }
}

// DataClient is shared across tasks by reference.
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DataClient>();
};
