//! The shared client engine.
//!
//! [`Client`] holds the state store, the broadcast channels, the fluent
//! request-configuration operators, the request executor, and the local
//! mutation operators. It is generic over a [`ResponseParser`] policy; the
//! two public variants instantiate it with the conventional envelope policy
//! ([`crate::DataClient`]) and the caller-supplied extractor policy
//! ([`crate::DataClientPro`]).
//!
//! # Concurrency
//!
//! All methods take `&self`; the state sits behind a lock that is never held
//! across an await. Overlapping in-flight calls on one instance are allowed:
//! last write wins, and a shared loading channel can flicker when two calls
//! overlap. That is a documented limitation, not something the engine hides.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;
use tokio::sync::watch;

use crate::clients::errors::{error_message, ClientError};
use crate::clients::response::ResponseParser;
use crate::clients::state::{
    bump_sum, id_is_set, is_falsy, merge_fields, mirror_results, segment, Channels, ClientState,
};
use crate::clients::transport::{HttpTransport, Method, TransportRequest, TransportResponse};
use crate::config::{ClientOptions, Options, Query};
use crate::url::{append_query, url_join};

/// A stateful REST data client parameterized by a response policy.
///
/// See [`crate::DataClient`] and [`crate::DataClientPro`] for construction.
#[derive(Debug)]
pub struct Client<P> {
    parser: P,
    transport: HttpTransport,
    state: RwLock<ClientState>,
    channels: Channels,
}

impl<P: ResponseParser> Client<P> {
    pub(crate) fn with_parser(
        url: impl Into<String>,
        options: ClientOptions,
        initial: Vec<Value>,
        initial_raw: Value,
        parser: P,
    ) -> Self {
        let mut state = ClientState::new(url.into(), initial_raw.clone(), initial.clone());
        state.options.merge(&options);
        state.size = options.size;
        state.catch_error = options.catch_error.or_else(|| {
            Some(Arc::new(|error: &ClientError| {
                tracing::error!(%error, "request failed");
            }))
        });
        state.catch_msg = options.catch_msg;

        Self {
            parser,
            transport: HttpTransport::new(),
            state: RwLock::new(state),
            channels: Channels::new(initial_raw, initial),
        }
    }

    fn state(&self) -> RwLockReadGuard<'_, ClientState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, ClientState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // * -------------------------------- Chain operators

    /// Stages an id segment for the very next request-issuing call.
    ///
    /// Single-use: cleared by every request-issuing operation immediately
    /// after it builds its URL, success or failure.
    pub fn id(&self, id: impl Into<Value>) -> &Self {
        self.state_mut().id = id.into();
        self
    }

    /// Stages a path suffix for the very next request-issuing call.
    ///
    /// Single-use, like [`Client::id`].
    pub fn path(&self, path: impl Into<String>) -> &Self {
        self.state_mut().path = path.into();
        self
    }

    /// Changes the client base URL. Sticky; see [`Client::url_reset`].
    pub fn url(&self, url: impl Into<String>) -> &Self {
        self.state_mut().url = url.into();
        self
    }

    /// Restores the construction-time base URL.
    pub fn url_reset(&self) -> &Self {
        let mut state = self.state_mut();
        state.url = state.origin_url.clone();
        drop(state);
        self
    }

    /// Replaces the sticky query parameters for collection fetches.
    ///
    /// Pure local state, so the query channel republishes immediately rather
    /// than waiting for the next request.
    pub fn query(&self, query: Query) -> &Self {
        self.state_mut().query = query.clone();
        self.channels.query.send_replace(query);
        self
    }

    /// Sets the page for collection fetches. Sticky.
    pub fn page(&self, page: u64) -> &Self {
        self.state_mut().page = Some(page);
        self
    }

    /// Sets the page size for collection fetches. Sticky.
    pub fn size(&self, size: u64) -> &Self {
        self.state_mut().size = Some(size);
        self
    }

    /// Merges an options patch into the current configuration.
    pub fn options(&self, patch: ClientOptions) -> &Self {
        let mut state = self.state_mut();
        state.options.merge(&patch);
        if let Some(size) = patch.size {
            state.size = Some(size);
        }
        if let Some(hook) = patch.catch_error {
            state.catch_error = Some(hook);
        }
        if let Some(hook) = patch.catch_msg {
            state.catch_msg = Some(hook);
        }
        drop(state);
        self
    }

    /// Designates the current item by identifier.
    ///
    /// Use with [`Client::fetch_current`] or [`Client::fetch_current_local`].
    pub fn current(&self, id: impl Into<Value>) -> &Self {
        self.state_mut().current = id.into();
        self
    }

    // * -------------------------------- Request executor

    /// Runs one transport call: loading flag around the call, policy check
    /// (unless skipped), extraction, and failure hooks before the error is
    /// re-raised.
    async fn run<T>(
        &self,
        url: String,
        method: Method,
        body: Option<Value>,
        loading: Option<&watch::Sender<bool>>,
        checked: bool,
        extract: impl FnOnce(&TransportResponse) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        let (headers, overrides) = {
            let state = self.state();
            let mut headers = HashMap::new();
            headers.insert(
                "Content-Type".to_string(),
                state.options.content_type.as_mime().to_string(),
            );
            (headers, state.options.request_overrides.clone())
        };

        if let Some(flag) = loading {
            flag.send_replace(true);
        }
        let request = TransportRequest {
            url,
            method,
            headers,
            body,
        };
        let outcome = match self.transport.send(request, &overrides).await {
            Ok(response) => {
                let checked = if checked {
                    self.parser.check(&response)
                } else {
                    Ok(())
                };
                checked.and_then(|()| extract(&response))
            }
            Err(error) => Err(error),
        };
        // The loading flag returns to false on both terminal paths.
        if let Some(flag) = loading {
            flag.send_replace(false);
        }

        outcome.map_err(|error| {
            self.report_failure(&error);
            error
        })
    }

    fn report_failure(&self, error: &ClientError) {
        let (catch_error, catch_msg) = {
            let state = self.state();
            (state.catch_error.clone(), state.catch_msg.clone())
        };
        if let Some(hook) = catch_error {
            hook(error);
        }
        if let Some(hook) = catch_msg {
            hook(&error_message(error));
        }
    }

    /// A low-level request that captures no state: the composed URL is used
    /// verbatim, nothing is staged or stored, no loading channel fires, and
    /// the response policy is not applied (any 2xx body passes through).
    /// Failure hooks still apply.
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn raw_request(
        &self,
        url: impl Into<String>,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ClientError> {
        self.run(url.into(), method, body, None, false, |response| {
            Ok(response.body.clone())
        })
        .await
    }

    fn verb_url(&self) -> String {
        let mut state = self.state_mut();
        let (id, path) = state.take_id_path();
        url_join(&state.url, [id, path], state.options.add_back_slash)
    }

    async fn send_verb(&self, method: Method, body: Option<Value>) -> Result<Value, ClientError> {
        let url = self.verb_url();
        self.run(url, method, body, None, true, |response| {
            Ok(response.body.clone())
        })
        .await
    }

    /// Fetches a single record (`GET` on `url/id/path`). The raw payload is
    /// returned and nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn get(&self) -> Result<Value, ClientError> {
        self.send_verb(Method::Get, None).await
    }

    /// Creates a record (`POST` on `url/id/path`).
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn post(&self, body: Option<Value>) -> Result<Value, ClientError> {
        self.send_verb(Method::Post, body).await
    }

    /// Replaces a record (`PUT` on `url/id/path`).
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn put(&self, body: Option<Value>) -> Result<Value, ClientError> {
        self.send_verb(Method::Put, body).await
    }

    /// Partially updates a record (`PATCH` on `url/id/path`).
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn patch(&self, body: Option<Value>) -> Result<Value, ClientError> {
        self.send_verb(Method::Patch, body).await
    }

    /// Deletes a record (`DELETE` on `url/id/path`).
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn delete(&self, body: Option<Value>) -> Result<Value, ClientError> {
        self.send_verb(Method::Delete, body).await
    }

    /// Sends an `OPTIONS` request on `url/id/path`.
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn option(&self, body: Option<Value>) -> Result<Value, ClientError> {
        self.send_verb(Method::Options, body).await
    }

    // * -------------------------------- Collection plumbing

    /// Composes the collection URL: `url/path` plus size, page, and the
    /// sticky query (query keys win on conflict). Consumes `id`/`path`.
    pub(crate) fn collection_url(&self, include_default_page: bool) -> String {
        let mut state = self.state_mut();
        let mut query = Query::new();
        if let Some(size) = state.size {
            query.insert("size".to_string(), size.to_string());
        }
        match (state.page, include_default_page) {
            (Some(page), _) => {
                query.insert("page".to_string(), page.to_string());
            }
            (None, true) => {
                query.insert("page".to_string(), "1".to_string());
            }
            (None, false) => {}
        }
        for (key, value) in &state.query {
            query.insert(key.clone(), value.clone());
        }
        let (_, path) = state.take_id_path();
        let url = url_join(&state.url, [path], state.options.add_back_slash);
        append_query(&url, &query)
    }

    /// Issues a collection fetch and extracts `(raw, items)` per the policy.
    pub(crate) async fn collection_request(
        &self,
        include_default_page: bool,
    ) -> Result<(Value, Vec<Value>), ClientError> {
        let url = self.collection_url(include_default_page);
        self.run(
            url,
            Method::Get,
            None,
            Some(&self.channels.data_loading),
            true,
            |response| {
                let items = self.parser.items(response)?;
                Ok((self.parser.raw(response), items))
            },
        )
        .await
    }

    /// Stores a fetched collection and republishes raw and items.
    pub(crate) fn store_collection(&self, raw: Value, items: Vec<Value>) {
        {
            let mut state = self.state_mut();
            state.raw = raw;
            state.items = items;
        }
        self.emit();
    }

    /// Republishes the raw envelope and item list channels.
    pub(crate) fn emit(&self) {
        let (raw, items) = {
            let state = self.state();
            (state.raw.clone(), state.items.clone())
        };
        self.channels.raw.send_replace(raw);
        self.channels.items.send_replace(items);
    }

    // * -------------------------------- Current item

    /// Fetches the current item from the server (`GET` on
    /// `url/current/path`), stores it, republishes the current-item channel,
    /// and overwrites the matching local item as a side effect.
    ///
    /// # Errors
    ///
    /// Returns the failure after invoking the configured hooks.
    pub async fn fetch_current(&self) -> Result<Option<Value>, ClientError> {
        let (url, current_id) = {
            let mut state = self.state_mut();
            let current = segment(&state.current);
            let (_, path) = state.take_id_path();
            let url = url_join(
                &state.url,
                [Some(current), path],
                state.options.add_back_slash,
            );
            (url, state.current.clone())
        };

        let item = self
            .run(
                url,
                Method::Get,
                None,
                Some(&self.channels.current_loading),
                true,
                |response| Ok(self.parser.current_item(response)),
            )
            .await?;

        let Some(item) = item else {
            return Ok(None);
        };
        self.state_mut().current_item = Some(item.clone());
        self.channels.current.send_replace(Some(item.clone()));
        self.patch_by_id(&current_id, &item);
        Ok(Some(item))
    }

    /// Resolves the current item from the held collection, with no network
    /// call. Returns `None` (and publishes nothing) when absent.
    pub fn fetch_current_local(&self) -> Option<Value> {
        let found = {
            let state = self.state();
            if !id_is_set(&state.current) {
                return None;
            }
            state
                .items
                .iter()
                .find(|item| item.get(&state.options.id_attribute) == Some(&state.current))
                .cloned()
        };
        if let Some(item) = &found {
            self.state_mut().current_item = Some(item.clone());
            self.channels.current.send_replace(Some(item.clone()));
        }
        found
    }

    // * -------------------------------- Local mutation operators

    /// Replaces the held collection wholesale.
    ///
    /// Deliberately leaves the envelope `sum` counter untouched; callers
    /// distinguishing bulk replace from incremental edit rely on that.
    pub fn update_local(&self, items: Vec<Value>) -> Vec<Value> {
        {
            let mut guard = self.state_mut();
            let state = &mut *guard;
            state.items = items;
            mirror_results(&mut state.raw, &state.items);
        }
        self.emit();
        self.get_data()
    }

    /// Appends one item locally; `sum` increments by one. A falsy value
    /// (null, `false`, zero, empty string) is a no-op with no publish.
    pub fn append_local(&self, item: Value) -> Vec<Value> {
        if is_falsy(&item) {
            return self.get_data();
        }
        {
            let mut guard = self.state_mut();
            let state = &mut *guard;
            state.items.push(item);
            bump_sum(&mut state.raw, 1);
            mirror_results(&mut state.raw, &state.items);
        }
        self.emit();
        self.get_data()
    }

    /// Prepends one item locally; `sum` increments by one. A falsy value
    /// (null, `false`, zero, empty string) is a no-op with no publish.
    pub fn prepend_local(&self, item: Value) -> Vec<Value> {
        if is_falsy(&item) {
            return self.get_data();
        }
        {
            let mut guard = self.state_mut();
            let state = &mut *guard;
            state.items.insert(0, item);
            bump_sum(&mut state.raw, 1);
            mirror_results(&mut state.raw, &state.items);
        }
        self.emit();
        self.get_data()
    }

    /// Shallow-merges a partial record into the item matching the staged id,
    /// in place, leaving every other item untouched. Also updates the
    /// current item when the staged id is the current selection. No-op when
    /// no item matches or the id is unset.
    pub fn patch_local(&self, partial: &Value) {
        let id = self.take_staged_id();
        if !id_is_set(&id) {
            return;
        }
        self.patch_by_id(&id, partial);
    }

    /// Alias of [`Client::patch_local`].
    pub fn put_local(&self, partial: &Value) {
        self.patch_local(partial);
    }

    /// Removes the item matching the staged id; `sum` decrements by one.
    /// No-op when no item matches.
    pub fn delete_local(&self) -> Vec<Value> {
        let id = self.take_staged_id();
        if id_is_set(&id) {
            let removed = {
                let mut guard = self.state_mut();
                let state = &mut *guard;
                let attribute = state.options.id_attribute.clone();
                let before = state.items.len();
                state.items.retain(|item| item.get(&attribute) != Some(&id));
                let removed = state.items.len() != before;
                if removed {
                    bump_sum(&mut state.raw, -1);
                    mirror_results(&mut state.raw, &state.items);
                }
                removed
            };
            if removed {
                self.emit();
            }
        }
        self.get_data()
    }

    /// Consumes the staged single-use id (and path), like a request would.
    fn take_staged_id(&self) -> Value {
        let mut state = self.state_mut();
        state.path.clear();
        std::mem::replace(&mut state.id, Value::Null)
    }

    pub(crate) fn patch_by_id(&self, id: &Value, partial: &Value) {
        let mutated = {
            let mut guard = self.state_mut();
            let state = &mut *guard;
            let attribute = state.options.id_attribute.clone();
            let mut mutated = false;
            if let Some(item) = state
                .items
                .iter_mut()
                .find(|item| item.get(&attribute) == Some(id))
            {
                merge_fields(item, partial);
                mutated = true;
            }
            if mutated {
                mirror_results(&mut state.raw, &state.items);
            }
            if state.current == *id {
                if let Some(current) = state.current_item.as_mut() {
                    if current.get(&attribute) == Some(id) {
                        merge_fields(current, partial);
                    }
                }
            }
            mutated
        };
        if mutated {
            self.emit();
        }
    }

    // * -------------------------------- Accessors

    /// Returns the held item collection.
    #[must_use]
    pub fn get_data(&self) -> Vec<Value> {
        self.state().items.clone()
    }

    /// Returns the last-known raw envelope.
    #[must_use]
    pub fn get_raw_data(&self) -> Value {
        self.state().raw.clone()
    }

    /// Returns the current selection identifier.
    #[must_use]
    pub fn get_current(&self) -> Value {
        self.state().current.clone()
    }

    /// Returns the materialized current item.
    #[must_use]
    pub fn get_current_data(&self) -> Option<Value> {
        self.state().current_item.clone()
    }

    /// Returns the sticky query parameters.
    #[must_use]
    pub fn get_query(&self) -> Query {
        self.state().query.clone()
    }

    /// Returns the resolved options.
    #[must_use]
    pub fn get_options(&self) -> Options {
        self.state().options.clone()
    }

    /// Returns the current base URL.
    #[must_use]
    pub fn get_url(&self) -> String {
        self.state().url.clone()
    }

    /// Returns the page size, when set.
    #[must_use]
    pub fn get_size(&self) -> Option<u64> {
        self.state().size
    }

    /// Returns the page for the next collection fetch (1 when never set).
    #[must_use]
    pub fn get_page(&self) -> u64 {
        self.state().page.unwrap_or(1)
    }

    // * -------------------------------- Subscriptions

    /// Subscribes to the raw envelope channel.
    #[must_use]
    pub fn subscribe_raw_data(&self) -> watch::Receiver<Value> {
        self.channels.raw.subscribe()
    }

    /// Subscribes to the item list channel.
    #[must_use]
    pub fn subscribe_data(&self) -> watch::Receiver<Vec<Value>> {
        self.channels.items.subscribe()
    }

    /// Subscribes to the current item channel.
    #[must_use]
    pub fn subscribe_current_data(&self) -> watch::Receiver<Option<Value>> {
        self.channels.current.subscribe()
    }

    /// Subscribes to the bulk-fetch loading channel.
    #[must_use]
    pub fn subscribe_data_loading(&self) -> watch::Receiver<bool> {
        self.channels.data_loading.subscribe()
    }

    /// Subscribes to the current-item loading channel.
    #[must_use]
    pub fn subscribe_current_loading(&self) -> watch::Receiver<bool> {
        self.channels.current_loading.subscribe()
    }

    /// Subscribes to the query channel.
    #[must_use]
    pub fn subscribe_query(&self) -> watch::Receiver<Query> {
        self.channels.query.subscribe()
    }

    /// Publishes a bulk-fetch loading value directly.
    pub fn set_data_loading(&self, loading: bool) {
        self.channels.data_loading.send_replace(loading);
    }

    /// Publishes a current-item loading value directly.
    pub fn set_current_loading(&self, loading: bool) {
        self.channels.current_loading.send_replace(loading);
    }

    // State hooks used by the variant-specific impls.

    pub(crate) fn sync_counters(&self, raw: &Value) {
        let mut state = self.state_mut();
        state.numpages = raw.get("numpages").and_then(Value::as_u64).unwrap_or(0);
        state.page = Some(raw.get("page").and_then(Value::as_u64).unwrap_or(1));
        state.sum = raw.get("sum").and_then(Value::as_i64).unwrap_or(0);
    }

    pub(crate) fn replace_raw(&self, raw: Value) {
        self.state_mut().raw = raw;
    }

    pub(crate) fn merge_raw_and_adopt_results(&self, raw: &Value) {
        let mut guard = self.state_mut();
        let state = &mut *guard;
        merge_fields(&mut state.raw, raw);
        state.items = state
            .raw
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
    }
}
