//! Owned client state and change-notification channels.
//!
//! Every client instance owns exactly one [`ClientState`] behind a lock and
//! one [`Channels`] set. All mutation funnels through the client's operators,
//! which republish the affected channels synchronously; the state is never
//! exposed through raw setters.

use serde_json::Value;
use tokio::sync::watch;

use crate::config::{ErrorHook, MessageHook, Options, Query};

/// The mutable per-instance state.
///
/// `id` and `path` are single-use: every request-issuing operation clears
/// them immediately after building its URL, success or failure.
pub(crate) struct ClientState {
    /// Current base URL.
    pub url: String,
    /// Immutable backup of the construction-time URL, for `url_reset`.
    pub origin_url: String,
    /// Resolved options.
    pub options: Options,
    /// Failure hook (defaults to a logging hook).
    pub catch_error: Option<ErrorHook>,
    /// Message hook (no default).
    pub catch_msg: Option<MessageHook>,
    /// Page size for collection fetches, when set.
    pub size: Option<u64>,
    /// Page for collection fetches; `None` until set or synced.
    pub page: Option<u64>,
    /// Page count reported by the last conventional fetch.
    pub numpages: u64,
    /// Total reported by the last conventional fetch.
    pub sum: i64,
    /// Sticky query parameters.
    pub query: Query,
    /// Single-use id segment (`Value::Null` when unset).
    pub id: Value,
    /// Single-use path segment (empty when unset).
    pub path: String,
    /// The identifier of the current selection (`Value::Null` when unset).
    pub current: Value,
    /// The held item collection, in server/page order unless locally mutated.
    pub items: Vec<Value>,
    /// The last-known raw envelope, kept consistent with `items`.
    pub raw: Value,
    /// The materialized current item.
    pub current_item: Option<Value>,
}

impl std::fmt::Debug for ClientState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientState")
            .field("url", &self.url)
            .field("origin_url", &self.origin_url)
            .field("options", &self.options)
            .field("catch_error", &self.catch_error.as_ref().map(|_| "<hook>"))
            .field("catch_msg", &self.catch_msg.as_ref().map(|_| "<hook>"))
            .field("size", &self.size)
            .field("page", &self.page)
            .field("numpages", &self.numpages)
            .field("sum", &self.sum)
            .field("query", &self.query)
            .field("id", &self.id)
            .field("path", &self.path)
            .field("current", &self.current)
            .field("items", &self.items)
            .field("raw", &self.raw)
            .field("current_item", &self.current_item)
            .finish()
    }
}

impl ClientState {
    pub fn new(url: String, raw: Value, items: Vec<Value>) -> Self {
        Self {
            origin_url: url.clone(),
            url,
            options: Options::default(),
            catch_error: None,
            catch_msg: None,
            size: None,
            page: None,
            numpages: 1,
            sum: 0,
            query: Query::new(),
            id: Value::Null,
            path: String::new(),
            current: Value::Null,
            items,
            raw,
            current_item: None,
        }
    }

    /// Consumes the single-use `id` and `path`, returning them as URL
    /// segments (always present, empty when unset, so trailing-slash policy
    /// applies uniformly).
    pub fn take_id_path(&mut self) -> (Option<String>, Option<String>) {
        let id = Some(segment(&self.id));
        let path = Some(std::mem::take(&mut self.path));
        self.id = Value::Null;
        (id, path)
    }
}

/// Renders an identifier value as a URL segment (empty when unset).
pub(crate) fn segment(id: &Value) -> String {
    match id {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

/// True when an identifier is usable for matching (non-null, non-empty).
pub(crate) fn id_is_set(id: &Value) -> bool {
    match id {
        Value::String(text) => !text.is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}

/// True for values that carry no record: null, `false`, zero, and the empty
/// string. Appending such a value is a no-op.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Mirrors the item list into the raw envelope's `results` field, when the
/// raw value is an envelope that carries one.
pub(crate) fn mirror_results(raw: &mut Value, items: &[Value]) {
    if let Some(object) = raw.as_object_mut() {
        if object.contains_key("results") {
            object.insert("results".to_string(), Value::Array(items.to_vec()));
        }
    }
}

/// Adjusts the raw envelope's `sum` counter, when it carries a numeric one.
pub(crate) fn bump_sum(raw: &mut Value, delta: i64) {
    if let Some(object) = raw.as_object_mut() {
        if let Some(sum) = object.get("sum").and_then(Value::as_i64) {
            object.insert("sum".to_string(), Value::from(sum + delta));
        }
    }
}

/// Shallow-merges the fields of a partial object into a target object.
pub(crate) fn merge_fields(target: &mut Value, partial: &Value) {
    if let (Some(target), Some(partial)) = (target.as_object_mut(), partial.as_object()) {
        for (key, value) in partial {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// One broadcast channel per published state field.
///
/// Subscribers receive the latest value immediately and every subsequent
/// publish, in publish order.
#[derive(Debug)]
pub(crate) struct Channels {
    pub raw: watch::Sender<Value>,
    pub items: watch::Sender<Vec<Value>>,
    pub current: watch::Sender<Option<Value>>,
    pub data_loading: watch::Sender<bool>,
    pub current_loading: watch::Sender<bool>,
    pub query: watch::Sender<Query>,
}

impl Channels {
    pub fn new(raw: Value, items: Vec<Value>) -> Self {
        Self {
            raw: watch::channel(raw).0,
            items: watch::channel(items).0,
            current: watch::channel(None).0,
            data_loading: watch::channel(false).0,
            current_loading: watch::channel(false).0,
            query: watch::channel(Query::new()).0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_take_id_path_clears_both() {
        let mut state = ClientState::new("/api".to_string(), Value::Null, Vec::new());
        state.id = json!("42");
        state.path = "publish/".to_string();

        let (id, path) = state.take_id_path();
        assert_eq!(id.as_deref(), Some("42"));
        assert_eq!(path.as_deref(), Some("publish/"));
        assert!(state.id.is_null());
        assert!(state.path.is_empty());
    }

    #[test]
    fn test_segment_renders_strings_and_numbers() {
        assert_eq!(segment(&json!("abc")), "abc");
        assert_eq!(segment(&json!(42)), "42");
        assert_eq!(segment(&Value::Null), "");
    }

    #[test]
    fn test_id_is_set() {
        assert!(id_is_set(&json!("x")));
        assert!(id_is_set(&json!(0)));
        assert!(!id_is_set(&json!("")));
        assert!(!id_is_set(&Value::Null));
    }

    #[test]
    fn test_is_falsy() {
        assert!(is_falsy(&Value::Null));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!(0.0)));
        assert!(is_falsy(&json!("")));

        assert!(!is_falsy(&json!(true)));
        assert!(!is_falsy(&json!(1)));
        assert!(!is_falsy(&json!("x")));
        assert!(!is_falsy(&json!({})));
        assert!(!is_falsy(&json!([])));
    }

    #[test]
    fn test_mirror_results_only_touches_envelopes() {
        let mut raw = json!({"results": [], "sum": 0});
        mirror_results(&mut raw, &[json!({"id": "1"})]);
        assert_eq!(raw["results"], json!([{"id": "1"}]));

        let mut opaque = json!({"count": 3});
        mirror_results(&mut opaque, &[json!({"id": "1"})]);
        assert_eq!(opaque, json!({"count": 3}));
    }

    #[test]
    fn test_bump_sum() {
        let mut raw = json!({"sum": 2});
        bump_sum(&mut raw, 1);
        bump_sum(&mut raw, 1);
        bump_sum(&mut raw, -1);
        assert_eq!(raw["sum"], json!(3));

        let mut no_sum = json!({"results": []});
        bump_sum(&mut no_sum, 1);
        assert_eq!(no_sum, json!({"results": []}));
    }

    #[test]
    fn test_merge_fields_is_shallow() {
        let mut target = json!({"id": "x", "nested": {"a": 1}});
        merge_fields(&mut target, &json!({"v": 1, "nested": {"b": 2}}));
        assert_eq!(target, json!({"id": "x", "v": 1, "nested": {"b": 2}}));
    }
}
