//! URL composition helpers.
//!
//! This module provides [`url_join`] for combining a base URL with optional
//! path segments, and [`append_query`] for serializing query parameters in a
//! stable (sorted) order.

use crate::config::Query;

/// Joins a base URL with optional trailing segments.
///
/// Rules:
///
/// - Empty or absent segments after the first are dropped.
/// - Adjacent segments are separated by exactly one `/`, whether or not the
///   preceding segment already ends with one.
/// - If the joined result already ends with `/` it is returned unchanged;
///   otherwise a trailing `/` is appended iff `trailing_slash` is true.
/// - A single segment with no extra parts is returned unchanged, with no
///   trailing-slash logic applied.
///
/// # Example
///
/// ```rust
/// use rest_data_client::url_join;
///
/// assert_eq!(url_join("/api/objects", [], false), "/api/objects");
/// assert_eq!(
///     url_join("/api/objects", [Some("123".to_string())], true),
///     "/api/objects/123/"
/// );
/// ```
pub fn url_join<I>(first: &str, rest: I, trailing_slash: bool) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut joined = false;
    let mut result = first.to_string();
    for segment in rest.into_iter().flatten() {
        joined = true;
        if segment.is_empty() {
            continue;
        }
        if !result.ends_with('/') {
            result.push('/');
        }
        result.push_str(&segment);
    }

    // Nothing to join: the base passes through untouched.
    if !joined {
        return result;
    }

    if !result.ends_with('/') && trailing_slash {
        result.push('/');
    }
    result
}

/// Appends query parameters to a URL.
///
/// Keys are serialized in sorted order (the query map is a `BTreeMap`) and
/// values are percent-encoded. An empty query returns the URL unchanged.
#[must_use]
pub fn append_query(url: &str, query: &Query) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let pairs: Vec<String> = query
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect();
    format!("{url}?{}", pairs.join("&"))
}
