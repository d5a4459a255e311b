//! URL and query-string helpers.
//!
//! Query strings are treated as ordered `key=value` pair lists, encoded with
//! `application/x-www-form-urlencoded` rules.

use url::Url;

/// Returns `true` if `url` is a fully-qualified URL with a scheme and a host.
///
/// `"https://dummyjson.com/products"` is absolute; `"/products"`,
/// `"products?limit=5"` and `"localhost:8080/x"` are not.
#[must_use]
pub fn is_absolute(url: &str) -> bool {
    Url::parse(url).is_ok_and(|parsed| parsed.has_host())
}

/// Decoded query pairs of `url`, in order.
#[must_use]
pub fn query_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// First value of the query parameter `name`.
#[must_use]
pub fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Replaces the whole query of `url` with `pairs`; no pairs removes the query.
pub fn set_query_pairs<K, V>(url: &mut Url, pairs: impl IntoIterator<Item = (K, V)>)
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs = pairs.into_iter().peekable();
    if pairs.peek().is_none() {
        url.set_query(None);
        return;
    }
    url.query_pairs_mut().clear().extend_pairs(pairs);
}

/// Merges an encoded query string into `url`.
///
/// Existing pairs whose key appears in `encoded` are dropped, the remaining
/// existing pairs keep their order, then the new pairs are appended.
pub fn merge_query(url: &mut Url, encoded: &str) {
    let incoming: Vec<(String, String)> = url::form_urlencoded::parse(encoded.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if incoming.is_empty() {
        return;
    }

    let mut pairs: Vec<(String, String)> = query_pairs(url)
        .into_iter()
        .filter(|(key, _)| !incoming.iter().any(|(new_key, _)| new_key == key))
        .collect();
    pairs.extend(incoming);
    set_query_pairs(url, pairs);
}

/// Sets `name` to `value`: the first occurrence is rewritten in place, later
/// duplicates are dropped, and an absent key goes in front of the other pairs.
pub fn replace_query_param(url: &mut Url, name: &str, value: &str) {
    let mut replaced = false;
    let mut pairs = Vec::new();
    for (key, current) in query_pairs(url) {
        if key != name {
            pairs.push((key, current));
        } else if !replaced {
            pairs.push((key, value.to_string()));
            replaced = true;
        }
    }
    if !replaced {
        pairs.insert(0, (name.to_string(), value.to_string()));
    }
    set_query_pairs(url, pairs);
}
