//! Insertion-ordered multimap used for query parameters and headers.

/// Ordered map from key to an ordered list of values.
///
/// Keys keep the order in which they were first inserted and each key keeps
/// its values in insertion order. Header maps compare keys ASCII
/// case-insensitively while query maps compare them exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiMap {
    entries: Vec<(String, Vec<String>)>,
    case_insensitive: bool,
}

impl MultiMap {
    /// Create an empty map with exact key comparison.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map whose keys compare case-insensitively.
    pub fn headers() -> Self {
        Self {
            entries: Vec::new(),
            case_insensitive: true,
        }
    }

    fn key_eq(&self, stored: &str, key: &str) -> bool {
        if self.case_insensitive {
            stored.eq_ignore_ascii_case(key)
        } else {
            stored == key
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| self.key_eq(k, key))
    }

    /// Append a value under `key`, after any values already present.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.get_all(key).first().map(String::as_str)
    }

    /// All values stored under `key`, in insertion order.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.position(key)
            .map(|idx| self.entries[idx].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Flattened `(key, value)` pairs, grouped by key in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse a raw query string into an ordered multimap.
///
/// Keys and values are percent-decoded and `+` is treated as a space.
/// A key without `=` gets an empty value.
pub fn parse_query_string(query: &str) -> MultiMap {
    let mut params = MultiMap::new();
    for pair in query.split('&').filter(|s| !s.is_empty()) {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        params.append(decode_component(key), decode_component(value));
    }
    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}
