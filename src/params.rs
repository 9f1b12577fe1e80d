//! Parameters handed to route handlers
//!
//! A successful match produces one flat name→value map: values bound by
//! template parts (`:id`) plus every query parameter whose name was not
//! already bound by the path.

use std::collections::HashMap;

/// Merged path and query parameters for one match.
///
/// # Example
///
/// ```
/// use deeplink::RouteParams;
///
/// // Template: recipe/:id
/// // Link:     hellofresh://host/recipe/1234?token=XYZ
/// let mut params = RouteParams::new();
/// params.insert("id".to_string(), "1234".to_string());
/// params.insert("token".to_string(), "XYZ".to_string());
///
/// assert_eq!(params.get("token"), Some("XYZ"));
/// assert_eq!(params.get_as::<u32>("id"), Some(1234));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    /// Create new empty route params
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from hashmap
    pub fn from_map(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter doesn't exist or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.params.get(key)?.parse().ok()
    }

    /// Insert a parameter, replacing any previous value
    pub fn insert(&mut self, key: String, value: String) {
        self.params.insert(key, value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Iterate over all parameters in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Consume into the underlying map
    pub fn into_inner(self) -> HashMap<String, String> {
        self.params
    }
}

impl From<HashMap<String, String>> for RouteParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self::from_map(params)
    }
}

impl FromIterator<(String, String)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
