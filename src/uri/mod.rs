//! Canonical URIs for deep links.
//!
//! [`DeepLinkUri`] is an immutable, normalized URI value for any scheme,
//! including custom ones such as `hellofresh://recipe/1234`. Parsing trims
//! ASCII whitespace, lowercases the scheme, canonicalizes the host (IDN,
//! IPv4, IPv6), resolves dot segments and percent-encodes each component
//! with its own rules while keeping any escapes the input already had.
//!
//! ```
//! use deeplink::DeepLinkUri;
//!
//! let uri = DeepLinkUri::parse("HelloFresh://Recipe/a/../1234?token=XYZ")?;
//! assert_eq!(uri.scheme(), "hellofresh");
//! assert_eq!(uri.host(), "recipe");
//! assert_eq!(uri.path_segments(), ["1234"]);
//! assert_eq!(uri.query_parameter("token"), Some("XYZ"));
//! assert_eq!(uri.to_string(), "hellofresh://recipe/1234?token=XYZ");
//! # Ok::<(), deeplink::UriError>(())
//! ```

mod builder;
mod encoding;
mod host;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

pub use builder::UriBuilder;
use encoding::{decode_query, join_query, percent_decode, QueryPairs};

use crate::debug_log;
use crate::error::UriError;

/// Port implied by `scheme` when none is given.
pub(crate) fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

// ============================================================================
// DeepLinkUri
// ============================================================================

/// A parsed, canonical URI.
///
/// Every component is kept both percent-decoded and in its encoded form;
/// the query and fragment are decoded on first access.
/// Two URIs are equal when their serialized forms are equal, so equivalent
/// but differently escaped inputs (`%6d` versus `m`) stay distinct.
#[derive(Clone)]
pub struct DeepLinkUri {
    scheme: String,
    username: String,
    encoded_username: String,
    password: String,
    encoded_password: String,
    host: String,
    port: Option<u16>,
    path_segments: Vec<String>,
    encoded_path_segments: Vec<String>,
    /// Decoded on first access.
    query: OnceLock<Option<QueryPairs>>,
    encoded_query: Option<QueryPairs>,
    /// Decoded on first access.
    fragment: OnceLock<Option<String>>,
    encoded_fragment: Option<String>,
    url: String,
}

impl DeepLinkUri {
    /// Parse an absolute URI.
    pub fn parse(input: &str) -> Result<Self, UriError> {
        UriBuilder::new()
            .parse(None, input)
            .and_then(UriBuilder::build)
            .inspect_err(|err| debug_log!("failed to parse {:?}: {}", input, err))
    }

    /// Like [`parse`](Self::parse), but returns `None` on malformed input.
    pub fn parse_opt(input: &str) -> Option<Self> {
        Self::parse(input).ok()
    }

    /// Resolve `link` against this URI. Returns `None` if the result is not
    /// a valid URI.
    pub fn resolve(&self, link: &str) -> Option<Self> {
        UriBuilder::new()
            .parse(Some(self), link)
            .and_then(UriBuilder::build)
            .ok()
    }

    /// A builder pre-populated with this URI's components.
    pub fn new_builder(&self) -> UriBuilder {
        UriBuilder {
            scheme: Some(self.scheme.clone()),
            encoded_username: self.encoded_username.clone(),
            encoded_password: self.encoded_password.clone(),
            host: Some(self.host.clone()),
            // Only an explicit port survives a scheme change.
            port: self.port.filter(|&port| Some(port) != default_port(&self.scheme)),
            encoded_path_segments: self.encoded_path_segments.clone(),
            encoded_query: self.encoded_query.clone(),
            encoded_fragment: self.encoded_fragment.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Scheme and authority
    // ------------------------------------------------------------------------

    /// Lowercase scheme, e.g. `http` or `hellofresh`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn encoded_username(&self) -> &str {
        &self.encoded_username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn encoded_password(&self) -> &str {
        &self.encoded_password
    }

    /// Canonical host. IPv6 addresses are returned without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit port, or the scheme default. `None` for a custom scheme
    /// without an explicit port.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    // ------------------------------------------------------------------------
    // Path
    // ------------------------------------------------------------------------

    /// Number of path segments; at least 1.
    pub fn path_size(&self) -> usize {
        self.path_segments.len()
    }

    /// The path with its original escapes, e.g. `/a%2Fb/c`.
    pub fn encoded_path(&self) -> String {
        let mut path = String::with_capacity(self.url.len());
        for segment in &self.encoded_path_segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    pub fn encoded_path_segments(&self) -> &[String] {
        &self.encoded_path_segments
    }

    /// Decoded path segments. `http://host/a/b/` yields `["a", "b", ""]`.
    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    // ------------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------------

    pub fn encoded_query(&self) -> Option<String> {
        self.encoded_query.as_deref().map(render_query)
    }

    /// Decoded query. Ambiguous when names or values contain `&` or `=`;
    /// prefer the per-parameter accessors.
    pub fn query(&self) -> Option<String> {
        self.decoded_query().map(|pairs| render_query(pairs))
    }

    fn decoded_query(&self) -> Option<&QueryPairs> {
        self.query
            .get_or_init(|| self.encoded_query.as_deref().map(decode_query))
            .as_ref()
    }

    /// Number of query parameters; 0 without a query, 1 for an empty one.
    pub fn query_size(&self) -> usize {
        self.encoded_query.as_ref().map_or(0, Vec::len)
    }

    /// The first value of `name`. `None` if absent or if it has no value.
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_pairs()
            .find(|(n, _)| *n == name)
            .and_then(|(_, value)| value)
    }

    /// Distinct parameter names in order of first appearance.
    pub fn query_parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in self.query_pairs() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Every value of `name`, in order. Value-less occurrences are `None`.
    pub fn query_parameter_values(&self, name: &str) -> Vec<Option<&str>> {
        self.query_pairs()
            .filter(|(n, _)| *n == name)
            .map(|(_, value)| value)
            .collect()
    }

    pub fn query_parameter_name(&self, index: usize) -> Option<&str> {
        self.decoded_query()?.get(index).map(|(name, _)| name.as_str())
    }

    pub fn query_parameter_value(&self, index: usize) -> Option<&str> {
        self.decoded_query()?.get(index)?.1.as_deref()
    }

    /// Decoded `(name, value)` pairs in order.
    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.decoded_query()
            .into_iter()
            .flatten()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }

    // ------------------------------------------------------------------------
    // Fragment
    // ------------------------------------------------------------------------

    pub fn encoded_fragment(&self) -> Option<&str> {
        self.encoded_fragment.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment
            .get_or_init(|| {
                self.encoded_fragment
                    .as_deref()
                    .map(|f| percent_decode(f, false).into_owned())
            })
            .as_deref()
    }

    /// The serialized form.
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

fn render_query(pairs: &[(String, Option<String>)]) -> String {
    let mut out = String::new();
    join_query(&mut out, pairs);
    out
}

impl PartialEq for DeepLinkUri {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for DeepLinkUri {}

impl Hash for DeepLinkUri {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl fmt::Debug for DeepLinkUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeepLinkUri").field(&self.url).finish()
    }
}

impl fmt::Display for DeepLinkUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl FromStr for DeepLinkUri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for DeepLinkUri {
    type Error = UriError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl AsRef<str> for DeepLinkUri {
    fn as_ref(&self) -> &str {
        &self.url
    }
}
