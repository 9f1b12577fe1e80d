//! Mutable staging type for [`DeepLinkUri`].
//!
//! The builder holds every component in its *encoded* form. Setters escape
//! their input with the same rules the parser uses, and [`UriBuilder::build`]
//! moves the components into an immutable [`DeepLinkUri`].

use std::fmt;
use std::sync::OnceLock;

use super::encoding::{
    canonicalize, join_query, percent_decode, split_query, Encoding, QueryPairs,
    FRAGMENT_ENCODE_SET, PASSWORD_ENCODE_SET, PATH_SEGMENT_ENCODE_SET, QUERY_COMPONENT_ENCODE_SET,
    QUERY_ENCODE_SET, USERNAME_ENCODE_SET,
};
use super::host::canonicalize_host;
use super::{default_port, DeepLinkUri};
use crate::error::UriError;

const USERNAME: Encoding = Encoding::new(USERNAME_ENCODE_SET, false);
const ENCODED_USERNAME: Encoding = Encoding::new(USERNAME_ENCODE_SET, true);
const PASSWORD: Encoding = Encoding::new(PASSWORD_ENCODE_SET, false);
const ENCODED_PASSWORD: Encoding = Encoding::new(PASSWORD_ENCODE_SET, true);
const PATH_SEGMENT: Encoding = Encoding::new(PATH_SEGMENT_ENCODE_SET, false);
const ENCODED_PATH_SEGMENT: Encoding = Encoding::new(PATH_SEGMENT_ENCODE_SET, true);
const QUERY: Encoding = Encoding::new(QUERY_ENCODE_SET, false).plus_is_space();
const ENCODED_QUERY: Encoding = Encoding::new(QUERY_ENCODE_SET, true).plus_is_space();
const QUERY_COMPONENT: Encoding = Encoding::new(QUERY_COMPONENT_ENCODE_SET, false).plus_is_space();
const ENCODED_QUERY_COMPONENT: Encoding =
    Encoding::new(QUERY_COMPONENT_ENCODE_SET, true).plus_is_space();
const FRAGMENT: Encoding = Encoding::new(FRAGMENT_ENCODE_SET, false).allow_non_ascii();
const ENCODED_FRAGMENT: Encoding = Encoding::new(FRAGMENT_ENCODE_SET, true).allow_non_ascii();

/// Builder for [`DeepLinkUri`].
///
/// # Example
///
/// ```
/// use deeplink::UriBuilder;
///
/// let uri = UriBuilder::new()
///     .scheme("hellofresh")?
///     .host("recipe")?
///     .add_path_segment("1234")
///     .add_query_parameter("token", Some("XYZ"))
///     .build()?;
///
/// assert_eq!(uri.to_string(), "hellofresh://recipe/1234?token=XYZ");
/// # Ok::<(), deeplink::UriError>(())
/// ```
#[derive(Debug, Clone)]
pub struct UriBuilder {
    pub(super) scheme: Option<String>,
    pub(super) encoded_username: String,
    pub(super) encoded_password: String,
    pub(super) host: Option<String>,
    /// Explicit port; `None` means the scheme default.
    pub(super) port: Option<u16>,
    /// Never empty. A trailing empty segment encodes a trailing slash.
    pub(super) encoded_path_segments: Vec<String>,
    pub(super) encoded_query: Option<QueryPairs>,
    pub(super) encoded_fragment: Option<String>,
}

impl Default for UriBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UriBuilder {
    /// Create an empty builder whose path is `/`.
    pub fn new() -> Self {
        Self {
            scheme: None,
            encoded_username: String::new(),
            encoded_password: String::new(),
            host: None,
            port: None,
            encoded_path_segments: vec![String::new()],
            encoded_query: None,
            encoded_fragment: None,
        }
    }

    // ------------------------------------------------------------------------
    // Scheme and authority
    // ------------------------------------------------------------------------

    /// Set the scheme. It is lowercased and must match
    /// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
    pub fn scheme(mut self, scheme: &str) -> Result<Self, UriError> {
        if scheme_delimiter_offset(&format!("{scheme}:")) != Some(scheme.len()) {
            return Err(UriError::MalformedScheme);
        }
        self.scheme = Some(scheme.to_ascii_lowercase());
        Ok(self)
    }

    pub fn username(mut self, username: &str) -> Self {
        self.encoded_username = canonicalize(username, USERNAME).into_owned();
        self
    }

    pub fn encoded_username(mut self, encoded_username: &str) -> Self {
        self.encoded_username = canonicalize(encoded_username, ENCODED_USERNAME).into_owned();
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.encoded_password = canonicalize(password, PASSWORD).into_owned();
        self
    }

    pub fn encoded_password(mut self, encoded_password: &str) -> Self {
        self.encoded_password = canonicalize(encoded_password, ENCODED_PASSWORD).into_owned();
        self
    }

    /// Set the host: a regular hostname, an internationalized domain name,
    /// an IPv4 address or an IPv6 address (with or without brackets).
    pub fn host(mut self, host: &str) -> Result<Self, UriError> {
        let canonical = canonicalize_host(host).ok_or_else(|| UriError::InvalidHost {
            host: host.to_string(),
        })?;
        self.host = Some(canonical);
        Ok(self)
    }

    /// Set an explicit port in `1..=65535`.
    pub fn port(mut self, port: u16) -> Result<Self, UriError> {
        if port == 0 {
            return Err(UriError::InvalidPort {
                port: port.to_string(),
            });
        }
        self.port = Some(port);
        Ok(self)
    }

    /// The explicit port, or the scheme default.
    pub fn effective_port(&self) -> Option<u16> {
        self.port
            .or_else(|| self.scheme.as_deref().and_then(default_port))
    }

    // ------------------------------------------------------------------------
    // Path
    // ------------------------------------------------------------------------

    /// Append one segment. `.` is ignored and `..` pops the last segment.
    pub fn add_path_segment(mut self, segment: &str) -> Self {
        self.push(segment, false, false);
        self
    }

    pub fn add_encoded_path_segment(mut self, encoded_segment: &str) -> Self {
        self.push(encoded_segment, false, true);
        self
    }

    /// Append segments separated by `/` or `\`. A leading slash produces an
    /// empty segment.
    pub fn add_path_segments(mut self, segments: &str) -> Self {
        self.push_all(segments, false);
        self
    }

    pub fn add_encoded_path_segments(mut self, encoded_segments: &str) -> Self {
        self.push_all(encoded_segments, true);
        self
    }

    fn push_all(&mut self, segments: &str, already_encoded: bool) {
        let limit = segments.len();
        let mut offset = 0;
        loop {
            let end = delimiter_offset(segments, offset, limit, b"/\\");
            self.push(&segments[offset..end], end < limit, already_encoded);
            offset = end + 1;
            if offset > limit {
                break;
            }
        }
    }

    /// Replace the segment at `index`. Dot segments are rejected.
    pub fn set_path_segment(self, index: usize, segment: &str) -> Result<Self, UriError> {
        let canonical = canonicalize(segment, PATH_SEGMENT).into_owned();
        self.replace_segment(index, canonical, segment)
    }

    pub fn set_encoded_path_segment(
        self,
        index: usize,
        encoded_segment: &str,
    ) -> Result<Self, UriError> {
        let canonical = canonicalize(encoded_segment, ENCODED_PATH_SEGMENT).into_owned();
        self.replace_segment(index, canonical, encoded_segment)
    }

    fn replace_segment(
        mut self,
        index: usize,
        canonical: String,
        original: &str,
    ) -> Result<Self, UriError> {
        let len = self.encoded_path_segments.len();
        if index >= len {
            return Err(UriError::IndexOutOfRange { index, len });
        }
        if is_dot(&canonical) || is_dot_dot(&canonical) {
            return Err(UriError::InvalidPathSegment {
                segment: original.to_string(),
            });
        }
        self.encoded_path_segments[index] = canonical;
        Ok(self)
    }

    /// Remove the segment at `index`. Removing the last segment leaves `/`.
    pub fn remove_path_segment(mut self, index: usize) -> Result<Self, UriError> {
        let len = self.encoded_path_segments.len();
        if index >= len {
            return Err(UriError::IndexOutOfRange { index, len });
        }
        self.encoded_path_segments.remove(index);
        if self.encoded_path_segments.is_empty() {
            self.encoded_path_segments.push(String::new());
        }
        Ok(self)
    }

    /// Replace the whole path. It must start with `/`; dot segments are resolved.
    pub fn encoded_path(mut self, encoded_path: &str) -> Result<Self, UriError> {
        if !encoded_path.starts_with('/') {
            return Err(UriError::InvalidPath {
                path: encoded_path.to_string(),
            });
        }
        self.resolve_path(encoded_path);
        Ok(self)
    }

    // ------------------------------------------------------------------------
    // Query
    // ------------------------------------------------------------------------

    /// Replace the query. `None` removes it; `Some("")` is an empty query.
    pub fn query(mut self, query: Option<&str>) -> Self {
        self.encoded_query = query.map(|q| split_query(&canonicalize(q, QUERY)));
        self
    }

    pub fn encoded_query(mut self, encoded_query: Option<&str>) -> Self {
        self.encoded_query = encoded_query.map(|q| split_query(&canonicalize(q, ENCODED_QUERY)));
        self
    }

    /// Append `name[=value]` to the query, escaping both.
    pub fn add_query_parameter(self, name: &str, value: Option<&str>) -> Self {
        self.append_query(name, value, QUERY_COMPONENT)
    }

    pub fn add_encoded_query_parameter(
        self,
        encoded_name: &str,
        encoded_value: Option<&str>,
    ) -> Self {
        self.append_query(encoded_name, encoded_value, ENCODED_QUERY_COMPONENT)
    }

    fn append_query(mut self, name: &str, value: Option<&str>, encoding: Encoding) -> Self {
        let pair = (
            canonicalize(name, encoding).into_owned(),
            value.map(|v| canonicalize(v, encoding).into_owned()),
        );
        self.encoded_query.get_or_insert_with(Vec::new).push(pair);
        self
    }

    /// Replace every parameter named `name` with a single `name=value`.
    pub fn set_query_parameter(self, name: &str, value: &str) -> Self {
        self.remove_all_query_parameters(name)
            .add_query_parameter(name, Some(value))
    }

    pub fn set_encoded_query_parameter(self, encoded_name: &str, encoded_value: &str) -> Self {
        self.remove_all_encoded_query_parameters(encoded_name)
            .add_encoded_query_parameter(encoded_name, Some(encoded_value))
    }

    pub fn remove_all_query_parameters(mut self, name: &str) -> Self {
        let canonical = canonicalize(name, QUERY_COMPONENT);
        self.remove_canonical_query_parameters(&canonical);
        self
    }

    pub fn remove_all_encoded_query_parameters(mut self, encoded_name: &str) -> Self {
        let canonical = canonicalize(encoded_name, ENCODED_QUERY_COMPONENT);
        self.remove_canonical_query_parameters(&canonical);
        self
    }

    fn remove_canonical_query_parameters(&mut self, canonical_name: &str) {
        let Some(pairs) = self.encoded_query.as_mut() else {
            return;
        };
        let before = pairs.len();
        pairs.retain(|(name, _)| name != canonical_name);
        // The query disappears only when removal emptied it.
        if pairs.is_empty() && before > 0 {
            self.encoded_query = None;
        }
    }

    // ------------------------------------------------------------------------
    // Fragment
    // ------------------------------------------------------------------------

    pub fn fragment(mut self, fragment: Option<&str>) -> Self {
        self.encoded_fragment = fragment.map(|f| canonicalize(f, FRAGMENT).into_owned());
        self
    }

    pub fn encoded_fragment(mut self, encoded_fragment: Option<&str>) -> Self {
        self.encoded_fragment =
            encoded_fragment.map(|f| canonicalize(f, ENCODED_FRAGMENT).into_owned());
        self
    }

    // ------------------------------------------------------------------------
    // Build
    // ------------------------------------------------------------------------

    /// Consume the builder. Fails if the scheme or host is missing.
    pub fn build(self) -> Result<DeepLinkUri, UriError> {
        let url = self.to_string();
        let port = self.effective_port();
        let Some(scheme) = self.scheme else {
            return Err(UriError::Incomplete { component: "scheme" });
        };
        let Some(host) = self.host else {
            return Err(UriError::Incomplete { component: "host" });
        };

        let decode = |s: &String| percent_decode(s, false).into_owned();

        Ok(DeepLinkUri {
            username: decode(&self.encoded_username),
            password: decode(&self.encoded_password),
            path_segments: self.encoded_path_segments.iter().map(decode).collect(),
            query: OnceLock::new(),
            fragment: OnceLock::new(),
            scheme,
            encoded_username: self.encoded_username,
            encoded_password: self.encoded_password,
            host,
            port,
            encoded_path_segments: self.encoded_path_segments,
            encoded_query: self.encoded_query,
            encoded_fragment: self.encoded_fragment,
            url,
        })
    }

    // ------------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------------

    /// Parse `input`, resolving it against `base` when it is relative.
    pub(super) fn parse(mut self, base: Option<&DeepLinkUri>, input: &str) -> Result<Self, UriError> {
        let input = input.trim_matches(|c| matches!(c, '\t' | '\n' | '\u{0c}' | '\r' | ' '));
        let limit = input.len();
        let bytes = input.as_bytes();
        let mut pos = 0;

        // Scheme.
        match (scheme_delimiter_offset(input), base) {
            (Some(offset), _) => {
                self.scheme = Some(input[..offset].to_ascii_lowercase());
                pos = offset + 1;
            }
            (None, Some(base)) => self.scheme = Some(base.scheme.clone()),
            (None, None) => return Err(UriError::MalformedScheme),
        }

        // Authority.
        let slash_count = slash_count(&bytes[pos..]);
        let relative_to = base.filter(|b| slash_count < 2 && self.scheme.as_deref() == Some(b.scheme()));
        if let Some(base) = relative_to {
            // Relative link: keep the base authority and path, and the query
            // too when the input has no path or query of its own.
            self.encoded_username = base.encoded_username.clone();
            self.encoded_password = base.encoded_password.clone();
            self.host = Some(base.host.clone());
            self.port = base.port;
            self.encoded_path_segments = base.encoded_path_segments.clone();
            if pos == limit || bytes[pos] == b'#' {
                self.encoded_query = base.encoded_query.clone();
            }
        } else {
            pos += slash_count;
            pos = self.parse_authority(input, pos)?;
        }

        // Path.
        let path_end = delimiter_offset(input, pos, limit, b"?#");
        self.resolve_path(&input[pos..path_end]);
        pos = path_end;

        // Query.
        if pos < limit && bytes[pos] == b'?' {
            let query_end = delimiter_offset(input, pos, limit, b"#");
            self.encoded_query = Some(split_query(&canonicalize(
                &input[pos + 1..query_end],
                ENCODED_QUERY,
            )));
            pos = query_end;
        }

        // Fragment.
        if pos < limit && bytes[pos] == b'#' {
            self.encoded_fragment =
                Some(canonicalize(&input[pos + 1..], ENCODED_FRAGMENT).into_owned());
        }

        Ok(self)
    }

    /// Reads `[username[:password]@]host[:port]` and returns the offset just
    /// past it.
    fn parse_authority(&mut self, input: &str, mut pos: usize) -> Result<usize, UriError> {
        let limit = input.len();
        let mut has_username = false;
        let mut has_password = false;

        loop {
            let delimiter = delimiter_offset(input, pos, limit, b"@/\\?#");
            if delimiter < limit && input.as_bytes()[delimiter] == b'@' {
                // Every '@' but the last is part of the user info.
                if has_password {
                    let more = canonicalize(&input[pos..delimiter], ENCODED_PASSWORD);
                    self.encoded_password = format!("{}%40{more}", self.encoded_password);
                } else {
                    let colon = delimiter_offset(input, pos, delimiter, b":");
                    let username = canonicalize(&input[pos..colon], ENCODED_USERNAME);
                    self.encoded_username = if has_username {
                        format!("{}%40{username}", self.encoded_username)
                    } else {
                        username.into_owned()
                    };
                    if colon != delimiter {
                        has_password = true;
                        self.encoded_password =
                            canonicalize(&input[colon + 1..delimiter], ENCODED_PASSWORD)
                                .into_owned();
                    }
                    has_username = true;
                }
                pos = delimiter + 1;
                continue;
            }

            let colon = port_colon_offset(input, pos, delimiter);
            let raw_host = &input[pos..colon];
            let host = canonicalize_host(raw_host);
            self.port = if colon < delimiter {
                let raw_port = &input[colon + 1..delimiter];
                Some(parse_port(raw_port).ok_or_else(|| UriError::InvalidPort {
                    port: raw_port.to_string(),
                })?)
            } else {
                None
            };
            self.host = Some(host.ok_or_else(|| UriError::InvalidHost {
                host: raw_host.to_string(),
            })?);
            return Ok(delimiter);
        }
    }

    /// Applies `input` to the current path, removing dot segments.
    fn resolve_path(&mut self, input: &str) {
        let Some(&first) = input.as_bytes().first() else {
            // Empty path: keep the current one.
            return;
        };

        let input = if first == b'/' || first == b'\\' {
            // Absolute path: start over from "/".
            self.encoded_path_segments.clear();
            self.encoded_path_segments.push(String::new());
            &input[1..]
        } else {
            // Relative path: replace everything after the last '/'.
            self.set_last_segment(String::new());
            input
        };

        let limit = input.len();
        let mut i = 0;
        while i < limit {
            let end = delimiter_offset(input, i, limit, b"/\\");
            let has_trailing_slash = end < limit;
            self.push(&input[i..end], has_trailing_slash, true);
            i = if has_trailing_slash { end + 1 } else { end };
        }
    }

    /// Adds a path segment; `..` or an escaped equivalent pops instead.
    fn push(&mut self, segment: &str, add_trailing_slash: bool, already_encoded: bool) {
        let encoding = if already_encoded {
            ENCODED_PATH_SEGMENT
        } else {
            PATH_SEGMENT
        };
        let segment = canonicalize(segment, encoding).into_owned();
        if is_dot(&segment) {
            return;
        }
        if is_dot_dot(&segment) {
            self.pop();
            return;
        }

        if self.last_segment().is_empty() {
            self.set_last_segment(segment);
        } else {
            self.encoded_path_segments.push(segment);
        }
        if add_trailing_slash {
            self.encoded_path_segments.push(String::new());
        }
    }

    /// Removes a segment so that the path ends with `/`: both `/a/b/c` and
    /// `/a/b/c/` become `/a/b/`. Never goes above the root.
    fn pop(&mut self) {
        let removed = self.encoded_path_segments.pop().unwrap_or_default();
        if removed.is_empty() && !self.encoded_path_segments.is_empty() {
            self.set_last_segment(String::new());
        } else {
            self.encoded_path_segments.push(String::new());
        }
    }

    fn last_segment(&self) -> &str {
        self.encoded_path_segments.last().map_or("", String::as_str)
    }

    fn set_last_segment(&mut self, segment: String) {
        match self.encoded_path_segments.last_mut() {
            Some(last) => *last = segment,
            None => self.encoded_path_segments.push(segment),
        }
    }
}

impl fmt::Display for UriBuilder {
    /// Renders the URI as far as it has been built. Without a scheme the
    /// output starts at `//`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host = self.host.as_deref().unwrap_or("");
        let mut out = String::with_capacity(64);

        if let Some(scheme) = &self.scheme {
            out.push_str(scheme);
            out.push(':');
        }
        out.push_str("//");

        if !self.encoded_username.is_empty() || !self.encoded_password.is_empty() {
            out.push_str(&self.encoded_username);
            if !self.encoded_password.is_empty() {
                out.push(':');
                out.push_str(&self.encoded_password);
            }
            out.push('@');
        }

        if host.contains(':') {
            out.push('[');
            out.push_str(host);
            out.push(']');
        } else {
            out.push_str(host);
        }

        if let Some(port) = self.effective_port() {
            if Some(port) != self.scheme.as_deref().and_then(default_port) {
                out.push(':');
                out.push_str(&port.to_string());
            }
        }

        for segment in &self.encoded_path_segments {
            out.push('/');
            out.push_str(segment);
        }

        if let Some(query) = &self.encoded_query {
            out.push('?');
            join_query(&mut out, query);
        }

        if let Some(fragment) = &self.encoded_fragment {
            out.push('#');
            out.push_str(fragment);
        }

        f.write_str(&out)
    }
}

// ============================================================================
// Scanning helpers
// ============================================================================

/// Offset of the first byte in `input[pos..limit]` found in `delimiters`, or
/// `limit` if there is none.
fn delimiter_offset(input: &str, pos: usize, limit: usize, delimiters: &[u8]) -> usize {
    input.as_bytes()[pos..limit]
        .iter()
        .position(|b| delimiters.contains(b))
        .map_or(limit, |i| pos + i)
}

/// Offset of the `:` ending a leading scheme, if `input` starts with one.
fn scheme_delimiter_offset(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_alphabetic() {
        return None;
    }
    for (i, &c) in bytes.iter().enumerate().skip(1) {
        match c {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'+' | b'-' | b'.' => continue,
            b':' => return Some(i),
            _ => return None,
        }
    }
    None
}

/// Number of leading `/` or `\` characters.
fn slash_count(input: &[u8]) -> usize {
    input
        .iter()
        .take_while(|&&c| c == b'/' || c == b'\\')
        .count()
}

/// Offset of the first `:` in `input[pos..limit]`, skipping `[...]`.
fn port_colon_offset(input: &str, pos: usize, limit: usize) -> usize {
    let bytes = input.as_bytes();
    let mut i = pos;
    while i < limit {
        match bytes[i] {
            b'[' => {
                i += 1;
                while i < limit && bytes[i] != b']' {
                    i += 1;
                }
            }
            b':' => return i,
            _ => {}
        }
        i += 1;
    }
    limit
}

fn parse_port(input: &str) -> Option<u16> {
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let port: u32 = input.parse().ok()?;
    u16::try_from(port).ok().filter(|&p| p != 0)
}

fn is_dot(segment: &str) -> bool {
    segment == "." || segment.eq_ignore_ascii_case("%2e")
}

fn is_dot_dot(segment: &str) -> bool {
    segment == ".."
        || segment.eq_ignore_ascii_case("%2e.")
        || segment.eq_ignore_ascii_case(".%2e")
        || segment.eq_ignore_ascii_case("%2e%2e")
}
