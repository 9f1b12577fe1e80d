//! Error types for URI parsing, route matching and parser construction.

use thiserror::Error;

// ============================================================================
// URI Errors
// ============================================================================

/// Errors produced while parsing or building a [`DeepLinkUri`](crate::DeepLinkUri).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    /// No scheme could be read and there was no base URI to inherit one from.
    #[error("expected a URI scheme but no colon was found")]
    MalformedScheme,

    /// The host contains illegal characters, failed IDN conversion or is a
    /// malformed IPv6 literal.
    #[error("invalid URI host: {host:?}")]
    InvalidHost { host: String },

    /// The port is empty, non-numeric or outside `1..=65535`.
    #[error("invalid URI port: {port:?}")]
    InvalidPort { port: String },

    /// A positional path-segment mutation referenced a missing segment.
    #[error("path segment index {index} out of range for {len} segments")]
    IndexOutOfRange { index: usize, len: usize },

    /// A positional path-segment mutation tried to store `.` or `..`.
    #[error("unexpected path segment: {segment:?}")]
    InvalidPathSegment { segment: String },

    /// An encoded path that does not start with `/`.
    #[error("unexpected encoded path: {path:?}")]
    InvalidPath { path: String },

    /// `build()` was called before a required component was set.
    #[error("cannot build URI: {component} is not set")]
    Incomplete { component: &'static str },
}

// ============================================================================
// Route Errors
// ============================================================================

/// Errors produced while creating routes or matching them against a URI.
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    /// A query key without `=` collided with parameter merging.
    #[error("query parameter {name:?} has no value")]
    ValuelessQueryParameter { name: String },

    /// A `:name(regex)` template part carries a regex that does not compile.
    #[error("invalid pattern in route template {template:?}")]
    InvalidPattern {
        template: String,
        #[source]
        source: regex::Error,
    },
}

// ============================================================================
// Construction Errors
// ============================================================================

/// Errors produced by [`ParserBuilder::build`](crate::ParserBuilder::build).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// No fallback handler was registered.
    #[error("default fallback is not provided")]
    MissingFallback,

    /// Two routes were registered with identical template lists.
    #[error("route with templates {templates:?} is already registered")]
    DuplicateRoute { templates: Vec<String> },
}
