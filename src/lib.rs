//! # deeplink
//!
//! Resolve incoming deep links to typed handlers.
//!
//! - **URI Engine** - [`DeepLinkUri`] parses any scheme (`https`, `myapp`, ...)
//!   into a canonical, re-serializable value; [`UriBuilder`] builds and edits
//!   them; [`DeepLinkUri::resolve`] resolves relative references
//! - **Route Matching** - [`Route`] templates with `:name`, `:name(regex)`,
//!   `:(regex)` and `*` parts, merged with query parameters
//! - **Dispatch** - [`DeepLinkParser`] tries routes in registration order and
//!   falls back to a mandatory default handler
//!
//! # Quick Start
//!
//! ```
//! use deeplink::{DeepLinkParser, DeepLinkUri, Route};
//!
//! #[derive(Debug, PartialEq)]
//! enum Screen {
//!     Recipes,
//!     Recipe(String),
//!     Home,
//! }
//!
//! let parser = DeepLinkParser::of(())
//!     .add_route(
//!         Route::new(["recipes", "recipe/:id"], |_uri, params, _env| match params.get("id") {
//!             Some(id) => Screen::Recipe(id.to_string()),
//!             None => Screen::Recipes,
//!         })
//!         .host_as_path(|uri| uri.scheme() == "hellofresh"),
//!     )
//!     .add_fallback(|_uri, _params, _env| Screen::Home)
//!     .build()
//!     .unwrap();
//!
//! let link = DeepLinkUri::parse("hellofresh://recipe/1234?token=XYZ").unwrap();
//! assert_eq!(parser.parse(&link).unwrap(), Screen::Recipe("1234".to_string()));
//!
//! let link = DeepLinkUri::parse("https://www.hellofresh.com/recipes/").unwrap();
//! assert_eq!(parser.parse(&link).unwrap(), Screen::Recipes);
//!
//! let link = DeepLinkUri::parse("https://www.hellofresh.com/").unwrap();
//! assert_eq!(parser.parse(&link).unwrap(), Screen::Home);
//! ```
//!
//! # Building Links
//!
//! ```
//! use deeplink::UriBuilder;
//!
//! let link = UriBuilder::new()
//!     .scheme("hellofresh").unwrap()
//!     .host("recipe").unwrap()
//!     .add_path_segment("1234")
//!     .add_query_parameter("source", Some("push notification"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(link.to_string(), "hellofresh://recipe/1234?source=push%20notification");
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Emits diagnostics through the `log` crate
//! - `tracing` - Emits diagnostics through `tracing`

#![doc(html_root_url = "https://docs.rs/deeplink/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// URI engine
pub mod uri;

// Routing
pub mod matcher;
pub mod params;
pub mod parser;
pub mod route;

// Error handling
pub mod error;

// Re-exports
pub use error::{BuildError, RouteError, UriError};
pub use params::RouteParams;
pub use parser::{DeepLinkParser, ParserBuilder};
pub use route::{HostAsPath, Route, RouteHandler};
pub use uri::{DeepLinkUri, UriBuilder};

/// Outcome of matching one route against one link.
///
/// # Example
///
/// ```
/// use deeplink::{MatchResult, RouteParams};
///
/// let miss = MatchResult::no_match();
/// assert!(!miss.is_match);
/// assert!(miss.params.is_empty());
///
/// let hit = MatchResult::matched(RouteParams::new());
/// assert!(hit.is_match);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Whether any of the route's templates matched
    pub is_match: bool,
    /// Path parameters plus query parameters not shadowed by the path
    pub params: RouteParams,
}

impl MatchResult {
    /// A successful match carrying `params`.
    #[must_use]
    pub fn matched(params: RouteParams) -> Self {
        Self {
            is_match: true,
            params,
        }
    }

    /// No template matched.
    #[must_use]
    pub fn no_match() -> Self {
        Self::default()
    }
}
