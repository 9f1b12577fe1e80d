//! Ordered dispatch of links to routes
//!
//! A [`DeepLinkParser`] is built once from an environment, an ordered list of
//! routes and a fallback. After `build()` it is immutable and can be shared
//! across threads.

use std::fmt;
use std::sync::Arc;

use crate::error::{BuildError, RouteError};
use crate::params::RouteParams;
use crate::route::{Route, RouteHandler};
use crate::uri::DeepLinkUri;
use crate::{debug_log, warn_log};

/// Dispatches a link to the first matching route, or to the fallback.
///
/// # Example
///
/// ```
/// use deeplink::{DeepLinkParser, DeepLinkUri, Route};
///
/// struct Environment {
///     logged_in: bool,
/// }
///
/// let parser = DeepLinkParser::of(Environment { logged_in: true })
///     .add_route(Route::new(["recipes", "recipe/:id"], |_uri, params, _env| {
///         format!("recipe {}", params.get("id").unwrap_or("list"))
///     }))
///     .add_route(Route::new(["subscription"], |_uri, _params, env: &Environment| {
///         if env.logged_in { "subscription" } else { "login" }.to_string()
///     }))
///     .add_fallback(|_uri, _params, _env| "home".to_string())
///     .build()
///     .unwrap();
///
/// let uri = DeepLinkUri::parse("https://www.hellofresh.com/recipe/1234").unwrap();
/// assert_eq!(parser.parse(&uri).unwrap(), "recipe 1234");
///
/// let uri = DeepLinkUri::parse("https://www.hellofresh.com/about").unwrap();
/// assert_eq!(parser.parse(&uri).unwrap(), "home");
/// ```
pub struct DeepLinkParser<E, T> {
    environment: E,
    routes: Vec<Route<E, T>>,
    fallback: RouteHandler<E, T>,
}

impl<E, T> DeepLinkParser<E, T> {
    /// Start building a parser whose handlers all receive `environment`
    pub fn of(environment: E) -> ParserBuilder<E, T> {
        ParserBuilder {
            environment,
            routes: Vec::new(),
            duplicates: Vec::new(),
            fallback: None,
        }
    }

    /// Dispatch `uri` to the first route that matches it, in registration
    /// order. The fallback receives empty parameters.
    ///
    /// Fails only when the matching route rejects the link's query, see
    /// [`Route::match_with`].
    pub fn parse(&self, uri: &DeepLinkUri) -> Result<T, RouteError> {
        for route in &self.routes {
            let result = route.match_with(uri)?;
            if result.is_match {
                debug_log!("dispatching {} to route {:?}", uri, route.templates());
                return Ok(route.handle(uri, &result.params, &self.environment));
            }
        }

        debug_log!("no route matched {}, dispatching to fallback", uri);
        Ok((self.fallback)(uri, &RouteParams::new(), &self.environment))
    }

    /// Registered routes in match order
    pub fn routes(&self) -> &[Route<E, T>] {
        &self.routes
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }
}

impl<E: fmt::Debug, T> fmt::Debug for DeepLinkParser<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepLinkParser")
            .field("environment", &self.environment)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// ParserBuilder
// ============================================================================

/// Staging type for [`DeepLinkParser`]
pub struct ParserBuilder<E, T> {
    environment: E,
    routes: Vec<Route<E, T>>,
    duplicates: Vec<Vec<String>>,
    fallback: Option<RouteHandler<E, T>>,
}

impl<E, T> ParserBuilder<E, T> {
    /// Append a route. Routes are tried in the order they are added.
    ///
    /// A route whose templates equal an already registered route's is not
    /// added and makes `build()` fail.
    pub fn add_route(mut self, route: Route<E, T>) -> Self {
        if self.routes.contains(&route) {
            warn_log!("route {:?} is already registered", route.templates());
            self.duplicates.push(route.templates().to_vec());
        } else {
            self.routes.push(route);
        }
        self
    }

    /// Set the handler for links no route matches, replacing any previous one
    pub fn add_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&DeepLinkUri, &RouteParams, &E) -> T + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(fallback));
        self
    }

    /// Finish construction.
    ///
    /// Fails with [`BuildError::MissingFallback`] when no fallback was added,
    /// and with [`BuildError::DuplicateRoute`] when a route was registered
    /// twice.
    pub fn build(self) -> Result<DeepLinkParser<E, T>, BuildError> {
        let Some(fallback) = self.fallback else {
            warn_log!("parser built without a fallback");
            return Err(BuildError::MissingFallback);
        };

        if let Some(templates) = self.duplicates.into_iter().next() {
            return Err(BuildError::DuplicateRoute { templates });
        }

        Ok(DeepLinkParser {
            environment: self.environment,
            routes: self.routes,
            fallback,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
