//! Route definition and matching

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::RouteError;
use crate::matcher::RoutePattern;
use crate::params::RouteParams;
use crate::uri::DeepLinkUri;
use crate::{trace_log, MatchResult};

/// Type for route handler functions
///
/// A handler receives the matched link, the merged path and query
/// parameters, and the environment the parser was built with.
pub type RouteHandler<E, T> = Arc<dyn Fn(&DeepLinkUri, &RouteParams, &E) -> T + Send + Sync>;

/// Decides per link whether the host is matched as the first path segment.
pub type HostAsPath = Arc<dyn Fn(&DeepLinkUri) -> bool + Send + Sync>;

/// A set of path templates paired with a handler.
///
/// Templates are tried in the order given; the first one that matches the
/// link's path decides the parameters.
///
/// # Example
///
/// ```
/// use deeplink::{DeepLinkUri, Route};
///
/// let route = Route::new(["recipes", "recipe/:id"], |_uri, params, _env: &()| {
///     params.get("id").unwrap_or("list").to_string()
/// });
///
/// let uri = DeepLinkUri::parse("https://www.hellofresh.com/recipe/1234").unwrap();
/// let result = route.match_with(&uri).unwrap();
/// assert!(result.is_match);
/// assert_eq!(result.params.get("id"), Some("1234"));
/// ```
pub struct Route<E, T> {
    templates: Vec<String>,
    patterns: Vec<RoutePattern>,
    handler: RouteHandler<E, T>,
    host_as_path: Option<HostAsPath>,
}

impl<E, T> Route<E, T> {
    /// Create a route from its templates and handler
    ///
    /// # Panics
    ///
    /// Panics if a template carries a regex that does not compile. Use
    /// `try_new` to handle the error instead.
    pub fn new<I, S, F>(templates: I, handler: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&DeepLinkUri, &RouteParams, &E) -> T + Send + Sync + 'static,
    {
        match Self::try_new(templates, handler) {
            Ok(route) => route,
            Err(e) => panic!("Invalid route template: {e}"),
        }
    }

    /// Create a route, returning an error for templates that fail to compile
    pub fn try_new<I, S, F>(templates: I, handler: F) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&DeepLinkUri, &RouteParams, &E) -> T + Send + Sync + 'static,
    {
        let templates: Vec<String> = templates.into_iter().map(Into::into).collect();
        let patterns = templates
            .iter()
            .map(|template| RoutePattern::parse(template))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            templates,
            patterns,
            handler: Arc::new(handler),
            host_as_path: None,
        })
    }

    /// Treat the host as the first path segment when `predicate` holds.
    ///
    /// Custom schemes often put the first path component where the host
    /// goes, as in `hellofresh://recipes`.
    ///
    /// ```
    /// use deeplink::{DeepLinkUri, Route};
    ///
    /// let route = Route::new(["recipes"], |_uri, _params, _env: &()| ())
    ///     .host_as_path(|uri| uri.scheme() == "hellofresh");
    ///
    /// let uri = DeepLinkUri::parse("hellofresh://recipes").unwrap();
    /// assert!(route.match_with(&uri).unwrap().is_match);
    /// ```
    pub fn host_as_path<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&DeepLinkUri) -> bool + Send + Sync + 'static,
    {
        self.host_as_path = Some(Arc::new(predicate));
        self
    }

    /// The templates as written, in match order
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Match `uri` against each template in order.
    ///
    /// On the first structural match, query parameters not already bound by
    /// the path are merged in. A query parameter without a value fails the
    /// match with [`RouteError::ValuelessQueryParameter`].
    pub fn match_with(&self, uri: &DeepLinkUri) -> Result<MatchResult, RouteError> {
        let segments = self.segments_of(uri);

        for pattern in &self.patterns {
            let Some(mut params) = pattern.match_segments(&segments) else {
                continue;
            };

            merge_query(&mut params, uri)?;
            trace_log!("{} matched template {:?}", uri, pattern.template());
            return Ok(MatchResult::matched(params));
        }

        trace_log!("{} matched none of {:?}", uri, self.templates);
        Ok(MatchResult::no_match())
    }

    /// Invoke the handler
    pub fn handle(&self, uri: &DeepLinkUri, params: &RouteParams, env: &E) -> T {
        (self.handler)(uri, params, env)
    }

    fn treats_host_as_path(&self, uri: &DeepLinkUri) -> bool {
        self.host_as_path
            .as_ref()
            .is_some_and(|predicate| predicate(uri))
    }

    fn segments_of<'a>(&self, uri: &'a DeepLinkUri) -> Vec<&'a str> {
        let mut segments = Vec::with_capacity(uri.path_size() + 1);
        if self.treats_host_as_path(uri) {
            segments.push(uri.host());
        }
        segments.extend(uri.path_segments().iter().map(String::as_str));

        // A trailing slash leaves one empty segment behind.
        if segments.last() == Some(&"") {
            segments.pop();
        }
        segments
    }
}

fn merge_query(params: &mut RouteParams, uri: &DeepLinkUri) -> Result<(), RouteError> {
    for name in uri.query_parameter_names() {
        if params.contains(name) {
            continue;
        }
        let value = uri
            .query_parameter(name)
            .ok_or_else(|| RouteError::ValuelessQueryParameter {
                name: name.to_string(),
            })?;
        params.insert(name.to_string(), value.to_string());
    }
    Ok(())
}

impl<E, T> Clone for Route<E, T> {
    fn clone(&self) -> Self {
        Self {
            templates: self.templates.clone(),
            patterns: self.patterns.clone(),
            handler: Arc::clone(&self.handler),
            host_as_path: self.host_as_path.clone(),
        }
    }
}

impl<E, T> PartialEq for Route<E, T> {
    fn eq(&self, other: &Self) -> bool {
        self.templates == other.templates
    }
}

impl<E, T> Eq for Route<E, T> {}

impl<E, T> Hash for Route<E, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.templates.hash(state);
    }
}

impl<E, T> fmt::Debug for Route<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("templates", &self.templates)
            .field("host_as_path", &self.host_as_path.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn uri(input: &str) -> DeepLinkUri {
        DeepLinkUri::parse(input).unwrap()
    }

    fn recipe_route() -> Route<(), String> {
        Route::new(["recipes", "recipe/:id"], |_, params, _| {
            params.get("id").unwrap_or("RecipeRoute").to_string()
        })
    }

    #[test]
    fn test_templates_are_kept_in_order() {
        assert_eq!(recipe_route().templates(), ["recipes", "recipe/:id"]);
    }

    #[test]
    fn test_first_matching_template_wins() {
        let route: Route<(), ()> = Route::new([":section", "recipes"], |_, _, _| ());

        let result = route.match_with(&uri("http://www.hellofresh.com/recipes")).unwrap();
        assert!(result.is_match);
        assert_eq!(result.params.get("section"), Some("recipes"));
    }

    #[test]
    fn test_trailing_slash_is_trimmed_once() {
        let route = recipe_route();

        assert!(route.match_with(&uri("http://www.hellofresh.com/recipes/")).unwrap().is_match);
        assert!(!route.match_with(&uri("http://www.hellofresh.com/recipes//")).unwrap().is_match);
    }

    #[test]
    fn test_no_match_has_empty_params() {
        let result = recipe_route()
            .match_with(&uri("http://www.hellofresh.com/boxes?id=1"))
            .unwrap();

        assert!(!result.is_match);
        assert!(result.params.is_empty());
    }

    #[test]
    fn test_host_as_path_predicate_is_per_link() {
        let route = recipe_route().host_as_path(|uri| uri.scheme() == "hellofresh");

        assert!(route.match_with(&uri("hellofresh://recipe/1234")).unwrap().is_match);
        // The predicate does not hold for http links, so the host is skipped.
        assert!(!route.match_with(&uri("http://recipe/1234")).unwrap().is_match);
        assert!(route.match_with(&uri("http://host/recipe/1234")).unwrap().is_match);
    }

    #[test]
    fn test_valueless_query_is_an_error() {
        let err = recipe_route()
            .match_with(&uri("http://www.hellofresh.com/recipes?flag"))
            .unwrap_err();

        assert!(matches!(err, RouteError::ValuelessQueryParameter { ref name } if name == "flag"));
    }

    #[test]
    fn test_valueless_query_shadowed_by_path_is_ignored() {
        let result = recipe_route()
            .match_with(&uri("http://www.hellofresh.com/recipe/1234?id"))
            .unwrap();

        assert!(result.is_match);
        assert_eq!(result.params.get("id"), Some("1234"));
    }

    #[test]
    fn test_empty_query_value_is_bound() {
        let result = recipe_route()
            .match_with(&uri("http://www.hellofresh.com/recipes?token="))
            .unwrap();

        assert_eq!(result.params.get("token"), Some(""));
    }

    #[test]
    fn test_first_query_value_is_merged() {
        let result = recipe_route()
            .match_with(&uri("http://www.hellofresh.com/recipes?tag=a&tag=b"))
            .unwrap();

        assert_eq!(result.params.get("tag"), Some("a"));
    }

    #[test]
    fn test_try_new_reports_invalid_regex() {
        let result: Result<Route<(), ()>, _> = Route::try_new(["recipe/:id([)"], |_, _, _| ());
        assert!(matches!(result, Err(RouteError::InvalidPattern { .. })));
    }

    #[test]
    #[should_panic(expected = "Invalid route template")]
    fn test_new_panics_on_invalid_regex() {
        let _: Route<(), ()> = Route::new(["recipe/:id([)"], |_, _, _| ());
    }

    #[test]
    fn test_handle_passes_environment() {
        let route: Route<u32, u32> = Route::new(["count"], |_, _, env| env + 1);
        let link = uri("http://host/count");

        assert_eq!(route.handle(&link, &RouteParams::new(), &41), 42);
    }

    #[test]
    fn test_equality_by_templates() {
        let a = recipe_route();
        let b: Route<(), String> = Route::new(["recipes", "recipe/:id"], |_, _, _| String::new());
        let c: Route<(), String> = Route::new(["recipe/:id", "recipes"], |_, _, _| String::new());

        assert_eq!(a, b);
        assert_ne!(a, c);

        let hash = |route: &Route<(), String>| {
            let mut hasher = DefaultHasher::new();
            route.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn test_debug_lists_templates() {
        let debug = format!("{:?}", recipe_route());
        assert!(debug.contains("recipe/:id"));
    }
}
