pub mod matcher;

use crate::error::RouteError;
use crate::handler::RequestHandler;
use crate::PathParams;

use http::Method;
pub use matcher::PathMatcher;
use std::fmt;
use tracing::debug;

/// A registered route: method, compiled template and handler
pub struct Route {
    method: Method,
    matcher: PathMatcher,
    handler: Box<dyn RequestHandler>,
}

impl Route {
    /// Gets the method, always uppercase
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Gets the template the route was registered with
    pub fn template(&self) -> &str {
        self.matcher.template()
    }

    /// Gets the request handler for this route
    pub fn handler(&self) -> &dyn RequestHandler {
        self.handler.as_ref()
    }

    /// Returns the captured parameters when both `method` and `path` match
    pub fn matches(&self, method: &str, path: &str) -> Option<PathParams> {
        if !self.method.as_str().eq_ignore_ascii_case(method) {
            return None;
        }
        self.matcher.matches(path)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route").field("method", &self.method).field("template", &self.template()).finish_non_exhaustive()
    }
}

/// Result of matching a route, containing the matched route and path parameters
#[derive(Debug)]
pub struct RouteMatch<'router> {
    route: &'router Route,
    params: PathParams,
}

impl<'router> RouteMatch<'router> {
    /// Gets the matched route
    pub fn route(&self) -> &'router Route {
        self.route
    }

    /// Gets the path parameters from the matched route
    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_parts(self) -> (&'router Route, PathParams) {
        (self.route, self.params)
    }
}

/// The ordered routes of an application.
///
/// Routes are appended while the application is being set up and only read afterwards.
/// Lookup walks them in registration order and the first one accepting both the method
/// and the path wins.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `template` and appends a route for `method`.
    ///
    /// The method is matched case-insensitively, `"get"` registers `GET`.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] when the template is malformed or the method is not a valid token;
    /// the route is not added in that case.
    pub fn register<H: RequestHandler + 'static>(
        &mut self,
        method: impl AsRef<str>,
        template: impl Into<String>,
        handler: H,
    ) -> Result<(), RouteError> {
        let method = normalize_method(method.as_ref())?;
        let matcher = PathMatcher::compile(template)?;

        debug!(method = %method, template = matcher.template(), "register route");
        self.routes.push(Route { method, matcher, handler: Box::new(handler) });
        Ok(())
    }

    /// Finds the first route matching `method` and `path`
    pub fn find(&self, method: &str, path: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .find_map(|route| route.matches(method, path).map(|params| RouteMatch { route, params }))
    }

    /// Returns the number of registered routes
    #[inline]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if no routes are registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates the routes in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

fn normalize_method(method: &str) -> Result<Method, RouteError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_invalid| RouteError::invalid_method(method))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::HttpScope;
    use crate::{handler_fn, BoxError, Request};

    async fn first(_req: Request, _params: PathParams) -> Result<&'static str, BoxError> {
        Ok("first")
    }

    async fn second(_req: Request, _params: PathParams) -> Result<&'static str, BoxError> {
        Ok("second")
    }

    fn router() -> RouteTable {
        let mut routes = RouteTable::new();
        routes.register("get", "/users/{id}", handler_fn(first)).unwrap();
        routes.register("GET", "/users/{name}", handler_fn(second)).unwrap();
        routes.register("POST", "/users", handler_fn(second)).unwrap();
        routes
    }

    #[test]
    fn test_method_is_normalized() {
        let routes = router();

        assert_eq!(routes.len(), 3);
        assert_eq!(routes.iter().next().unwrap().method(), Method::GET);
        assert!(routes.find("GET", "/users/7").is_some());
        assert!(routes.find("get", "/users/7").is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let routes = router();

        let (route, params) = routes.find("GET", "/users/ada").unwrap().into_parts();
        assert_eq!(route.template(), "/users/{id}");
        assert_eq!(params.get("id"), Some("ada"));
        assert_eq!(params.get("name"), None);
    }

    #[tokio::test]
    async fn test_first_match_invokes_earlier_handler() {
        let routes = router();
        let route_match = routes.find("GET", "/users/ada").unwrap();

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<crate::transport::InboundMessage>();
        drop(tx);
        let req = Request::new(HttpScope::new("GET", "/users/ada"), Box::new(rx));
        let response = route_match.route().handler().invoke(req, route_match.params().clone()).await.unwrap();
        assert_eq!(response.body().as_ref(), b"first");
    }

    #[test]
    fn test_method_mismatch_is_a_miss() {
        let routes = router();

        assert!(routes.find("DELETE", "/users/7").is_none());
        assert!(routes.find("GET", "/users").is_none());
        assert!(routes.find("POST", "/users").is_some());
        assert!(routes.find("GET", "/nothing").is_none());
    }

    #[test]
    fn test_bad_registration_is_rejected() {
        let mut routes = RouteTable::new();

        assert!(matches!(
            routes.register("GET", "/users/{id", handler_fn(first)),
            Err(RouteError::UnterminatedPlaceholder { .. })
        ));
        assert!(matches!(routes.register("GE T", "/users", handler_fn(first)), Err(RouteError::InvalidMethod { .. })));
        assert!(routes.is_empty());
    }
}
