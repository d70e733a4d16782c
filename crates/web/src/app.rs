//! The application: a route table and the middleware pipeline around its dispatcher.
//!
//! An [`App`] is built once at startup through [`AppBuilder`] and then shared by every
//! connection. It is itself a [`Stage`], so a transport drives it the same way it would
//! drive any other stage.
//!
//! ```ignore
//! let app = App::builder()
//!     .get("/hello/{name}", handler_fn(hello))?
//!     .post("/echo", handler_fn(echo))?
//!     .wrap(RequestLogger)
//!     .build();
//! ```

use crate::dispatcher::{not_found, respond, Dispatcher};
use crate::error::{BoxError, RouteError};
use crate::handler::RequestHandler;
use crate::middleware::{compose, Middleware, SharedStage, Stage};
use crate::router::RouteTable;
use crate::transport::{BoxInbound, BoxOutbound, Scope};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

pub struct App {
    routes: Arc<RouteTable>,
    pipeline: SharedStage,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

#[async_trait]
impl Stage for App {
    /// Runs the pipeline for HTTP connections and answers anything else with `404` directly
    async fn call(&self, scope: Scope, receive: BoxInbound, mut send: BoxOutbound) -> Result<(), BoxError> {
        if !scope.is_http() {
            debug!(kind = scope.kind(), "unsupported connection type");
            return respond(send.as_mut(), not_found()).await;
        }

        self.pipeline.call(scope, receive, send).await
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App").field("routes", &self.routes).finish_non_exhaustive()
    }
}

macro_rules! method_route {
    ($method:ident, $upper_case_method:literal) => {
        #[doc = concat!("Registers `handler` for ", $upper_case_method, " requests matching `template`.")]
        ///
        /// # Errors
        ///
        /// Returns a [`RouteError`] when the template is malformed.
        pub fn $method<H: RequestHandler + 'static>(
            self,
            template: impl Into<String>,
            handler: H,
        ) -> Result<Self, RouteError> {
            self.route($upper_case_method, template, handler)
        }
    };
}

/// Collects routes and middlewares, then freezes them into an [`App`]
#[derive(Default)]
pub struct AppBuilder {
    routes: RouteTable,
    middlewares: Vec<Box<dyn Middleware>>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` requests matching `template`.
    ///
    /// Routes are tried in registration order.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteError`] when the template is malformed or the method is invalid.
    pub fn route<H: RequestHandler + 'static>(
        mut self,
        method: impl AsRef<str>,
        template: impl Into<String>,
        handler: H,
    ) -> Result<Self, RouteError> {
        self.routes.register(method, template, handler)?;
        Ok(self)
    }

    method_route!(get, "GET");
    method_route!(post, "POST");
    method_route!(put, "PUT");
    method_route!(delete, "DELETE");
    method_route!(patch, "PATCH");
    method_route!(head, "HEAD");
    method_route!(options, "OPTIONS");

    /// Adds a middleware; the first one added sees each request first
    pub fn wrap<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Box::new(middleware));
        self
    }

    pub fn build(self) -> App {
        let routes = Arc::new(self.routes);
        let dispatcher: SharedStage = Arc::new(Dispatcher::new(Arc::clone(&routes)));
        let pipeline = compose(dispatcher, &self.middlewares);

        info!(routes = routes.len(), middlewares = self.middlewares.len(), "application built");
        App { routes, pipeline }
    }
}

impl fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppBuilder")
            .field("routes", &self.routes)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
