//! Routes one request to its handler and turns the outcome into a response.
//!
//! Whatever the handler does, the client gets exactly one response:
//! - no matching route: `404` with the text body `Not Found`
//! - an [`ApplicationError`]: its status with a `{"detail": ...}` JSON body
//! - any other error, or a panic: `500` with `{"detail": "Internal Server Error"}`
//!
//! The cause of an unexpected failure is logged, never sent to the client.

use crate::error::{ApplicationError, BoxError};
use crate::middleware::Stage;
use crate::request::Request;
use crate::responder::Responder;
use crate::response::Response;
use crate::router::RouteTable;
use crate::transport::{BoxInbound, BoxOutbound, Outbound, Scope};
use async_trait::async_trait;
use futures::FutureExt;
use http::StatusCode;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

/// The innermost stage of an application
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable>,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Routes `req` and produces its response, never failing
    pub async fn dispatch(&self, req: Request) -> Response {
        let Some(route_match) = self.routes.find(req.method(), req.path()) else {
            debug!(method = req.method(), path = req.path(), "no route matched");
            return not_found();
        };

        let (route, params) = route_match.into_parts();
        let invocation = AssertUnwindSafe(route.handler().invoke(req, params)).catch_unwind();

        match invocation.await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => match e.downcast::<ApplicationError>() {
                Ok(application_error) => (*application_error).into_response(),
                Err(e) => {
                    error!(cause = %e, route = route.template(), "request handler failed");
                    internal_server_error()
                }
            },
            Err(panic) => {
                error!(cause = panic_message(panic.as_ref()), route = route.template(), "request handler panicked");
                internal_server_error()
            }
        }
    }
}

#[async_trait]
impl Stage for Dispatcher {
    async fn call(&self, scope: Scope, receive: BoxInbound, mut send: BoxOutbound) -> Result<(), BoxError> {
        let http_scope = match scope {
            Scope::Http(http_scope) => http_scope,
            Scope::Other(kind) => {
                debug!(kind = %kind, "dispatcher only serves http");
                return respond(send.as_mut(), not_found()).await;
            }
        };

        let response = self.dispatch(Request::new(http_scope, receive)).await;
        respond(send.as_mut(), response).await
    }
}

/// Sends `response` as its start message followed by its body message
pub async fn respond(send: &mut dyn Outbound, response: Response) -> Result<(), BoxError> {
    let (start, body) = response.into_messages();
    send.send(start).await?;
    send.send(body).await?;
    Ok(())
}

pub(crate) fn not_found() -> Response {
    Response::text("Not Found").with_status(StatusCode::NOT_FOUND)
}

pub(crate) fn internal_server_error() -> Response {
    Response::json(json!({ "detail": "Internal Server Error" })).with_status(StatusCode::INTERNAL_SERVER_ERROR)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
