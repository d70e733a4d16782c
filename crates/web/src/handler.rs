use crate::error::BoxError;
use crate::request::{PathParams, Request};
use crate::responder::Responder;
use crate::response::Response;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;

/// The code behind a route.
///
/// A handler receives the request and the path parameters captured by its route and
/// either produces a [`Response`] or fails. Failures are turned into responses by the
/// [`Dispatcher`](crate::Dispatcher): an [`ApplicationError`](crate::ApplicationError)
/// keeps its status, anything else becomes a 500.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    async fn invoke(&self, req: Request, params: PathParams) -> Result<Response, BoxError>;
}

/// a holder for an async fn returning any [`Responder`]
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Wraps an async fn `(Request, PathParams) -> Result<impl Responder, BoxError>` as a handler
pub fn handler_fn<F, Fut, R>(f: F) -> FnHandler<F>
where
    F: Fn(Request, PathParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
    R: Responder + Send + 'static,
{
    FnHandler::new(f)
}

#[async_trait]
impl<F, Fut, R> RequestHandler for FnHandler<F>
where
    F: Fn(Request, PathParams) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, BoxError>> + Send + 'static,
    R: Responder + Send + 'static,
{
    async fn invoke(&self, req: Request, params: PathParams) -> Result<Response, BoxError> {
        let responder = (self.f)(req, params).await?;
        Ok(responder.into_response())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ApplicationError;
    use crate::transport::{HttpScope, MockInbound};
    use http::StatusCode;
    use serde_json::{json, Value};

    fn assert_is_handler<T: RequestHandler>(_handler: &T) {
        // no op
    }

    fn request() -> Request {
        Request::new(HttpScope::new("GET", "/hello/Ada"), Box::new(MockInbound::new()))
    }

    #[test]
    fn assert_fn_is_handler() {
        async fn get(_req: Request, _params: PathParams) -> Result<(), BoxError> {
            Ok(())
        }

        let handler = handler_fn(get);
        assert_is_handler(&handler);
    }

    #[tokio::test]
    async fn responder_is_converted() {
        async fn hello(_req: Request, params: PathParams) -> Result<Value, BoxError> {
            let name = params.get("name").unwrap_or("stranger");
            Ok(json!({ "message": format!("Hello, {name}") }))
        }

        let params: PathParams = [("name", "Ada")].into_iter().collect();
        let response = handler_fn(hello).invoke(request(), params).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.header("content-type").unwrap(), "application/json; charset=utf-8");
        assert_eq!(response.body().as_ref(), br#"{"message":"Hello, Ada"}"#);
    }

    #[tokio::test]
    async fn error_is_propagated() {
        async fn deny(_req: Request, _params: PathParams) -> Result<Response, BoxError> {
            Err(ApplicationError::new(StatusCode::FORBIDDEN).into())
        }

        let error = handler_fn(deny).invoke(request(), PathParams::empty()).await.unwrap_err();
        assert_eq!(error.downcast_ref::<ApplicationError>().map(ApplicationError::status), Some(StatusCode::FORBIDDEN));
    }
}
