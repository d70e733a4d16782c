//! The middleware chain.
//!
//! Every step of the pipeline is a [`Stage`]: an async operation over the connection
//! triple `(scope, receive, send)`. The [`Dispatcher`](crate::Dispatcher) is the innermost
//! stage, and a [`Middleware`] turns the next stage into a new one that may inspect the
//! scope, call the next stage, or answer on its own without calling it.
//!
//! Middlewares are folded around the innermost stage in reverse registration order, so
//! the first registered middleware sees the request first and finishes last.

mod logger;

pub use logger::RequestLogger;

use crate::error::BoxError;
use crate::transport::{BoxInbound, BoxOutbound, Scope};
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub type SharedStage = Arc<dyn Stage>;

/// One step of the request pipeline
#[async_trait]
pub trait Stage: Send + Sync {
    async fn call(&self, scope: Scope, receive: BoxInbound, send: BoxOutbound) -> Result<(), BoxError>;
}

/// Wraps the next stage of the pipeline into a new stage
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: SharedStage) -> SharedStage;
}

#[async_trait]
impl<S: Stage + ?Sized> Stage for Arc<S> {
    async fn call(&self, scope: Scope, receive: BoxInbound, send: BoxOutbound) -> Result<(), BoxError> {
        self.as_ref().call(scope, receive, send).await
    }
}

/// a stage backed by an async fn over the connection triple
pub struct StageFn<F> {
    f: F,
}

impl<F> fmt::Debug for StageFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageFn").finish_non_exhaustive()
    }
}

/// Creates a [`Stage`] from an async fn `(Scope, BoxInbound, BoxOutbound) -> Result<(), BoxError>`
pub fn stage_fn<F, Fut>(f: F) -> StageFn<F>
where
    F: Fn(Scope, BoxInbound, BoxOutbound) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    StageFn { f }
}

#[async_trait]
impl<F, Fut> Stage for StageFn<F>
where
    F: Fn(Scope, BoxInbound, BoxOutbound) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
{
    async fn call(&self, scope: Scope, receive: BoxInbound, send: BoxOutbound) -> Result<(), BoxError> {
        (self.f)(scope, receive, send).await
    }
}

/// a middleware backed by a fn from the next stage to a new stage
pub struct MiddlewareFn<F> {
    f: F,
}

impl<F> fmt::Debug for MiddlewareFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareFn").finish_non_exhaustive()
    }
}

/// Creates a [`Middleware`] from a fn `(SharedStage) -> impl Stage`.
///
/// ```ignore
/// let deny = middleware_fn(|_next| {
///     stage_fn(|_scope, _receive, mut send: BoxOutbound| async move {
///         respond(send.as_mut(), Response::text("denied").with_status(StatusCode::FORBIDDEN)).await
///     })
/// });
/// ```
pub fn middleware_fn<F, S>(f: F) -> MiddlewareFn<F>
where
    F: Fn(SharedStage) -> S + Send + Sync,
    S: Stage + 'static,
{
    MiddlewareFn { f }
}

impl<F, S> Middleware for MiddlewareFn<F>
where
    F: Fn(SharedStage) -> S + Send + Sync,
    S: Stage + 'static,
{
    fn wrap(&self, next: SharedStage) -> SharedStage {
        Arc::new((self.f)(next))
    }
}

/// Folds `middlewares` around `inner`, the first middleware ends up outermost
pub fn compose(inner: SharedStage, middlewares: &[Box<dyn Middleware>]) -> SharedStage {
    middlewares.iter().rev().fold(inner, |next, middleware| middleware.wrap(next))
}
