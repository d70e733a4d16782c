//! A small async request-handling core.
//!
//! Applications register handlers against route templates such as `/hello/{name}`,
//! optionally wrap the dispatcher in middlewares, and hand the resulting [`App`] to a
//! transport that speaks the connection contract in [`transport`].

mod app;
mod body;
mod dispatcher;
mod error;
mod handler;
mod request;
mod responder;
mod response;
mod utils;

pub mod middleware;
pub mod router;
pub mod transport;

pub use app::App;
pub use app::AppBuilder;
pub use body::Body;
pub use dispatcher::respond;
pub use dispatcher::Dispatcher;
pub use error::ApplicationError;
pub use error::BoxError;
pub use error::RequestError;
pub use error::RouteError;
pub use error::TransportError;
pub use handler::handler_fn;
pub use handler::FnHandler;
pub use handler::RequestHandler;
pub use middleware::middleware_fn;
pub use middleware::stage_fn;
pub use middleware::Middleware;
pub use middleware::RequestLogger;
pub use middleware::SharedStage;
pub use middleware::Stage;
pub use request::PathParams;
pub use request::Request;
pub use responder::Responder;
pub use response::Response;
pub use response::ResponseBuilder;
pub use router::RouteTable;
