//! Routes of the hello application.

use lilac_web::{handler_fn, App, ApplicationError, BoxError, PathParams, Request, RequestLogger, RouteError};
use serde_json::{json, Value};

pub async fn hello(_req: Request, params: PathParams) -> Result<Value, BoxError> {
    let name = params.get("name").unwrap_or_default();
    Ok(json!({ "message": format!("Hello, {name}") }))
}

pub async fn echo(mut req: Request, _params: PathParams) -> Result<Value, BoxError> {
    let body = req.json().await?;
    if !body.is_object() {
        return Err(ApplicationError::bad_request("Expected JSON object").into());
    }
    Ok(json!({ "you_sent": body }))
}

pub async fn boom(_req: Request, _params: PathParams) -> Result<Value, BoxError> {
    Err("boom".into())
}

pub fn app() -> Result<App, RouteError> {
    let app = App::builder()
        .get("/hello/{name}", handler_fn(hello))?
        .post("/echo", handler_fn(echo))?
        .get("/boom", handler_fn(boom))?
        .wrap(RequestLogger)
        .build();
    Ok(app)
}
