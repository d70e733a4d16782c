//! A TCP server that serves every accepted connection with one application.
//!
//! ```no_run
//! # async fn run(app: lilac_web::App) -> Result<(), lilac_http::ServerBuildError> {
//! use lilac_http::Server;
//!
//! let server = Server::builder().address("127.0.0.1:8080").app(app).build()?;
//! server.start().await;
//! # Ok(())
//! # }
//! ```

use crate::connection::HttpConnection;
use lilac_web::{SharedStage, Stage};
use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[derive(Default)]
pub struct ServerBuilder {
    app: Option<SharedStage>,
    address: Option<io::Result<Vec<SocketAddr>>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Sets the address to listen on; resolution errors are reported by [`build`](Self::build)
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    /// Sets the application serving every connection
    pub fn app<S: Stage + 'static>(mut self, app: S) -> Self {
        self.app = Some(Arc::new(app));
        self
    }

    /// # Errors
    ///
    /// Returns a [`ServerBuildError`] when the application or the address is missing, or the
    /// address did not resolve to anything.
    pub fn build(self) -> Result<Server, ServerBuildError> {
        let app = self.app.ok_or(ServerBuildError::MissingApp)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::invalid_address)?;
        if address.is_empty() {
            return Err(ServerBuildError::invalid_address(io::Error::from(io::ErrorKind::AddrNotAvailable)));
        }
        Ok(Server { app, address })
    }
}

pub struct Server {
    app: SharedStage,
    address: Vec<SocketAddr>,
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("app must be set")]
    MissingApp,
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {source}")]
    InvalidAddress { source: io::Error },
}

impl ServerBuildError {
    pub fn invalid_address(source: io::Error) -> Self {
        Self::InvalidAddress { source }
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("app", &self.app.is_some())
            .field("address", &self.address)
            .finish()
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server").field("address", &self.address).finish_non_exhaustive()
    }
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    /// Accepts connections until the listener fails to bind, one task per connection
    pub async fn start(self) {
        info!("start listening at {:?}", self.address);
        let tcp_listener = match TcpListener::bind(self.address.as_slice()).await {
            Ok(tcp_listener) => tcp_listener,
            Err(e) => {
                error!(cause = %e, "bind server error");
                return;
            }
        };

        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let app = Arc::clone(&self.app);

            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer);
                match connection.process(app).await {
                    Ok(()) => {
                        info!(%remote_addr, "finished process, connection shutdown");
                    }
                    Err(e) => {
                        error!(%remote_addr, cause = %e, "service has error, connection shutdown");
                    }
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lilac_web::App;

    #[test]
    fn build_requires_app_and_address() {
        let result = Server::builder().address("127.0.0.1:0").build();
        assert!(matches!(result, Err(ServerBuildError::MissingApp)));

        let result = Server::builder().app(App::builder().build()).build();
        assert!(matches!(result, Err(ServerBuildError::MissingAddress)));

        let result = Server::builder().app(App::builder().build()).address("not an address").build();
        assert!(matches!(result, Err(ServerBuildError::InvalidAddress { .. })));
    }

    #[test]
    fn build_resolves_the_address() {
        let server = Server::builder().app(App::builder().build()).address("127.0.0.1:8080").build().unwrap();
        assert_eq!(server.address(), ["127.0.0.1:8080".parse::<SocketAddr>().unwrap()]);
    }
}
