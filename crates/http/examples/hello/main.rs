mod handlers;

use lilac_http::Server;
use std::error::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let app = handlers::app()?;
    Server::builder().address("127.0.0.1:8080").app(app).build()?.start().await;
    Ok(())
}
