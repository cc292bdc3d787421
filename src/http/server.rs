use axum::Router;
use std::net::SocketAddr;
use tokio::net::{TcpListener, ToSocketAddrs};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::http::routes::router;
use crate::http::state::AppState;
use crate::Error;

pub struct HttpServer {
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    pub async fn bind(addr: impl ToSocketAddrs, state: AppState) -> Result<HttpServer, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(HttpServer {
            listener,
            router: router(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves requests until `shutdown` is cancelled, then drains the requests in flight.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), Error> {
        info!("HTTP server listening on {}", self.local_addr()?);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
