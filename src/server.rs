use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::codec::FrameCodec;
use crate::config::Config;
use crate::http::{AppState, HttpServer};
use crate::rpc::RpcServer;
use crate::store::{open_store, SharedStore};
use crate::Error;

/// Both endpoints, started over one shared store.
pub struct Service {
    http_addr: SocketAddr,
    rpc_addr: SocketAddr,
    http_shutdown: CancellationToken,
    rpc_shutdown: CancellationToken,
    http_task: JoinHandle<Result<(), Error>>,
    rpc_task: JoinHandle<Result<(), Error>>,
    failed: CancellationToken,
    grace: Duration,
}

impl Service {
    /// Binds both listeners and starts serving. Bind failures are returned before anything runs.
    pub async fn start(config: &Config, store: SharedStore) -> Result<Service, Error> {
        let state = AppState::new(store.clone(), config.service_name.as_str());
        let http = HttpServer::bind((config.host.as_str(), config.http_port), state).await?;
        let rpc = RpcServer::bind(
            (config.host.as_str(), config.rpc_port),
            store,
            FrameCodec::new(config.max_frame_size),
        )
        .await?;

        let http_addr = http.local_addr()?;
        let rpc_addr = rpc.local_addr()?;

        let failed = CancellationToken::new();
        let http_shutdown = CancellationToken::new();
        let rpc_shutdown = CancellationToken::new();

        let http_task = tokio::spawn(supervise(
            "HTTP",
            http.run(http_shutdown.clone()),
            failed.clone(),
        ));
        let rpc_task = tokio::spawn(supervise(
            "RPC",
            rpc.run(rpc_shutdown.clone()),
            failed.clone(),
        ));

        Ok(Service {
            http_addr,
            rpc_addr,
            http_shutdown,
            rpc_shutdown,
            http_task,
            rpc_task,
            failed,
            grace: config.shutdown_grace(),
        })
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        self.rpc_addr
    }

    /// Resolves once either server has stopped with an error.
    pub async fn failed(&self) {
        self.failed.cancelled().await
    }

    /// Stops the HTTP server, giving it the grace period to drain, then stops the RPC server.
    pub async fn shutdown(self) -> Result<(), Error> {
        let Service {
            http_shutdown,
            rpc_shutdown,
            mut http_task,
            rpc_task,
            grace,
            ..
        } = self;

        info!("Stopping HTTP server");
        http_shutdown.cancel();
        let http_result = match tokio::time::timeout(grace, &mut http_task).await {
            Ok(joined) => joined.map_err(Error::from).and_then(|result| result),
            Err(_) => {
                warn!("HTTP server did not stop within {:?}, aborting", grace);
                http_task.abort();
                Ok(())
            }
        };

        info!("Stopping RPC server");
        rpc_shutdown.cancel();
        let rpc_result = rpc_task.await.map_err(Error::from).and_then(|result| result);

        http_result.and(rpc_result)
    }
}

async fn supervise<F>(name: &'static str, server: F, failed: CancellationToken) -> Result<(), Error>
where
    F: Future<Output = Result<(), Error>>,
{
    let result = server.await;
    if let Err(e) = &result {
        error!("{} server failed: {}", name, e);
        failed.cancel();
    }
    result
}

/// Opens the configured store, serves both endpoints until SIGINT or SIGTERM, then shuts down.
pub async fn run(config: Config) -> Result<(), Error> {
    run_until(config, shutdown_signal()).await
}

/// Like [`run`], stopping when `shutdown` resolves instead of on a signal.
pub async fn run_until<F>(config: Config, shutdown: F) -> Result<(), Error>
where
    F: Future<Output = ()>,
{
    let store = open_store(&config).await?;
    let service = Service::start(&config, store).await?;

    info!(
        "{} serving HTTP on {} and RPC on {}",
        config.service_name,
        service.http_addr(),
        service.rpc_addr()
    );

    tokio::select! {
        _ = shutdown => info!("Shutdown requested"),
        _ = service.failed() => warn!("A server stopped unexpectedly, shutting down"),
    }

    service.shutdown().await?;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to install ctrl-c handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
