use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument, warn};

use crate::codec::FrameCodec;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::rpc::procedures::executable::Executable;
use crate::rpc::procedures::Procedure;
use crate::store::{AlbumStore, SharedStore};
use crate::Error;

pub struct RpcServer {
    listener: TcpListener,
    store: SharedStore,
    codec: FrameCodec,
}

impl RpcServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        store: SharedStore,
        codec: FrameCodec,
    ) -> Result<RpcServer, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(RpcServer::new(listener, store, codec))
    }

    pub fn new(listener: TcpListener, store: SharedStore, codec: FrameCodec) -> RpcServer {
        RpcServer {
            listener,
            store,
            codec,
        }
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `shutdown` is cancelled, then waits for every connection to
    /// finish the call it is serving.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), Error> {
        info!("RPC server listening on {}", self.local_addr()?);

        let tracker = TaskTracker::new();

        let result = loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break Ok(()),
                accepted = self.listener.accept() => accepted,
            };

            let (socket, client_address) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => break Err(Error::from(e)),
            };
            info!("Accepted connection from {:?}", client_address);

            let store = self.store.clone();
            let codec = self.codec.clone();
            let shutdown = shutdown.clone();
            tracker.spawn(async move {
                let res = handle_connection(socket, client_address, store, codec, shutdown).await;
                if let Err(e) = res {
                    error!("Connection error: {}", e);
                }
            });
        };

        tracker.close();
        debug!("Waiting for {} connections to finish", tracker.len());
        tracker.wait().await;

        info!("RPC server stopped");
        result
    }
}

#[instrument(
    name = "connection",
    skip(stream, store, codec, shutdown),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    store: SharedStore,
    codec: FrameCodec,
    shutdown: CancellationToken,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream, client_address, codec);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    loop {
        // Only waiting for the next call is interrupted, a call already read is answered.
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = conn.read_frame() => frame?,
        };
        let Some(frame) = frame else {
            break;
        };

        debug!("Received frame from client: {}", frame);
        let res = dispatch(frame, store.as_ref()).await;
        debug!("Sending response to client: {}", res);

        conn.write_frame(res).await?;
    }

    info!("Connection closed");
    Ok(())
}

/// Runs one call and turns any failure into an error reply.
pub async fn dispatch(frame: Frame, store: &dyn AlbumStore) -> Frame {
    let result = match Procedure::try_from(frame) {
        Ok(procedure) => procedure.exec(store).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(frame) => frame,
        Err(err) => {
            warn!("Call failed: {}", err);
            Frame::err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::album::{Album, AlbumId, NewAlbum};
    use crate::store::{MemoryStore, StoreError, StoreResult};
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl AlbumStore for BrokenStore {
        async fn list_all(&self) -> StoreResult<Vec<Album>> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }

        async fn get_by_id(&self, _id: AlbumId) -> StoreResult<Album> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }

        async fn create(&self, _album: NewAlbum) -> StoreResult<Album> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }

        async fn update(&self, _id: AlbumId, _album: NewAlbum) -> StoreResult<Album> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }

        async fn delete(&self, _id: AlbumId) -> StoreResult<()> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }

        async fn count(&self) -> StoreResult<usize> {
            Err(StoreError::Unavailable("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn dispatch_invalid_id_is_error_reply() {
        let res = dispatch(Frame::call("GETALBUMBYID", ["abc"]), &MemoryStore::new()).await;

        assert_eq!(res, Frame::Error("ERR invalid album id 'abc'".to_string()));
    }

    #[tokio::test]
    async fn dispatch_unknown_procedure_is_error_reply() {
        let frame = Frame::call("FLUSHALL", Vec::<String>::new());

        let res = dispatch(frame, &MemoryStore::new()).await;

        assert_eq!(res, Frame::Error("ERR unknown procedure 'FLUSHALL'".to_string()));
    }

    #[tokio::test]
    async fn dispatch_store_failure_is_error_reply() {
        let res = dispatch(Frame::call("GETALBUMS", Vec::<String>::new()), &BrokenStore).await;

        assert_eq!(
            res,
            Frame::Error("ERR store unavailable: disk on fire".to_string())
        );
    }

    #[tokio::test]
    async fn dispatch_not_found_is_null() {
        let res = dispatch(Frame::call("GETALBUMBYID", ["5"]), &MemoryStore::new()).await;

        assert_eq!(res, Frame::Null);
    }
}
