use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error as ThisError;
use tracing::{debug, warn};

use crate::album::{Album, AlbumId, NewAlbum};
use crate::codec::FrameCodec;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::rpc::wire::{album_from_frame, WireError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, ThisError)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(crate::Error),
    #[error("server replied with an error: {0}")]
    Remote(String),
    #[error("unexpected reply {0}")]
    UnexpectedReply(Frame),
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection closed by server")]
    ConnectionClosed,
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl From<crate::Error> for ClientError {
    fn from(err: crate::Error) -> Self {
        ClientError::Transport(err)
    }
}

/// A client for the album procedures. Calls are sent one at a time over a single connection.
///
/// After a timeout or transport failure the connection may still carry a late reply, so the
/// client refuses further calls with [`ClientError::ConnectionClosed`]. Connect again to retry.
pub struct RpcClient {
    conn: Connection,
    timeout: Duration,
    broken: bool,
}

impl RpcClient {
    pub async fn connect(addr: SocketAddr) -> Result<RpcClient, ClientError> {
        let conn = Connection::connect(addr, FrameCodec::default()).await?;
        Ok(RpcClient {
            conn,
            timeout: DEFAULT_TIMEOUT,
            broken: false,
        })
    }

    /// Sets how long each call may take before it fails with [`ClientError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> RpcClient {
        self.timeout = timeout;
        self
    }

    pub async fn ping(&mut self) -> Result<String, ClientError> {
        match self.call("PING", vec![]).await? {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            frame => Err(ClientError::UnexpectedReply(frame)),
        }
    }

    pub async fn get_albums(&mut self) -> Result<Vec<Album>, ClientError> {
        match self.call("GETALBUMS", vec![]).await? {
            Frame::Array(frames) => frames
                .into_iter()
                .map(|frame| album_from_frame(frame).map_err(ClientError::from))
                .collect(),
            frame => Err(ClientError::UnexpectedReply(frame)),
        }
    }

    pub async fn get_album_by_id(&mut self, id: AlbumId) -> Result<Option<Album>, ClientError> {
        let reply = self.call("GETALBUMBYID", vec![id.to_string()]).await?;
        optional_album(reply)
    }

    /// Creates `album`. The server assigns the id, the one sent here is a placeholder.
    pub async fn create_album(&mut self, album: &NewAlbum) -> Result<Album, ClientError> {
        let mut args = vec!["0".to_string()];
        args.extend(album_args(album));

        let reply = self.call("CREATEALBUM", args).await?;
        Ok(album_from_frame(reply)?)
    }

    pub async fn update_album(
        &mut self,
        id: AlbumId,
        album: &NewAlbum,
    ) -> Result<Option<Album>, ClientError> {
        let mut args = vec![id.to_string()];
        args.extend(album_args(album));

        let reply = self.call("UPDATEALBUM", args).await?;
        optional_album(reply)
    }

    /// Returns whether an album was deleted.
    pub async fn delete_album(&mut self, id: AlbumId) -> Result<bool, ClientError> {
        match self.call("DELETEALBUM", vec![id.to_string()]).await? {
            Frame::Integer(n) => Ok(n > 0),
            frame => Err(ClientError::UnexpectedReply(frame)),
        }
    }

    /// Sends a raw call frame and returns the reply, error replies included.
    pub async fn send(&mut self, frame: Frame) -> Result<Frame, ClientError> {
        if self.broken {
            return Err(ClientError::ConnectionClosed);
        }

        let timeout = self.timeout;
        let exchange = async {
            self.conn.write_frame(frame).await?;
            self.conn.read_frame().await
        };

        let err = match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(Some(reply))) => return Ok(reply),
            Ok(Ok(None)) => ClientError::ConnectionClosed,
            Ok(Err(e)) => ClientError::Transport(e),
            Err(_) => ClientError::Timeout(timeout),
        };

        warn!("Closing RPC client: {}", err);
        self.broken = true;
        Err(err)
    }

    async fn call(&mut self, name: &str, args: Vec<String>) -> Result<Frame, ClientError> {
        debug!("Calling {} with {} arguments", name, args.len());

        match self.send(Frame::call(name, args)).await? {
            Frame::Error(msg) => Err(ClientError::Remote(msg)),
            reply => Ok(reply),
        }
    }
}

fn album_args(album: &NewAlbum) -> [String; 4] {
    [
        album.title.clone(),
        album.artist.clone(),
        album.price.to_string(),
        album.tax.to_string(),
    ]
}

fn optional_album(reply: Frame) -> Result<Option<Album>, ClientError> {
    match reply {
        Frame::Null => Ok(None),
        frame => Ok(Some(album_from_frame(frame)?)),
    }
}
