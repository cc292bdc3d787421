use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use uuid::Uuid;

use crate::codec::FrameCodec;
use crate::frame::Frame;
use crate::Result;

/// A TCP stream framed with [`FrameCodec`].
///
/// Data read from the socket is buffered by the codec until a whole frame is available, so
/// `read_frame` may be cancelled and retried without losing input.
pub struct Connection {
    pub id: Uuid,
    pub peer_addr: SocketAddr,
    framed: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream, peer_addr: SocketAddr, codec: FrameCodec) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            peer_addr,
            framed: Framed::new(stream, codec),
        }
    }

    /// Opens a client-side connection to `addr`.
    pub async fn connect(addr: SocketAddr, codec: FrameCodec) -> Result<Connection> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Connection::new(stream, addr, codec))
    }

    /// Reads the next frame. `None` means the peer closed the connection cleanly.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.framed.next().await.transpose()
    }

    pub async fn write_frame(&mut self, frame: Frame) -> Result<()> {
        self.framed.send(frame).await
    }
}
