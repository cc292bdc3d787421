use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};

use albumstore::codec::FrameCodec;
use albumstore::connection::Connection;
use albumstore::frame::Frame;

async fn create_connection(
    codec: FrameCodec,
) -> Result<(UnboundedSender<Vec<u8>>, Connection), std::io::Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let local_addr = listener.local_addr()?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            while let Some(data) = rx.recv().await {
                if socket.write_all(&data).await.is_err() {
                    break;
                }
            }
        }
    });

    let stream = TcpStream::connect(local_addr).await?;

    Ok((tx, Connection::new(stream, local_addr, codec)))
}

#[tokio::test]
async fn test_parse_simple_string() {
    let (tx, mut connection) = create_connection(FrameCodec::default()).await.unwrap();

    tx.send(b"+PONG\r\n".to_vec()).unwrap();

    let actual = connection.read_frame().await.unwrap();
    let expected = Some(Frame::Simple("PONG".to_string()));

    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_parse_album_message() {
    let (tx, mut connection) = create_connection(FrameCodec::default()).await.unwrap();

    let bytes = b"*4\r\n$2\r\nid\r\n$1\r\n1\r\n$5\r\ntitle\r\n$10\r\nHammerhead\r\n";

    tx.send(bytes.to_vec()).unwrap();

    let actual = connection.read_frame().await.unwrap();
    let expected = Some(Frame::Array(vec![
        Frame::Bulk(Bytes::from("id")),
        Frame::Bulk(Bytes::from("1")),
        Frame::Bulk(Bytes::from("title")),
        Frame::Bulk(Bytes::from("Hammerhead")),
    ]));

    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_parse_error_reply() {
    let (tx, mut connection) = create_connection(FrameCodec::default()).await.unwrap();

    tx.send(b"-ERR invalid album id 'abc'\r\n".to_vec()).unwrap();

    let actual = connection.read_frame().await.unwrap();
    let expected = Some(Frame::Error("ERR invalid album id 'abc'".to_string()));

    assert_eq!(actual, expected);
}

#[tokio::test]
async fn test_parse_frame_split_across_writes() {
    let (tx, mut connection) = create_connection(FrameCodec::default()).await.unwrap();

    tx.send(b"*2\r\n$12\r\nGETALBUM".to_vec()).unwrap();
    tx.send(b"BYID\r\n$1\r\n3\r\n".to_vec()).unwrap();

    let actual = connection.read_frame().await.unwrap();

    assert_eq!(actual, Some(Frame::call("GETALBUMBYID", ["3"])));
}

#[tokio::test]
async fn test_parse_multiple_frames_sequentially() {
    let (tx, mut connection) = create_connection(FrameCodec::default()).await.unwrap();

    tx.send(b"+PONG\r\n:1\r\n_\r\n".to_vec()).unwrap();
    tx.send(b"*0\r\n".to_vec()).unwrap();

    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(Frame::Simple("PONG".to_string()))
    );
    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(Frame::Integer(1))
    );
    assert_eq!(connection.read_frame().await.unwrap(), Some(Frame::Null));
    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(Frame::Array(vec![]))
    );
}

#[tokio::test]
async fn test_clean_close_is_none() {
    let (tx, mut connection) = create_connection(FrameCodec::default()).await.unwrap();

    tx.send(b":7\r\n".to_vec()).unwrap();
    drop(tx);

    assert_eq!(
        connection.read_frame().await.unwrap(),
        Some(Frame::Integer(7))
    );
    assert_eq!(connection.read_frame().await.unwrap(), None);
}

#[tokio::test]
async fn test_oversized_frame_is_error() {
    let (tx, mut connection) = create_connection(FrameCodec::new(32)).await.unwrap();

    let mut bytes = b"$1000\r\n".to_vec();
    bytes.extend(std::iter::repeat(b'a').take(100));
    tx.send(bytes).unwrap();

    assert!(connection.read_frame().await.is_err());
}

#[tokio::test]
async fn test_write_frame_reaches_peer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (socket, peer) = listener.accept().await.unwrap();
        let mut conn = Connection::new(socket, peer, FrameCodec::default());
        conn.read_frame().await.unwrap()
    });

    let mut client = Connection::connect(addr, FrameCodec::default()).await.unwrap();
    client
        .write_frame(Frame::call("DELETEALBUM", ["2"]))
        .await
        .unwrap();

    assert_eq!(
        server.await.unwrap(),
        Some(Frame::call("DELETEALBUM", ["2"]))
    );
}
