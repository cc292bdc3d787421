// RESP framing, used as the RPC wire format.
// https://redis.io/docs/reference/protocol-spec

use bytes::{Buf, Bytes};
use std::fmt;
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

// Calls are one array deep and replies two.
const MAX_DEPTH: usize = 32;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("unsupported frame data type: {0}")]
    UnsupportedDataType(char),
    #[error("protocol error; invalid frame format: {0}")]
    InvalidFormat(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    pub fn bulk(value: impl Into<String>) -> Frame {
        Frame::Bulk(Bytes::from(value.into()))
    }

    /// An error reply in the conventional `ERR <message>` form.
    pub fn err(message: impl fmt::Display) -> Frame {
        Frame::Error(format!("ERR {message}"))
    }

    /// Builds a call frame: the procedure name followed by its arguments, all as bulk strings.
    pub fn call<I, S>(name: &str, args: I) -> Frame
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut parts = vec![Frame::bulk(name)];
        parts.extend(args.into_iter().map(Frame::bulk));
        Frame::Array(parts)
    }

    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        Self::parse_nested(src, 0)
    }

    fn parse_nested(src: &mut Cursor<&[u8]>, depth: usize) -> Result<Self, Error> {
        if depth > MAX_DEPTH {
            return Err(Error::InvalidFormat("frame nesting too deep".to_string()));
        }

        // The first byte in an RESP-serialized payload always identifies its type.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => Ok(Frame::Simple(get_line_string(src)?)),
            DataType::SimpleError => Ok(Frame::Error(get_line_string(src)?)),
            DataType::Integer => Ok(Frame::Integer(get_integer(src)?)),
            // $<length>\r\n<data>\r\n
            DataType::BulkString => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(len) => Ok(Frame::Bulk(Bytes::copy_from_slice(get_exact(src, len)?))),
            },
            // !<length>\r\n<error>\r\n
            DataType::BulkError => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(len) => {
                    let msg = String::from_utf8(get_exact(src, len)?.to_vec())?;
                    Ok(Frame::Error(msg))
                }
            },
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(len) => {
                    // Elements are at least 3 bytes each, don't trust the header beyond that.
                    let mut frames = Vec::with_capacity(len.min(src.remaining() / 3));
                    for _ in 0..len {
                        frames.push(Self::parse_nested(src, depth + 1)?);
                    }
                    Ok(Frame::Array(frames))
                }
            },
            DataType::Null => {
                get_line(src)?;
                Ok(Frame::Null)
            }
            data_type => Err(Error::UnsupportedDataType(u8::from(data_type) as char)),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes);
        bytes
    }

    fn write_to(&self, dst: &mut Vec<u8>) {
        match self {
            Frame::Simple(s) => {
                dst.push(u8::from(DataType::SimpleString));
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Frame::Error(s) => {
                dst.push(u8::from(DataType::SimpleError));
                dst.extend_from_slice(s.as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Frame::Integer(i) => {
                dst.push(u8::from(DataType::Integer));
                dst.extend_from_slice(i.to_string().as_bytes());
                dst.extend_from_slice(CRLF);
            }
            Frame::Bulk(data) => {
                dst.push(u8::from(DataType::BulkString));
                dst.extend_from_slice(data.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                dst.extend_from_slice(data);
                dst.extend_from_slice(CRLF);
            }
            Frame::Null => {
                dst.push(u8::from(DataType::Null));
                dst.extend_from_slice(CRLF);
            }
            Frame::Array(frames) => {
                dst.push(u8::from(DataType::Array));
                dst.extend_from_slice(frames.len().to_string().as_bytes());
                dst.extend_from_slice(CRLF);
                for frame in frames {
                    frame.write_to(dst);
                }
            }
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "_"),
            Frame::Array(frames) => {
                write!(f, "[")?;
                for (i, frame) in frames.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", frame)?;
                }
                write!(f, "]")
            }
        }
    }
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    let end = buf[start..]
        .windows(2)
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((end + CRLF.len()) as u64);
    Ok(&buf[start..end])
}

fn get_line_string(src: &mut Cursor<&[u8]>) -> Result<String, Error> {
    Ok(String::from_utf8(get_line(src)?.to_vec())?)
}

fn get_integer(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let line = get_line_string(src)?;
    line.parse::<i64>()
        .map_err(|_| Error::InvalidFormat(format!("invalid integer {:?}", line)))
}

/// Reads a length header. `-1` is the RESP2 null marker.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    match get_integer(src)? {
        -1 => Ok(None),
        len if len < 0 => Err(Error::InvalidFormat(format!("invalid length {}", len))),
        len => Ok(Some(len as usize)),
    }
}

fn get_exact<'a>(src: &mut Cursor<&'a [u8]>, len: usize) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();
    let end = start.checked_add(len).ok_or(Error::Incomplete)?;

    if buf.len() < end + CRLF.len() {
        return Err(Error::Incomplete);
    }
    if &buf[end..end + CRLF.len()] != CRLF {
        return Err(Error::InvalidFormat(
            "bulk data is not terminated by CRLF".to_string(),
        ));
    }

    src.set_position((end + CRLF.len()) as u64);
    Ok(&buf[start..end])
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    BulkError,    // '!'
    Array,        // '*'
    Null,         // '_'
    Boolean,      // '#'
    Double,       // ','
    Map,          // '%'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'!' => Ok(Self::BulkError),
            b'*' => Ok(Self::Array),
            b'_' => Ok(Self::Null),
            b'#' => Ok(Self::Boolean),
            b',' => Ok(Self::Double),
            b'%' => Ok(Self::Map),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::BulkError => b'!',
            DataType::Array => b'*',
            DataType::Null => b'_',
            DataType::Boolean => b'#',
            DataType::Double => b',',
            DataType::Map => b'%',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        Error::InvalidFormat("invalid UTF-8 string".to_string())
    }
}
