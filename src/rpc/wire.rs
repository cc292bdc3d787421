use bytes::Bytes;
use itertools::Itertools;
use std::str;
use thiserror::Error as ThisError;

use crate::album::{Album, AlbumId};
use crate::frame::Frame;

/// Encodes an album as a flat array of field/value pairs.
///
/// Numbers are written as the shortest decimal text that parses back to the same value.
pub fn album_to_frame(album: &Album) -> Frame {
    Frame::Array(vec![
        Frame::bulk("id"),
        Frame::bulk(album.id.to_string()),
        Frame::bulk("title"),
        Frame::bulk(album.title.as_str()),
        Frame::bulk("artist"),
        Frame::bulk(album.artist.as_str()),
        Frame::bulk("price"),
        Frame::bulk(album.price.to_string()),
        Frame::bulk("tax"),
        Frame::bulk(album.tax.to_string()),
    ])
}

/// Decodes an album message. Unknown fields are skipped, every known field is required.
pub fn album_from_frame(frame: Frame) -> Result<Album, WireError> {
    let frames = match frame {
        Frame::Array(frames) => frames,
        frame => return Err(WireError::UnexpectedFrame(frame)),
    };
    if frames.len() % 2 != 0 {
        return Err(WireError::OddFieldCount(frames.len()));
    }

    let mut id = None;
    let mut title = None;
    let mut artist = None;
    let mut price = None;
    let mut tax = None;

    for (field, value) in frames.into_iter().tuples() {
        let field = frame_to_string(field)?;
        let value = frame_to_string(value)?;
        match field.as_str() {
            "id" => id = Some(parse_field::<AlbumId>("id", value)?),
            "title" => title = Some(value),
            "artist" => artist = Some(value),
            "price" => price = Some(parse_field::<f64>("price", value)?),
            "tax" => tax = Some(parse_field::<f64>("tax", value)?),
            _ => {}
        }
    }

    Ok(Album {
        id: id.ok_or(WireError::MissingField("id"))?,
        title: title.ok_or(WireError::MissingField("title"))?,
        artist: artist.ok_or(WireError::MissingField("artist"))?,
        price: price.ok_or(WireError::MissingField("price"))?,
        tax: tax.ok_or(WireError::MissingField("tax"))?,
        created_at: None,
        updated_at: None,
    })
}

fn frame_to_string(frame: Frame) -> Result<String, WireError> {
    match frame {
        Frame::Simple(s) => Ok(s),
        Frame::Bulk(bytes) => bulk_to_string(bytes),
        frame => Err(WireError::UnexpectedFrame(frame)),
    }
}

fn bulk_to_string(bytes: Bytes) -> Result<String, WireError> {
    str::from_utf8(&bytes[..])
        .map(|s| s.to_string())
        .map_err(|_| WireError::InvalidUtf8)
}

fn parse_field<T: str::FromStr>(field: &'static str, value: String) -> Result<T, WireError> {
    value
        .parse::<T>()
        .map_err(|_| WireError::InvalidField { field, value })
}

#[derive(Debug, ThisError, PartialEq)]
pub enum WireError {
    #[error("unexpected frame {0}")]
    UnexpectedFrame(Frame),
    #[error("album message has an odd number of elements ({0})")]
    OddFieldCount(usize),
    #[error("album message is missing '{0}'")]
    MissingField(&'static str),
    #[error("invalid {field} '{value}'")]
    InvalidField { field: &'static str, value: String },
    #[error("invalid UTF-8 string")]
    InvalidUtf8,
}
