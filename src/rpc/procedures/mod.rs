pub mod create_album;
pub mod delete_album;
pub mod executable;
pub mod get_album_by_id;
pub mod get_albums;
pub mod ping;
pub mod update_album;

use async_trait::async_trait;
use std::str::{self, FromStr};
use std::vec;
use strum_macros::{EnumString, IntoStaticStr};
use thiserror::Error as ThisError;

use crate::album::{AlbumId, NewAlbum, DEFAULT_TAX};
use crate::frame::Frame;
use crate::store::{AlbumStore, StoreError};

use create_album::CreateAlbum;
use delete_album::DeleteAlbum;
use executable::Executable;
use get_album_by_id::GetAlbumById;
use get_albums::GetAlbums;
use ping::Ping;
use update_album::UpdateAlbum;

#[derive(Debug, PartialEq)]
pub enum Procedure {
    CreateAlbum(CreateAlbum),
    DeleteAlbum(DeleteAlbum),
    GetAlbumById(GetAlbumById),
    GetAlbums(GetAlbums),
    UpdateAlbum(UpdateAlbum),

    Ping(Ping),
}

/// Procedure names as they appear on the wire, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProcedureName {
    CreateAlbum,
    DeleteAlbum,
    GetAlbumById,
    GetAlbums,
    UpdateAlbum,
    Ping,
}

impl ProcedureName {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[async_trait]
impl Executable for Procedure {
    async fn exec(self, store: &dyn AlbumStore) -> Result<Frame, RpcError> {
        match self {
            Procedure::CreateAlbum(procedure) => procedure.exec(store).await,
            Procedure::DeleteAlbum(procedure) => procedure.exec(store).await,
            Procedure::GetAlbumById(procedure) => procedure.exec(store).await,
            Procedure::GetAlbums(procedure) => procedure.exec(store).await,
            Procedure::UpdateAlbum(procedure) => procedure.exec(store).await,
            Procedure::Ping(procedure) => procedure.exec(store).await,
        }
    }
}

impl TryFrom<Frame> for Procedure {
    type Error = RpcError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Calls are sent as arrays: the procedure name followed by its arguments.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(RpcError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                })
            }
        };

        let mut parts = frames.into_iter();
        let name = match parts.next() {
            Some(frame) => frame_to_string(frame)?,
            None => return Err(RpcError::EndOfStream),
        };
        let name = ProcedureName::from_str(&name)
            .map_err(|_| RpcError::UnknownProcedure { name: name.clone() })?;

        let mut parser = ProcedureParser { name, parts };

        let procedure = match name {
            ProcedureName::CreateAlbum => {
                CreateAlbum::try_from(&mut parser).map(Procedure::CreateAlbum)
            }
            ProcedureName::DeleteAlbum => {
                DeleteAlbum::try_from(&mut parser).map(Procedure::DeleteAlbum)
            }
            ProcedureName::GetAlbumById => {
                GetAlbumById::try_from(&mut parser).map(Procedure::GetAlbumById)
            }
            ProcedureName::GetAlbums => GetAlbums::try_from(&mut parser).map(Procedure::GetAlbums),
            ProcedureName::UpdateAlbum => {
                UpdateAlbum::try_from(&mut parser).map(Procedure::UpdateAlbum)
            }
            ProcedureName::Ping => Ping::try_from(&mut parser).map(Procedure::Ping),
        }?;

        parser.finish()?;
        Ok(procedure)
    }
}

pub struct ProcedureParser {
    name: ProcedureName,
    parts: vec::IntoIter<Frame>,
}

impl ProcedureParser {
    fn next_frame(&mut self) -> Result<Frame, RpcError> {
        self.parts.next().ok_or(RpcError::WrongArity {
            procedure: self.name.as_str(),
        })
    }

    pub fn next_string(&mut self) -> Result<String, RpcError> {
        frame_to_string(self.next_frame()?)
    }

    /// Like `next_string`, but `None` once the arguments are exhausted.
    pub fn next_optional_string(&mut self) -> Result<Option<String>, RpcError> {
        match self.parts.next() {
            Some(frame) => frame_to_string(frame).map(Some),
            None => Ok(None),
        }
    }

    pub fn next_album_id(&mut self) -> Result<AlbumId, RpcError> {
        let id = self.next_string()?;
        if !id.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(RpcError::InvalidAlbumId(id));
        }
        id.parse::<AlbumId>()
            .map_err(|_| RpcError::InvalidAlbumId(id))
    }

    pub fn next_number(&mut self, field: &'static str) -> Result<f64, RpcError> {
        let value = self.next_string()?;
        parse_number(field, value)
    }

    /// Reads `title artist price [tax]` and validates the result.
    pub fn next_album(&mut self) -> Result<NewAlbum, RpcError> {
        let title = self.next_string()?;
        let artist = self.next_string()?;
        let price = self.next_number("price")?;
        let tax = match self.next_optional_string()? {
            Some(value) => parse_number("tax", value)?,
            None => DEFAULT_TAX,
        };

        let album = NewAlbum {
            title,
            artist,
            price,
            tax,
        };
        album
            .validate()
            .map_err(|err| RpcError::InvalidInput(err.to_string()))?;

        Ok(album)
    }

    /// Fails when arguments are left over.
    fn finish(&mut self) -> Result<(), RpcError> {
        if self.parts.len() > 0 {
            return Err(RpcError::WrongArity {
                procedure: self.name.as_str(),
            });
        }
        Ok(())
    }
}

fn frame_to_string(frame: Frame) -> Result<String, RpcError> {
    match frame {
        Frame::Simple(s) => Ok(s),
        Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
            .map(|s| s.to_string())
            .map_err(RpcError::InvalidUTF8String),
        frame => Err(RpcError::InvalidFrame {
            expected: "simple or bulk string".to_string(),
            actual: frame,
        }),
    }
}

fn parse_number(field: &'static str, value: String) -> Result<f64, RpcError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| RpcError::InvalidNumber { field, value })
}

#[derive(Debug, ThisError, PartialEq)]
pub enum RpcError {
    #[error("protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("unknown procedure '{name}'")]
    UnknownProcedure { name: String },
    #[error("wrong number of arguments for '{procedure}'")]
    WrongArity { procedure: &'static str },
    #[error("invalid album id '{0}'")]
    InvalidAlbumId(String),
    #[error("invalid {field} '{value}'")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid album: {0}")]
    InvalidInput(String),
    #[error("protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("protocol error; empty call")]
    EndOfStream,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn parse_name_case_insensitively() {
        let frame = Frame::call("getAlbums", Vec::<String>::new());

        let procedure = Procedure::try_from(frame).unwrap();

        assert_eq!(procedure, Procedure::GetAlbums(GetAlbums));
    }

    #[test]
    fn parse_simple_string_arguments() {
        let frame = Frame::Array(vec![
            Frame::Simple("GETALBUMBYID".to_string()),
            Frame::Simple("3".to_string()),
        ]);

        let procedure = Procedure::try_from(frame).unwrap();

        assert_eq!(procedure, Procedure::GetAlbumById(GetAlbumById { id: 3 }));
    }

    #[test]
    fn album_id_must_start_with_a_digit() {
        for id in ["+5", " 5", "5 ", ""] {
            let frame = Frame::call("GETALBUMBYID", vec![id]);

            let err = Procedure::try_from(frame).unwrap_err();

            assert_eq!(err, RpcError::InvalidAlbumId(id.to_string()));
        }
    }

    #[test]
    fn unknown_procedure() {
        let frame = Frame::call("FLUSHALL", Vec::<String>::new());

        let err = Procedure::try_from(frame).unwrap_err();

        assert_eq!(
            err,
            RpcError::UnknownProcedure {
                name: "FLUSHALL".to_string()
            }
        );
    }

    #[test]
    fn non_array_frame() {
        let err = Procedure::try_from(Frame::Simple("GETALBUMS".to_string())).unwrap_err();

        assert_eq!(
            err,
            RpcError::InvalidFrame {
                expected: "array".to_string(),
                actual: Frame::Simple("GETALBUMS".to_string())
            }
        );
    }

    #[test]
    fn empty_call() {
        let err = Procedure::try_from(Frame::Array(vec![])).unwrap_err();

        assert_eq!(err, RpcError::EndOfStream);
    }

    #[test]
    fn extra_arguments() {
        let err = Procedure::try_from(Frame::call("GETALBUMS", ["1"])).unwrap_err();

        assert_eq!(
            err,
            RpcError::WrongArity {
                procedure: "getalbums"
            }
        );
    }

    #[test]
    fn integer_argument_is_rejected() {
        let frame = Frame::Array(vec![Frame::bulk("GETALBUMBYID"), Frame::Integer(1)]);

        let err = Procedure::try_from(frame).unwrap_err();

        assert_eq!(
            err,
            RpcError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: Frame::Integer(1)
            }
        );
    }

    #[test]
    fn invalid_utf8_argument() {
        let frame = Frame::Array(vec![
            Frame::bulk("GETALBUMBYID"),
            Frame::Bulk(Bytes::from_static(&[0xff, 0xfe])),
        ]);

        let err = Procedure::try_from(frame).unwrap_err();

        assert!(matches!(err, RpcError::InvalidUTF8String(_)));
    }
}
