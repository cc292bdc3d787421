use async_trait::async_trait;

use crate::album::AlbumId;
use crate::frame::Frame;
use crate::rpc::procedures::executable::Executable;
use crate::rpc::procedures::{ProcedureParser, RpcError};
use crate::store::{AlbumStore, StoreError};

/// Removes the album stored under `id`. Replies 1 when it was removed and 0 when there was none.
#[derive(Debug, PartialEq)]
pub struct DeleteAlbum {
    pub id: AlbumId,
}

#[async_trait]
impl Executable for DeleteAlbum {
    async fn exec(self, store: &dyn AlbumStore) -> Result<Frame, RpcError> {
        match store.delete(self.id).await {
            Ok(()) => Ok(Frame::Integer(1)),
            Err(StoreError::NotFound(_)) => Ok(Frame::Integer(0)),
            Err(err) => Err(err.into()),
        }
    }
}

impl TryFrom<&mut ProcedureParser> for DeleteAlbum {
    type Error = RpcError;

    fn try_from(parser: &mut ProcedureParser) -> Result<Self, Self::Error> {
        let id = parser.next_album_id()?;
        Ok(Self { id })
    }
}
