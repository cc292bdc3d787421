use async_trait::async_trait;

use crate::album::AlbumId;
use crate::frame::Frame;
use crate::rpc::procedures::executable::Executable;
use crate::rpc::procedures::{ProcedureParser, RpcError};
use crate::rpc::wire::album_to_frame;
use crate::store::{AlbumStore, StoreError};

/// Get the album stored under `id`. If there is none the special value `nil` is returned.
#[derive(Debug, PartialEq)]
pub struct GetAlbumById {
    pub id: AlbumId,
}

#[async_trait]
impl Executable for GetAlbumById {
    async fn exec(self, store: &dyn AlbumStore) -> Result<Frame, RpcError> {
        match store.get_by_id(self.id).await {
            Ok(album) => Ok(album_to_frame(&album)),
            Err(StoreError::NotFound(_)) => Ok(Frame::Null),
            Err(err) => Err(err.into()),
        }
    }
}

impl TryFrom<&mut ProcedureParser> for GetAlbumById {
    type Error = RpcError;

    fn try_from(parser: &mut ProcedureParser) -> Result<Self, Self::Error> {
        let id = parser.next_album_id()?;
        Ok(Self { id })
    }
}
