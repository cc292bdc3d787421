use async_trait::async_trait;

use crate::frame::Frame;
use crate::rpc::procedures::executable::Executable;
use crate::rpc::procedures::{ProcedureParser, RpcError};
use crate::rpc::wire::album_to_frame;
use crate::store::AlbumStore;

/// Returns every live album, each encoded as an album message.
#[derive(Debug, PartialEq)]
pub struct GetAlbums;

#[async_trait]
impl Executable for GetAlbums {
    async fn exec(self, store: &dyn AlbumStore) -> Result<Frame, RpcError> {
        let albums = store.list_all().await?;
        Ok(Frame::Array(albums.iter().map(album_to_frame).collect()))
    }
}

impl TryFrom<&mut ProcedureParser> for GetAlbums {
    type Error = RpcError;

    fn try_from(_parser: &mut ProcedureParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
