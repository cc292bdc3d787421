use async_trait::async_trait;

use crate::album::NewAlbum;
use crate::frame::Frame;
use crate::rpc::procedures::executable::Executable;
use crate::rpc::procedures::{ProcedureParser, RpcError};
use crate::rpc::wire::album_to_frame;
use crate::store::AlbumStore;

/// Stores a new album and returns it with the id the store assigned.
///
/// Arguments are `id title artist price [tax]`. The id is required on the wire but ignored,
/// the store always picks its own.
#[derive(Debug, PartialEq)]
pub struct CreateAlbum {
    pub album: NewAlbum,
}

#[async_trait]
impl Executable for CreateAlbum {
    async fn exec(self, store: &dyn AlbumStore) -> Result<Frame, RpcError> {
        let album = store.create(self.album).await?;
        Ok(album_to_frame(&album))
    }
}

impl TryFrom<&mut ProcedureParser> for CreateAlbum {
    type Error = RpcError;

    fn try_from(parser: &mut ProcedureParser) -> Result<Self, Self::Error> {
        let _id = parser.next_string()?;
        let album = parser.next_album()?;
        Ok(Self { album })
    }
}
