use async_trait::async_trait;

use crate::album::{AlbumId, NewAlbum};
use crate::frame::Frame;
use crate::rpc::procedures::executable::Executable;
use crate::rpc::procedures::{ProcedureParser, RpcError};
use crate::rpc::wire::album_to_frame;
use crate::store::{AlbumStore, StoreError};

/// Replaces the album stored under `id`, returning the updated album or `nil` when there is none.
#[derive(Debug, PartialEq)]
pub struct UpdateAlbum {
    pub id: AlbumId,
    pub album: NewAlbum,
}

#[async_trait]
impl Executable for UpdateAlbum {
    async fn exec(self, store: &dyn AlbumStore) -> Result<Frame, RpcError> {
        match store.update(self.id, self.album).await {
            Ok(album) => Ok(album_to_frame(&album)),
            Err(StoreError::NotFound(_)) => Ok(Frame::Null),
            Err(err) => Err(err.into()),
        }
    }
}

impl TryFrom<&mut ProcedureParser> for UpdateAlbum {
    type Error = RpcError;

    fn try_from(parser: &mut ProcedureParser) -> Result<Self, Self::Error> {
        let id = parser.next_album_id()?;
        let album = parser.next_album()?;
        Ok(Self { id, album })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::procedures::Procedure;
    use crate::rpc::wire::album_from_frame;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn existing_album() {
        let store = MemoryStore::new();
        store.create(NewAlbum::new("X", "Y", 10.0)).await.unwrap();

        let frame = Frame::call("UPDATEALBUM", ["1", "X2", "Y2", "12.5", "0.2"]);
        let procedure = Procedure::try_from(frame).unwrap();
        let album = album_from_frame(procedure.exec(&store).await.unwrap()).unwrap();

        assert_eq!(album.id, 1);
        assert_eq!(album.title, "X2");
        assert_eq!(album.price, 12.5);
        assert_eq!(album.tax, 0.2);
        assert_eq!(store.get_by_id(1).await.unwrap(), album);
    }

    #[tokio::test]
    async fn missing_album() {
        let frame = Frame::call("UPDATEALBUM", ["7", "X", "Y", "1"]);
        let procedure = Procedure::try_from(frame).unwrap();

        let result = procedure.exec(&MemoryStore::new()).await.unwrap();

        assert_eq!(result, Frame::Null);
    }

    #[test]
    fn negative_price() {
        let frame = Frame::call("UPDATEALBUM", ["1", "X", "Y", "-1"]);

        let err = Procedure::try_from(frame).unwrap_err();

        assert_eq!(
            err,
            RpcError::InvalidInput("price must be a non-negative number, got -1".to_string())
        );
    }
}
