use async_trait::async_trait;

use crate::frame::Frame;
use crate::rpc::procedures::RpcError;
use crate::store::AlbumStore;

#[async_trait]
pub trait Executable {
    async fn exec(self, store: &dyn AlbumStore) -> Result<Frame, RpcError>;
}
