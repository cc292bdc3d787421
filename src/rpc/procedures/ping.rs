use async_trait::async_trait;

use crate::frame::Frame;
use crate::rpc::procedures::executable::Executable;
use crate::rpc::procedures::{ProcedureParser, RpcError};
use crate::store::AlbumStore;

/// Returns PONG if no argument is provided, otherwise a copy of the argument as a bulk.
#[derive(Debug, PartialEq)]
pub struct Ping {
    pub payload: Option<String>,
}

#[async_trait]
impl Executable for Ping {
    async fn exec(self, _store: &dyn AlbumStore) -> Result<Frame, RpcError> {
        let res = self
            .payload
            .map_or(Frame::Simple("PONG".to_string()), Frame::bulk);

        Ok(res)
    }
}

impl TryFrom<&mut ProcedureParser> for Ping {
    type Error = RpcError;

    fn try_from(parser: &mut ProcedureParser) -> Result<Self, Self::Error> {
        let payload = parser.next_optional_string()?;
        Ok(Self { payload })
    }
}
