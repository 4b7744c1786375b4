use bytes::{Bytes, BytesMut};
use spark_rpc_core::{CommunicationVersion, RequestMetadata, ResponseMetadata, Result};

use crate::frame;

/// 协议版本 2：在实现版本之后追加 `async_task_id`，空字符串表示“无”。
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtocolV2;

impl ProtocolV2 {
    pub const VERSION: u16 = 2;
}

impl CommunicationVersion for ProtocolV2 {
    fn supported(&self) -> u16 {
        Self::VERSION
    }

    fn serialize_request(&self, metadata: &RequestMetadata, dst: &mut BytesMut) -> Result<()> {
        frame::encode_request(Self::VERSION, true, metadata, dst)
    }

    fn deserialize_request(&self, src: &mut Bytes) -> Result<RequestMetadata> {
        frame::decode_request(Self::VERSION, true, src)
    }

    fn serialize_response(&self, metadata: &ResponseMetadata, dst: &mut BytesMut) -> Result<()> {
        frame::encode_response(Self::VERSION, metadata, dst)
    }

    fn deserialize_response(&self, src: &mut Bytes) -> Result<ResponseMetadata> {
        frame::decode_response(Self::VERSION, src)
    }
}
