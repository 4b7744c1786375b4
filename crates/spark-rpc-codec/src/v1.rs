use bytes::{Bytes, BytesMut};
use spark_rpc_core::{CommunicationVersion, RequestMetadata, ResponseMetadata, Result};

use crate::frame;

/// 协议版本 1：不携带异步任务号。
#[derive(Clone, Copy, Debug, Default)]
pub struct ProtocolV1;

impl ProtocolV1 {
    pub const VERSION: u16 = 1;
}

impl CommunicationVersion for ProtocolV1 {
    fn supported(&self) -> u16 {
        Self::VERSION
    }

    fn serialize_request(&self, metadata: &RequestMetadata, dst: &mut BytesMut) -> Result<()> {
        frame::encode_request(Self::VERSION, false, metadata, dst)
    }

    fn deserialize_request(&self, src: &mut Bytes) -> Result<RequestMetadata> {
        frame::decode_request(Self::VERSION, false, src)
    }

    fn serialize_response(&self, metadata: &ResponseMetadata, dst: &mut BytesMut) -> Result<()> {
        frame::encode_response(Self::VERSION, metadata, dst)
    }

    fn deserialize_response(&self, src: &mut Bytes) -> Result<ResponseMetadata> {
        frame::decode_response(Self::VERSION, src)
    }
}
