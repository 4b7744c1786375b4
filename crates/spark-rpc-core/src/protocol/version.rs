use bytes::{Bytes, BytesMut};

use crate::error::Result;

use super::{RequestMetadata, ResponseMetadata};

/// 协议版本的编解码契约。
///
/// # 教案式说明
/// - **意图 (Why)**：线上格式按版本演进，每个版本独立实现编解码，协商层只做精确匹配，
///   不做任何隐式的升级或降级转换；
/// - **契约 (What)**：
///   - `supported()` 返回本实现唯一支持的版本号，与帧首的 `version:u16` 对应；
///   - 对任意合法元数据 `m`（`m.version == supported()`），`deserialize_*(serialize_*(m)) == m`；
///   - `serialize_*` 在元数据非法（版本不符、V1 携带异步任务号等）时返回 `Serialization`
///     或 `InvalidArgument`，且**不向 `dst` 写入任何字节**；
///   - `deserialize_*` 从 `src` 消费一个完整帧；截断、非法 UTF-8、重复 TLV 标签、版本不符
///     一律返回 `Serialization`；
/// - **权衡 (Trade-offs)**：以 `BytesMut`/`Bytes` 作为缓冲契约，解码出的 TLV 值可以零拷贝切片。
pub trait CommunicationVersion: Send + Sync + 'static {
    fn supported(&self) -> u16;

    fn serialize_request(&self, metadata: &RequestMetadata, dst: &mut BytesMut) -> Result<()>;

    fn deserialize_request(&self, src: &mut Bytes) -> Result<RequestMetadata>;

    fn serialize_response(&self, metadata: &ResponseMetadata, dst: &mut BytesMut) -> Result<()>;

    fn deserialize_response(&self, src: &mut Bytes) -> Result<ResponseMetadata>;
}
