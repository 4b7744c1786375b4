use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use spark_rpc_core::{
    CommunicationVersion, InvocationError, RequestMetadata, ResponseMetadata, Result,
};

use crate::{ProtocolV1, ProtocolV2, wire};

/// 已支持的协议版本集合，新版本在前。
///
/// # 教案式说明
/// - **意图 (Why)**：调用方按对端声明的版本号挑选编解码实现；发送时缺省使用最新版本；
/// - **契约 (What)**：
///   - [`ProtocolVersions::choose`] 线性扫描、精确匹配 `supported()`，未命中返回 `None`，
///     绝不隐式升级或降级；
///   - `encode_*` 在版本不受支持时返回 `Serialization`，且不产生任何字节；
///   - `decode_*` 要求输入恰好是一个完整帧，多余的尾部字节视为损坏；
/// - **权衡 (Trade-offs)**：版本数量极少（个位数），线性扫描比映射表更直观。
#[derive(Clone)]
pub struct ProtocolVersions {
    versions: Vec<Arc<dyn CommunicationVersion>>,
}

impl ProtocolVersions {
    /// 空集合，配合 [`ProtocolVersions::register`] 组装自定义版本。
    pub fn empty() -> Self {
        Self {
            versions: Vec::new(),
        }
    }

    /// 内置版本：V2、V1。
    pub fn standard() -> Self {
        Self::empty().register(ProtocolV1).register(ProtocolV2)
    }

    /// 注册版本并保持“新版本在前”；同号版本被替换。
    pub fn register(mut self, version: impl CommunicationVersion) -> Self {
        let supported = version.supported();
        self.versions.retain(|existing| existing.supported() != supported);
        let position = self
            .versions
            .iter()
            .position(|existing| existing.supported() < supported)
            .unwrap_or(self.versions.len());
        self.versions.insert(position, Arc::new(version));
        self
    }

    /// 最新的已支持版本。
    pub fn latest(&self) -> Option<&dyn CommunicationVersion> {
        self.versions.first().map(|version| version.as_ref())
    }

    pub fn choose(&self, version: u16) -> Option<&dyn CommunicationVersion> {
        self.versions
            .iter()
            .find(|candidate| candidate.supported() == version)
            .map(|candidate| candidate.as_ref())
    }

    /// 已支持的版本号，新版本在前。
    pub fn supported(&self) -> impl Iterator<Item = u16> + '_ {
        self.versions.iter().map(|version| version.supported())
    }

    fn require(&self, version: u16) -> Result<&dyn CommunicationVersion> {
        self.choose(version).ok_or_else(|| {
            InvocationError::serialization(format!("protocol version {version} is not supported"))
        })
    }

    fn peek_version(frame: &Bytes) -> Result<u16> {
        match frame.get(..2) {
            Some(&[high, low]) => Ok(u16::from_be_bytes([high, low])),
            _ => Err(wire::truncated("version", 2, frame.len())),
        }
    }

    fn ensure_consumed(rest: &Bytes) -> Result<()> {
        if !rest.is_empty() {
            return Err(InvocationError::serialization(format!(
                "{} trailing bytes after metadata frame",
                rest.len()
            )));
        }
        Ok(())
    }

    pub fn encode_request(&self, metadata: &RequestMetadata) -> Result<Bytes> {
        let codec = self.require(metadata.version)?;
        let mut dst = BytesMut::new();
        codec.serialize_request(metadata, &mut dst)?;
        Ok(dst.freeze())
    }

    /// 依据帧首版本号选择实现并解码。
    pub fn decode_request(&self, mut frame: Bytes) -> Result<RequestMetadata> {
        let codec = self.require(Self::peek_version(&frame)?)?;
        let metadata = codec.deserialize_request(&mut frame)?;
        Self::ensure_consumed(&frame)?;
        Ok(metadata)
    }

    pub fn encode_response(&self, metadata: &ResponseMetadata) -> Result<Bytes> {
        let codec = self.require(metadata.version)?;
        let mut dst = BytesMut::new();
        codec.serialize_response(metadata, &mut dst)?;
        Ok(dst.freeze())
    }

    pub fn decode_response(&self, mut frame: Bytes) -> Result<ResponseMetadata> {
        let codec = self.require(Self::peek_version(&frame)?)?;
        let metadata = codec.deserialize_response(&mut frame)?;
        Self::ensure_consumed(&frame)?;
        Ok(metadata)
    }
}

impl Default for ProtocolVersions {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ProtocolVersions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.supported()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_rpc_core::ErrorKind;

    #[test]
    fn standard_set_is_newest_first() {
        let versions = ProtocolVersions::standard();
        assert_eq!(versions.supported().collect::<Vec<_>>(), [2, 1]);
        assert_eq!(versions.latest().map(|v| v.supported()), Some(2));
        assert_eq!(format!("{versions:?}"), "[2, 1]");
    }

    #[test]
    fn register_replaces_same_version() {
        let versions = ProtocolVersions::standard().register(ProtocolV1);
        assert_eq!(versions.supported().collect::<Vec<_>>(), [2, 1]);
        assert!(ProtocolVersions::empty().latest().is_none());
    }

    #[test]
    fn choose_is_exact() {
        let versions = ProtocolVersions::standard();
        assert_eq!(versions.choose(1).map(|v| v.supported()), Some(1));
        assert!(versions.choose(0).is_none());
        assert!(versions.choose(3).is_none());
    }

    #[test]
    fn empty_input_is_truncated() {
        let err = ProtocolVersions::standard()
            .decode_response(Bytes::new())
            .expect_err("空帧");
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
