use bytes::Bytes;

use crate::error::{InvocationError, codes};
use crate::model::{Provider, Version};

use super::{DataFormat, TagValues, tags};

/// 单次调用的请求元数据。
///
/// # 契约说明（What）
/// - `version` 必须是编解码器支持的协议版本，否则编码在写出任何字节之前失败；
/// - `async_task_id` 仅 V2 及以后的版本可以携带，且不得为空字符串（空串在线上表示“无”）；
/// - `tag_values` 的标签唯一，由 [`TagValues`] 保证。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestMetadata {
    pub version: u16,
    pub data_format: DataFormat,
    pub capability_id: String,
    pub capability_version: Version,
    pub provider_id: String,
    pub provider_version: Version,
    pub async_task_id: Option<String>,
    pub tag_values: TagValues,
}

impl RequestMetadata {
    /// 以选中的实现填充能力/实现字段，扩展区为空。
    pub fn for_provider(version: u16, data_format: DataFormat, provider: &Provider) -> Self {
        let capability = provider.capability();
        Self {
            version,
            data_format,
            capability_id: capability.id().to_owned(),
            capability_version: capability.version(),
            provider_id: provider.id().to_owned(),
            provider_version: provider.version(),
            async_task_id: None,
            tag_values: TagValues::new(),
        }
    }

    pub fn with_async_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.async_task_id = Some(task_id.into());
        self
    }

    pub fn with_tag(mut self, tag: u16, value: impl Into<Bytes>) -> Self {
        self.tag_values.insert(tag, value);
        self
    }
}

/// 单次调用的响应元数据；`code == 0` 是唯一的成功值。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub version: u16,
    pub data_format: DataFormat,
    pub code: i32,
    pub message: String,
    pub tag_values: TagValues,
}

impl ResponseMetadata {
    pub fn success(version: u16, data_format: DataFormat) -> Self {
        Self {
            version,
            data_format,
            code: codes::SUCCESS,
            message: String::new(),
            tag_values: TagValues::new(),
        }
    }

    /// 服务端把分类错误写成响应：保留码值与消息，降级键写入 [`tags::DEGRADATION_KEY`]。
    pub fn from_error(version: u16, data_format: DataFormat, error: &InvocationError) -> Self {
        let mut tag_values = TagValues::new();
        if let Some(key) = error.degradation_key() {
            tag_values.insert_text(tags::DEGRADATION_KEY, key);
        }
        Self {
            version,
            data_format,
            code: error.code(),
            message: error.message().to_owned(),
            tag_values,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::Capability;

    #[test]
    fn request_copies_provider_identity() {
        let capability = Capability::new("calc.add", Version::new(1, 0, 0));
        let provider = Provider::new("impl-1", Version::new(1, 2, 0), capability);
        let request = RequestMetadata::for_provider(2, DataFormat::JSON, &provider)
            .with_async_task_id("task-9")
            .with_tag(tags::TRACE_ID, Bytes::from_static(b"trace"));

        assert_eq!(request.capability_id, "calc.add");
        assert_eq!(request.provider_version, Version::new(1, 2, 0));
        assert_eq!(request.async_task_id.as_deref(), Some("task-9"));
        assert_eq!(request.tag_values.text(tags::TRACE_ID), Some("trace"));
    }

    #[test]
    fn error_response_round_trips_through_classification() {
        let error = InvocationError::degradable("inventory offline").with_degradation_key("stale-cache");
        let response = ResponseMetadata::from_error(1, DataFormat::PROTOBUF, &error);
        assert!(!response.is_success());

        let restored = InvocationError::from_response(&response).expect("失败响应");
        assert_eq!(restored.kind(), ErrorKind::Degradable);
        assert_eq!(restored.degradation_key(), Some("stale-cache"));
        assert_eq!(restored.message(), "inventory offline");
    }
}
