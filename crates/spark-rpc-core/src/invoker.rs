use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::model::Target;
use crate::protocol::{RequestMetadata, ResponseMetadata};

/// 对单个目标执行一次调用。
///
/// # 教案式说明
/// - **意图 (Why)**：把“发送 + 等待响应”抽象为唯一的异步入口，路由与传输彼此解耦；
/// - **契约 (What)**：
///   - 调用至多执行一次，实现**不得**自行重试，重试与否由调用方依据错误分类决定；
///   - 超过 `timeout` 时返回 `Retryable`，不返回部分结果；
///   - 仅当响应码为 `0` 时返回 `Ok`，失败响应经 [`crate::InvocationError::from_response`] 转换为分类错误；
///   - 传输故障按可恢复性映射为 `Retryable` 或 `Degradable`；
/// - **权衡 (Trade-offs)**：连接、缓冲区均归调用 future 所有，future 被丢弃（超时或取消）时一并释放。
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(
        &self,
        target: &Target,
        request: &RequestMetadata,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<(ResponseMetadata, Bytes)>;
}
