use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use spark_rpc_codec::ProtocolVersions;
use spark_rpc_core::observability::keys;
use spark_rpc_core::{
    InvocationError, Invoker, InvokerConfig, RequestMetadata, ResponseMetadata, Result, Target,
};
use tokio::net::TcpStream;
use tracing::{Instrument, debug, info_span, warn};

use crate::error::{CONNECT, EXCHANGE, map_io_error, timeout_error};
use crate::frame::{DEFAULT_MAX_FRAME_LEN, encode_frame, read_frame, send_frame};

/// 基于 Tokio 的 TCP 调用器：每次调用建立一条连接，完成一次请求/响应往返后关闭。
///
/// # 教案式说明
/// - **意图 (Why)**：以最小的传输实现落地 [`Invoker`] 契约，连接不复用，调用之间没有共享状态；
/// - **执行逻辑 (How)**：
///   1. 先编码请求元数据并组装整帧（含帧长上限检查），任一步失败时不发起任何网络操作；
///   2. 在 `tokio::time::timeout` 的保护下完成“建连 → 写帧 → 读帧”；可选的建连超时在其内部单独生效；
///   3. 解码响应元数据，非零响应码转换为分类错误；
/// - **契约 (What)**：
///   - 从不重试；超时返回 `Retryable`（错误码 `TIMEOUT`），不返回部分结果；
///   - 返回的每个错误都带有请求元数据中的能力标识与实现标识；
///   - 连接与缓冲区归调用 future 所有，超时或取消导致 future 被丢弃时随之释放，
///     与成功路径释放的资源完全一致。
#[derive(Clone, Debug)]
pub struct TcpInvoker {
    versions: ProtocolVersions,
    connect_timeout: Option<Duration>,
    max_frame_len: usize,
}

impl TcpInvoker {
    pub fn new(versions: ProtocolVersions) -> Self {
        Self {
            versions,
            connect_timeout: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    /// 按调用器配置构造（目前只读取建连超时）。
    pub fn from_config(versions: ProtocolVersions, config: &InvokerConfig) -> Self {
        Self::new(versions).with_connect_timeout(config.connect_timeout())
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// 编码请求元数据并组装整帧。
    fn frame(&self, request: &RequestMetadata, payload: &[u8]) -> Result<Bytes> {
        let metadata = self.versions.encode_request(request)?;
        encode_frame(&metadata, payload, self.max_frame_len)
    }

    async fn connect(&self, target: &Target) -> Result<TcpStream> {
        let connecting = TcpStream::connect((target.host(), target.port()));
        let stream = match self.connect_timeout {
            Some(limit) => {
                let started = Instant::now();
                tokio::time::timeout(limit, connecting)
                    .await
                    .map_err(|_| timeout_error(CONNECT, started.elapsed().as_millis()))?
            }
            None => connecting.await,
        };
        let stream = stream.map_err(|err| map_io_error(CONNECT, err))?;
        // 单次往返的小帧，关闭 Nagle 以免被延迟确认拖慢。
        stream
            .set_nodelay(true)
            .map_err(|err| map_io_error(CONNECT, err))?;
        Ok(stream)
    }

    async fn exchange(&self, target: &Target, frame: Bytes) -> Result<(ResponseMetadata, Bytes)> {
        let mut stream = self.connect(target).await?;
        send_frame(&mut stream, &frame).await?;
        let (response_metadata, response_payload) = read_frame(&mut stream, self.max_frame_len).await?;
        let response = self.versions.decode_response(response_metadata)?;
        match InvocationError::from_response(&response) {
            Some(err) => Err(err),
            None => Ok((response, response_payload)),
        }
    }
}

#[async_trait]
impl Invoker for TcpInvoker {
    async fn invoke(
        &self,
        target: &Target,
        request: &RequestMetadata,
        payload: Bytes,
        timeout: Duration,
    ) -> Result<(ResponseMetadata, Bytes)> {
        let span = info_span!(
            keys::SPAN_INVOKE,
            rpc.capability = %request.capability_id,
            rpc.provider = %request.provider_id,
            rpc.target = %target
        );
        async move {
            let started = Instant::now();
            let outcome = match self.frame(request, &payload) {
                Ok(frame) => {
                    debug!(timeout_ms = timeout.as_millis() as u64, "tcp invocation started");
                    match tokio::time::timeout(timeout, self.exchange(target, frame)).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(timeout_error(EXCHANGE, started.elapsed().as_millis())),
                    }
                }
                Err(err) => Err(err),
            }
            .map_err(|err| {
                err.with_capability(request.capability_id.as_str())
                    .with_provider(request.provider_id.as_str())
            });

            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &outcome {
                Ok(_) => debug!(rpc.elapsed_ms = elapsed_ms, "tcp invocation finished"),
                Err(err) => warn!(
                    rpc.elapsed_ms = elapsed_ms,
                    rpc.error.kind = err.kind().as_str(),
                    rpc.error.code = err.code(),
                    "tcp invocation failed: {err}"
                ),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}
