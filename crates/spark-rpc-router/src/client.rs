//! 调用客户端：把路由、元数据构造与调用器串成一次完整调用。

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use spark_rpc_codec::ProtocolVersions;
use spark_rpc_core::observability::keys;
use spark_rpc_core::{
    DataFormat, Extensions, InvocationError, Invoker, InvokerConfig, RequestMetadata,
    ResponseMetadata, Result, TagValues, Target, tags,
};
use tracing::{Instrument, debug, info_span, warn};

use crate::router::Router;

/// 单次调用的参数。
#[derive(Clone, Debug)]
pub struct InvocationRequest {
    capability_id: String,
    provider_id: Option<String>,
    strategy: Option<String>,
    extensions: Option<Extensions>,
    async_task_id: Option<String>,
    tag_values: TagValues,
    payload: Bytes,
    timeout: Option<Duration>,
}

impl InvocationRequest {
    pub fn new(capability_id: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            capability_id: capability_id.into(),
            provider_id: None,
            strategy: None,
            extensions: None,
            async_task_id: None,
            tag_values: TagValues::new(),
            payload: payload.into(),
            timeout: None,
        }
    }

    /// 指定实现，能力下存在多个实现时必须提供。
    pub fn provider(mut self, provider_id: impl Into<String>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    /// 覆盖路由器的缺省策略。
    pub fn strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy = Some(name.into());
        self
    }

    pub fn extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = Some(extensions);
        self
    }

    pub fn async_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.async_task_id = Some(task_id.into());
        self
    }

    pub fn tag(mut self, tag: u16, value: impl Into<Bytes>) -> Self {
        self.tag_values.insert(tag, value);
        self
    }

    /// 覆盖配置中的调用超时。
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// 单次调用的结果：选中的目标、响应元数据与响应负载。
#[derive(Clone, Debug)]
pub struct InvocationResponse {
    pub target: Target,
    pub metadata: ResponseMetadata,
    pub payload: Bytes,
}

/// 调用客户端。
///
/// # 教案式说明
/// - **意图 (Why)**：业务代码只关心“调用某能力”，实现解析、目标路由、协议版本与数据格式的填充
///   集中在这里完成；
/// - **执行逻辑 (How)**：
///   1. 经能力目录挑选唯一实现（歧义返回 `TooManyProviders`）；
///   2. 按策略路由出目标（为空返回 `TargetNotFound`）；
///   3. 以协商好的协议版本与配置的数据格式构造请求元数据，缺省写入本地 worker 标识标签；
///   4. 交给调用器执行一次，非零响应码转换为分类错误；
/// - **契约 (What)**：客户端**从不重试**；调用方依据 `is_retryable()`/`is_degradable()` 自行决定后续动作。
pub struct InvocationClient<I> {
    router: Arc<Router>,
    invoker: I,
    versions: ProtocolVersions,
    protocol_version: u16,
    data_format: DataFormat,
    timeout: Duration,
}

impl<I: Invoker> InvocationClient<I> {
    /// 构造客户端；配置的协议版本必须在 `versions` 中，缺省取最新版本。
    pub fn new(
        router: Arc<Router>,
        invoker: I,
        versions: ProtocolVersions,
        config: &InvokerConfig,
    ) -> Result<Self> {
        let protocol_version = match config.protocol_version {
            Some(version) => versions.choose(version).map(|codec| codec.supported()),
            None => versions.latest().map(|codec| codec.supported()),
        }
        .ok_or_else(|| {
            InvocationError::invalid_argument(format!(
                "protocol version {:?} is not among the supported versions {versions:?}",
                config.protocol_version
            ))
        })?;

        Ok(Self {
            router,
            invoker,
            versions,
            protocol_version,
            data_format: DataFormat::from_raw(config.data_format),
            timeout: config.timeout(),
        })
    }

    pub fn protocol_version(&self) -> u16 {
        self.protocol_version
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn versions(&self) -> &ProtocolVersions {
        &self.versions
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub async fn invoke(&self, request: InvocationRequest) -> Result<InvocationResponse> {
        let span = info_span!(
            keys::SPAN_INVOKE,
            rpc.capability = %request.capability_id,
            rpc.protocol.version = self.protocol_version
        );
        self.invoke_inner(request).instrument(span).await
    }

    async fn invoke_inner(&self, request: InvocationRequest) -> Result<InvocationResponse> {
        let InvocationRequest {
            capability_id,
            provider_id,
            strategy,
            extensions,
            async_task_id,
            tag_values,
            payload,
            timeout,
        } = request;

        let provider = self
            .router
            .resolve_provider(&capability_id, provider_id.as_deref())?;
        let strategy = strategy.unwrap_or_else(|| self.router.default_strategy());
        let target = self
            .router
            .route(&capability_id, &strategy, extensions.as_ref())?;

        let mut metadata =
            RequestMetadata::for_provider(self.protocol_version, self.data_format, &provider);
        metadata.async_task_id = async_task_id;
        metadata.tag_values = tag_values;
        if !metadata.tag_values.contains(tags::WORKER_ID) {
            metadata
                .tag_values
                .insert_text(tags::WORKER_ID, &*self.router.local_worker_id());
        }

        let timeout = timeout.unwrap_or(self.timeout);
        debug!(rpc.provider = provider.id(), rpc.target = %target, "invocation started");
        let outcome = self
            .invoker
            .invoke(&target, &metadata, payload, timeout)
            .await
            .and_then(|(response, payload)| match InvocationError::from_response(&response) {
                Some(err) => Err(err),
                None => Ok((response, payload)),
            });

        match outcome {
            Ok((metadata, payload)) => {
                debug!(rpc.target = %target, "invocation finished");
                Ok(InvocationResponse {
                    target,
                    metadata,
                    payload,
                })
            }
            Err(err) => {
                let err = attach_context(err, &capability_id, provider.id());
                warn!(
                    rpc.target = %target,
                    rpc.error.kind = err.kind().as_str(),
                    rpc.error.code = err.code(),
                    "invocation failed: {err}"
                );
                Err(err)
            }
        }
    }
}

fn attach_context(err: InvocationError, capability_id: &str, provider_id: &str) -> InvocationError {
    let err = if err.capability_id().is_none() {
        err.with_capability(capability_id)
    } else {
        err
    };
    if err.provider_id().is_none() {
        err.with_provider(provider_id)
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CapabilityCatalog;
    use crate::locator::StaticTargetLocator;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use spark_rpc_core::{Capability, Provider, Version};
    use tracing_test::traced_test;

    /// 直接以成功响应回显负载的调用器。
    struct EchoInvoker;

    #[async_trait]
    impl Invoker for EchoInvoker {
        async fn invoke(
            &self,
            _: &Target,
            request: &RequestMetadata,
            payload: Bytes,
            _: Duration,
        ) -> Result<(ResponseMetadata, Bytes)> {
            Ok((ResponseMetadata::success(request.version, request.data_format), payload))
        }
    }

    #[traced_test]
    #[test]
    fn invoke_span_uses_registered_field_names() {
        let catalog = Arc::new(CapabilityCatalog::new());
        let capability = Capability::new("calc.add", Version::new(1, 0, 0));
        catalog.register_provider(Provider::new("impl-1", Version::new(1, 0, 0), capability));
        let locator = StaticTargetLocator::new();
        locator.register("calc.add", Target::new("w-1", "127.0.0.1", 7000));
        let router = Arc::new(Router::new(catalog, Arc::new(locator), "w-1"));

        let client = InvocationClient::new(
            router,
            EchoInvoker,
            ProtocolVersions::standard(),
            &InvokerConfig::default(),
        )
        .expect("缺省配置合法");
        let response = block_on(client.invoke(InvocationRequest::new("calc.add", "payload")))
            .expect("调用成功");
        assert_eq!(response.payload, Bytes::from_static(b"payload"));

        assert!(logs_contain("invocation finished"));
        assert!(logs_contain(keys::SPAN_INVOKE));
        for field in [
            keys::FIELD_CAPABILITY,
            keys::FIELD_PROTOCOL_VERSION,
            keys::FIELD_PROVIDER,
            keys::FIELD_TARGET,
        ] {
            assert!(logs_contain(&format!("{field}=")), "missing field {field}");
        }
    }
}
