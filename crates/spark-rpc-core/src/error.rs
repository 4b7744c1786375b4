//! 调用核心的错误分类。
//!
//! # 设计背景（Why）
//! - 路由、筛选、编解码与传输各层产生的故障需要合流为一个带标签的错误类型，
//!   调用方依据 [`ErrorKind`] 决定“立即失败 / 重新路由后重试 / 走显式降级分支”，
//!   而不是解析错误消息或比较类型层级；
//! - 线上响应只携带 `i32` 错误码，因此分类与错误码之间通过一张静态表双向映射，
//!   编译期即可确定，不依赖任何运行期注解或反射。
//!
//! # 契约说明（What）
//! - `code == 0` 恒表示成功，永不出现在 [`InvocationError`] 中；
//! - 表中未登记的非零错误码一律归入 [`ErrorKind::Unclassified`]，按不可重试处理；
//! - [`ErrorKind::Retryable`] 是 [`ErrorKind::Degradable`] 的特化：两者的 `is_degradable()` 均为 `true`。

use std::borrow::Cow;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::protocol::{ResponseMetadata, tags};

/// 线上错误码常量集合。
///
/// 码值一经发布即视为协议的一部分，只允许追加，禁止复用或修改。
pub mod codes {
    /// 成功。
    pub const SUCCESS: i32 = 0;
    /// 未分类的失败，保守地按不可重试处理。
    pub const UNCLASSIFIED: i32 = 0x7F00_0000;
    /// 调用方违反前置条件。
    pub const INVALID_ARGUMENT: i32 = 0x7F00_0001;
    /// 筛选后无可用目标。
    pub const TARGET_NOT_FOUND: i32 = 0x7F00_0002;
    /// 要求唯一实现时匹配到多个实现。
    pub const TOO_MANY_PROVIDERS: i32 = 0x7F00_0003;
    /// 能力未注册实现，或指定的实现不存在。
    pub const PROVIDER_NOT_FOUND: i32 = 0x7F00_0004;
    /// 元数据或负载无法编解码。
    pub const SERIALIZATION: i32 = 0x7F00_0005;
    /// 允许降级的失败。
    pub const DEGRADABLE: i32 = 0x7F01_0000;
    /// 瞬时失败，可换目标重试。
    pub const RETRYABLE: i32 = 0x7F01_0001;
    /// 调用超时（可重试）。
    pub const TIMEOUT: i32 = 0x7F01_0002;
    /// 传输层瞬时故障（可重试）。
    pub const TRANSPORT: i32 = 0x7F01_0003;
}

/// 错误分类。
///
/// 分类即处置策略：`InvalidArgument`/`Serialization` 立即失败；`Retryable` 可换目标重试；
/// `Degradable` 交由调用方选择显式降级；其余按调用方自身策略处理。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidArgument,
    TargetNotFound,
    TooManyProviders,
    ProviderNotFound,
    Degradable,
    Retryable,
    Serialization,
    Unclassified,
}

/// 分类表中的一行：线上码值、分类与稳定的点分标识。
#[derive(Clone, Copy, Debug)]
pub struct Classification {
    pub code: i32,
    pub kind: ErrorKind,
    pub name: &'static str,
}

/// 错误码分类表。
///
/// 同一分类可以登记多个码值（例如超时与传输故障都归为 `Retryable`），
/// 每个分类的**第一行**即为该分类的规范码值。
const CLASSIFICATIONS: &[Classification] = &[
    Classification {
        code: codes::INVALID_ARGUMENT,
        kind: ErrorKind::InvalidArgument,
        name: "rpc.invalid_argument",
    },
    Classification {
        code: codes::TARGET_NOT_FOUND,
        kind: ErrorKind::TargetNotFound,
        name: "rpc.target_not_found",
    },
    Classification {
        code: codes::TOO_MANY_PROVIDERS,
        kind: ErrorKind::TooManyProviders,
        name: "rpc.too_many_providers",
    },
    Classification {
        code: codes::PROVIDER_NOT_FOUND,
        kind: ErrorKind::ProviderNotFound,
        name: "rpc.provider_not_found",
    },
    Classification {
        code: codes::SERIALIZATION,
        kind: ErrorKind::Serialization,
        name: "rpc.serialization",
    },
    Classification {
        code: codes::DEGRADABLE,
        kind: ErrorKind::Degradable,
        name: "rpc.degradable",
    },
    Classification {
        code: codes::RETRYABLE,
        kind: ErrorKind::Retryable,
        name: "rpc.retryable",
    },
    Classification {
        code: codes::TIMEOUT,
        kind: ErrorKind::Retryable,
        name: "rpc.timeout",
    },
    Classification {
        code: codes::TRANSPORT,
        kind: ErrorKind::Retryable,
        name: "rpc.transport",
    },
    Classification {
        code: codes::UNCLASSIFIED,
        kind: ErrorKind::Unclassified,
        name: "rpc.unclassified",
    },
];

/// 遍历完整的分类表，供文档生成与契约测试使用。
pub fn classifications() -> &'static [Classification] {
    CLASSIFICATIONS
}

/// 按码值查表；`0` 与未登记码值返回 `None`。
pub fn lookup(code: i32) -> Option<&'static Classification> {
    CLASSIFICATIONS.iter().find(|row| row.code == code)
}

impl ErrorKind {
    fn canonical(self) -> &'static Classification {
        CLASSIFICATIONS
            .iter()
            .find(|row| row.kind == self)
            .unwrap_or(&CLASSIFICATIONS[CLASSIFICATIONS.len() - 1])
    }

    /// 分类的规范线上码值。
    pub fn code(self) -> i32 {
        self.canonical().code
    }

    /// 稳定的点分标识，例如 `rpc.target_not_found`。
    pub fn as_str(self) -> &'static str {
        self.canonical().name
    }

    /// 把非零码值解析为分类；未登记的码值归入 `Unclassified`，`0` 返回 `None`。
    pub fn from_code(code: i32) -> Option<Self> {
        if code == codes::SUCCESS {
            return None;
        }
        Some(lookup(code).map_or(ErrorKind::Unclassified, |row| row.kind))
    }

    /// 是否允许调用方走降级分支（`Retryable` 同样成立）。
    pub fn is_degradable(self) -> bool {
        matches!(self, ErrorKind::Degradable | ErrorKind::Retryable)
    }

    /// 是否可以换目标重试。
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Retryable)
    }
}

/// 调用核心对外抛出的唯一错误类型。
///
/// # 教案式说明
/// - **意图 (Why)**：以“分类 + 结构化字段”取代异常类层级，调用方通过 `match err.kind()`
///   即可完成分类处置，日志也能直接读取能力/实现标识与错误码；
/// - **契约 (What)**：
///   - `kind`：处置分类；`code`：线上码值，默认取分类的规范码值，来自远端响应时保留原值；
///   - `capability_id`/`provider_id`：已知时必须附带，便于在不解析消息的情况下定位；
///   - `degradation_key`：可选的降级键，调用方据此挑选降级分支；
///   - `source`：底层原因（I/O 错误、UTF-8 错误等）。
/// - **权衡 (Trade-offs)**：消息使用 `Cow<'static, str>`，静态文案零分配，动态文案按需分配。
#[derive(Debug, Error)]
#[error("[{name}] {message}")]
pub struct InvocationError {
    kind: ErrorKind,
    code: i32,
    name: &'static str,
    message: Cow<'static, str>,
    capability_id: Option<Arc<str>>,
    provider_id: Option<Arc<str>>,
    degradation_key: Option<String>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

/// 调用核心统一的返回值别名。
pub type Result<T, E = InvocationError> = core::result::Result<T, E>;

impl InvocationError {
    /// 以分类与消息构造错误，码值取分类的规范码值。
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            code: kind.code(),
            name: kind.as_str(),
            message: message.into(),
            capability_id: None,
            provider_id: None,
            degradation_key: None,
            source: None,
        }
    }

    pub fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// 筛选后没有任何目标。
    pub fn target_not_found(capability_id: impl Into<Arc<str>>) -> Self {
        let capability_id = capability_id.into();
        Self::new(
            ErrorKind::TargetNotFound,
            format!("no target available for capability `{capability_id}`"),
        )
        .with_capability(capability_id)
    }

    /// 未指定实现而能力下存在多个实现。
    pub fn too_many_providers(capability_id: impl Into<Arc<str>>, count: usize) -> Self {
        let capability_id = capability_id.into();
        Self::new(
            ErrorKind::TooManyProviders,
            format!(
                "capability `{capability_id}` has {count} providers, an explicit provider id is required"
            ),
        )
        .with_capability(capability_id)
    }

    pub fn provider_not_found(capability_id: impl Into<Arc<str>>, provider_id: Option<&str>) -> Self {
        let capability_id = capability_id.into();
        let err = match provider_id {
            Some(provider_id) => Self::new(
                ErrorKind::ProviderNotFound,
                format!("provider `{provider_id}` is not registered for capability `{capability_id}`"),
            )
            .with_provider(provider_id),
            None => Self::new(
                ErrorKind::ProviderNotFound,
                format!("capability `{capability_id}` has no registered provider"),
            ),
        };
        err.with_capability(capability_id)
    }

    pub fn serialization(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn degradable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Degradable, message)
    }

    pub fn retryable(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Retryable, message)
    }

    /// 把失败响应还原为分类错误；成功响应返回 `None`。
    ///
    /// # 执行逻辑（How）
    /// 1. `code == 0` 直接返回 `None`；
    /// 2. 按分类表解析码值，未登记码值归入 `Unclassified`，并**保留原始码值**；
    /// 3. 若响应 TLV 中携带 [`tags::DEGRADATION_KEY`]，写入 `degradation_key`。
    pub fn from_response(response: &ResponseMetadata) -> Option<Self> {
        let kind = ErrorKind::from_code(response.code)?;
        let mut err = Self::new(kind, response.message.clone()).with_code(response.code);
        if let Some(key) = response.tag_values.text(tags::DEGRADATION_KEY) {
            err = err.with_degradation_key(key);
        }
        Some(err)
    }

    pub fn with_capability(mut self, capability_id: impl Into<Arc<str>>) -> Self {
        self.capability_id = Some(capability_id.into());
        self
    }

    pub fn with_provider(mut self, provider_id: impl Into<Arc<str>>) -> Self {
        self.provider_id = Some(provider_id.into());
        self
    }

    pub fn with_degradation_key(mut self, key: impl Into<String>) -> Self {
        self.degradation_key = Some(key.into());
        self
    }

    /// 覆盖线上码值；`0` 被忽略，错误永远不会携带成功码。
    pub fn with_code(mut self, code: i32) -> Self {
        if code != codes::SUCCESS {
            self.code = code;
            self.name = lookup(code)
                .filter(|row| row.kind == self.kind)
                .map_or(self.kind.as_str(), |row| row.name);
        }
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    /// 码值对应的稳定标识；未登记的码值取分类的标识。
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn capability_id(&self) -> Option<&str> {
        self.capability_id.as_deref()
    }

    pub fn provider_id(&self) -> Option<&str> {
        self.provider_id.as_deref()
    }

    pub fn degradation_key(&self) -> Option<&str> {
        self.degradation_key.as_deref()
    }

    pub fn is_degradable(&self) -> bool {
        self.kind.is_degradable()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
