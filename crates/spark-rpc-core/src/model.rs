//! 能力 / 实现 / 目标的基础数据模型。
//!
//! # 教案级说明（Why）
//! - 调用链上的每一层（筛选链、路由器、调用器、协议编解码）都需要引用同一组只读标识，
//!   因此在核心 Crate 中集中定义，避免各实现层自行拼装字符串；
//! - 模型在注册阶段构造后保持不可变，使用 `Arc<str>` 保存标识，克隆成本恒定，适合在高并发路由中复制。
//!
//! # 模块结构（How）
//! - [`Version`]：`major.minor.patch` 三段式语义化版本，线上格式为 3 个 `u16`；
//! - [`Capability`]：逻辑服务契约；
//! - [`Provider`]：某个能力的一种具体实现；
//! - [`Target`]：承载实现的可达进程。

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{InvocationError, Result};

/// 语义化版本，三段均为 `u16`，与线上格式一一对应。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    major: u16,
    minor: u16,
    patch: u16,
}

impl Version {
    /// 构造版本号。
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub const fn major(&self) -> u16 {
        self.major
    }

    pub const fn minor(&self) -> u16 {
        self.minor
    }

    pub const fn patch(&self) -> u16 {
        self.patch
    }

    /// 以 `[major, minor, patch]` 顺序返回三段数值，供编解码器逐段写出。
    pub const fn segments(&self) -> [u16; 3] {
        [self.major, self.minor, self.patch]
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = InvocationError;

    /// 解析 `major.minor.patch`；缺省段按 0 处理（`"2"` 等价于 `"2.0.0"`），超过三段视为非法。
    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvocationError::invalid_argument("version string is blank"));
        }
        let mut segments = [0u16; 3];
        let mut count = 0;
        for part in trimmed.split('.') {
            if count == segments.len() {
                return Err(InvocationError::invalid_argument(format!(
                    "version `{trimmed}` has more than three segments"
                )));
            }
            segments[count] = part.parse::<u16>().map_err(|err| {
                InvocationError::invalid_argument(format!(
                    "version `{trimmed}` has an invalid segment `{part}`"
                ))
                .with_source(err)
            })?;
            count += 1;
        }
        Ok(Self::new(segments[0], segments[1], segments[2]))
    }
}

/// 逻辑服务契约（泛化服务），创建后不可变。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Capability {
    id: Arc<str>,
    version: Version,
}

impl Capability {
    pub fn new(id: impl Into<Arc<str>>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// 能力标识，例如 `calc.add`。
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 返回共享的标识句柄，错误上下文与计数器键直接复用，避免重复分配。
    pub fn shared_id(&self) -> Arc<str> {
        Arc::clone(&self.id)
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// 能力的一种具体实现。
///
/// # 契约说明（What）
/// - 同一能力可以被多个实现承载；每次调用恰好选中一个实现（除非调用方显式扇出）；
/// - `capability` 字段保存所属能力的完整快照，编码请求元数据时无需再次查表。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Provider {
    id: Arc<str>,
    version: Version,
    capability: Capability,
}

impl Provider {
    pub fn new(id: impl Into<Arc<str>>, version: Version, capability: Capability) -> Self {
        Self {
            id: id.into(),
            version,
            capability,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn shared_id(&self) -> Arc<str> {
        Arc::clone(&self.id)
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }
}

/// 可达的网络进程，承载一个或多个实现。
///
/// # 教案式说明
/// - **意图 (Why)**：目标列表由外部定位器在每次路由时给出，核心不持有、不缓存；
/// - **契约 (What)**：`worker_id` 标识进程，`host`/`port` 描述接入点；
///   `worker_id` 与 `host` 非空即视为格式良好（见 [`Target::is_well_formed`]），
///   筛选链在入口处统一校验；
/// - **权衡 (Trade-offs)**：端口使用 `u16`，由类型系统排除越界值。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    worker_id: Arc<str>,
    host: Arc<str>,
    port: u16,
}

impl Target {
    pub fn new(worker_id: impl Into<Arc<str>>, host: impl Into<Arc<str>>, port: u16) -> Self {
        Self {
            worker_id: worker_id.into(),
            host: host.into(),
            port,
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port` 形式的接入地址，供传输层建连使用。
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 进程标识与主机名均非空白。
    pub fn is_well_formed(&self) -> bool {
        !self.worker_id.trim().is_empty() && !self.host.trim().is_empty()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.worker_id, self.host, self.port)
    }
}
