//! 运行期配置：路由器与调用器的可调参数。
//!
//! # 教案级说明
//! - **意图 (Why)**：筛选策略、超时与协议版本都是部署期决策，集中在一份 TOML 中描述，
//!   由宿主在启动阶段装载一次后构造路由器与调用客户端；
//! - **契约 (What)**：[`RpcConfig::from_toml_str`] 完成解析与校验，返回的配置即可直接使用；
//!   解析失败与语义校验失败均以 [`ConfigError`] 返回；
//! - **设计 (How)**：`serde` 派生反序列化，缺省字段通过 `#[serde(default)]` 填充；
//!   策略种类使用 kebab-case 字符串（`round-robin`、`worker-fair` …）。
//!
//! ```toml
//! [router]
//! local_worker_id = "worker-a"
//! default_strategy = "rr"
//!
//! [[router.strategies]]
//! name = "rr"
//! kind = "round-robin"
//!
//! [[router.strategies]]
//! name = "sticky"
//! kind = "worker-match"
//! extension_key = "sticky.worker"
//!
//! [invoker]
//! timeout_ms = 1500
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 配置装载与校验错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("配置解析失败: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("配置字段 `{field}` 非法: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// 顶层配置。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    pub router: RouterConfig,
    #[serde(default)]
    pub invoker: InvokerConfig,
}

impl RpcConfig {
    /// 解析并校验 TOML 文本。
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: RpcConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.router.validate()?;
        self.invoker.validate()
    }
}

/// 未配置时使用的策略名。
pub const DEFAULT_STRATEGY: &str = "round-robin";

fn default_strategy_name() -> String {
    DEFAULT_STRATEGY.to_owned()
}

/// 路由器配置。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// 本进程的 worker 标识，作为筛选链的 `local_worker_id`。
    pub local_worker_id: String,
    /// 调用方未指定策略时使用的策略名。
    #[serde(default = "default_strategy_name")]
    pub default_strategy: String,
    /// 额外注册的具名策略；内置策略（`empty`、`random`、`round-robin`、`local-worker`、
    /// `worker-fair`）无需声明即可使用。
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

impl RouterConfig {
    pub fn new(local_worker_id: impl Into<String>) -> Self {
        Self {
            local_worker_id: local_worker_id.into(),
            default_strategy: default_strategy_name(),
            strategies: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local_worker_id.trim().is_empty() {
            return Err(ConfigError::invalid("router.local_worker_id", "must not be blank"));
        }
        if self.default_strategy.trim().is_empty() {
            return Err(ConfigError::invalid("router.default_strategy", "must not be blank"));
        }
        let mut names = BTreeSet::new();
        for strategy in &self.strategies {
            strategy.validate()?;
            if !names.insert(strategy.name.as_str()) {
                return Err(ConfigError::invalid(
                    "router.strategies.name",
                    format!("duplicate strategy `{}`", strategy.name),
                ));
            }
        }
        Ok(())
    }
}

/// 策略种类。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    Empty,
    Random,
    RoundRobin,
    HostMatch,
    WorkerMatch,
    LocalWorker,
    WorkerFair,
}

impl StrategyKind {
    /// 至多选出一个目标的“冠军”策略。
    pub fn is_champion(self) -> bool {
        matches!(
            self,
            StrategyKind::Random
                | StrategyKind::RoundRobin
                | StrategyKind::HostMatch
                | StrategyKind::WorkerMatch
                | StrategyKind::LocalWorker
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::Empty => "empty",
            StrategyKind::Random => "random",
            StrategyKind::RoundRobin => "round-robin",
            StrategyKind::HostMatch => "host-match",
            StrategyKind::WorkerMatch => "worker-match",
            StrategyKind::LocalWorker => "local-worker",
            StrategyKind::WorkerFair => "worker-fair",
        }
    }
}

/// 一条具名策略声明。
///
/// - `host-match` 需要 `value`（目标主机）；
/// - `worker-match` 需要 `value`（固定 worker）或 `extension_key`（从扩展参数读取 worker）；
/// - `worker-fair` 的 `champion` 缺省为 `round-robin`，`value`/`extension_key` 传给该冠军策略。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub kind: StrategyKind,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub extension_key: Option<String>,
    #[serde(default)]
    pub champion: Option<StrategyKind>,
}

impl StrategyConfig {
    pub fn new(name: impl Into<String>, kind: StrategyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: None,
            extension_key: None,
            champion: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_extension_key(mut self, key: impl Into<String>) -> Self {
        self.extension_key = Some(key.into());
        self
    }

    pub fn with_champion(mut self, champion: StrategyKind) -> Self {
        self.champion = Some(champion);
        self
    }

    /// 实际生效的冠军策略种类：`worker-fair` 取 `champion`（缺省轮询），其余取自身。
    pub fn effective_champion(&self) -> StrategyKind {
        match self.kind {
            StrategyKind::WorkerFair => self.champion.unwrap_or(StrategyKind::RoundRobin),
            other => other,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid("router.strategies.name", "must not be blank"));
        }
        if let Some(champion) = self.champion {
            if self.kind != StrategyKind::WorkerFair {
                return Err(ConfigError::invalid(
                    "router.strategies.champion",
                    format!("strategy `{}` is not worker-fair", self.name),
                ));
            }
            if !champion.is_champion() {
                return Err(ConfigError::invalid(
                    "router.strategies.champion",
                    format!("`{}` cannot pick a single target", champion.as_str()),
                ));
            }
        }
        let has_value = self.value.as_deref().is_some_and(|v| !v.trim().is_empty());
        let has_key = self
            .extension_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        match self.effective_champion() {
            StrategyKind::HostMatch if !has_value => Err(ConfigError::invalid(
                "router.strategies.value",
                format!("host-match strategy `{}` needs a host", self.name),
            )),
            StrategyKind::WorkerMatch if !has_value && !has_key => Err(ConfigError::invalid(
                "router.strategies.value",
                format!(
                    "worker-match strategy `{}` needs a worker id or an extension key",
                    self.name
                ),
            )),
            _ => Ok(()),
        }
    }
}

fn default_timeout_ms() -> u64 {
    3_000
}

/// 调用器配置。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokerConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// 缺省时使用编解码器支持的最新版本。
    #[serde(default)]
    pub protocol_version: Option<u16>,
    #[serde(default)]
    pub data_format: u8,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            protocol_version: None,
            data_format: 0,
            connect_timeout_ms: None,
        }
    }
}

impl InvokerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::invalid("invoker.timeout_ms", "must be positive"));
        }
        if let Some(connect) = self.connect_timeout_ms {
            if connect == 0 || connect > self.timeout_ms {
                return Err(ConfigError::invalid(
                    "invoker.connect_timeout_ms",
                    "must be positive and not exceed timeout_ms",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [router]
        local_worker_id = "worker-a"
        default_strategy = "fair"

        [[router.strategies]]
        name = "fair"
        kind = "worker-fair"
        champion = "random"

        [[router.strategies]]
        name = "sticky"
        kind = "worker-match"
        extension_key = "sticky.worker"

        [invoker]
        timeout_ms = 1500
        protocol_version = 1
    "#;

    #[test]
    fn parses_full_document() {
        let config = RpcConfig::from_toml_str(SAMPLE).expect("合法配置");
        assert_eq!(config.router.local_worker_id, "worker-a");
        assert_eq!(config.router.strategies.len(), 2);
        assert_eq!(
            config.router.strategies[0].effective_champion(),
            StrategyKind::Random
        );
        assert_eq!(config.invoker.timeout(), Duration::from_millis(1500));
        assert_eq!(config.invoker.protocol_version, Some(1));
        assert_eq!(config.invoker.data_format, 0);
    }

    #[test]
    fn invoker_section_is_optional() {
        let config = RpcConfig::from_toml_str("[router]\nlocal_worker_id = \"w\"\n").expect("最小配置");
        assert_eq!(config.invoker, InvokerConfig::default());
        assert_eq!(config.router.default_strategy, "round-robin");
    }

    #[test]
    fn rejects_semantic_errors() {
        let cases = [
            "[router]\nlocal_worker_id = \" \"\n",
            "[router]\nlocal_worker_id = \"w\"\n[[router.strategies]]\nname = \"h\"\nkind = \"host-match\"\n",
            "[router]\nlocal_worker_id = \"w\"\n[[router.strategies]]\nname = \"r\"\nkind = \"random\"\nchampion = \"random\"\n",
            "[router]\nlocal_worker_id = \"w\"\n[[router.strategies]]\nname = \"f\"\nkind = \"worker-fair\"\nchampion = \"empty\"\n",
            "[router]\nlocal_worker_id = \"w\"\n[invoker]\ntimeout_ms = 0\n",
            "[router]\nlocal_worker_id = \"w\"\n[invoker]\ntimeout_ms = 10\nconnect_timeout_ms = 20\n",
        ];
        for raw in cases {
            let err = RpcConfig::from_toml_str(raw).expect_err("非法配置");
            assert!(matches!(err, ConfigError::Invalid { .. }), "{raw}: {err}");
        }
    }

    #[test]
    fn rejects_duplicate_names_and_unknown_kinds() {
        let duplicate = "[router]\nlocal_worker_id = \"w\"\n\
            [[router.strategies]]\nname = \"x\"\nkind = \"random\"\n\
            [[router.strategies]]\nname = \"x\"\nkind = \"empty\"\n";
        assert!(matches!(
            RpcConfig::from_toml_str(duplicate),
            Err(ConfigError::Invalid { field: "router.strategies.name", .. })
        ));

        let unknown = "[router]\nlocal_worker_id = \"w\"\n[[router.strategies]]\nname = \"x\"\nkind = \"fastest\"\n";
        assert!(matches!(RpcConfig::from_toml_str(unknown), Err(ConfigError::Parse(_))));
    }
}
