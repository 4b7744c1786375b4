//! 日志字段约定与可选的订阅器安装入口。
//!
//! 库代码只通过 `tracing` 发出事件与 span，是否输出、输出到哪里由宿主决定。
//! span 名与字段名统一登记在 [`keys`] 中：span 宏直接引用常量，字段名在事件宏内以同名字面量书写
//! （`tracing` 字段名须为标识符），各 Crate 的日志测试按常量断言，日志检索与告警规则据此保持稳定。

/// 稳定的日志字段名与 span 名。
pub mod keys {
    /// 路由 span 名称。
    pub const SPAN_ROUTE: &str = "spark_rpc.route";
    /// 调用 span 名称。
    pub const SPAN_INVOKE: &str = "spark_rpc.invoke";

    pub const FIELD_CAPABILITY: &str = "rpc.capability";
    pub const FIELD_PROVIDER: &str = "rpc.provider";
    pub const FIELD_STRATEGY: &str = "rpc.strategy";
    pub const FIELD_CANDIDATES: &str = "rpc.candidates";
    pub const FIELD_SELECTED: &str = "rpc.selected";
    pub const FIELD_TARGET: &str = "rpc.target";
    pub const FIELD_PROTOCOL_VERSION: &str = "rpc.protocol.version";
    pub const FIELD_TLV_TAG: &str = "rpc.tlv.tag";
    pub const FIELD_ERROR_KIND: &str = "rpc.error.kind";
    pub const FIELD_ERROR_CODE: &str = "rpc.error.code";
    pub const FIELD_ELAPSED_MS: &str = "rpc.elapsed_ms";
}

/// 控制日志过滤规则的环境变量。
pub const LOG_ENV: &str = "SPARK_RPC_LOG";

/// 安装全局 `fmt + EnvFilter` 订阅器。
///
/// 过滤规则读取 [`LOG_ENV`]，缺省为 `info`。已有全局订阅器时返回错误，不覆盖宿主的配置。
#[cfg(feature = "subscriber")]
pub fn install_fmt_subscriber() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());
    tracing::subscriber::set_global_default(subscriber)
}
