#![deny(unsafe_code)]
#![doc = "spark-rpc-core: 泛化服务调用核心契约。"]
#![doc = ""]
#![doc = "== 职责边界 =="]
#![doc = "本 Crate 只沉淀契约与数据模型：能力（Capability）/实现（Provider）/目标（Target）模型、错误分类、"]
#![doc = "调用元数据与协议版本契约、目标筛选链，以及面向外部协作者的 `TargetLocator`/`Invoker` 接口。"]
#![doc = "具体的筛选策略与路由器位于 `spark-rpc-router`，协议版本实现位于 `spark-rpc-codec`，"]
#![doc = "TCP 调用器位于 `spark-rpc-transport-tcp`。"]

/// 运行期配置，支持从 TOML 装载。
pub mod config;
pub mod error;
pub mod extensions;
pub mod filter;
pub mod invoker;
pub mod locator;
pub mod model;
pub mod observability;
pub mod protocol;

pub use config::{ConfigError, InvokerConfig, RouterConfig, RpcConfig, StrategyConfig, StrategyKind};
pub use error::{ErrorKind, InvocationError, Result, codes};
pub use extensions::{ExtensionValue, Extensions};
pub use filter::{Champion, ChampionFilter, FilterChain, TargetFilter};
pub use invoker::Invoker;
pub use locator::TargetLocator;
pub use model::{Capability, Provider, Target, Version};
pub use protocol::{
    CommunicationVersion, DataFormat, RequestMetadata, ResponseMetadata, TagValues, tags,
};
