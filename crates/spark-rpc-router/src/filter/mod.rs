//! 内置筛选策略与具名策略注册表。
//!
//! - [`champion`]：至多选出一个目标的策略（随机、轮询、主机匹配、worker 匹配、本地 worker）；
//! - [`fanout`]：按 worker 分区后每区各选一个的扇出策略；
//! - [`registry`]：策略名到筛选链的映射，由路由器持有，不存在进程级单例。

pub mod champion;
pub mod fanout;
pub mod registry;

pub use champion::{
    HostMatchChampion, LocalWorkerChampion, RandomChampion, RoundRobinChampion,
    WorkerMatchChampion,
};
pub use fanout::WorkerFairFilter;
pub use registry::FilterRegistry;
