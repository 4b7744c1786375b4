#![deny(unsafe_code)]
//! spark-rpc-router：能力目录、目标筛选策略与调用路由器。
//!
//! # 模块结构（How）
//! - [`catalog`]：能力/实现登记表（`ArcSwap` 快照）；
//! - [`locator`]：内存目标定位器（`DashMap`）；
//! - [`filter`]：内置筛选策略与具名策略注册表；
//! - [`router`]：按能力与策略选出目标；
//! - [`client`]：路由 + 元数据构造 + 单次调用。

pub mod catalog;
pub mod client;
pub mod filter;
pub mod locator;
pub mod router;

pub use catalog::{CapabilityCatalog, CatalogEntry};
pub use client::{InvocationClient, InvocationRequest, InvocationResponse};
pub use filter::{
    FilterRegistry, HostMatchChampion, LocalWorkerChampion, RandomChampion, RoundRobinChampion,
    WorkerFairFilter, WorkerMatchChampion,
};
pub use locator::StaticTargetLocator;
pub use router::Router;
