//! 目标筛选链契约。
//!
//! # 教案级说明（Why）
//! - 负载均衡策略本质上是纯函数 `(capability, local_worker_id, candidates, extensions) -> selected`，
//!   以 trait 表达后既能由结构体实现（需要状态，如轮询计数器），也能直接传入闭包；
//! - 前置条件只在链入口 [`FilterChain::apply`] 统一校验一次，组合进链的每个筛选器
//!   都可以假定输入合法，不必重复防御。
//!
//! # 契约说明（What）
//! - [`TargetFilter`]：接收候选列表所有权，返回筛选后的列表，可以为空；
//! - [`Champion`]：“冠军”策略只挑选至多一个下标，由 [`ChampionFilter`] 适配为筛选器；
//! - [`FilterChain`]：按 `then` 的顺序串联筛选器，空链即恒等筛选。

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{InvocationError, Result};
use crate::extensions::Extensions;
use crate::model::{Capability, Target};

/// 目标筛选器。
pub trait TargetFilter: Send + Sync {
    fn filter(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        candidates: Vec<Target>,
        extensions: &Extensions,
    ) -> Vec<Target>;
}

impl<F> TargetFilter for F
where
    F: Fn(&Capability, &str, Vec<Target>, &Extensions) -> Vec<Target> + Send + Sync,
{
    fn filter(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        candidates: Vec<Target>,
        extensions: &Extensions,
    ) -> Vec<Target> {
        self(capability, local_worker_id, candidates, extensions)
    }
}

/// 从候选列表中挑出至多一个目标的策略。
///
/// 空输入必须返回 `None`；返回越界下标时 [`ChampionFilter`] 按“未选中”处理。
pub trait Champion: Send + Sync {
    fn pick(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        candidates: &[Target],
        extensions: &Extensions,
    ) -> Option<usize>;

    /// 在扇出分区内挑选，`partition` 为分区标识（按 worker 扇出时即 worker 标识）。
    ///
    /// 有状态的策略（如轮询）按分区独立维护状态；无状态策略沿用默认实现。
    fn pick_in_partition(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        partition: &str,
        candidates: &[Target],
        extensions: &Extensions,
    ) -> Option<usize> {
        let _ = partition;
        self.pick(capability, local_worker_id, candidates, extensions)
    }
}

impl<C: Champion + ?Sized> Champion for Arc<C> {
    fn pick(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        candidates: &[Target],
        extensions: &Extensions,
    ) -> Option<usize> {
        (**self).pick(capability, local_worker_id, candidates, extensions)
    }

    fn pick_in_partition(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        partition: &str,
        candidates: &[Target],
        extensions: &Extensions,
    ) -> Option<usize> {
        (**self).pick_in_partition(capability, local_worker_id, partition, candidates, extensions)
    }
}

/// 把 [`Champion`] 适配为 [`TargetFilter`]：结果为空或单元素列表。
#[derive(Clone, Debug, Default)]
pub struct ChampionFilter<C> {
    champion: C,
}

impl<C> ChampionFilter<C> {
    pub fn new(champion: C) -> Self {
        Self { champion }
    }

    pub fn champion(&self) -> &C {
        &self.champion
    }
}

impl<C: Champion> TargetFilter for ChampionFilter<C> {
    fn filter(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        candidates: Vec<Target>,
        extensions: &Extensions,
    ) -> Vec<Target> {
        if candidates.is_empty() {
            return Vec::new();
        }
        self.champion
            .pick(capability, local_worker_id, &candidates, extensions)
            .and_then(|index| candidates.into_iter().nth(index))
            .into_iter()
            .collect()
    }
}

/// 按顺序组合的筛选链。
#[derive(Clone, Default)]
pub struct FilterChain {
    stages: Vec<Arc<dyn TargetFilter>>,
}

impl FilterChain {
    /// 空链：候选列表原样返回。
    pub fn new() -> Self {
        Self::default()
    }

    /// 以单个筛选器开头的链。
    pub fn of(filter: impl TargetFilter + 'static) -> Self {
        Self::new().then(filter)
    }

    /// 追加一个筛选器，前一级的输出作为下一级的输入。
    pub fn then(mut self, filter: impl TargetFilter + 'static) -> Self {
        self.stages.push(Arc::new(filter));
        self
    }

    /// 追加一个已共享的筛选器（注册表中的实例直接复用，不重复构造）。
    pub fn then_shared(mut self, filter: Arc<dyn TargetFilter>) -> Self {
        self.stages.push(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// 链入口：校验前置条件后依次执行各级筛选器。
    ///
    /// # 前置条件
    /// - 能力标识非空白；
    /// - `local_worker_id` 非空白；
    /// - 每个候选目标格式良好（见 [`Target::is_well_formed`]）；
    /// - `extensions` 缺省时按空表处理。
    ///
    /// 任一条件不满足返回携带能力标识的 `InvalidArgument`。
    pub fn apply(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        candidates: Vec<Target>,
        extensions: Option<&Extensions>,
    ) -> Result<Vec<Target>> {
        if capability.id().trim().is_empty() {
            return Err(InvocationError::invalid_argument("capability id must not be blank"));
        }
        if local_worker_id.trim().is_empty() {
            return Err(
                InvocationError::invalid_argument("local worker id must not be blank")
                    .with_capability(capability.shared_id()),
            );
        }
        if let Some(position) = candidates.iter().position(|target| !target.is_well_formed()) {
            debug!(
                rpc.capability = capability.id(),
                rpc.candidates = candidates.len(),
                "rejected malformed candidate #{position}"
            );
            return Err(InvocationError::invalid_argument(format!(
                "candidate #{position} has a blank worker id or host"
            ))
            .with_capability(capability.shared_id()));
        }
        let extensions = extensions.unwrap_or(Extensions::empty());
        Ok(self.filter(capability, local_worker_id, candidates, extensions))
    }
}

impl TargetFilter for FilterChain {
    fn filter(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        candidates: Vec<Target>,
        extensions: &Extensions,
    ) -> Vec<Target> {
        self.stages.iter().fold(candidates, |current, stage| {
            stage.filter(capability, local_worker_id, current, extensions)
        })
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("stages", &self.stages.len())
            .finish()
    }
}
