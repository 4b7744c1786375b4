use std::sync::Arc;

use dashmap::DashMap;
use spark_rpc_core::{Target, TargetLocator};

/// 内存中的目标表：`capability_id -> Vec<Target>`。
///
/// # 教案式解读
/// - **意图（Why）**：未接入注册中心的部署（单机、测试、静态拓扑）需要一个开箱即用的定位器；
/// - **实现策略（How）**：内部持有 `Arc<DashMap<..>>`，克隆后共享同一张表，注册/注销与路由读取可以并发进行；
/// - **契约（What）**：
///   - `register` 对同一能力去重（目标完全相同则忽略），保留注册顺序；
///   - `locate` 返回快照克隆，未登记的能力返回空列表。
#[derive(Debug, Clone, Default)]
pub struct StaticTargetLocator {
    inner: Arc<DashMap<String, Vec<Target>>>,
}

impl StaticTargetLocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加目标；返回 `false` 表示该目标已存在。
    pub fn register(&self, capability_id: impl Into<String>, target: Target) -> bool {
        let mut entry = self.inner.entry(capability_id.into()).or_default();
        if entry.contains(&target) {
            return false;
        }
        entry.push(target);
        true
    }

    /// 整体替换某能力的目标列表，返回旧列表。
    pub fn replace(&self, capability_id: impl Into<String>, targets: Vec<Target>) -> Option<Vec<Target>> {
        self.inner.insert(capability_id.into(), targets)
    }

    /// 移除某能力下指定 worker 的全部目标，返回移除数量。
    pub fn deregister(&self, capability_id: &str, worker_id: &str) -> usize {
        let Some(mut entry) = self.inner.get_mut(capability_id) else {
            return 0;
        };
        let before = entry.len();
        entry.retain(|target| target.worker_id() != worker_id);
        before - entry.len()
    }

    pub fn clear(&self, capability_id: &str) -> Option<Vec<Target>> {
        self.inner.remove(capability_id).map(|(_, targets)| targets)
    }
}

impl TargetLocator for StaticTargetLocator {
    fn locate(&self, capability_id: &str) -> Vec<Target> {
        self.inner
            .get(capability_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}
