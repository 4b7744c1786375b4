//! “冠军”策略：从候选中至多选出一个目标。
//!
//! 所有策略在空输入上返回 `None`；匹配类策略在找不到匹配项时同样返回 `None`，
//! 由路由器统一转换为 `TargetNotFound`。

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use rand::Rng;
use rand::rngs::OsRng;
use spark_rpc_core::{Capability, Champion, Extensions, Target};

/// 均匀随机选择，随机源为操作系统提供的密码学安全随机数。
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomChampion;

impl Champion for RandomChampion {
    fn pick(&self, _: &Capability, _: &str, candidates: &[Target], _: &Extensions) -> Option<usize> {
        match candidates.len() {
            0 => None,
            1 => Some(0),
            len => Some(OsRng.gen_range(0..len)),
        }
    }
}

/// 按能力维度轮询。
///
/// # 教案式说明
/// - **意图 (Why)**：同一能力的连续调用依次落在不同目标上，且不同能力互不干扰；
/// - **契约 (What)**：
///   - 每个能力一个单调递增的 `AtomicU64` 计数器，选中下标为 `counter mod len`；
///   - 扇出分区（[`Champion::pick_in_partition`]）在能力之下再按分区标识各持一个计数器，
///     同一次扇出中的各分区互不推进对方的序号；
///   - 读取并递增是一次 `fetch_add`，无全局锁，并发调用各自拿到不同的序号；
///   - 计数器永不淘汰，键空间以能力数量（及每个能力的分区数量）为上界；
/// - **权衡 (Trade-offs)**：只有候选列表的长度与顺序保持稳定时，N 次连续调用才恰好覆盖 N 个目标；
///   列表在两次调用之间变化时仅保证“大致均衡”。
#[derive(Debug, Default)]
pub struct RoundRobinChampion {
    counters: DashMap<Arc<str>, CapabilityCounters>,
}

#[derive(Debug, Default)]
struct CapabilityCounters {
    whole: AtomicU64,
    partitions: DashMap<Arc<str>, AtomicU64>,
}

impl CapabilityCounters {
    fn next_in_partition(&self, partition: &str) -> u64 {
        if let Some(counter) = self.partitions.get(partition) {
            return counter.fetch_add(1, Ordering::Relaxed);
        }
        self.partitions
            .entry(Arc::from(partition))
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed)
    }
}

impl RoundRobinChampion {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_counters<R>(&self, capability: &Capability, f: impl FnOnce(&CapabilityCounters) -> R) -> R {
        if let Some(counters) = self.counters.get(capability.id()) {
            return f(&counters);
        }
        let counters = self.counters.entry(capability.shared_id()).or_default();
        f(&counters)
    }

    /// 已建立计数器的能力数量。
    pub fn tracked_capabilities(&self) -> usize {
        self.counters.len()
    }

    /// 某能力下已建立计数器的扇出分区数量。
    pub fn tracked_partitions(&self, capability_id: &str) -> usize {
        self.counters
            .get(capability_id)
            .map_or(0, |counters| counters.partitions.len())
    }
}

impl Champion for RoundRobinChampion {
    fn pick(&self, capability: &Capability, _: &str, candidates: &[Target], _: &Extensions) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        let ticket = self.with_counters(capability, |counters| {
            counters.whole.fetch_add(1, Ordering::Relaxed)
        });
        Some((ticket % candidates.len() as u64) as usize)
    }

    fn pick_in_partition(
        &self,
        capability: &Capability,
        _: &str,
        partition: &str,
        candidates: &[Target],
        _: &Extensions,
    ) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        let ticket = self.with_counters(capability, |counters| counters.next_in_partition(partition));
        Some((ticket % candidates.len() as u64) as usize)
    }
}

/// 选中第一个主机名等于配置值的目标。
#[derive(Clone, Debug)]
pub struct HostMatchChampion {
    host: String,
}

impl HostMatchChampion {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Champion for HostMatchChampion {
    fn pick(&self, _: &Capability, _: &str, candidates: &[Target], _: &Extensions) -> Option<usize> {
        candidates.iter().position(|target| target.host() == self.host)
    }
}

/// 选中第一个 worker 标识等于期望值的目标。
///
/// 期望值可以固定配置，也可以在每次调用时从扩展参数读取（粘滞调用）。两者都配置时
/// 扩展参数优先，缺失时回落到固定值；都没有时不选中任何目标。
#[derive(Clone, Debug, Default)]
pub struct WorkerMatchChampion {
    extension_key: Option<String>,
    fixed: Option<String>,
}

impl WorkerMatchChampion {
    pub fn fixed(worker_id: impl Into<String>) -> Self {
        Self {
            extension_key: None,
            fixed: Some(worker_id.into()),
        }
    }

    pub fn from_extension(key: impl Into<String>) -> Self {
        Self {
            extension_key: Some(key.into()),
            fixed: None,
        }
    }

    pub fn with_fallback(mut self, worker_id: impl Into<String>) -> Self {
        self.fixed = Some(worker_id.into());
        self
    }

    fn wanted<'a>(&'a self, extensions: &'a Extensions) -> Option<&'a str> {
        self.extension_key
            .as_deref()
            .and_then(|key| extensions.text(key))
            .or(self.fixed.as_deref())
    }
}

impl Champion for WorkerMatchChampion {
    fn pick(&self, _: &Capability, _: &str, candidates: &[Target], extensions: &Extensions) -> Option<usize> {
        let wanted = self.wanted(extensions)?;
        candidates.iter().position(|target| target.worker_id() == wanted)
    }
}

/// 选中与调用方同进程的目标。
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalWorkerChampion;

impl Champion for LocalWorkerChampion {
    fn pick(&self, _: &Capability, local_worker_id: &str, candidates: &[Target], _: &Extensions) -> Option<usize> {
        candidates
            .iter()
            .position(|target| target.worker_id() == local_worker_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_rpc_core::Version;

    fn capability(id: &str) -> Capability {
        Capability::new(id, Version::new(1, 0, 0))
    }

    fn targets() -> Vec<Target> {
        vec![
            Target::new("A", "10.0.0.1", 7000),
            Target::new("B", "10.0.0.2", 7000),
            Target::new("C", "10.0.0.2", 7001),
        ]
    }

    #[test]
    fn every_champion_yields_none_on_empty_input() {
        let cap = capability("calc.add");
        let ext = Extensions::empty();
        let champions: Vec<Box<dyn Champion>> = vec![
            Box::new(RandomChampion),
            Box::new(RoundRobinChampion::new()),
            Box::new(HostMatchChampion::new("10.0.0.1")),
            Box::new(WorkerMatchChampion::fixed("A")),
            Box::new(LocalWorkerChampion),
        ];
        for champion in champions {
            assert_eq!(champion.pick(&cap, "A", &[], ext), None);
        }
    }

    #[test]
    fn random_stays_in_bounds() {
        let cap = capability("calc.add");
        let candidates = targets();
        for _ in 0..200 {
            let index = RandomChampion
                .pick(&cap, "A", &candidates, Extensions::empty())
                .expect("非空输入必有结果");
            assert!(index < candidates.len());
        }
        assert_eq!(
            RandomChampion.pick(&cap, "A", &candidates[..1], Extensions::empty()),
            Some(0)
        );
    }

    #[test]
    fn round_robin_counters_are_per_capability() {
        let champion = RoundRobinChampion::new();
        let candidates = targets();
        let add = capability("calc.add");
        let sub = capability("calc.sub");
        let ext = Extensions::empty();

        assert_eq!(champion.pick(&add, "A", &candidates, ext), Some(0));
        assert_eq!(champion.pick(&add, "A", &candidates, ext), Some(1));
        assert_eq!(champion.pick(&sub, "A", &candidates, ext), Some(0));
        assert_eq!(champion.pick(&add, "A", &candidates, ext), Some(2));
        assert_eq!(champion.tracked_capabilities(), 2);
    }

    #[test]
    fn partition_counters_are_independent_of_each_other_and_of_the_whole() {
        let champion = RoundRobinChampion::new();
        let add = capability("calc.add");
        let ext = Extensions::empty();
        let pair = [Target::new("w-1", "10.0.0.1", 1), Target::new("w-1", "10.0.0.1", 2)];

        assert_eq!(champion.pick_in_partition(&add, "A", "w-1", &pair, ext), Some(0));
        assert_eq!(champion.pick_in_partition(&add, "A", "w-2", &pair, ext), Some(0));
        assert_eq!(champion.pick_in_partition(&add, "A", "w-1", &pair, ext), Some(1));
        assert_eq!(champion.pick_in_partition(&add, "A", "w-2", &pair, ext), Some(1));
        assert_eq!(champion.pick(&add, "A", &pair, ext), Some(0));
        assert_eq!(champion.tracked_capabilities(), 1);
        assert_eq!(champion.tracked_partitions("calc.add"), 2);
        assert_eq!(champion.tracked_partitions("calc.sub"), 0);
    }

    #[test]
    fn host_match_picks_first_occurrence() {
        let cap = capability("calc.add");
        let candidates = targets();
        let ext = Extensions::empty();
        assert_eq!(HostMatchChampion::new("10.0.0.2").pick(&cap, "A", &candidates, ext), Some(1));
        assert_eq!(HostMatchChampion::new("10.9.9.9").pick(&cap, "A", &candidates, ext), None);
    }

    #[test]
    fn worker_match_prefers_extension_over_fallback() {
        let cap = capability("calc.add");
        let candidates = targets();
        let sticky = WorkerMatchChampion::from_extension("sticky.worker").with_fallback("A");

        let ext = Extensions::new().with("sticky.worker", "C");
        assert_eq!(sticky.pick(&cap, "A", &candidates, &ext), Some(2));
        assert_eq!(sticky.pick(&cap, "A", &candidates, Extensions::empty()), Some(0));

        let strict = WorkerMatchChampion::from_extension("sticky.worker");
        assert_eq!(strict.pick(&cap, "A", &candidates, Extensions::empty()), None);
        assert_eq!(
            WorkerMatchChampion::fixed("Z").pick(&cap, "A", &candidates, Extensions::empty()),
            None
        );
    }

    #[test]
    fn local_worker_matches_caller() {
        let cap = capability("calc.add");
        let candidates = targets();
        assert_eq!(LocalWorkerChampion.pick(&cap, "B", &candidates, Extensions::empty()), Some(1));
        assert_eq!(LocalWorkerChampion.pick(&cap, "Q", &candidates, Extensions::empty()), None);
    }
}
