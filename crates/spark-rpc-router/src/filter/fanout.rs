use std::collections::HashMap;

use spark_rpc_core::{Capability, Champion, Extensions, Target, TargetFilter};

/// 按 worker 公平扇出：每个 worker 至多一个目标。
///
/// # 教案式说明
/// - **意图 (Why)**：广播类调用需要“每个进程恰好收到一次”，而同一进程可能暴露多个接入点；
/// - **执行逻辑 (How)**：
///   1. 按 worker 标识分区，分区顺序为首次出现的顺序；
///   2. 以 worker 标识为分区标识，对每个分区独立调用冠军策略挑出至多一个目标
///      （[`Champion::pick_in_partition`]，轮询等有状态策略按分区各自推进）；
///   3. 按分区顺序拼接结果；
/// - **契约 (What)**：K 个不同 worker 的输入最多产生 K 个结果，且同一 worker 至多一个。
#[derive(Clone, Debug, Default)]
pub struct WorkerFairFilter<C> {
    champion: C,
}

impl<C> WorkerFairFilter<C> {
    pub fn new(champion: C) -> Self {
        Self { champion }
    }
}

impl<C: Champion> TargetFilter for WorkerFairFilter<C> {
    fn filter(
        &self,
        capability: &Capability,
        local_worker_id: &str,
        candidates: Vec<Target>,
        extensions: &Extensions,
    ) -> Vec<Target> {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut partitions: Vec<Vec<Target>> = Vec::new();
        for target in candidates {
            match slots.get(target.worker_id()) {
                Some(&slot) => partitions[slot].push(target),
                None => {
                    slots.insert(target.worker_id().to_owned(), partitions.len());
                    partitions.push(vec![target]);
                }
            }
        }

        partitions
            .into_iter()
            .filter_map(|partition| {
                let worker_id = partition.first()?.worker_id();
                let index = self.champion.pick_in_partition(
                    capability,
                    local_worker_id,
                    worker_id,
                    &partition,
                    extensions,
                )?;
                partition.into_iter().nth(index)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{LocalWorkerChampion, RoundRobinChampion};
    use spark_rpc_core::Version;

    fn capability() -> Capability {
        Capability::new("events.broadcast", Version::new(1, 0, 0))
    }

    #[test]
    fn one_target_per_worker_in_first_seen_order() {
        let filter = WorkerFairFilter::new(RoundRobinChampion::new());
        let candidates = vec![
            Target::new("w-2", "10.0.0.2", 1),
            Target::new("w-1", "10.0.0.1", 1),
            Target::new("w-2", "10.0.0.2", 2),
            Target::new("w-3", "10.0.0.3", 1),
            Target::new("w-1", "10.0.0.1", 2),
        ];
        let selected = filter.filter(&capability(), "w-1", candidates, Extensions::empty());
        let workers: Vec<&str> = selected.iter().map(Target::worker_id).collect();
        assert_eq!(workers, ["w-2", "w-1", "w-3"]);
    }

    #[test]
    fn round_robin_rotates_inside_every_partition() {
        let filter = WorkerFairFilter::new(RoundRobinChampion::new());
        let candidates = vec![
            Target::new("w-1", "10.0.0.1", 1),
            Target::new("w-1", "10.0.0.1", 2),
            Target::new("w-2", "10.0.0.2", 1),
            Target::new("w-2", "10.0.0.2", 2),
        ];
        let mut w1_ports = Vec::new();
        let mut w2_ports = Vec::new();
        for _ in 0..4 {
            let selected = filter.filter(&capability(), "w-1", candidates.clone(), Extensions::empty());
            assert_eq!(selected.len(), 2);
            w1_ports.push(selected[0].port());
            w2_ports.push(selected[1].port());
        }
        assert_eq!(w1_ports, [1, 2, 1, 2]);
        assert_eq!(w2_ports, [1, 2, 1, 2]);
    }

    #[test]
    fn partitions_without_a_pick_are_dropped() {
        let filter = WorkerFairFilter::new(LocalWorkerChampion);
        let candidates = vec![
            Target::new("w-1", "10.0.0.1", 1),
            Target::new("w-2", "10.0.0.2", 1),
        ];
        let selected = filter.filter(&capability(), "w-2", candidates, Extensions::empty());
        assert_eq!(selected, vec![Target::new("w-2", "10.0.0.2", 1)]);
        assert!(
            filter
                .filter(&capability(), "w-2", Vec::new(), Extensions::empty())
                .is_empty()
        );
    }
}
