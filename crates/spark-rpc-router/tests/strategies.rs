//! 筛选策略的性质测试与并发公平性。

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use spark_rpc_core::{Capability, ChampionFilter, Extensions, FilterChain, Provider, Target, Version};
use spark_rpc_router::{
    CapabilityCatalog, HostMatchChampion, RandomChampion, RoundRobinChampion, Router,
    StaticTargetLocator, WorkerFairFilter, WorkerMatchChampion,
};

fn capability() -> Capability {
    Capability::new("calc.add", Version::new(1, 0, 0))
}

fn target_strategy() -> impl Strategy<Value = Target> {
    ("w-[0-4]", "h-[0-3]", 1u16..4).prop_map(|(worker, host, port)| Target::new(worker, host, port))
}

proptest! {
    #[test]
    fn random_pick_is_a_member_of_the_input(candidates in prop::collection::vec(target_strategy(), 0..12)) {
        let chain = FilterChain::of(ChampionFilter::new(RandomChampion));
        let selected = chain.apply(&capability(), "w-0", candidates.clone(), None).expect("合法输入");
        if candidates.is_empty() {
            prop_assert!(selected.is_empty());
        } else {
            prop_assert_eq!(selected.len(), 1);
            prop_assert!(candidates.contains(&selected[0]));
        }
    }

    #[test]
    fn worker_fair_yields_at_most_one_per_worker(candidates in prop::collection::vec(target_strategy(), 0..16)) {
        let chain = FilterChain::of(WorkerFairFilter::new(RandomChampion));
        let selected = chain.apply(&capability(), "w-0", candidates.clone(), None).expect("合法输入");

        let distinct: BTreeSet<&str> = candidates.iter().map(Target::worker_id).collect();
        prop_assert_eq!(selected.len(), distinct.len());
        let mut seen = BTreeSet::new();
        for target in &selected {
            prop_assert!(seen.insert(target.worker_id().to_owned()), "worker 重复");
            prop_assert!(candidates.contains(target));
        }
    }

    #[test]
    fn match_champions_find_present_values(candidates in prop::collection::vec(target_strategy(), 1..12), pick in any::<prop::sample::Index>()) {
        let wanted = pick.get(&candidates).clone();
        let by_host = FilterChain::of(ChampionFilter::new(HostMatchChampion::new(wanted.host())));
        let selected = by_host.apply(&capability(), "w-0", candidates.clone(), None).expect("合法输入");
        prop_assert_eq!(selected.len(), 1);
        prop_assert_eq!(selected[0].host(), wanted.host());

        let by_worker = FilterChain::of(ChampionFilter::new(WorkerMatchChampion::fixed(wanted.worker_id())));
        let selected = by_worker.apply(&capability(), "w-0", candidates.clone(), None).expect("合法输入");
        prop_assert_eq!(selected.len(), 1);
        prop_assert_eq!(selected[0].worker_id(), wanted.worker_id());

        let absent = FilterChain::of(ChampionFilter::new(HostMatchChampion::new("nowhere")));
        prop_assert!(absent.apply(&capability(), "w-0", candidates, None).expect("合法输入").is_empty());
    }

    #[test]
    fn round_robin_visits_each_candidate_once_per_cycle(size in 1usize..8) {
        let candidates: Vec<Target> = (0..size)
            .map(|i| Target::new(format!("w-{i}"), "h", 7000))
            .collect();
        let champion = ChampionFilter::new(RoundRobinChampion::new());
        let chain = FilterChain::of(champion);
        let mut visited = BTreeSet::new();
        for _ in 0..size {
            let selected = chain.apply(&capability(), "w-0", candidates.clone(), None).expect("合法输入");
            visited.insert(selected[0].worker_id().to_owned());
        }
        prop_assert_eq!(visited.len(), size);
    }
}

#[test]
fn concurrent_round_robin_is_exactly_fair() {
    const THREADS: usize = 8;
    const CALLS_PER_THREAD: usize = 300;

    let catalog = Arc::new(CapabilityCatalog::new());
    catalog.register_provider(Provider::new("impl-1", Version::new(1, 0, 0), capability()));
    let locator = StaticTargetLocator::new();
    for worker in ["A", "B", "C"] {
        locator.register("calc.add", Target::new(worker, "10.0.0.1", 7000));
    }
    let router = Arc::new(Router::new(catalog, Arc::new(locator), "A"));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                let mut hits: HashMap<String, usize> = HashMap::new();
                for _ in 0..CALLS_PER_THREAD {
                    let target = router
                        .route("calc.add", "round-robin", Some(&Extensions::new()))
                        .expect("有可用目标");
                    *hits.entry(target.worker_id().to_owned()).or_default() += 1;
                }
                hits
            })
        })
        .collect();

    let mut totals: HashMap<String, usize> = HashMap::new();
    for handle in handles {
        for (worker, count) in handle.join().expect("线程不应 panic") {
            *totals.entry(worker).or_default() += count;
        }
    }
    let expected = THREADS * CALLS_PER_THREAD / 3;
    for worker in ["A", "B", "C"] {
        assert_eq!(totals.get(worker).copied(), Some(expected), "worker {worker}");
    }
}
