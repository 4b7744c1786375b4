use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use spark_rpc_core::{
    Champion, ChampionFilter, ConfigError, FilterChain, RouterConfig, StrategyConfig, StrategyKind,
    TargetFilter,
};

use super::{
    HostMatchChampion, LocalWorkerChampion, RandomChampion, RoundRobinChampion,
    WorkerFairFilter, WorkerMatchChampion,
};

/// 策略名到筛选链的映射。
///
/// # 教案级说明
/// - **意图 (Why)**：筛选器实例由注册表显式构造并持有，路由器按名称取用，
///   不依赖任何进程级单例；
/// - **契约 (What)**：
///   - [`FilterRegistry::with_builtins`] 预置 `empty`、`random`、`round-robin`、`local-worker`
///     与 `worker-fair`（分区内轮询）；
///   - 同一注册表内所有轮询策略共享一组按能力划分的计数器，`worker-fair` 在能力之下再按 worker 分区计数；
///   - 同名注册覆盖旧值；
/// - **权衡 (Trade-offs)**：注册表本身可克隆（内部全是 `Arc`），路由器热更新时整份替换。
#[derive(Clone)]
pub struct FilterRegistry {
    chains: HashMap<String, FilterChain>,
    round_robin: Arc<RoundRobinChampion>,
}

impl FilterRegistry {
    /// 不含任何策略的注册表。
    pub fn empty() -> Self {
        Self {
            chains: HashMap::new(),
            round_robin: Arc::new(RoundRobinChampion::new()),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for kind in [
            StrategyKind::Empty,
            StrategyKind::Random,
            StrategyKind::RoundRobin,
            StrategyKind::LocalWorker,
            StrategyKind::WorkerFair,
        ] {
            let chain = registry.build(&StrategyConfig::new(kind.as_str(), kind));
            registry.register_chain(kind.as_str(), chain);
        }
        registry
    }

    /// 内置策略加上配置中声明的具名策略；配置先经过校验。
    pub fn from_config(config: &RouterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut registry = Self::with_builtins();
        for strategy in &config.strategies {
            let chain = registry.build(strategy);
            registry.register_chain(strategy.name.clone(), chain);
        }
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, filter: impl TargetFilter + 'static) {
        self.register_chain(name, FilterChain::of(filter));
    }

    pub fn register_chain(&mut self, name: impl Into<String>, chain: FilterChain) {
        self.chains.insert(name.into(), chain);
    }

    pub fn get(&self, name: &str) -> Option<&FilterChain> {
        self.chains.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.chains.contains_key(name)
    }

    /// 已注册的策略名，按字典序。
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.chains.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 按声明构造筛选链；调用方保证声明已通过校验。
    fn build(&self, strategy: &StrategyConfig) -> FilterChain {
        match strategy.kind {
            StrategyKind::Empty => FilterChain::new(),
            StrategyKind::WorkerFair => {
                FilterChain::of(WorkerFairFilter::new(self.champion(strategy)))
            }
            _ => FilterChain::of(ChampionFilter::new(self.champion(strategy))),
        }
    }

    fn champion(&self, strategy: &StrategyConfig) -> Arc<dyn Champion> {
        match strategy.effective_champion() {
            StrategyKind::Random => Arc::new(RandomChampion),
            StrategyKind::HostMatch => {
                Arc::new(HostMatchChampion::new(strategy.value.clone().unwrap_or_default()))
            }
            StrategyKind::WorkerMatch => {
                let champion = match strategy.extension_key.as_deref() {
                    Some(key) => WorkerMatchChampion::from_extension(key),
                    None => WorkerMatchChampion::default(),
                };
                match strategy.value.as_deref() {
                    Some(worker) => Arc::new(champion.with_fallback(worker)),
                    None => Arc::new(champion),
                }
            }
            StrategyKind::LocalWorker => Arc::new(LocalWorkerChampion),
            StrategyKind::RoundRobin | StrategyKind::Empty | StrategyKind::WorkerFair => {
                self.round_robin.clone()
            }
        }
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}
