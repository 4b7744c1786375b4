use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use spark_rpc_core::config::DEFAULT_STRATEGY;
use spark_rpc_core::observability::keys;
use spark_rpc_core::{
    ConfigError, Extensions, FilterChain, InvocationError, Provider, Result, RouterConfig, Target,
    TargetLocator,
};
use tracing::{debug, info_span, warn};

use crate::catalog::CapabilityCatalog;
use crate::filter::FilterRegistry;

/// 可热替换的路由设置快照。
#[derive(Clone, Debug)]
struct RouterSettings {
    local_worker_id: Arc<str>,
    default_strategy: String,
    registry: FilterRegistry,
}

/// 调用路由器：能力 → 候选目标 → 筛选链 → 目标。
///
/// # 设计动机（Why）
/// - 候选目标每次都向外部定位器重新获取，路由器自身不缓存目标；
/// - 策略注册表与本地 worker 标识放在 `ArcSwap` 快照中，[`Router::reconfigure`] 整体替换，
///   读路径无锁。
///
/// # 行为概览（How）
/// 1. 在目录中解析能力描述，未登记返回 `ProviderNotFound`；
/// 2. 按名称取出筛选链，未知策略返回 `InvalidArgument`；
/// 3. 询问定位器并执行筛选链（入口统一校验前置条件）；
/// 4. 结果为空时返回 `TargetNotFound`。
pub struct Router {
    catalog: Arc<CapabilityCatalog>,
    locator: Arc<dyn TargetLocator>,
    settings: ArcSwap<RouterSettings>,
}

impl Router {
    /// 使用内置策略构造路由器，缺省策略为 `round-robin`。
    pub fn new(
        catalog: Arc<CapabilityCatalog>,
        locator: Arc<dyn TargetLocator>,
        local_worker_id: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            catalog,
            locator,
            settings: ArcSwap::from_pointee(RouterSettings {
                local_worker_id: local_worker_id.into(),
                default_strategy: DEFAULT_STRATEGY.to_owned(),
                registry: FilterRegistry::with_builtins(),
            }),
        }
    }

    pub fn from_config(
        config: &RouterConfig,
        catalog: Arc<CapabilityCatalog>,
        locator: Arc<dyn TargetLocator>,
    ) -> std::result::Result<Self, ConfigError> {
        let router = Self::new(catalog, locator, config.local_worker_id.as_str());
        router.reconfigure(config)?;
        Ok(router)
    }

    /// 以新配置整体替换策略注册表（轮询计数器随之重置）。
    pub fn reconfigure(&self, config: &RouterConfig) -> std::result::Result<(), ConfigError> {
        let registry = FilterRegistry::from_config(config)?;
        if !registry.contains(&config.default_strategy) {
            return Err(ConfigError::Invalid {
                field: "router.default_strategy",
                reason: format!("strategy `{}` is not registered", config.default_strategy),
            });
        }
        self.settings.store(Arc::new(RouterSettings {
            local_worker_id: config.local_worker_id.as_str().into(),
            default_strategy: config.default_strategy.clone(),
            registry,
        }));
        Ok(())
    }

    /// 注册或覆盖一条具名筛选链。
    pub fn register_strategy(&self, name: impl Into<String>, chain: FilterChain) {
        let name = name.into();
        self.settings.rcu(|current| {
            let mut next = RouterSettings::clone(current);
            next.registry.register_chain(name.clone(), chain.clone());
            next
        });
    }

    pub fn catalog(&self) -> &Arc<CapabilityCatalog> {
        &self.catalog
    }

    pub fn local_worker_id(&self) -> Arc<str> {
        Arc::clone(&self.settings.load().local_worker_id)
    }

    pub fn default_strategy(&self) -> String {
        self.settings.load().default_strategy.clone()
    }

    /// 为调用挑选实现，委托给能力目录。
    pub fn resolve_provider(&self, capability_id: &str, provider_id: Option<&str>) -> Result<Provider> {
        self.catalog.select_provider(capability_id, provider_id)
    }

    /// 选出单个目标；扇出策略下返回筛选结果的第一个。
    pub fn route(
        &self,
        capability_id: &str,
        strategy_name: &str,
        extensions: Option<&Extensions>,
    ) -> Result<Target> {
        let mut selected = self.route_all(capability_id, strategy_name, extensions)?;
        Ok(selected.swap_remove(0))
    }

    /// 返回完整的（非空）筛选结果，供扇出策略使用。
    pub fn route_all(
        &self,
        capability_id: &str,
        strategy_name: &str,
        extensions: Option<&Extensions>,
    ) -> Result<Vec<Target>> {
        let span = info_span!(
            keys::SPAN_ROUTE,
            rpc.capability = capability_id,
            rpc.strategy = strategy_name
        );
        let _entered = span.enter();

        let capability = self.catalog.resolve_capability(capability_id)?;
        let settings = self.settings.load();
        let chain = settings.registry.get(strategy_name).ok_or_else(|| {
            InvocationError::invalid_argument(format!("unknown routing strategy `{strategy_name}`"))
                .with_capability(capability.shared_id())
        })?;

        let candidates = self.locator.locate(capability_id);
        let candidate_count = candidates.len();
        let selected = chain.apply(
            &capability,
            &settings.local_worker_id,
            candidates,
            extensions,
        )?;

        if selected.is_empty() {
            warn!(
                rpc.candidates = candidate_count,
                "no target left after filtering"
            );
            return Err(InvocationError::target_not_found(capability.shared_id()));
        }
        debug!(
            rpc.candidates = candidate_count,
            rpc.selected = selected.len(),
            rpc.target = %selected[0],
            "route resolved"
        );
        Ok(selected)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("catalog_revision", &self.catalog.revision())
            .field("settings", &self.settings.load_full())
            .finish()
    }
}
