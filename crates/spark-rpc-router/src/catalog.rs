use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use spark_rpc_core::{Capability, InvocationError, Provider, Result};
use tracing::debug;

/// 某个能力及其已注册的全部实现。
#[derive(Clone, Debug)]
pub struct CatalogEntry {
    capability: Capability,
    providers: Vec<Provider>,
}

impl CatalogEntry {
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// 按注册顺序排列的实现。
    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }
}

#[derive(Debug, Default)]
struct CatalogTable {
    entries: BTreeMap<String, CatalogEntry>,
}

/// 能力目录：能力与实现的只读登记表。
///
/// # 设计动机（Why）
/// - 能力/实现在注册后只读，读多写极少，适合“读路径零锁、写路径整表替换”的 `ArcSwap` 模式；
/// - 写入通过 `rcu` 复制当前表后替换，正在进行的读取继续持有旧快照，不受影响。
///
/// # 契约说明（What）
/// - [`CapabilityCatalog::select_provider`] 未指定实现且存在多个实现时返回 `TooManyProviders`；
///   能力未登记、没有实现或指定实现不存在时返回 `ProviderNotFound`；
/// - 每次写入递增修订号，供观测与测试判断快照世代。
#[derive(Debug)]
pub struct CapabilityCatalog {
    table: ArcSwap<CatalogTable>,
    revision: AtomicU64,
}

impl CapabilityCatalog {
    pub fn new() -> Self {
        Self {
            table: ArcSwap::from_pointee(CatalogTable::default()),
            revision: AtomicU64::new(0),
        }
    }

    /// 登记能力；已存在时覆盖能力描述并保留其实现列表。
    pub fn register_capability(&self, capability: Capability) {
        self.table.rcu(|current| {
            let mut entries = current.entries.clone();
            entries
                .entry(capability.id().to_owned())
                .and_modify(|entry| entry.capability = capability.clone())
                .or_insert_with(|| CatalogEntry {
                    capability: capability.clone(),
                    providers: Vec::new(),
                });
            CatalogTable { entries }
        });
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// 登记实现；所属能力未登记时一并登记，同名实现被替换。
    pub fn register_provider(&self, provider: Provider) {
        let capability_id = provider.capability().id().to_owned();
        self.table.rcu(|current| {
            let mut entries = current.entries.clone();
            let entry = entries
                .entry(capability_id.clone())
                .or_insert_with(|| CatalogEntry {
                    capability: provider.capability().clone(),
                    providers: Vec::new(),
                });
            match entry.providers.iter_mut().find(|existing| existing.id() == provider.id()) {
                Some(existing) => *existing = provider.clone(),
                None => entry.providers.push(provider.clone()),
            }
            CatalogTable { entries }
        });
        let revision = self.revision.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(
            rpc.capability = %capability_id,
            rpc.provider = provider.id(),
            revision,
            "provider registered"
        );
    }

    /// 整表替换：以给定实现集合重建目录。
    pub fn replace_all<I>(&self, providers: I)
    where
        I: IntoIterator<Item = Provider>,
    {
        let mut entries: BTreeMap<String, CatalogEntry> = BTreeMap::new();
        for provider in providers {
            let entry = entries
                .entry(provider.capability().id().to_owned())
                .or_insert_with(|| CatalogEntry {
                    capability: provider.capability().clone(),
                    providers: Vec::new(),
                });
            entry.providers.retain(|existing| existing.id() != provider.id());
            entry.providers.push(provider);
        }
        self.table.store(Arc::new(CatalogTable { entries }));
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    pub fn entry(&self, capability_id: &str) -> Option<CatalogEntry> {
        self.table.load().entries.get(capability_id).cloned()
    }

    /// 解析能力描述；未登记返回 `ProviderNotFound`。
    pub fn resolve_capability(&self, capability_id: &str) -> Result<Capability> {
        self.table
            .load()
            .entries
            .get(capability_id)
            .map(|entry| entry.capability.clone())
            .ok_or_else(|| InvocationError::provider_not_found(capability_id, None))
    }

    pub fn providers(&self, capability_id: &str) -> Vec<Provider> {
        self.table
            .load()
            .entries
            .get(capability_id)
            .map(|entry| entry.providers.clone())
            .unwrap_or_default()
    }

    /// 为一次调用挑选唯一实现。
    pub fn select_provider(&self, capability_id: &str, provider_id: Option<&str>) -> Result<Provider> {
        let table = self.table.load();
        let providers = table
            .entries
            .get(capability_id)
            .map(|entry| entry.providers.as_slice())
            .unwrap_or_default();

        match provider_id {
            Some(wanted) => providers
                .iter()
                .find(|provider| provider.id() == wanted)
                .cloned()
                .ok_or_else(|| InvocationError::provider_not_found(capability_id, Some(wanted))),
            None => match providers {
                [] => Err(InvocationError::provider_not_found(capability_id, None)),
                [only] => Ok(only.clone()),
                many => Err(InvocationError::too_many_providers(capability_id, many.len())),
            },
        }
    }
}

impl Default for CapabilityCatalog {
    fn default() -> Self {
        Self::new()
    }
}
