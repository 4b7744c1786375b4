//! 全局日志订阅器的安装路径。
//!
//! 全局订阅器每个进程只能安装一次，因此本文件只有一个测试。

use std::sync::Arc;

use spark_rpc_core::observability::install_fmt_subscriber;
use spark_rpc_core::{Capability, Provider, Target, Version};
use spark_rpc_router::{CapabilityCatalog, Router, StaticTargetLocator};

#[test]
fn fmt_subscriber_installs_once_and_carries_routing_events() {
    install_fmt_subscriber().expect("首次安装成功");
    assert!(install_fmt_subscriber().is_err(), "已有全局订阅器时不得覆盖");
    assert!(tracing::dispatcher::has_been_set());

    let catalog = Arc::new(CapabilityCatalog::new());
    let capability = Capability::new("calc.add", Version::new(1, 0, 0));
    catalog.register_provider(Provider::new("impl-1", Version::new(1, 0, 0), capability));
    let locator = StaticTargetLocator::new();
    locator.register("calc.add", Target::new("w-1", "127.0.0.1", 7000));
    let router = Router::new(catalog, Arc::new(locator), "w-1");

    let target = router.route("calc.add", "round-robin", None).expect("有可用目标");
    assert_eq!(target.worker_id(), "w-1");
}
