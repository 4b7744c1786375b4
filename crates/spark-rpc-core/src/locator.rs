use crate::model::Target;

/// 外部目标定位器：给出能力当前可达的目标列表。
///
/// 路由器在每次调用时都会重新询问定位器，核心不缓存结果；返回空列表是合法的，
/// 由路由器统一转换为 `TargetNotFound`。
pub trait TargetLocator: Send + Sync {
    fn locate(&self, capability_id: &str) -> Vec<Target>;
}

impl<F> TargetLocator for F
where
    F: Fn(&str) -> Vec<Target> + Send + Sync,
{
    fn locate(&self, capability_id: &str) -> Vec<Target> {
        self(capability_id)
    }
}
