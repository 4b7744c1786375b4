use std::borrow::Cow;
use std::collections::{BTreeMap, btree_map};
use std::sync::OnceLock;

use bytes::Bytes;

/// 单次调用的扩展参数值。
///
/// # 教案级说明
/// - **意图 (Why)**：筛选策略偶尔需要调用方给出的上下文（粘滞 worker、灰度标签等），
///   以最小枚举覆盖文本 / 整数 / 布尔 / 原始字节四类，避免引入通用动态类型；
/// - **契约 (What)**：值的语义由键约定，核心不解释；
/// - **权衡 (Trade-offs)**：枚举非穷尽，新增变体不会破坏现有匹配。
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtensionValue {
    Text(Cow<'static, str>),
    Integer(i64),
    Boolean(bool),
    Bytes(Bytes),
}

impl ExtensionValue {
    /// 文本值的只读视图；其他变体返回 `None`。
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExtensionValue::Text(text) => Some(text.as_ref()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ExtensionValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ExtensionValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<&'static str> for ExtensionValue {
    fn from(value: &'static str) -> Self {
        ExtensionValue::Text(Cow::Borrowed(value))
    }
}

impl From<String> for ExtensionValue {
    fn from(value: String) -> Self {
        ExtensionValue::Text(Cow::Owned(value))
    }
}

impl From<i64> for ExtensionValue {
    fn from(value: i64) -> Self {
        ExtensionValue::Integer(value)
    }
}

impl From<bool> for ExtensionValue {
    fn from(value: bool) -> Self {
        ExtensionValue::Boolean(value)
    }
}

impl From<Bytes> for ExtensionValue {
    fn from(value: Bytes) -> Self {
        ExtensionValue::Bytes(value)
    }
}

/// 传给筛选链的只读扩展参数表。
///
/// 使用有序映射保证迭代顺序稳定（日志、测试断言均依赖这一点）；
/// 核心组件只读取，不修改。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Extensions(BTreeMap<Cow<'static, str>, ExtensionValue>);

impl Extensions {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// 进程内共享的空表，供“未提供扩展参数”的调用路径直接借用。
    pub fn empty() -> &'static Extensions {
        static EMPTY: OnceLock<Extensions> = OnceLock::new();
        EMPTY.get_or_init(Extensions::new)
    }

    /// 插入或覆盖键值对，返回旧值。
    pub fn insert(
        &mut self,
        key: impl Into<Cow<'static, str>>,
        value: impl Into<ExtensionValue>,
    ) -> Option<ExtensionValue> {
        self.0.insert(key.into(), value.into())
    }

    /// 构造期链式写法：`Extensions::new().with("sticky.worker", "w-2")`。
    pub fn with(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<ExtensionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ExtensionValue> {
        self.0.get(key)
    }

    /// 读取文本值；键不存在或类型不符时返回 `None`。
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ExtensionValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Cow<'static, str>, ExtensionValue> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_accessors_respect_variant() {
        let ext = Extensions::new()
            .with("sticky.worker", "w-2")
            .with("attempt", 3_i64)
            .with("canary", true);

        assert_eq!(ext.text("sticky.worker"), Some("w-2"));
        assert_eq!(ext.text("attempt"), None);
        assert_eq!(ext.get("attempt").and_then(ExtensionValue::as_integer), Some(3));
        assert_eq!(ext.get("canary").and_then(ExtensionValue::as_bool), Some(true));
        assert_eq!(ext.text("missing"), None);
    }

    #[test]
    fn iteration_order_is_sorted_by_key() {
        let ext = Extensions::new().with("b", "2").with("a", "1");
        let keys: Vec<&str> = ext.iter().map(|(key, _)| key.as_ref()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn shared_empty_instance_is_empty() {
        assert!(Extensions::empty().is_empty());
        assert_eq!(Extensions::empty().len(), 0);
    }
}
