use bytes::Bytes;

use crate::error::{InvocationError, Result};

/// 约定的 TLV 标签。
///
/// 未在此登记的标签同样可以写入，解码端按不透明字节原样保留。
pub mod tags {
    /// 发起方 worker 标识（UTF-8）。
    pub const WORKER_ID: u16 = 0;
    /// 发起方实例标识（UTF-8）。
    pub const INSTANCE_ID: u16 = 1;
    /// 链路追踪标识（UTF-8）。
    pub const TRACE_ID: u16 = 2;
    /// 失败响应携带的降级键（UTF-8）。
    pub const DEGRADATION_KEY: u16 = 3;
}

/// 有序且标签唯一的 TLV 条目集合。
///
/// # 教案级说明
/// - **意图 (Why)**：TLV 区是协议向前兼容的扩展点，新字段以新标签追加，旧解码器跳过即可；
/// - **契约 (What)**：
///   - 条目保持插入顺序，编码时按此顺序写出，往返后顺序不变；
///   - 标签唯一：[`TagValues::insert`] 覆盖同名标签，[`TagValues::try_push`] 遇重复标签报错；
/// - **权衡 (Trade-offs)**：条目数量通常为个位数，线性查找比哈希表更省内存且保序。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagValues {
    entries: Vec<(u16, Bytes)>,
}

impl TagValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入或覆盖标签，覆盖时保持原有位置并返回旧值。
    pub fn insert(&mut self, tag: u16, value: impl Into<Bytes>) -> Option<Bytes> {
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == tag) {
            Some((_, slot)) => Some(core::mem::replace(slot, value)),
            None => {
                self.entries.push((tag, value));
                None
            }
        }
    }

    pub fn insert_text(&mut self, tag: u16, value: impl Into<String>) -> Option<Bytes> {
        self.insert(tag, Bytes::from(value.into()))
    }

    /// 解码路径使用：追加条目，重复标签视为帧损坏。
    pub fn try_push(&mut self, tag: u16, value: Bytes) -> Result<()> {
        if self.contains(tag) {
            return Err(InvocationError::serialization(format!(
                "duplicate TLV tag {tag}"
            )));
        }
        self.entries.push((tag, value));
        Ok(())
    }

    pub fn get(&self, tag: u16) -> Option<&Bytes> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == tag)
            .map(|(_, value)| value)
    }

    /// 以 UTF-8 文本读取标签值；缺失或非法 UTF-8 时返回 `None`。
    pub fn text(&self, tag: u16) -> Option<&str> {
        self.get(tag).and_then(|value| core::str::from_utf8(value).ok())
    }

    pub fn contains(&self, tag: u16) -> bool {
        self.get(tag).is_some()
    }

    pub fn remove(&mut self, tag: u16) -> Option<Bytes> {
        let index = self.entries.iter().position(|(existing, _)| *existing == tag)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, &Bytes)> + '_ {
        self.entries.iter().map(|(tag, value)| (*tag, value))
    }
}

impl FromIterator<(u16, Bytes)> for TagValues {
    /// 收集时同名标签后者覆盖前者。
    fn from_iter<I: IntoIterator<Item = (u16, Bytes)>>(iter: I) -> Self {
        let mut tag_values = TagValues::new();
        for (tag, value) in iter {
            tag_values.insert(tag, value);
        }
        tag_values
    }
}
