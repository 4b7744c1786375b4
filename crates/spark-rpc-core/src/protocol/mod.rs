//! 调用元数据与协议版本契约。
//!
//! # 模块结构（How）
//! - [`DataFormat`]：负载序列化格式的原始字节标签；
//! - [`TagValues`] 与 [`tags`]：TLV 扩展区及其约定标签；
//! - [`RequestMetadata`]/[`ResponseMetadata`]：每次调用的元数据；
//! - [`CommunicationVersion`]：协议版本实现需满足的编解码契约，具体版本位于 `spark-rpc-codec`。

mod data_format;
mod metadata;
mod tlv;
mod version;

pub use data_format::DataFormat;
pub use metadata::{RequestMetadata, ResponseMetadata};
pub use tlv::{TagValues, tags};
pub use version::CommunicationVersion;
