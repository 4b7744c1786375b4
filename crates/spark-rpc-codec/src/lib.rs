#![deny(unsafe_code)]
//! spark-rpc-codec：调用元数据的版本化线上格式。
//!
//! # 教案级说明
//! - **意图 (Why)**：请求/响应元数据需要在不同版本的进程之间互通。每个协议版本独立实现
//!   [`CommunicationVersion`](spark_rpc_core::CommunicationVersion)，新版本只追加字段，
//!   扩展信息一律放入最后写出的 TLV 区，旧版本解码器跳过未知标签即可；
//! - **契约 (What)**：
//!   - 所有整数大端序；字符串为 `[len:u32][utf8]`；
//!   - [`ProtocolV1`] 与 [`ProtocolV2`] 的唯一差异是 V2 在实现版本之后携带 `async_task_id`；
//!   - [`ProtocolVersions`] 以“新版本在前”保存已支持版本，`choose` 精确匹配，不做隐式转换；
//! - **设计 (How)**：`wire` 负责基本类型读写，`tlv` 负责扩展区，`frame` 是两个版本共享的帧布局，
//!   版本差异仅体现为一个布尔开关。

mod frame;
mod tlv;
mod v1;
mod v2;
mod versions;
mod wire;

pub use tlv::{decode_block, encode_block, encoded_block_len};
pub use v1::ProtocolV1;
pub use v2::ProtocolV2;
pub use versions::ProtocolVersions;
