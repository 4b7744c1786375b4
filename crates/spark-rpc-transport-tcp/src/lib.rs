#![deny(unsafe_code)]
//! spark-rpc-transport-tcp：基于 Tokio 的 TCP 调用器。
//!
//! - [`TcpInvoker`]：实现 [`spark_rpc_core::Invoker`]，每次调用一条连接、一次往返；
//! - [`frame`]：连接上的长度前缀分帧，服务端实现可直接复用。

mod error;
pub mod frame;
mod invoker;

pub use frame::{DEFAULT_MAX_FRAME_LEN, encode_frame, read_frame, send_frame, write_frame};
pub use invoker::TcpInvoker;
