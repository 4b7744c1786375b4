use std::io;

use spark_rpc_core::{InvocationError, codes};

/// 描述一次底层操作的名称，写入错误消息。
#[derive(Clone, Copy, Debug)]
pub(crate) struct OperationKind {
    pub message: &'static str,
}

pub(crate) const CONNECT: OperationKind = OperationKind {
    message: "tcp connect",
};
pub(crate) const WRITE: OperationKind = OperationKind {
    message: "tcp write",
};
pub(crate) const READ: OperationKind = OperationKind { message: "tcp read" };
pub(crate) const EXCHANGE: OperationKind = OperationKind {
    message: "tcp exchange",
};

/// 将 IO 错误映射为分类错误：瞬时故障可换目标重试，其余只允许降级。
pub(crate) fn map_io_error(kind: OperationKind, error: io::Error) -> InvocationError {
    let message = format!("{}: {}", kind.message, error);
    if is_transient(&error) {
        InvocationError::retryable(message)
            .with_code(codes::TRANSPORT)
            .with_source(error)
    } else {
        InvocationError::degradable(message).with_source(error)
    }
}

/// 调用超时：可重试。
pub(crate) fn timeout_error(kind: OperationKind, elapsed_ms: u128) -> InvocationError {
    InvocationError::retryable(format!("{} timed out after {elapsed_ms} ms", kind.message))
        .with_code(codes::TIMEOUT)
}

fn is_transient(error: &io::Error) -> bool {
    use io::ErrorKind;
    matches!(
        error.kind(),
        ErrorKind::TimedOut
            | ErrorKind::WouldBlock
            | ErrorKind::Interrupted
            | ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::AddrInUse
            | ErrorKind::AddrNotAvailable
            | ErrorKind::BrokenPipe
            | ErrorKind::WriteZero
            | ErrorKind::UnexpectedEof
    )
}
