//! 对接进程内 Tokio 监听器的端到端调用。

use std::time::Duration;

use bytes::Bytes;
use spark_rpc_codec::ProtocolVersions;
use spark_rpc_core::{
    Capability, DataFormat, ErrorKind, InvocationError, Invoker, InvokerConfig, Provider,
    RequestMetadata, ResponseMetadata, Target, Version, codes,
};
use spark_rpc_transport_tcp::{DEFAULT_MAX_FRAME_LEN, TcpInvoker, read_frame, write_frame};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn request(version: u16) -> RequestMetadata {
    let capability = Capability::new("calc.add", Version::new(1, 0, 0));
    let provider = Provider::new("impl-1", Version::new(1, 0, 0), capability);
    RequestMetadata::for_provider(version, DataFormat::JSON, &provider)
}

async fn listener() -> (TcpListener, Target) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("绑定本地端口");
    let port = listener.local_addr().expect("本地地址").port();
    (listener, Target::new("worker-1", "127.0.0.1", port))
}

/// 单连接服务端：解码请求后交给 `respond` 生成响应元数据，负载原样回显。
fn serve_once<F>(listener: TcpListener, respond: F) -> JoinHandle<RequestMetadata>
where
    F: FnOnce(&RequestMetadata) -> ResponseMetadata + Send + 'static,
{
    tokio::spawn(async move {
        let versions = ProtocolVersions::standard();
        let (mut stream, _) = listener.accept().await.expect("接受连接");
        let (metadata, payload) = read_frame(&mut stream, DEFAULT_MAX_FRAME_LEN)
            .await
            .expect("读取请求帧");
        let request = versions.decode_request(metadata).expect("解码请求");
        let response = versions.encode_response(&respond(&request)).expect("编码响应");
        write_frame(&mut stream, &response, &payload, DEFAULT_MAX_FRAME_LEN)
            .await
            .expect("写出响应帧");
        request
    })
}

#[tokio::test]
async fn round_trip_against_local_listener() {
    let (listener, target) = listener().await;
    let server = serve_once(listener, |request| {
        ResponseMetadata::success(request.version, request.data_format)
    });

    let invoker = TcpInvoker::new(ProtocolVersions::standard());
    let sent = request(2).with_async_task_id("task-1");
    let (response, payload) = invoker
        .invoke(&target, &sent, Bytes::from_static(b"{\"a\":1,\"b\":2}"), Duration::from_secs(5))
        .await
        .expect("调用成功");

    assert!(response.is_success());
    assert_eq!(response.version, 2);
    assert_eq!(payload, Bytes::from_static(b"{\"a\":1,\"b\":2}"));
    assert_eq!(server.await.expect("服务端任务"), sent);
}

#[tokio::test]
async fn failure_response_carries_degradation_key() {
    let (listener, target) = listener().await;
    let server = serve_once(listener, |request| {
        let error = InvocationError::degradable("pricing engine offline")
            .with_degradation_key("list-price");
        ResponseMetadata::from_error(request.version, request.data_format, &error)
    });

    let invoker = TcpInvoker::new(ProtocolVersions::standard());
    let err = invoker
        .invoke(&target, &request(1), Bytes::new(), Duration::from_secs(5))
        .await
        .expect_err("失败响应");

    assert_eq!(err.kind(), ErrorKind::Degradable);
    assert_eq!(err.code(), codes::DEGRADABLE);
    assert_eq!(err.degradation_key(), Some("list-price"));
    assert_eq!(err.message(), "pricing engine offline");
    assert_eq!(err.capability_id(), Some("calc.add"));
    assert_eq!(err.provider_id(), Some("impl-1"));
    server.await.expect("服务端任务");
}

#[tokio::test]
async fn silent_server_times_out_as_retryable() {
    let (listener, target) = listener().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("接受连接");
        tokio::time::sleep(Duration::from_millis(500)).await;
        drop(stream);
    });

    let invoker = TcpInvoker::new(ProtocolVersions::standard());
    let err = invoker
        .invoke(&target, &request(2), Bytes::new(), Duration::from_millis(50))
        .await
        .expect_err("超时");

    assert_eq!(err.kind(), ErrorKind::Retryable);
    assert_eq!(err.code(), codes::TIMEOUT);
    assert_eq!(err.capability_id(), Some("calc.add"));
    server.abort();
}

#[tokio::test]
async fn refused_connection_is_retryable() {
    let (listener, target) = listener().await;
    drop(listener);

    let invoker = TcpInvoker::new(ProtocolVersions::standard());
    let err = invoker
        .invoke(&target, &request(2), Bytes::new(), Duration::from_secs(5))
        .await
        .expect_err("连接被拒绝");

    assert!(err.is_retryable());
    assert_eq!(err.code(), codes::TRANSPORT);
}

#[tokio::test]
async fn invalid_metadata_fails_before_connecting() {
    // 目标端口上没有监听者：若发起连接会得到 Retryable，而这里期望编码阶段的 Serialization。
    let (listener, target) = listener().await;
    drop(listener);

    let config = InvokerConfig {
        connect_timeout_ms: Some(100),
        ..InvokerConfig::default()
    };
    let invoker = TcpInvoker::from_config(ProtocolVersions::standard(), &config);
    let err = invoker
        .invoke(
            &target,
            &request(1).with_async_task_id("task-1"),
            Bytes::new(),
            Duration::from_secs(5),
        )
        .await
        .expect_err("V1 不支持异步任务号");
    assert_eq!(err.kind(), ErrorKind::Serialization);

    let err = invoker
        .invoke(&target, &request(999), Bytes::new(), Duration::from_secs(5))
        .await
        .expect_err("不支持的协议版本");
    assert_eq!(err.kind(), ErrorKind::Serialization);
}

#[tokio::test]
async fn oversized_payload_is_rejected_before_connecting() {
    let (listener, target) = listener().await;

    let invoker = TcpInvoker::new(ProtocolVersions::standard()).with_max_frame_len(64);
    let err = invoker
        .invoke(&target, &request(2), Bytes::from(vec![0u8; 128]), Duration::from_secs(5))
        .await
        .expect_err("帧超限");
    assert_eq!(err.kind(), ErrorKind::Serialization);
    assert_eq!(err.capability_id(), Some("calc.add"));
    assert_eq!(err.provider_id(), Some("impl-1"));

    let accepted = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
    assert!(accepted.is_err(), "超限帧不应触发建连");
}

#[tokio::test]
async fn every_failure_carries_request_identity() {
    let (listener, target) = listener().await;
    drop(listener);
    let invoker = TcpInvoker::new(ProtocolVersions::standard());

    let refused = invoker
        .invoke(&target, &request(2), Bytes::new(), Duration::from_secs(5))
        .await
        .expect_err("连接被拒绝");
    let unsupported = invoker
        .invoke(&target, &request(999), Bytes::new(), Duration::from_secs(5))
        .await
        .expect_err("不支持的协议版本");

    for err in [refused, unsupported] {
        assert_eq!(err.capability_id(), Some("calc.add"), "{err}");
        assert_eq!(err.provider_id(), Some("impl-1"), "{err}");
    }
}
