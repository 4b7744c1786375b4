#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use spark_rpc_codec::ProtocolVersions;

/// Fuzz 输入：任意字节按请求或响应帧解码。
///
/// - **Why**：元数据帧来自网络，解码器必须对截断、超长长度字段、非法 UTF-8 与重复 TLV 标签
///   一律返回错误而不是 panic 或过量分配；
/// - **What**：解码成功的帧重新编码后必须再次解码为相同的元数据（往返律）。
#[derive(Debug, Arbitrary)]
enum MetadataCase {
    Request(Vec<u8>),
    Response(Vec<u8>),
}

fuzz_target!(|case: MetadataCase| {
    let versions = ProtocolVersions::standard();
    match case {
        MetadataCase::Request(raw) => {
            if let Ok(decoded) = versions.decode_request(Bytes::from(raw)) {
                let frame = versions
                    .encode_request(&decoded)
                    .expect("decoded metadata must re-encode");
                let again = versions
                    .decode_request(frame)
                    .expect("re-encoded metadata must decode");
                assert_eq!(again, decoded);
            }
        }
        MetadataCase::Response(raw) => {
            if let Ok(decoded) = versions.decode_response(Bytes::from(raw)) {
                let frame = versions
                    .encode_response(&decoded)
                    .expect("decoded metadata must re-encode");
                let again = versions
                    .decode_response(frame)
                    .expect("re-encoded metadata must decode");
                assert_eq!(again, decoded);
            }
        }
    }
});
