//! V1/V2 共享的帧布局。
//!
//! 请求：`[version:u16][data_format:u8][capability_id:str][capability_version:3×u16]
//! [provider_id:str][provider_version:3×u16][async_task_id:str]*[tag_values]`，`*` 仅在
//! `with_async_task` 为真时出现；响应：`[version:u16][data_format:u8][code:i32][message:str][tag_values]`。

use bytes::{BufMut, Bytes, BytesMut};
use spark_rpc_core::{
    DataFormat, InvocationError, RequestMetadata, ResponseMetadata, Result,
};

use crate::{tlv, wire};

const HEADER: usize = 2 + 1;
const VERSION_TRIPLE: usize = 6;

fn check_version(expected: u16, actual: u16) -> Result<()> {
    if expected != actual {
        return Err(InvocationError::serialization(format!(
            "metadata declares protocol version {actual}, codec handles version {expected}"
        )));
    }
    Ok(())
}

fn read_header(src: &mut Bytes, expected: u16) -> Result<DataFormat> {
    let version = wire::get_u16(src, "version")?;
    check_version(expected, version)?;
    Ok(DataFormat::from_raw(wire::get_u8(src, "data_format")?))
}

pub(crate) fn encode_request(
    protocol: u16,
    with_async_task: bool,
    metadata: &RequestMetadata,
    dst: &mut BytesMut,
) -> Result<()> {
    check_version(protocol, metadata.version)?;
    let async_task_id = match metadata.async_task_id.as_deref() {
        Some(_) if !with_async_task => {
            return Err(InvocationError::serialization(format!(
                "protocol version {protocol} cannot carry an async task id"
            )));
        }
        Some("") => {
            return Err(InvocationError::invalid_argument(
                "async task id must not be empty, use None instead",
            ));
        }
        other => other.unwrap_or(""),
    };

    let mut total = HEADER
        + wire::check_str(&metadata.capability_id, "capability_id")?
        + VERSION_TRIPLE
        + wire::check_str(&metadata.provider_id, "provider_id")?
        + VERSION_TRIPLE
        + tlv::encoded_block_len(&metadata.tag_values)?;
    if with_async_task {
        total += wire::check_str(async_task_id, "async_task_id")?;
    }

    dst.reserve(total);
    dst.put_u16(metadata.version);
    dst.put_u8(metadata.data_format.raw());
    wire::put_str(dst, &metadata.capability_id);
    wire::put_version(dst, metadata.capability_version);
    wire::put_str(dst, &metadata.provider_id);
    wire::put_version(dst, metadata.provider_version);
    if with_async_task {
        wire::put_str(dst, async_task_id);
    }
    tlv::encode_block(&metadata.tag_values, dst)
}

pub(crate) fn decode_request(
    protocol: u16,
    with_async_task: bool,
    src: &mut Bytes,
) -> Result<RequestMetadata> {
    let data_format = read_header(src, protocol)?;
    let capability_id = wire::get_str(src, "capability_id")?;
    let capability_version = wire::get_version(src, "capability_version")?;
    let provider_id = wire::get_str(src, "provider_id")?;
    let provider_version = wire::get_version(src, "provider_version")?;
    let async_task_id = if with_async_task {
        Some(wire::get_str(src, "async_task_id")?).filter(|id| !id.is_empty())
    } else {
        None
    };
    let tag_values = tlv::decode_block(src)?;
    Ok(RequestMetadata {
        version: protocol,
        data_format,
        capability_id,
        capability_version,
        provider_id,
        provider_version,
        async_task_id,
        tag_values,
    })
}

pub(crate) fn encode_response(
    protocol: u16,
    metadata: &ResponseMetadata,
    dst: &mut BytesMut,
) -> Result<()> {
    check_version(protocol, metadata.version)?;
    let total = HEADER
        + 4
        + wire::check_str(&metadata.message, "message")?
        + tlv::encoded_block_len(&metadata.tag_values)?;

    dst.reserve(total);
    dst.put_u16(metadata.version);
    dst.put_u8(metadata.data_format.raw());
    dst.put_i32(metadata.code);
    wire::put_str(dst, &metadata.message);
    tlv::encode_block(&metadata.tag_values, dst)
}

pub(crate) fn decode_response(protocol: u16, src: &mut Bytes) -> Result<ResponseMetadata> {
    let data_format = read_header(src, protocol)?;
    let code = wire::get_i32(src, "code")?;
    let message = wire::get_str(src, "message")?;
    let tag_values = tlv::decode_block(src)?;
    Ok(ResponseMetadata {
        version: protocol,
        data_format,
        code,
        message,
        tag_values,
    })
}
