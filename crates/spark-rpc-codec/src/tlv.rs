//! TLV 扩展区：`[block_len:u32]` 后跟若干 `[tag:u16][len:u32][value]`。
//!
//! 解码时未登记的标签以 `trace!` 记录后按不透明字节原样保留，重新编码时一并写回。

use bytes::{BufMut, Bytes, BytesMut};
use spark_rpc_core::{InvocationError, Result, TagValues, tags};
use tracing::trace;

use crate::wire;

const ENTRY_HEADER: usize = 2 + 4;

fn is_well_known(tag: u16) -> bool {
    matches!(
        tag,
        tags::WORKER_ID | tags::INSTANCE_ID | tags::TRACE_ID | tags::DEGRADATION_KEY
    )
}

/// 扩展区（含 4 字节块长度）编码后的总长度；块长度或单值超出 `u32` 时报错。
pub fn encoded_block_len(tag_values: &TagValues) -> Result<usize> {
    let mut body = 0usize;
    for (tag, value) in tag_values.iter() {
        if u32::try_from(value.len()).is_err() {
            return Err(InvocationError::serialization(format!(
                "TLV tag {tag} value exceeds u32::MAX bytes"
            )));
        }
        body += ENTRY_HEADER + value.len();
    }
    if u32::try_from(body).is_err() {
        return Err(InvocationError::serialization("TLV block exceeds u32::MAX bytes"));
    }
    Ok(4 + body)
}

/// 写出扩展区；先完成长度校验，失败时不写入任何字节。
pub fn encode_block(tag_values: &TagValues, dst: &mut BytesMut) -> Result<()> {
    let total = encoded_block_len(tag_values)?;
    dst.reserve(total);
    dst.put_u32((total - 4) as u32);
    for (tag, value) in tag_values.iter() {
        dst.put_u16(tag);
        dst.put_u32(value.len() as u32);
        dst.put_slice(value);
    }
    Ok(())
}

/// 读取一个完整的扩展区。
///
/// 条目必须恰好填满 `block_len`；条目越界或重复标签返回 `Serialization`。
pub fn decode_block(src: &mut Bytes) -> Result<TagValues> {
    let mut block = wire::get_slice(src, "tag_values")?;
    let mut tag_values = TagValues::new();
    while !block.is_empty() {
        let tag = wire::get_u16(&mut block, "tag_values.tag")?;
        let value = wire::get_slice(&mut block, "tag_values.value")?;
        if !is_well_known(tag) {
            trace!(rpc.tlv.tag = tag, len = value.len(), "preserving unknown TLV tag");
        }
        tag_values.try_push(tag, value)?;
    }
    Ok(tag_values)
}
