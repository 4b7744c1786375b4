//! 连接上的分帧：`[meta_len:u32][payload_len:u32][meta][payload]`，大端序。
//!
//! 元数据部分是编解码器产出的完整帧，负载部分是不透明字节。两段总长不得超过
//! 调用器配置的上限，超限在写出前或读到帧头时即以 `Serialization` 拒绝。

use bytes::{BufMut, Bytes, BytesMut};
use spark_rpc_core::{InvocationError, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{READ, WRITE, map_io_error};

/// 帧头长度。
pub const HEADER_LEN: usize = 8;

/// 缺省的单帧上限（元数据 + 负载）。
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

fn check_len(metadata_len: usize, payload_len: usize, max_frame_len: usize) -> Result<()> {
    let total = metadata_len.saturating_add(payload_len);
    if total > max_frame_len {
        return Err(InvocationError::serialization(format!(
            "frame of {total} bytes exceeds the {max_frame_len} byte limit"
        )));
    }
    Ok(())
}

/// 组装一帧。
pub fn encode_frame(metadata: &[u8], payload: &[u8], max_frame_len: usize) -> Result<Bytes> {
    check_len(metadata.len(), payload.len(), max_frame_len.min(u32::MAX as usize))?;
    let mut dst = BytesMut::with_capacity(HEADER_LEN + metadata.len() + payload.len());
    dst.put_u32(metadata.len() as u32);
    dst.put_u32(payload.len() as u32);
    dst.put_slice(metadata);
    dst.put_slice(payload);
    Ok(dst.freeze())
}

/// 写出一帧并刷新。
pub async fn write_frame<W>(writer: &mut W, metadata: &[u8], payload: &[u8], max_frame_len: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(metadata, payload, max_frame_len)?;
    send_frame(writer, &frame).await
}

/// 写出一帧已由 [`encode_frame`] 组装好的字节并刷新。
pub async fn send_frame<W>(writer: &mut W, frame: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(frame)
        .await
        .map_err(|err| map_io_error(WRITE, err))?;
    writer.flush().await.map_err(|err| map_io_error(WRITE, err))
}

/// 读取一帧，返回 `(metadata, payload)`。
pub async fn read_frame<R>(reader: &mut R, max_frame_len: usize) -> Result<(Bytes, Bytes)>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|err| map_io_error(READ, err))?;
    let metadata_len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let payload_len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    check_len(metadata_len, payload_len, max_frame_len)?;

    let mut body = BytesMut::zeroed(metadata_len + payload_len);
    reader
        .read_exact(&mut body)
        .await
        .map_err(|err| map_io_error(READ, err))?;
    let mut body = body.freeze();
    let metadata = body.split_to(metadata_len);
    Ok((metadata, body))
}
