//! 大端序基本类型的读写。
//!
//! 读取函数在字节不足时返回 `Serialization` 错误并指明字段名，绝不 panic；
//! 写入函数假定调用方已完成长度校验。

use bytes::{Buf, BufMut, Bytes, BytesMut};
use spark_rpc_core::{InvocationError, Result, Version};

pub(crate) fn truncated(field: &'static str, needed: usize, remaining: usize) -> InvocationError {
    InvocationError::serialization(format!(
        "frame truncated while reading `{field}`: need {needed} bytes, {remaining} left"
    ))
}

fn ensure(src: &Bytes, needed: usize, field: &'static str) -> Result<()> {
    if src.remaining() < needed {
        return Err(truncated(field, needed, src.remaining()));
    }
    Ok(())
}

pub(crate) fn get_u8(src: &mut Bytes, field: &'static str) -> Result<u8> {
    ensure(src, 1, field)?;
    Ok(src.get_u8())
}

pub(crate) fn get_u16(src: &mut Bytes, field: &'static str) -> Result<u16> {
    ensure(src, 2, field)?;
    Ok(src.get_u16())
}

pub(crate) fn get_u32(src: &mut Bytes, field: &'static str) -> Result<u32> {
    ensure(src, 4, field)?;
    Ok(src.get_u32())
}

pub(crate) fn get_i32(src: &mut Bytes, field: &'static str) -> Result<i32> {
    ensure(src, 4, field)?;
    Ok(src.get_i32())
}

/// 读取 `[len:u32][len bytes]` 并切出零拷贝视图。
pub(crate) fn get_slice(src: &mut Bytes, field: &'static str) -> Result<Bytes> {
    let len = get_u32(src, field)? as usize;
    ensure(src, len, field)?;
    Ok(src.split_to(len))
}

pub(crate) fn get_str(src: &mut Bytes, field: &'static str) -> Result<String> {
    let raw = get_slice(src, field)?;
    String::from_utf8(raw.to_vec()).map_err(|err| {
        InvocationError::serialization(format!("field `{field}` is not valid UTF-8")).with_source(err)
    })
}

pub(crate) fn get_version(src: &mut Bytes, field: &'static str) -> Result<Version> {
    ensure(src, 6, field)?;
    Ok(Version::new(src.get_u16(), src.get_u16(), src.get_u16()))
}

/// 写入前的长度校验：字符串长度必须能以 `u32` 表示。
pub(crate) fn check_str(value: &str, field: &'static str) -> Result<usize> {
    u32::try_from(value.len()).map_err(|_| {
        InvocationError::serialization(format!("field `{field}` exceeds u32::MAX bytes"))
    })?;
    Ok(4 + value.len())
}

pub(crate) fn put_str(dst: &mut BytesMut, value: &str) {
    dst.put_u32(value.len() as u32);
    dst.put_slice(value.as_bytes());
}

pub(crate) fn put_version(dst: &mut BytesMut, version: Version) {
    for segment in version.segments() {
        dst.put_u16(segment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_rpc_core::ErrorKind;

    #[test]
    fn strings_are_length_prefixed() {
        let mut dst = BytesMut::new();
        put_str(&mut dst, "calc");
        assert_eq!(&dst[..], b"\x00\x00\x00\x04calc");

        let mut src = dst.freeze();
        assert_eq!(get_str(&mut src, "id").expect("合法字符串"), "calc");
        assert!(src.is_empty());
    }

    #[test]
    fn short_input_is_a_serialization_error() {
        let mut src = Bytes::from_static(b"\x00\x00\x00\x09abc");
        let err = get_str(&mut src, "capability_id").expect_err("长度不足");
        assert_eq!(err.kind(), ErrorKind::Serialization);
        assert!(err.message().contains("capability_id"));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut src = Bytes::from_static(b"\x00\x00\x00\x02\xff\xfe");
        let err = get_str(&mut src, "message").expect_err("非法 UTF-8");
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }
}
