use core::fmt;

/// 负载序列化格式，线上为单字节。
///
/// 未登记的字节值同样可以表示与透传，核心只负责搬运，不解释负载。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataFormat(u8);

const KNOWN: &[(DataFormat, &str)] = &[
    (DataFormat::PROTOBUF, "protobuf"),
    (DataFormat::JSON, "json"),
    (DataFormat::CBOR, "cbor"),
];

impl DataFormat {
    pub const PROTOBUF: DataFormat = DataFormat(0);
    pub const JSON: DataFormat = DataFormat(1);
    pub const CBOR: DataFormat = DataFormat(2);

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    /// 线上原始字节。
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// 扩宽后的 `i32` 视图，供日志与跨语言对端比较使用。
    pub const fn code(self) -> i32 {
        self.0 as i32
    }

    /// 已登记格式的名称；未登记返回 `None`。
    pub fn name(self) -> Option<&'static str> {
        KNOWN
            .iter()
            .find(|(format, _)| *format == self)
            .map(|(_, name)| *name)
    }

    /// 按名称（大小写不敏感）查找已登记格式。
    pub fn from_name(name: &str) -> Option<Self> {
        KNOWN
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(format, _)| *format)
    }
}

impl From<u8> for DataFormat {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "format#{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_formats_resolve_both_ways() {
        assert_eq!(DataFormat::from_name("JSON"), Some(DataFormat::JSON));
        assert_eq!(DataFormat::CBOR.name(), Some("cbor"));
        assert_eq!(DataFormat::default(), DataFormat::PROTOBUF);
    }

    #[test]
    fn unknown_bytes_stay_representable() {
        let format = DataFormat::from_raw(0xFF);
        assert_eq!(format.name(), None);
        assert_eq!(format.code(), 255);
        assert_eq!(format.to_string(), "format#255");
    }
}
