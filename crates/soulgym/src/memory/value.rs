//! Typed values read from and written to process memory.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::{Error, Result};

/// Length of fixed-size string reads (bytes, NUL padded)
pub const STRING_LEN: usize = 32;

/// Type of the value at the end of a pointer chain
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    Byte,
    U32,
    I32,
    F32,
    F64,
    String,
}

impl ValueType {
    /// Number of bytes occupied in memory
    pub fn size(&self) -> usize {
        match self {
            Self::Byte => 1,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
            Self::String => STRING_LEN,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// A value of one of the supported memory types
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Byte(u8),
    U32(u32),
    I32(i32),
    F32(f32),
    F64(f64),
    String(String),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Byte(_) => ValueType::Byte,
            Self::U32(_) => ValueType::U32,
            Self::I32(_) => ValueType::I32,
            Self::F32(_) => ValueType::F32,
            Self::F64(_) => ValueType::F64,
            Self::String(_) => ValueType::String,
        }
    }

    /// Decode a value from little-endian bytes.
    ///
    /// Strings stop at the first NUL and are decoded lossily.
    pub fn decode(value_type: ValueType, bytes: &[u8]) -> Result<Self> {
        let size = value_type.size();
        if bytes.len() < size {
            return Err(Error::MemoryReadFailed {
                address: 0,
                message: format!(
                    "expected {} bytes for {}, got {}",
                    size,
                    value_type,
                    bytes.len()
                ),
            });
        }

        let value = match value_type {
            ValueType::Byte => Self::Byte(bytes[0]),
            ValueType::U32 => Self::U32(u32::from_le_bytes(word(bytes))),
            ValueType::I32 => Self::I32(i32::from_le_bytes(word(bytes))),
            ValueType::F32 => Self::F32(f32::from_le_bytes(word(bytes))),
            ValueType::F64 => Self::F64(f64::from_le_bytes(dword(bytes))),
            ValueType::String => {
                let raw = &bytes[..STRING_LEN];
                let len = memchr::memchr(0, raw).unwrap_or(raw.len());
                Self::String(String::from_utf8_lossy(&raw[..len]).into_owned())
            }
        };
        Ok(value)
    }

    /// Encode as the little-endian bytes written to memory.
    ///
    /// Strings are truncated or NUL padded to [`STRING_LEN`].
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Byte(v) => vec![*v],
            Self::U32(v) => v.to_le_bytes().to_vec(),
            Self::I32(v) => v.to_le_bytes().to_vec(),
            Self::F32(v) => v.to_le_bytes().to_vec(),
            Self::F64(v) => v.to_le_bytes().to_vec(),
            Self::String(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.truncate(STRING_LEN - 1);
                bytes.resize(STRING_LEN, 0);
                bytes
            }
        }
    }

    /// Numeric view of the value; `None` for strings
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Byte(v) => Some(f64::from(*v)),
            Self::U32(v) => Some(f64::from(*v)),
            Self::I32(v) => Some(f64::from(*v)),
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            Self::String(_) => None,
        }
    }

    /// Integer view of the value; floats are not converted
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::U32(v) => Some(i64::from(*v)),
            Self::I32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Parse a textual value as the given type (CLI input)
    pub fn parse(value_type: ValueType, text: &str) -> Result<Self> {
        let text = text.trim();
        let invalid = |e: &dyn std::fmt::Display| {
            Error::Config(format!("invalid {} value {:?}: {}", value_type, text, e))
        };
        Ok(match value_type {
            ValueType::Byte => Self::Byte(text.parse().map_err(|e| invalid(&e))?),
            ValueType::U32 => Self::U32(text.parse().map_err(|e| invalid(&e))?),
            ValueType::I32 => Self::I32(text.parse().map_err(|e| invalid(&e))?),
            ValueType::F32 => Self::F32(text.parse().map_err(|e| invalid(&e))?),
            ValueType::F64 => Self::F64(text.parse().map_err(|e| invalid(&e))?),
            ValueType::String => Self::String(text.to_string()),
        })
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Byte(v) => write!(f, "{} (0x{:02X})", v, v),
            Self::U32(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::F32(v) => write!(f, "{:.4}", v),
            Self::F64(v) => write!(f, "{:.6}", v),
            Self::String(s) => write!(f, "{:?}", s),
        }
    }
}

fn word(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn dword(bytes: &[u8]) -> [u8; 8] {
    [
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_value_type_names() {
        assert_eq!(ValueType::from_str("i32").unwrap(), ValueType::I32);
        assert_eq!(ValueType::from_str("byte").unwrap(), ValueType::Byte);
        assert_eq!(ValueType::F64.as_str(), "f64");
        assert!(ValueType::from_str("int").is_err());
    }

    #[test]
    fn test_decode_numeric() {
        assert_eq!(
            Value::decode(ValueType::I32, &(-7i32).to_le_bytes()).unwrap(),
            Value::I32(-7)
        );
        assert_eq!(
            Value::decode(ValueType::F32, &124.5f32.to_le_bytes()).unwrap(),
            Value::F32(124.5)
        );
        assert_eq!(Value::decode(ValueType::Byte, &[0xC3]).unwrap(), Value::Byte(0xC3));
    }

    #[test]
    fn test_decode_short_buffer_fails() {
        assert!(Value::decode(ValueType::F64, &[0, 0, 0, 0]).is_err());
    }

    #[test]
    fn test_decode_string_stops_at_nul() {
        let mut bytes = vec![0u8; STRING_LEN];
        bytes[..5].copy_from_slice(b"Ludex");
        bytes[6] = b'X';
        assert_eq!(
            Value::decode(ValueType::String, &bytes).unwrap(),
            Value::String("Ludex".into())
        );
    }

    #[test]
    fn test_string_encoding_is_fixed_length() {
        let bytes = Value::String("a".repeat(40)).to_bytes();
        assert_eq!(bytes.len(), STRING_LEN);
        assert_eq!(bytes[STRING_LEN - 1], 0);
    }

    #[test]
    fn test_parse_and_views() {
        let v = Value::parse(ValueType::F32, " -2.5 ").unwrap();
        assert_eq!(v, Value::F32(-2.5));
        assert_eq!(v.as_i64(), None);
        assert_eq!(Value::U32(9).as_f64(), Some(9.0));
        assert!(Value::parse(ValueType::Byte, "300").is_err());
    }
}
