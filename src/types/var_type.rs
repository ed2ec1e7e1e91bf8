//! Telemetry variable type codes and runtime values

use serde::{Deserialize, Serialize};

use crate::{Result, SdkError};

/// Supported telemetry data types.
/// Maps to the SDK's irsdk_VarType enum; the discriminants are the wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum VarType {
    /// 8-bit character (irsdk_char)
    Char = 0,
    /// Single-byte boolean, non-zero means true (irsdk_bool)
    Bool = 1,
    /// 32-bit signed integer (irsdk_int)
    Int32 = 2,
    /// 32-bit unsigned bit field (irsdk_bitField)
    UInt32 = 3,
    /// 32-bit floating point (irsdk_float)
    Float32 = 4,
    /// 64-bit floating point (irsdk_double)
    Float64 = 5,
}

impl VarType {
    /// Decode a wire type code. Codes outside 0..=5 are rejected.
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(VarType::Char),
            1 => Ok(VarType::Bool),
            2 => Ok(VarType::Int32),
            3 => Ok(VarType::UInt32),
            4 => Ok(VarType::Float32),
            5 => Ok(VarType::Float64),
            _ => Err(SdkError::parse_error(
                "Variable type decoding",
                format!("Unknown type code: {}", code),
            )),
        }
    }

    /// The wire code for this type.
    pub const fn code(&self) -> i32 {
        *self as i32
    }

    /// Returns the size in bytes of this data type.
    /// Matches the irsdk_VarTypeBytes array from the SDK.
    pub const fn size(&self) -> usize {
        match self {
            VarType::Char | VarType::Bool => 1,
            VarType::Int32 | VarType::UInt32 | VarType::Float32 => 4,
            VarType::Float64 => 8,
        }
    }
}

/// Runtime value type that can hold any telemetry sample.
///
/// Scalars map one-to-one onto the wire types; variables with an element
/// count above one decode to [`Value::Array`]. Session-info values are a
/// separate document type ([`crate::SessionValue`]) and never appear here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Char(u8),
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Float32(f32),
    Float64(f64),
    Array(Vec<Value>),
}

impl Value {
    /// Scalar i32 accessor; `None` for any other shape.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Scalar u32 accessor; `None` for any other shape.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    /// Scalar f32 accessor; `None` for any other shape.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Float32(v) => Some(*v),
            _ => None,
        }
    }

    /// Scalar f64 accessor; `None` for any other shape.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Scalar bool accessor; `None` for any other shape.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Array accessor; `None` for scalars.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Char(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Array(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_match_sdk_table() {
        assert_eq!(VarType::Char.code(), 0);
        assert_eq!(VarType::Bool.code(), 1);
        assert_eq!(VarType::Int32.code(), 2);
        assert_eq!(VarType::UInt32.code(), 3);
        assert_eq!(VarType::Float32.code(), 4);
        assert_eq!(VarType::Float64.code(), 5);
    }

    #[test]
    fn sizes_match_sdk_table() {
        assert_eq!(VarType::Char.size(), 1);
        assert_eq!(VarType::Bool.size(), 1);
        assert_eq!(VarType::Int32.size(), 4);
        assert_eq!(VarType::UInt32.size(), 4);
        assert_eq!(VarType::Float32.size(), 4);
        assert_eq!(VarType::Float64.size(), 8);
    }

    #[test]
    fn from_code_round_trips_and_rejects_unknown() {
        for code in 0..6 {
            assert_eq!(VarType::from_code(code).unwrap().code(), code);
        }
        assert!(VarType::from_code(-1).is_err());
        assert!(VarType::from_code(6).is_err());
        assert!(VarType::from_code(99).is_err());
    }

    #[test]
    fn value_accessors_only_match_their_variant() {
        assert_eq!(Value::Int32(7).as_i32(), Some(7));
        assert_eq!(Value::Int32(7).as_f32(), None);
        assert_eq!(Value::Float32(1.5).as_f32(), Some(1.5));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        let arr = Value::Array(vec![Value::Int32(1), Value::Int32(2)]);
        assert_eq!(arr.as_array().map(|a| a.len()), Some(2));
        assert_eq!(arr.as_i32(), None);
    }
}
