//! Logical values of network variables.

use std::fmt;

use crate::types::TypeTag;

/// A single value read from or written to a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bit(bool),
}

impl Value {
    /// The type this value naturally encodes as.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::U8(_) => TypeTag::U8,
            Value::U16(_) => TypeTag::U16,
            Value::U32(_) => TypeTag::U32,
            Value::U64(_) => TypeTag::U64,
            Value::I8(_) => TypeTag::I8,
            Value::I16(_) => TypeTag::I16,
            Value::I32(_) => TypeTag::I32,
            Value::I64(_) => TypeTag::I64,
            Value::F32(_) => TypeTag::F32,
            Value::F64(_) => TypeTag::F64,
            Value::Bit(_) => TypeTag::Bit,
        }
    }

    /// Exact integer view; `None` for floats.
    pub fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::U8(x) => Some(x as i128),
            Value::U16(x) => Some(x as i128),
            Value::U32(x) => Some(x as i128),
            Value::U64(x) => Some(x as i128),
            Value::I8(x) => Some(x as i128),
            Value::I16(x) => Some(x as i128),
            Value::I32(x) => Some(x as i128),
            Value::I64(x) => Some(x as i128),
            Value::Bit(b) => Some(b as i128),
            Value::F32(_) | Value::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::F32(x) => x as f64,
            Value::F64(x) => x,
            _ => self.as_i128().unwrap_or_default() as f64,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|x| u64::try_from(x).ok())
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|x| i64::try_from(x).ok())
    }

    /// Non-zero is true.
    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bit(b) => b,
            Value::F32(x) => x != 0.0,
            Value::F64(x) => x != 0.0,
            _ => self.as_i128() != Some(0),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(x) => write!(f, "{}", x),
            Value::U16(x) => write!(f, "{}", x),
            Value::U32(x) => write!(f, "{}", x),
            Value::U64(x) => write!(f, "{}", x),
            Value::I8(x) => write!(f, "{}", x),
            Value::I16(x) => write!(f, "{}", x),
            Value::I32(x) => write!(f, "{}", x),
            Value::I64(x) => write!(f, "{}", x),
            Value::F32(x) => write!(f, "{}", x),
            Value::F64(x) => write!(f, "{}", x),
            Value::Bit(b) => write!(f, "{}", *b as u8),
        }
    }
}

macro_rules! impl_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Value {
                fn from(x: $t) -> Self {
                    Value::$variant(x)
                }
            }
        )*
    };
}

impl_from! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    bool => Bit,
}
