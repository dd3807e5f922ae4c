//! Encode/decode variable values to and from register image bytes.
//!
//! Multi-byte types use a configurable byte order (little-endian by default, the order the
//! calibrator firmware exposes). Before encoding, any [`Value`] is coerced to the target
//! type: integral targets round to the nearest integer and reject out-of-range input, float
//! targets convert without rounding, and `bit` truncates toward zero, then clamps to 0/1.

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::types::{CodecKind, TypeTag};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    Big,
    #[default]
    Little,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Codec {
    pub endianness: Endianness,
}

impl Codec {
    pub fn new(endianness: Endianness) -> Self {
        Codec { endianness }
    }

    /// Coerce `value` to the logical representation of `tag`.
    pub fn coerce(&self, tag: TypeTag, value: &Value) -> Result<Value> {
        match tag.codec() {
            CodecKind::Bit => coerce_bit(value).map(Value::Bit),
            CodecKind::Float { .. } => Ok(match tag {
                TypeTag::F32 => Value::F32(match *value {
                    Value::F32(x) => x,
                    _ => value.as_f64() as f32,
                }),
                _ => Value::F64(value.as_f64()),
            }),
            CodecKind::Unsigned { .. } | CodecKind::Signed { .. } => {
                let n = coerce_integral(tag, value)?;
                Ok(int_value(tag, n))
            }
        }
    }

    /// Encode a value as `tag.size()` bytes.
    pub fn encode(&self, tag: TypeTag, value: &Value) -> Result<Vec<u8>> {
        let v = self.coerce(tag, value)?;
        let mut out = Vec::with_capacity(tag.size());
        match self.endianness {
            Endianness::Big => encode_with::<BigEndian>(&mut out, &v)?,
            Endianness::Little => encode_with::<LittleEndian>(&mut out, &v)?,
        }
        Ok(out)
    }

    /// Decode exactly `tag.size()` bytes.
    pub fn decode(&self, tag: TypeTag, bytes: &[u8]) -> Result<Value> {
        if bytes.len() != tag.size() {
            return Err(Error::ShortBuffer {
                expected: tag.size(),
                actual: bytes.len(),
            });
        }
        Ok(match self.endianness {
            Endianness::Big => decode_with::<BigEndian>(tag, bytes),
            Endianness::Little => decode_with::<LittleEndian>(tag, bytes),
        })
    }
}

fn encode_with<B: ByteOrder>(w: &mut Vec<u8>, v: &Value) -> Result<()> {
    match *v {
        Value::U8(x) => w.write_u8(x)?,
        Value::U16(x) => w.write_u16::<B>(x)?,
        Value::U32(x) => w.write_u32::<B>(x)?,
        Value::U64(x) => w.write_u64::<B>(x)?,
        Value::I8(x) => w.write_i8(x)?,
        Value::I16(x) => w.write_i16::<B>(x)?,
        Value::I32(x) => w.write_i32::<B>(x)?,
        Value::I64(x) => w.write_i64::<B>(x)?,
        Value::F32(x) => w.write_f32::<B>(x)?,
        Value::F64(x) => w.write_f64::<B>(x)?,
        Value::Bit(b) => w.write_u8(b as u8)?,
    }
    Ok(())
}

fn decode_with<B: ByteOrder>(tag: TypeTag, buf: &[u8]) -> Value {
    match tag {
        TypeTag::U8 => Value::U8(buf[0]),
        TypeTag::U16 => Value::U16(B::read_u16(buf)),
        TypeTag::U32 => Value::U32(B::read_u32(buf)),
        TypeTag::U64 => Value::U64(B::read_u64(buf)),
        TypeTag::I8 => Value::I8(buf[0] as i8),
        TypeTag::I16 => Value::I16(B::read_i16(buf)),
        TypeTag::I32 => Value::I32(B::read_i32(buf)),
        TypeTag::I64 => Value::I64(B::read_i64(buf)),
        TypeTag::F32 => Value::F32(B::read_f32(buf)),
        TypeTag::F64 => Value::F64(B::read_f64(buf)),
        TypeTag::Bit => Value::Bit(buf[0] & 1 != 0),
    }
}

fn int_bounds(tag: TypeTag) -> (i128, i128) {
    match tag {
        TypeTag::U8 => (0, u8::MAX as i128),
        TypeTag::U16 => (0, u16::MAX as i128),
        TypeTag::U32 => (0, u32::MAX as i128),
        TypeTag::U64 => (0, u64::MAX as i128),
        TypeTag::I8 => (i8::MIN as i128, i8::MAX as i128),
        TypeTag::I16 => (i16::MIN as i128, i16::MAX as i128),
        TypeTag::I32 => (i32::MIN as i128, i32::MAX as i128),
        TypeTag::I64 => (i64::MIN as i128, i64::MAX as i128),
        TypeTag::F32 | TypeTag::F64 | TypeTag::Bit => (0, 1),
    }
}

fn coerce_integral(tag: TypeTag, value: &Value) -> Result<i128> {
    let out_of_range = || Error::ValueOutOfRange {
        value: value.to_string(),
        type_tag: tag,
    };
    let n = match value.as_i128() {
        Some(n) => n,
        None => {
            let x = value.as_f64();
            if !x.is_finite() {
                return Err(out_of_range());
            }
            // `as` saturates, so anything beyond i128 stays out of range below.
            x.round() as i128
        }
    };
    let (min, max) = int_bounds(tag);
    if n < min || n > max {
        return Err(out_of_range());
    }
    Ok(n)
}

fn coerce_bit(value: &Value) -> Result<bool> {
    match value.as_i128() {
        Some(n) => Ok(n.clamp(0, 1) == 1),
        None => {
            let x = value.as_f64();
            if x.is_nan() {
                return Err(Error::ValueOutOfRange {
                    value: value.to_string(),
                    type_tag: TypeTag::Bit,
                });
            }
            Ok(x.trunc().clamp(0.0, 1.0) == 1.0)
        }
    }
}

fn int_value(tag: TypeTag, n: i128) -> Value {
    match tag {
        TypeTag::U8 => Value::U8(n as u8),
        TypeTag::U16 => Value::U16(n as u16),
        TypeTag::U32 => Value::U32(n as u32),
        TypeTag::U64 => Value::U64(n as u64),
        TypeTag::I8 => Value::I8(n as i8),
        TypeTag::I16 => Value::I16(n as i16),
        TypeTag::I32 => Value::I32(n as i32),
        TypeTag::I64 => Value::I64(n as i64),
        TypeTag::F32 => Value::F32(n as f32),
        TypeTag::F64 => Value::F64(n as f64),
        TypeTag::Bit => Value::Bit(n != 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn representative(tag: TypeTag) -> Vec<Value> {
        match tag {
            TypeTag::U8 => vec![Value::U8(0), Value::U8(u8::MAX)],
            TypeTag::U16 => vec![Value::U16(0), Value::U16(u16::MAX)],
            TypeTag::U32 => vec![Value::U32(0), Value::U32(u32::MAX)],
            TypeTag::U64 => vec![Value::U64(0), Value::U64(u64::MAX)],
            TypeTag::I8 => vec![Value::I8(0), Value::I8(i8::MIN), Value::I8(i8::MAX)],
            TypeTag::I16 => vec![Value::I16(0), Value::I16(i16::MIN), Value::I16(i16::MAX)],
            TypeTag::I32 => vec![Value::I32(0), Value::I32(i32::MIN), Value::I32(i32::MAX)],
            TypeTag::I64 => vec![Value::I64(0), Value::I64(i64::MIN), Value::I64(i64::MAX)],
            TypeTag::F32 => vec![
                Value::F32(0.0),
                Value::F32(f32::MIN),
                Value::F32(f32::MAX),
                Value::F32(-12.375),
            ],
            TypeTag::F64 => vec![
                Value::F64(0.0),
                Value::F64(f64::MIN),
                Value::F64(f64::MAX),
                Value::F64(0.1),
            ],
            TypeTag::Bit => vec![Value::Bit(false), Value::Bit(true)],
        }
    }

    #[test]
    fn decode_inverts_encode() {
        for codec in [Codec::new(Endianness::Little), Codec::new(Endianness::Big)] {
            for tag in TypeTag::ALL {
                for v in representative(tag) {
                    let bytes = codec.encode(tag, &v).unwrap();
                    assert_eq!(bytes.len(), tag.size(), "{}", tag);
                    assert_eq!(codec.decode(tag, &bytes).unwrap(), v, "{} {:?}", tag, v);
                }
            }
        }
    }

    #[test]
    fn byte_order() {
        let le = Codec::default().encode(TypeTag::U32, &Value::U32(0x0102_0304)).unwrap();
        let be = Codec::new(Endianness::Big)
            .encode(TypeTag::U32, &Value::U32(0x0102_0304))
            .unwrap();
        assert_eq!(le, vec![4, 3, 2, 1]);
        assert_eq!(be, vec![1, 2, 3, 4]);
    }

    #[test]
    fn integral_coercion_rounds_to_nearest() {
        let codec = Codec::default();
        assert_eq!(codec.coerce(TypeTag::U8, &Value::F64(2.6)).unwrap(), Value::U8(3));
        assert_eq!(codec.coerce(TypeTag::I16, &Value::F64(-2.5)).unwrap(), Value::I16(-3));
        assert_eq!(codec.coerce(TypeTag::U32, &Value::I8(7)).unwrap(), Value::U32(7));
    }

    #[test]
    fn integral_coercion_rejects_out_of_range() {
        let codec = Codec::default();
        assert!(matches!(
            codec.coerce(TypeTag::U8, &Value::U16(256)),
            Err(Error::ValueOutOfRange { .. })
        ));
        assert!(codec.coerce(TypeTag::U16, &Value::I32(-1)).is_err());
        assert!(codec.coerce(TypeTag::I64, &Value::F64(f64::NAN)).is_err());
        assert!(codec.coerce(TypeTag::U64, &Value::F64(1e30)).is_err());
    }

    #[test]
    fn float_coercion_keeps_fraction() {
        let codec = Codec::default();
        assert_eq!(codec.coerce(TypeTag::F64, &Value::I32(3)).unwrap(), Value::F64(3.0));
        assert_eq!(codec.coerce(TypeTag::F32, &Value::F64(0.5)).unwrap(), Value::F32(0.5));
    }

    #[test]
    fn bit_coercion_clamps() {
        let codec = Codec::default();
        assert_eq!(codec.coerce(TypeTag::Bit, &Value::I32(5)).unwrap(), Value::Bit(true));
        assert_eq!(codec.coerce(TypeTag::Bit, &Value::I32(-5)).unwrap(), Value::Bit(false));
        assert_eq!(codec.coerce(TypeTag::Bit, &Value::F64(0.2)).unwrap(), Value::Bit(false));
        assert_eq!(codec.coerce(TypeTag::Bit, &Value::F64(7.0)).unwrap(), Value::Bit(true));
        assert_eq!(codec.coerce(TypeTag::Bit, &Value::F64(0.6)).unwrap(), Value::Bit(false));
        assert_eq!(codec.coerce(TypeTag::Bit, &Value::F64(1.9)).unwrap(), Value::Bit(true));
        assert_eq!(codec.coerce(TypeTag::Bit, &Value::F32(-0.9)).unwrap(), Value::Bit(false));
    }

    #[test]
    fn decode_wrong_length() {
        assert!(matches!(
            Codec::default().decode(TypeTag::U32, &[1, 2]),
            Err(Error::ShortBuffer { expected: 4, actual: 2 })
        ));
    }
}
