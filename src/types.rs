//! Type registry: symbolic type names, wire sizes and codec kinds.
//!
//! Every [`TypeTag`] maps to exactly one byte size and one [`CodecKind`]. The `bit` type
//! lives in a one-byte container but occupies a single bit position of that byte.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Symbolic type of a network variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bit,
}

/// How values of a type are laid out in the register image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecKind {
    Unsigned { width: usize },
    Signed { width: usize },
    Float { width: usize },
    Bit,
}

impl TypeTag {
    pub const ALL: [TypeTag; 11] = [
        TypeTag::U8,
        TypeTag::U16,
        TypeTag::U32,
        TypeTag::U64,
        TypeTag::I8,
        TypeTag::I16,
        TypeTag::I32,
        TypeTag::I64,
        TypeTag::F32,
        TypeTag::F64,
        TypeTag::Bit,
    ];

    /// Canonical short name (`u8`, `f64`, `bit`, ...).
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::U8 => "u8",
            TypeTag::U16 => "u16",
            TypeTag::U32 => "u32",
            TypeTag::U64 => "u64",
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::Bit => "bit",
        }
    }

    pub fn size(self) -> usize {
        TypeRegistry::size_of(self)
    }

    pub fn codec(self) -> CodecKind {
        TypeRegistry::codec_of(self)
    }

    pub fn is_bit(self) -> bool {
        self == TypeTag::Bit
    }

    pub fn is_float(self) -> bool {
        matches!(self, TypeTag::F32 | TypeTag::F64)
    }

    pub fn is_integral(self) -> bool {
        !self.is_bit() && !self.is_float()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for TypeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TypeRegistry::lookup(s)
    }
}

/// Static mapping from type names and tags to sizes and codecs.
///
/// Besides the canonical names, the aliases found in existing variable files are accepted:
/// `float` (f32), `double` (f64) and `bool` (a byte-wide flag stored as u8).
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeRegistry;

impl TypeRegistry {
    /// Resolve a symbolic type name. Unknown names are an error, never a default.
    pub fn lookup(name: &str) -> Result<TypeTag> {
        let tag = match name {
            "u8" => TypeTag::U8,
            "u16" => TypeTag::U16,
            "u32" => TypeTag::U32,
            "u64" => TypeTag::U64,
            "i8" => TypeTag::I8,
            "i16" => TypeTag::I16,
            "i32" => TypeTag::I32,
            "i64" => TypeTag::I64,
            "f32" | "float" => TypeTag::F32,
            "f64" | "double" => TypeTag::F64,
            "bit" => TypeTag::Bit,
            "bool" => TypeTag::U8,
            _ => return Err(Error::UnknownType(name.to_string())),
        };
        Ok(tag)
    }

    /// Size in bytes of the storage a type occupies (the containing byte for `bit`).
    pub fn size_of(tag: TypeTag) -> usize {
        match tag.codec() {
            CodecKind::Unsigned { width }
            | CodecKind::Signed { width }
            | CodecKind::Float { width } => width,
            CodecKind::Bit => 1,
        }
    }

    pub fn size_of_name(name: &str) -> Result<usize> {
        Self::lookup(name).map(Self::size_of)
    }

    pub fn codec_of(tag: TypeTag) -> CodecKind {
        match tag {
            TypeTag::U8 => CodecKind::Unsigned { width: 1 },
            TypeTag::U16 => CodecKind::Unsigned { width: 2 },
            TypeTag::U32 => CodecKind::Unsigned { width: 4 },
            TypeTag::U64 => CodecKind::Unsigned { width: 8 },
            TypeTag::I8 => CodecKind::Signed { width: 1 },
            TypeTag::I16 => CodecKind::Signed { width: 2 },
            TypeTag::I32 => CodecKind::Signed { width: 4 },
            TypeTag::I64 => CodecKind::Signed { width: 8 },
            TypeTag::F32 => CodecKind::Float { width: 4 },
            TypeTag::F64 => CodecKind::Float { width: 8 },
            TypeTag::Bit => CodecKind::Bit,
        }
    }

    pub fn codec_of_name(name: &str) -> Result<CodecKind> {
        Self::lookup(name).map(Self::codec_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_match_widths() {
        let sizes: Vec<usize> = TypeTag::ALL.iter().map(|t| t.size()).collect();
        assert_eq!(sizes, vec![1, 2, 4, 8, 1, 2, 4, 8, 4, 8, 1]);
    }

    #[test]
    fn canonical_names_round_trip() {
        for tag in TypeTag::ALL {
            assert_eq!(tag.name().parse::<TypeTag>().unwrap(), tag);
        }
    }

    #[test]
    fn aliases() {
        assert_eq!(TypeRegistry::lookup("double").unwrap(), TypeTag::F64);
        assert_eq!(TypeRegistry::lookup("float").unwrap(), TypeTag::F32);
        assert_eq!(TypeRegistry::lookup("bool").unwrap(), TypeTag::U8);
    }

    #[test]
    fn unknown_type_is_an_error() {
        match TypeRegistry::size_of_name("nonexistent") {
            Err(Error::UnknownType(name)) => assert_eq!(name, "nonexistent"),
            other => panic!("expected UnknownType, got {:?}", other),
        }
        assert!(TypeRegistry::lookup("long double").is_err());
        assert!(TypeRegistry::lookup("U8").is_err());
    }
}
