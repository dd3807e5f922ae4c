//! Resolved placement of a variable inside the register image.

use std::fmt;

use crate::error::{Error, Result};
use crate::types::TypeTag;

/// Byte offset plus, for bit variables, the bit position inside that byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VarIndex {
    pub byte_index: u32,
    pub bit_index: Option<u8>,
}

impl VarIndex {
    pub fn byte(byte_index: u32) -> Self {
        VarIndex {
            byte_index,
            bit_index: None,
        }
    }

    pub fn bit(byte_index: u32, bit_index: u8) -> Self {
        VarIndex {
            byte_index,
            bit_index: Some(bit_index),
        }
    }
}

impl fmt::Display for VarIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bit_index {
            Some(bit) => write!(f, "{}-{}", self.byte_index, bit),
            None => write!(f, "{}", self.byte_index),
        }
    }
}

/// One named variable: where it lives and how it is typed.
///
/// For `bit` variables `index.bit_index` is always `Some(0..8)`; for every other type it is
/// `None`. Name and type are fixed at construction; only the index can be recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDescriptor {
    name: String,
    index: VarIndex,
    type_tag: TypeTag,
}

fn valid_index(index: VarIndex, type_tag: TypeTag) -> bool {
    match (type_tag.is_bit(), index.bit_index) {
        (true, Some(bit)) => bit < 8,
        (false, None) => true,
        _ => false,
    }
}

impl VariableDescriptor {
    /// # Panics
    ///
    /// Panics if the bit index does not match the type (see [`VariableDescriptor::try_new`]).
    pub fn new(name: impl Into<String>, index: VarIndex, type_tag: TypeTag) -> Self {
        assert!(
            valid_index(index, type_tag),
            "invalid index {:?} for {} variable",
            index,
            type_tag
        );
        VariableDescriptor {
            name: name.into(),
            index,
            type_tag,
        }
    }

    pub fn try_new(name: impl Into<String>, index: VarIndex, type_tag: TypeTag) -> Result<Self> {
        if !valid_index(index, type_tag) {
            return Err(Error::InvalidBitIndex {
                byte_index: index.byte_index,
                bit_index: index.bit_index,
            });
        }
        Ok(VariableDescriptor {
            name: name.into(),
            index,
            type_tag,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> VarIndex {
        self.index
    }

    pub fn byte_index(&self) -> u32 {
        self.index.byte_index
    }

    pub fn bit_index(&self) -> Option<u8> {
        self.index.bit_index
    }

    pub fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    pub fn size_bytes(&self) -> usize {
        self.type_tag.size()
    }

    /// First byte past this variable's storage.
    pub fn end(&self) -> usize {
        self.index.byte_index as usize + self.size_bytes()
    }

    pub fn is_bit(&self) -> bool {
        self.type_tag.is_bit()
    }

    /// # Panics
    ///
    /// Panics if the index does not match the type.
    pub fn set_index(&mut self, index: VarIndex) {
        assert!(
            valid_index(index, self.type_tag),
            "invalid index {:?} for {} variable",
            index,
            self.type_tag
        );
        self.index = index;
    }

    fn label(&self) -> String {
        if self.name.is_empty() {
            format!("{} {}", self.type_tag, self.index)
        } else {
            format!("{} ({} {})", self.name, self.type_tag, self.index)
        }
    }

    /// True if both descriptors claim at least one common storage bit.
    pub fn overlaps(&self, other: &VariableDescriptor) -> bool {
        if let (Some(a), Some(b)) = (self.bit_index(), other.bit_index()) {
            return self.byte_index() == other.byte_index() && a == b;
        }
        (self.byte_index() as usize) < other.end() && (other.byte_index() as usize) < self.end()
    }
}

impl fmt::Display for VariableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Fail with [`Error::OverlappingStorage`] on the first pair of descriptors sharing storage.
pub fn check_overlaps(descriptors: &[VariableDescriptor]) -> Result<()> {
    let mut sorted: Vec<&VariableDescriptor> = descriptors.iter().collect();
    sorted.sort_by_key(|d| (d.byte_index(), d.bit_index()));
    for (i, a) in sorted.iter().enumerate() {
        for b in &sorted[i + 1..] {
            if b.byte_index() as usize >= a.end() {
                break;
            }
            if a.overlaps(b) {
                return Err(Error::OverlappingStorage {
                    first: a.label(),
                    second: b.label(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_display() {
        assert_eq!(VarIndex::byte(12).to_string(), "12");
        assert_eq!(VarIndex::bit(5, 3).to_string(), "5-3");
    }

    #[test]
    fn try_new_validates_bit_index() {
        assert!(VariableDescriptor::try_new("a", VarIndex::bit(0, 7), TypeTag::Bit).is_ok());
        assert!(matches!(
            VariableDescriptor::try_new("a", VarIndex::bit(0, 8), TypeTag::Bit),
            Err(Error::InvalidBitIndex { byte_index: 0, bit_index: Some(8) })
        ));
        assert!(VariableDescriptor::try_new("a", VarIndex::byte(0), TypeTag::Bit).is_err());
        assert!(VariableDescriptor::try_new("a", VarIndex::bit(0, 1), TypeTag::U8).is_err());
    }

    #[test]
    #[should_panic]
    fn new_panics_on_bit_without_position() {
        VariableDescriptor::new("", VarIndex::byte(3), TypeTag::Bit);
    }

    #[test]
    fn bits_share_a_byte() {
        let descs = vec![
            VariableDescriptor::new("a", VarIndex::bit(69, 0), TypeTag::Bit),
            VariableDescriptor::new("b", VarIndex::bit(69, 1), TypeTag::Bit),
            VariableDescriptor::new("c", VarIndex::byte(70), TypeTag::F64),
        ];
        assert!(check_overlaps(&descs).is_ok());
    }

    #[test]
    fn overlap_detected() {
        let descs = vec![
            VariableDescriptor::new("wide", VarIndex::byte(20), TypeTag::U32),
            VariableDescriptor::new("flag", VarIndex::bit(22, 0), TypeTag::Bit),
        ];
        assert!(matches!(
            check_overlaps(&descs),
            Err(Error::OverlappingStorage { .. })
        ));
        let same_bit = vec![
            VariableDescriptor::new("x", VarIndex::bit(1, 4), TypeTag::Bit),
            VariableDescriptor::new("y", VarIndex::bit(1, 4), TypeTag::Bit),
        ];
        assert!(check_overlaps(&same_bit).is_err());
    }
}
