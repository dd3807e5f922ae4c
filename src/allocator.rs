//! Index allocator: incremental placement of variables in a dynamic list.
//!
//! Offsets are never stored in the source; each variable is placed relative to its
//! predecessor only:
//!
//! | previous | next    | placement                                              |
//! |----------|---------|--------------------------------------------------------|
//! | none     | any     | byte 0 (bit 0 for `bit`)                               |
//! | bit      | bit     | next bit of the same byte, wrapping to byte + 1 after 7 |
//! | non-bit  | bit     | byte + size, bit 0                                     |
//! | non-bit  | non-bit | byte + size                                            |
//! | bit      | non-bit | the same byte as the bit                               |
//!
//! The last row matches the register maps of existing firmware: a trailing bit field
//! does not reserve its byte for the next scalar. Changing it would shift every later
//! offset.

use log::debug;

use crate::descriptor::{VarIndex, VariableDescriptor};
use crate::error::{Error, Result};
use crate::types::TypeTag;

/// Placement of a variable of type `tag` directly after `previous`.
///
/// # Panics
///
/// Panics if the placement would start past `u32::MAX`, the limit of byte addressing in
/// the register image.
pub fn next_index(tag: TypeTag, previous: Option<&VariableDescriptor>) -> VarIndex {
    let prev = match previous {
        Some(p) => p,
        None if tag.is_bit() => return VarIndex::bit(0, 0),
        None => return VarIndex::byte(0),
    };
    let byte = prev.byte_index();
    match (prev.bit_index(), tag.is_bit()) {
        (Some(7), true) => VarIndex::bit(offset_after(prev, 1), 0),
        (Some(bit), true) => VarIndex::bit(byte, bit + 1),
        (None, true) => VarIndex::bit(offset_after(prev, prev.size_bytes()), 0),
        (None, false) => VarIndex::byte(offset_after(prev, prev.size_bytes())),
        (Some(_), false) => VarIndex::byte(byte),
    }
}

fn offset_after(prev: &VariableDescriptor, step: usize) -> u32 {
    u32::try_from(step)
        .ok()
        .and_then(|step| prev.byte_index().checked_add(step))
        .unwrap_or_else(|| panic!("byte offset after {} exceeds u32 addressing", prev))
}

/// Append a variable after the current last element and return its placement.
pub fn append(
    descriptors: &mut Vec<VariableDescriptor>,
    name: impl Into<String>,
    tag: TypeTag,
) -> VarIndex {
    let index = next_index(tag, descriptors.last());
    descriptors.push(VariableDescriptor::new(name, index, tag));
    index
}

fn check_position(descriptors: &[VariableDescriptor], position: usize) -> Result<()> {
    if position >= descriptors.len() {
        return Err(Error::IndexOutOfRange {
            position,
            len: descriptors.len(),
        });
    }
    Ok(())
}

/// Retype the variable at `position` (keeping its name), then re-place everything after it.
pub fn replace(descriptors: &mut [VariableDescriptor], position: usize, tag: TypeTag) -> Result<()> {
    check_position(descriptors, position)?;
    let name = descriptors[position].name().to_string();
    let index = next_index(tag, position.checked_sub(1).map(|p| &descriptors[p]));
    descriptors[position] = VariableDescriptor::new(name, index, tag);
    recompute_from(descriptors, position + 1)?;
    debug!(
        "replaced position {} with {} at {}; {} descriptor(s) re-placed",
        position,
        tag,
        index,
        descriptors.len() - position - 1
    );
    Ok(())
}

/// Re-place every descriptor from `position` on against its predecessor.
///
/// `position == len` is accepted and does nothing, so callers can cascade after the
/// last element.
pub fn recompute_from(descriptors: &mut [VariableDescriptor], position: usize) -> Result<()> {
    if position > descriptors.len() {
        return Err(Error::IndexOutOfRange {
            position,
            len: descriptors.len(),
        });
    }
    for i in position..descriptors.len() {
        let index = next_index(
            descriptors[i].type_tag(),
            i.checked_sub(1).map(|p| &descriptors[p]),
        );
        descriptors[i].set_index(index);
    }
    Ok(())
}

/// Drop the last `count` descriptors. Earlier placements are unaffected.
pub fn pop_back(descriptors: &mut Vec<VariableDescriptor>, count: usize) {
    let keep = descriptors.len().saturating_sub(count);
    descriptors.truncate(keep);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(types: &[TypeTag]) -> Vec<VariableDescriptor> {
        let mut out = Vec::new();
        for &t in types {
            append(&mut out, "", t);
        }
        out
    }

    fn indices(descs: &[VariableDescriptor]) -> Vec<String> {
        descs.iter().map(|d| d.index().to_string()).collect()
    }

    #[test]
    fn first_variable_starts_at_zero() {
        assert_eq!(next_index(TypeTag::U32, None), VarIndex::byte(0));
        assert_eq!(next_index(TypeTag::Bit, None), VarIndex::bit(0, 0));
    }

    #[test]
    fn transitions() {
        let bit = VariableDescriptor::new("", VarIndex::bit(5, 3), TypeTag::Bit);
        let last_bit = VariableDescriptor::new("", VarIndex::bit(5, 7), TypeTag::Bit);
        let word = VariableDescriptor::new("", VarIndex::byte(10), TypeTag::U16);
        assert_eq!(next_index(TypeTag::Bit, Some(&bit)), VarIndex::bit(5, 4));
        assert_eq!(next_index(TypeTag::Bit, Some(&last_bit)), VarIndex::bit(6, 0));
        assert_eq!(next_index(TypeTag::U32, Some(&bit)), VarIndex::byte(5));
        assert_eq!(next_index(TypeTag::Bit, Some(&word)), VarIndex::bit(12, 0));
        assert_eq!(next_index(TypeTag::F64, Some(&word)), VarIndex::byte(12));
    }

    #[test]
    fn last_addressable_byte() {
        let near_end = VariableDescriptor::new("", VarIndex::byte(u32::MAX - 4), TypeTag::U32);
        assert_eq!(next_index(TypeTag::U8, Some(&near_end)), VarIndex::byte(u32::MAX));
    }

    #[test]
    #[should_panic(expected = "exceeds u32 addressing")]
    fn offset_past_u32_panics() {
        let at_end = VariableDescriptor::new("", VarIndex::byte(u32::MAX - 1), TypeTag::U16);
        next_index(TypeTag::U8, Some(&at_end));
    }

    #[test]
    fn replace_cascades() {
        let mut descs = build(&[
            TypeTag::U8,
            TypeTag::U8,
            TypeTag::Bit,
            TypeTag::Bit,
            TypeTag::U32,
            TypeTag::U8,
        ]);
        assert_eq!(indices(&descs), ["0", "1", "2-0", "2-1", "2", "6"]);
        replace(&mut descs, 2, TypeTag::U16).unwrap();
        assert_eq!(indices(&descs), ["0", "1", "2", "4-0", "4", "8"]);
    }

    #[test]
    fn replace_first_keeps_name() {
        let mut descs = Vec::new();
        append(&mut descs, "mode", TypeTag::U8);
        append(&mut descs, "flag", TypeTag::Bit);
        replace(&mut descs, 0, TypeTag::U64).unwrap();
        assert_eq!(descs[0].name(), "mode");
        assert_eq!(descs[1].index(), VarIndex::bit(8, 0));
    }

    #[test]
    fn replace_out_of_range() {
        let mut descs = build(&[TypeTag::U8]);
        assert!(matches!(
            replace(&mut descs, 1, TypeTag::U8),
            Err(Error::IndexOutOfRange { position: 1, len: 1 })
        ));
        assert_eq!(descs[0].type_tag(), TypeTag::U8);
    }

    #[test]
    fn pop_back_truncates() {
        let mut descs = build(&[TypeTag::U8, TypeTag::U16, TypeTag::U32]);
        pop_back(&mut descs, 2);
        assert_eq!(descs.len(), 1);
        pop_back(&mut descs, 5);
        assert!(descs.is_empty());
    }
}
