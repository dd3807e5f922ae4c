//! Layout tests: offset derivation from declaration lists and cascading re-placement.

use netvar::{
    build_layout, Declaration, Error, RegisterImage, TypeRegistry, TypeTag, VarIndex,
    VariableRepository,
};
use netvar::TypeTag::*;

fn declarations(types: &[TypeTag]) -> Vec<Declaration> {
    types
        .iter()
        .enumerate()
        .map(|(i, &t)| Declaration::new(i, format!("v{}", i), t))
        .collect()
}

fn indices(types: &[TypeTag]) -> Vec<VarIndex> {
    build_layout(&declarations(types))
        .expect("layout")
        .iter()
        .map(|d| d.index())
        .collect()
}

#[test]
fn test_layout_is_deterministic() {
    let decls = declarations(&[U8, Bit, Bit, F64, I16, Bit, U64, F32]);
    let first = build_layout(&decls).expect("layout");
    for _ in 0..5 {
        assert_eq!(build_layout(&decls).expect("layout"), first);
    }
}

#[test]
fn test_nine_bits_wrap_into_next_byte() {
    let layout = build_layout(&declarations(&[Bit; 9])).expect("layout");
    let bytes: Vec<u32> = layout.iter().map(|d| d.byte_index()).collect();
    let bits: Vec<u8> = layout.iter().map(|d| d.bit_index().expect("bit")).collect();
    assert_eq!(bytes, vec![0, 0, 0, 0, 0, 0, 0, 0, 1]);
    assert_eq!(bits, vec![0, 1, 2, 3, 4, 5, 6, 7, 0]);
}

#[test]
fn test_scalar_after_bit_shares_byte() {
    let idx = indices(&[U32, U8, Bit, Bit, Bit, Bit, U32]);
    assert_eq!(idx[5], VarIndex::bit(5, 3));
    assert_eq!(idx[6], VarIndex::byte(5));
}

#[test]
fn test_bit_after_scalar_starts_new_byte() {
    let idx = indices(&[U16, Bit, U8, Bit]);
    assert_eq!(
        idx,
        vec![
            VarIndex::byte(0),
            VarIndex::bit(2, 0),
            VarIndex::byte(2),
            VarIndex::bit(3, 0),
        ]
    );
}

#[test]
fn test_cascading_replace() {
    let image = RegisterImage::shared(16);
    let mut repo = VariableRepository::from_types(image, [U8, U8, Bit, Bit, U32, U8]);
    let before: Vec<String> = repo.descriptors().iter().map(|d| d.index().to_string()).collect();
    assert_eq!(before, vec!["0", "1", "2-0", "2-1", "2", "6"]);
    let size_before: usize = repo.descriptors().iter().map(|d| d.size_bytes()).sum();

    repo.replace(2, U16).expect("replace");

    let after: Vec<String> = repo.descriptors().iter().map(|d| d.index().to_string()).collect();
    assert_eq!(after, vec!["0", "1", "2", "4-0", "4", "8"]);
    let size_after: usize = repo.descriptors().iter().map(|d| d.size_bytes()).sum();
    assert_eq!(size_after, size_before + 1);
    assert_eq!(repo.image_size(), 9);

    // Positions before the replaced one keep their placement.
    assert_eq!(repo.descriptors()[0].index(), VarIndex::byte(0));
    assert_eq!(repo.descriptors()[1].index(), VarIndex::byte(1));
}

#[test]
fn test_unknown_type_leaves_repository_untouched() {
    let image = RegisterImage::shared(8);
    let mut repo = VariableRepository::from_types(image, [U8, Bit]);
    let before = repo.descriptors().to_vec();

    let result = TypeRegistry::size_of_name("nonexistent");
    assert!(matches!(result, Err(Error::UnknownType(ref n)) if n == "nonexistent"));
    let result = TypeRegistry::lookup("nonexistent").and_then(|tag| repo.replace(1, tag));
    assert!(result.is_err());

    assert_eq!(repo.descriptors(), &before[..]);
}

#[test]
fn test_pop_back_keeps_earlier_offsets() {
    let image = RegisterImage::shared(32);
    let mut repo = VariableRepository::from_types(image, [U16, Bit, F64, I8]);
    let prefix = repo.descriptors()[..2].to_vec();
    repo.pop_back(2);
    assert_eq!(repo.descriptors(), &prefix[..]);
    assert_eq!(repo.append(U32), VarIndex::byte(2));
}
