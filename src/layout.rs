//! Layout builder: resolve byte/bit offsets from sequential declarations.
//!
//! Declarations carry only a sequence number, a name and a type. Offsets are derived by
//! placing each declaration after the previous one (see [`crate::allocator`] for the
//! transition rules), so the builder is a pure function of its input.

use log::debug;

use crate::allocator;
use crate::descriptor::VariableDescriptor;
use crate::error::{Error, Result};
use crate::types::TypeTag;

/// One `(sequence number, name, type)` entry of a variable declaration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub number: usize,
    pub name: String,
    pub type_tag: TypeTag,
}

impl Declaration {
    pub fn new(number: usize, name: impl Into<String>, type_tag: TypeTag) -> Self {
        Declaration {
            number,
            name: name.into(),
            type_tag,
        }
    }
}

/// Fully resolved variable layout in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    descriptors: Vec<VariableDescriptor>,
}

impl Layout {
    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    pub fn into_descriptors(self) -> Vec<VariableDescriptor> {
        self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Descriptor by declaration number.
    pub fn get(&self, number: usize) -> Option<&VariableDescriptor> {
        self.descriptors.get(number)
    }

    /// First descriptor with the given name.
    pub fn find(&self, name: &str) -> Option<(usize, &VariableDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .find(|(_, d)| d.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariableDescriptor> {
        self.descriptors.iter()
    }

    /// Bytes spanned by the image: end of the last declared variable.
    pub fn image_size(&self) -> usize {
        self.descriptors.last().map_or(0, VariableDescriptor::end)
    }
}

impl<'a> IntoIterator for &'a Layout {
    type Item = &'a VariableDescriptor;
    type IntoIter = std::slice::Iter<'a, VariableDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

/// Incremental builder; `build_layout` is the one-shot form.
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    descriptors: Vec<VariableDescriptor>,
}

impl LayoutBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place the next declaration. Its number must equal the count built so far.
    pub fn push(&mut self, decl: &Declaration) -> Result<&VariableDescriptor> {
        let expected = self.descriptors.len();
        if decl.number != expected {
            return Err(Error::OutOfOrderDeclaration {
                expected,
                found: decl.number,
            });
        }
        allocator::append(&mut self.descriptors, decl.name.clone(), decl.type_tag);
        Ok(&self.descriptors[expected])
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn finish(self) -> Layout {
        Layout {
            descriptors: self.descriptors,
        }
    }
}

/// Resolve offsets for an ordered declaration list.
pub fn build_layout<'a, I>(declarations: I) -> Result<Layout>
where
    I: IntoIterator<Item = &'a Declaration>,
{
    let mut builder = LayoutBuilder::new();
    for decl in declarations {
        builder.push(decl)?;
    }
    let layout = builder.finish();
    debug!(
        "built layout of {} variable(s), image size {} byte(s)",
        layout.len(),
        layout.image_size()
    );
    Ok(layout)
}
