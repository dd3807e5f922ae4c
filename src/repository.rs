//! Variable repository: a dynamic, ordered list of variables over one device port.
//!
//! Used where the variable list is edited at run time (the register table view of a
//! calibrator): appending, retyping and dropping variables re-places everything after the
//! edited position via [`crate::allocator`]. Entries are anonymous and addressed by
//! position; each is named `#<position>` for display.

use log::debug;

use crate::accessor::{AccessMode, VariableAccessor};
use crate::allocator;
use crate::codec::Codec;
use crate::descriptor::{VarIndex, VariableDescriptor};
use crate::error::{Error, Result};
use crate::port::DeviceAccessPort;
use crate::types::TypeTag;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct VariableRepository<P> {
    port: P,
    codec: Codec,
    descriptors: Vec<VariableDescriptor>,
    vars: Vec<VariableAccessor<P>>,
}

impl<P: DeviceAccessPort + Clone> VariableRepository<P> {
    pub fn new(port: P) -> Self {
        VariableRepository {
            port,
            codec: Codec::default(),
            descriptors: Vec::new(),
            vars: Vec::new(),
        }
    }

    /// Build a repository holding `types` in order.
    pub fn from_types<I>(port: P, types: I) -> Self
    where
        I: IntoIterator<Item = TypeTag>,
    {
        let mut repo = VariableRepository::new(port);
        for tag in types {
            repo.append(tag);
        }
        repo
    }

    /// Codec used by every variable, current and future.
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self.vars = self
            .vars
            .into_iter()
            .map(|v| v.with_codec(codec))
            .collect();
        self
    }

    fn accessor(&self, position: usize) -> VariableAccessor<P> {
        VariableAccessor::new(
            self.descriptors[position].clone(),
            self.port.clone(),
            AccessMode::ReadWrite,
        )
        .with_codec(self.codec)
    }

    fn check_position(&self, position: usize) -> Result<()> {
        if position >= self.vars.len() {
            return Err(Error::IndexOutOfRange {
                position,
                len: self.vars.len(),
            });
        }
        Ok(())
    }

    /// Add a variable after the last one; returns its placement.
    pub fn append(&mut self, tag: TypeTag) -> VarIndex {
        let position = self.descriptors.len();
        let index = allocator::append(&mut self.descriptors, format!("#{}", position), tag);
        self.vars.push(self.accessor(position));
        debug!("repository: appended {} at {}", tag, index);
        index
    }

    /// Change the type at `position`; every later variable is re-placed.
    pub fn replace(&mut self, position: usize, tag: TypeTag) -> Result<()> {
        self.check_position(position)?;
        allocator::replace(&mut self.descriptors, position, tag)?;
        self.vars[position] = self.accessor(position);
        for (var, d) in self.vars[position + 1..]
            .iter_mut()
            .zip(&self.descriptors[position + 1..])
        {
            var.set_index(d.index());
        }
        Ok(())
    }

    /// Drop the last `count` variables (all of them if fewer remain).
    pub fn pop_back(&mut self, count: usize) {
        allocator::pop_back(&mut self.descriptors, count);
        self.vars.truncate(self.descriptors.len());
        debug!("repository: popped to {} variable(s)", self.vars.len());
    }

    pub fn clear(&mut self) {
        self.descriptors.clear();
        self.vars.clear();
    }

    pub fn get(&self, position: usize) -> Option<&VariableAccessor<P>> {
        self.vars.get(position)
    }

    pub fn get_mut(&mut self, position: usize) -> Option<&mut VariableAccessor<P>> {
        self.vars.get_mut(position)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariableAccessor<P>> {
        self.vars.iter()
    }

    pub fn descriptors(&self) -> &[VariableDescriptor] {
        &self.descriptors
    }

    /// The ordered type list; enough to rebuild the repository with [`Self::from_types`].
    pub fn types(&self) -> Vec<TypeTag> {
        self.descriptors.iter().map(|d| d.type_tag()).collect()
    }

    pub fn image_size(&self) -> usize {
        self.descriptors.last().map_or(0, VariableDescriptor::end)
    }

    pub fn read(&self, position: usize) -> Result<Value> {
        self.check_position(position)?;
        self.vars[position].get()
    }

    pub fn write(&mut self, position: usize, value: Value) -> Result<()> {
        self.check_position(position)?;
        self.vars[position].set(value)
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}
