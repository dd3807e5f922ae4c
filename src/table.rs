//! Named register table: a declarative list of register specs resolved once into a
//! name → [`BufferedAccessor`] map over a shared device port.
//!
//! Every register is buffered with the same delay so a value written through the table
//! reads back immediately even though the device only refreshes its image later.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use log::debug;

use crate::accessor::{AccessMode, VariableAccessor};
use crate::buffered::{BufferedAccessor, Clock};
use crate::codec::{Codec, Endianness};
use crate::descriptor::{check_overlaps, VarIndex, VariableDescriptor};
use crate::error::{Error, Result};
use crate::layout::Layout;
use crate::port::DeviceAccessPort;
use crate::types::TypeTag;
use crate::value::Value;

/// One register of a device map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSpec {
    pub name: String,
    pub byte_index: u32,
    pub bit_index: Option<u8>,
    pub type_tag: TypeTag,
    pub mode: AccessMode,
}

impl RegisterSpec {
    pub fn new(
        name: impl Into<String>,
        byte_index: u32,
        type_tag: TypeTag,
        mode: AccessMode,
    ) -> Self {
        RegisterSpec {
            name: name.into(),
            byte_index,
            bit_index: None,
            type_tag,
            mode,
        }
    }

    pub fn bit(name: impl Into<String>, byte_index: u32, bit_index: u8, mode: AccessMode) -> Self {
        RegisterSpec {
            name: name.into(),
            byte_index,
            bit_index: Some(bit_index),
            type_tag: TypeTag::Bit,
            mode,
        }
    }

    fn index(&self) -> VarIndex {
        VarIndex {
            byte_index: self.byte_index,
            bit_index: self.bit_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// How long a written value is served from the buffer.
    pub delay: Duration,
    pub endianness: Endianness,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            delay: Duration::from_secs(1),
            endianness: Endianness::Little,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameClash {
    Reject,
    KeepFirst,
}

#[derive(Debug)]
pub struct RegisterTable<P> {
    port: P,
    registers: Vec<BufferedAccessor<P>>,
    by_name: HashMap<String, usize>,
}

impl<P: DeviceAccessPort + Clone> RegisterTable<P> {
    /// Build a table from explicit register specs.
    ///
    /// Fails on duplicate names, bit indices that do not match the type, and registers
    /// whose storage overlaps.
    pub fn new<I>(specs: I, port: P, options: TableOptions) -> Result<Self>
    where
        I: IntoIterator<Item = RegisterSpec>,
    {
        let mut descriptors = Vec::new();
        let mut modes = Vec::new();
        for spec in specs {
            let index = spec.index();
            descriptors.push(VariableDescriptor::try_new(spec.name, index, spec.type_tag)?);
            modes.push(spec.mode);
        }
        check_overlaps(&descriptors)?;
        let table = Self::build(descriptors, modes, port, options, NameClash::Reject)?;
        debug!(
            "register table: {} register(s), {} byte(s)",
            table.len(),
            table.data_size()
        );
        Ok(table)
    }

    /// One register per layout declaration, addressable by number and by name.
    ///
    /// Unnamed declarations get the name `#<number>`. Names are display text here: every
    /// declaration is reachable by number, and when several share a name, lookup by name
    /// finds the first. Storage overlap is allowed: a scalar following a bit field shares
    /// that field's byte.
    pub fn from_layout(
        layout: &Layout,
        port: P,
        mode: AccessMode,
        options: TableOptions,
    ) -> Result<Self> {
        let descriptors: Vec<VariableDescriptor> = layout
            .iter()
            .enumerate()
            .map(|(number, d)| {
                if d.name().is_empty() {
                    VariableDescriptor::new(format!("#{}", number), d.index(), d.type_tag())
                } else {
                    d.clone()
                }
            })
            .collect();
        let modes = vec![mode; descriptors.len()];
        let table = Self::build(descriptors, modes, port, options, NameClash::KeepFirst)?;
        debug!(
            "register table from layout: {} register(s), {} named",
            table.len(),
            table.by_name.len()
        );
        Ok(table)
    }

    fn build(
        descriptors: Vec<VariableDescriptor>,
        modes: Vec<AccessMode>,
        port: P,
        options: TableOptions,
        clash: NameClash,
    ) -> Result<Self> {
        let codec = Codec::new(options.endianness);
        let mut by_name = HashMap::new();
        let mut registers = Vec::with_capacity(descriptors.len());
        for (number, (d, mode)) in descriptors.into_iter().zip(modes).enumerate() {
            match by_name.entry(d.name().to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(number);
                }
                Entry::Occupied(_) if clash == NameClash::KeepFirst => {
                    debug!("register {} ({}) shadowed by an earlier name", number, d.name());
                }
                Entry::Occupied(_) => return Err(Error::DuplicateName(d.name().to_string())),
            }
            let inner = VariableAccessor::new(d, port.clone(), mode).with_codec(codec);
            registers.push(BufferedAccessor::new(inner, options.delay));
        }
        Ok(RegisterTable {
            port,
            registers,
            by_name,
        })
    }

    /// Use `clock` for buffer expiry in every register.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.registers = self
            .registers
            .into_iter()
            .map(|r| r.with_clock(clock.clone()))
            .collect();
        self
    }

    fn number_of(&self, name: &str) -> Result<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnknownName(name.to_string()))
    }

    fn check_number(&self, number: usize) -> Result<()> {
        if number >= self.registers.len() {
            return Err(Error::IndexOutOfRange {
                position: number,
                len: self.registers.len(),
            });
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Value> {
        let number = self.number_of(name)?;
        self.registers[number].get()
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let number = self.number_of(name)?;
        self.registers[number].set(value)
    }

    pub fn read(&self, number: usize) -> Result<Value> {
        self.check_number(number)?;
        self.registers[number].get()
    }

    pub fn write(&mut self, number: usize, value: Value) -> Result<()> {
        self.check_number(number)?;
        self.registers[number].set(value)
    }

    pub fn register(&self, name: &str) -> Option<&BufferedAccessor<P>> {
        let number = *self.by_name.get(name)?;
        self.registers.get(number)
    }

    pub fn register_mut(&mut self, name: &str) -> Option<&mut BufferedAccessor<P>> {
        let number = *self.by_name.get(name)?;
        self.registers.get_mut(number)
    }

    /// Registers in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, BufferedAccessor<P>> {
        self.registers.iter()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Bytes of device image the table addresses: one past the highest byte any register uses.
    pub fn data_size(&self) -> usize {
        self.registers
            .iter()
            .map(|r| r.descriptor().end())
            .max()
            .unwrap_or(0)
    }

    pub fn connected(&self) -> bool {
        self.port.is_connected()
    }

    /// Drop every buffered value; call after the device reconnects.
    pub fn reset(&mut self) {
        for r in &mut self.registers {
            r.reset();
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }
}
