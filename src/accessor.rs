//! Variable accessor: typed get/set of one variable through a device port.

use log::{trace, warn};

use crate::codec::Codec;
use crate::descriptor::{VarIndex, VariableDescriptor};
use crate::error::{Error, Result};
use crate::port::DeviceAccessPort;
use crate::types::TypeTag;
use crate::value::Value;

/// Whether a variable may be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    ReadOnly,
    #[default]
    ReadWrite,
}

impl AccessMode {
    pub fn is_writable(self) -> bool {
        self == AccessMode::ReadWrite
    }
}

/// Common interface of plain and buffered variables.
pub trait NetVar {
    fn get(&self) -> Result<Value>;
    fn set(&mut self, value: Value) -> Result<()>;
    fn descriptor(&self) -> &VariableDescriptor;
    fn mode(&self) -> AccessMode;
    fn set_index(&mut self, index: VarIndex);

    fn name(&self) -> &str {
        self.descriptor().name()
    }

    fn type_tag(&self) -> TypeTag {
        self.descriptor().type_tag()
    }

    fn index(&self) -> VarIndex {
        self.descriptor().index()
    }
}

/// Binds one descriptor to one port; holds no cached state.
#[derive(Debug, Clone)]
pub struct VariableAccessor<P> {
    descriptor: VariableDescriptor,
    port: P,
    mode: AccessMode,
    codec: Codec,
}

fn log_device_error<T>(result: Result<T>, descriptor: &VariableDescriptor) -> Result<T> {
    if let Err(e) = &result {
        if e.is_device_unavailable() {
            warn!("{}: {}", descriptor, e);
        }
    }
    result
}

impl<P: DeviceAccessPort> VariableAccessor<P> {
    pub fn new(descriptor: VariableDescriptor, port: P, mode: AccessMode) -> Self {
        VariableAccessor {
            descriptor,
            port,
            mode,
            codec: Codec::default(),
        }
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    /// Read the variable from the device.
    pub fn get(&self) -> Result<Value> {
        let d = &self.descriptor;
        let result = match d.bit_index() {
            Some(bit) => self.port.read_bit(d.byte_index(), bit).map(Value::Bit),
            None => self
                .port
                .read_bytes(d.byte_index(), d.size_bytes() as u32)
                .and_then(|bytes| self.codec.decode(d.type_tag(), &bytes)),
        };
        let value = log_device_error(result, d)?;
        trace!("get {} -> {}", d, value);
        Ok(value)
    }

    /// Coerce `value` to the variable type and write it to the device.
    ///
    /// Returns the value as actually written (rounded / clamped).
    pub fn write(&mut self, value: Value) -> Result<Value> {
        let d = &self.descriptor;
        if !self.mode.is_writable() {
            return Err(Error::PermissionDenied { index: d.index() });
        }
        let coerced = self.codec.coerce(d.type_tag(), &value)?;
        let result = match d.bit_index() {
            Some(bit) => self.port.write_bit(d.byte_index(), bit, coerced.as_bool()),
            None => {
                let bytes = self.codec.encode(d.type_tag(), &coerced)?;
                self.port.write_bytes(d.byte_index(), &bytes)
            }
        };
        log_device_error(result, d)?;
        trace!("set {} <- {}", d, coerced);
        Ok(coerced)
    }

    pub fn set(&mut self, value: Value) -> Result<()> {
        self.write(value).map(|_| ())
    }

    pub fn descriptor(&self) -> &VariableDescriptor {
        &self.descriptor
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn set_index(&mut self, index: VarIndex) {
        self.descriptor.set_index(index);
    }
}

impl<P: DeviceAccessPort> NetVar for VariableAccessor<P> {
    fn get(&self) -> Result<Value> {
        VariableAccessor::get(self)
    }

    fn set(&mut self, value: Value) -> Result<()> {
        VariableAccessor::set(self, value)
    }

    fn descriptor(&self) -> &VariableDescriptor {
        &self.descriptor
    }

    fn mode(&self) -> AccessMode {
        self.mode
    }

    fn set_index(&mut self, index: VarIndex) {
        VariableAccessor::set_index(self, index)
    }
}
