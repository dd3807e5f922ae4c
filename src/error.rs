//! Error taxonomy shared by every layer of the crate.

use std::time::Duration;

use crate::descriptor::VarIndex;
use crate::types::TypeTag;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown type: {0:?}")]
    UnknownType(String),
    #[error("Out of order declaration: expected index {expected}, found {found}")]
    OutOfOrderDeclaration { expected: usize, found: usize },
    #[error("Declaration {0} has no type")]
    MissingType(usize),
    #[error("Parse: {0}")]
    Parse(String),
    #[error("Index {position} out of range (len {len})")]
    IndexOutOfRange { position: usize, len: usize },
    #[error("Invalid bit index {bit_index:?} at byte {byte_index}")]
    InvalidBitIndex { byte_index: u32, bit_index: Option<u8> },
    #[error("Duplicate variable name: {0}")]
    DuplicateName(String),
    #[error("Unknown variable name: {0}")]
    UnknownName(String),
    #[error("Overlapping storage: {first} and {second}")]
    OverlappingStorage { first: String, second: String },
    #[error("Permission denied: write to read-only variable at {index}")]
    PermissionDenied { index: VarIndex },
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Address out of range: {length} byte(s) at {byte_index} (image size {size})")]
    AddressOutOfRange { byte_index: u32, length: u32, size: usize },
    #[error("Value {value} out of range for {type_tag}")]
    ValueOutOfRange { value: String, type_tag: TypeTag },
    #[error("Short buffer: expected {expected} byte(s), got {actual}")]
    ShortBuffer { expected: usize, actual: usize },
    #[error("guaranteed_set requires a zero buffer delay (delay is {delay:?})")]
    BufferedGuaranteedSet { delay: Duration },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors raised because the device connection is absent.
    pub fn is_device_unavailable(&self) -> bool {
        matches!(self, Error::DeviceUnavailable(_))
    }
}
