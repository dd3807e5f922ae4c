//! # netvar: Network Variable Addressing and Access
//!
//! Maps a flat device register image (a byte array exposed by calibrator firmware over
//! USB, Modbus or TCP) onto typed, named program variables, including single-bit fields,
//! and keeps writes readable right away even though the device only exposes them after
//! its next refresh.
//!
//! ## Layers
//!
//! - **Types**: `u8`..`u64`, `i8`..`i64`, `f32`, `f64`, `bit` with fixed sizes
//! - **Layout**: offsets derived from an ordered declaration list (no offsets in the source)
//! - **Port**: raw byte/bit I/O against the device, injected by the caller
//! - **Accessors**: typed get/set of one variable, optionally buffered for a delay
//! - **Repository / table**: dynamic variable lists and named register maps
//!
//! ## Configuration format
//!
//! ```text
//! [Variables]
//! Name_0=mode
//! Type_0=u8
//! Name_1=signal_on
//! Type_1=bit
//! Name_2=amplitude
//! Type_2=double
//! ```
//!
//! resolves to `mode@0`, `signal_on@1-0`, `amplitude@1`. A scalar following a bit field
//! shares that field's byte; existing device register maps are laid out this way, so the
//! overlap is kept for compatibility rather than treated as an error.
//!
//! ## Usage
//!
//! ```
//! use netvar::{load_layout, AccessMode, RegisterImage, RegisterTable, TableOptions, Value};
//!
//! let layout = load_layout("Name_0=gain\nType_0=u16\nName_1=on\nType_1=bit\n")?;
//! let image = RegisterImage::shared(layout.image_size());
//! let mut table = RegisterTable::from_layout(
//!     &layout,
//!     image.clone(),
//!     AccessMode::ReadWrite,
//!     TableOptions::default(),
//! )?;
//! table.set("gain", Value::F64(99.6))?;
//! assert_eq!(table.get("gain")?, Value::U16(100));
//! # Ok::<(), netvar::Error>(())
//! ```

pub mod accessor;
pub mod allocator;
pub mod buffered;
pub mod codec;
pub mod descriptor;
pub mod dump;
pub mod error;
pub mod layout;
pub mod parser;
pub mod port;
pub mod repository;
pub mod table;
pub mod types;
pub mod value;

pub use accessor::{AccessMode, NetVar, VariableAccessor};
pub use buffered::{BufferedAccessor, Clock, DelayTimer, ManualClock, SystemClock};
pub use codec::{Codec, Endianness};
pub use descriptor::{check_overlaps, VarIndex, VariableDescriptor};
pub use error::{Error, Result};
pub use layout::{build_layout, Declaration, Layout, LayoutBuilder};
pub use parser::{load_layout, load_layout_file, parse_declarations};
pub use port::{DeviceAccessPort, RegisterImage};
pub use repository::VariableRepository;
pub use table::{RegisterSpec, RegisterTable, TableOptions};
pub use types::{CodecKind, TypeRegistry, TypeTag};
pub use value::Value;
