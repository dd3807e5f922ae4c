//! Device access port: raw byte and bit I/O against a device register image.
//!
//! The transport that actually talks to the device (USB, Modbus, serial) implements
//! [`DeviceAccessPort`]; everything above it (accessors, repositories, tables) receives the
//! port explicitly. One connection is shared between many accessors through the blanket
//! implementations for `&mut P`, `Box<P>` and `Rc<RefCell<P>>`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::trace;

use crate::error::{Error, Result};

/// Raw access to a device's byte-addressable register image.
pub trait DeviceAccessPort {
    /// Read `length` bytes starting at `byte_index`.
    fn read_bytes(&self, byte_index: u32, length: u32) -> Result<Vec<u8>>;

    /// Write `data` starting at `byte_index`.
    fn write_bytes(&mut self, byte_index: u32, data: &[u8]) -> Result<()>;

    /// Read bit `bit_index` (0..8) of byte `byte_index`.
    fn read_bit(&self, byte_index: u32, bit_index: u8) -> Result<bool>;

    /// Write bit `bit_index` (0..8) of byte `byte_index`.
    fn write_bit(&mut self, byte_index: u32, bit_index: u8, value: bool) -> Result<()>;

    /// Whether the underlying connection is currently established.
    fn is_connected(&self) -> bool {
        true
    }
}

impl<P: DeviceAccessPort + ?Sized> DeviceAccessPort for &mut P {
    fn read_bytes(&self, byte_index: u32, length: u32) -> Result<Vec<u8>> {
        (**self).read_bytes(byte_index, length)
    }

    fn write_bytes(&mut self, byte_index: u32, data: &[u8]) -> Result<()> {
        (**self).write_bytes(byte_index, data)
    }

    fn read_bit(&self, byte_index: u32, bit_index: u8) -> Result<bool> {
        (**self).read_bit(byte_index, bit_index)
    }

    fn write_bit(&mut self, byte_index: u32, bit_index: u8, value: bool) -> Result<()> {
        (**self).write_bit(byte_index, bit_index, value)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

impl<P: DeviceAccessPort + ?Sized> DeviceAccessPort for Box<P> {
    fn read_bytes(&self, byte_index: u32, length: u32) -> Result<Vec<u8>> {
        (**self).read_bytes(byte_index, length)
    }

    fn write_bytes(&mut self, byte_index: u32, data: &[u8]) -> Result<()> {
        (**self).write_bytes(byte_index, data)
    }

    fn read_bit(&self, byte_index: u32, bit_index: u8) -> Result<bool> {
        (**self).read_bit(byte_index, bit_index)
    }

    fn write_bit(&mut self, byte_index: u32, bit_index: u8, value: bool) -> Result<()> {
        (**self).write_bit(byte_index, bit_index, value)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

/// Shared single-threaded connection. Borrows are held only for the duration of one call.
impl<P: DeviceAccessPort + ?Sized> DeviceAccessPort for Rc<RefCell<P>> {
    fn read_bytes(&self, byte_index: u32, length: u32) -> Result<Vec<u8>> {
        self.borrow().read_bytes(byte_index, length)
    }

    fn write_bytes(&mut self, byte_index: u32, data: &[u8]) -> Result<()> {
        self.borrow_mut().write_bytes(byte_index, data)
    }

    fn read_bit(&self, byte_index: u32, bit_index: u8) -> Result<bool> {
        self.borrow().read_bit(byte_index, bit_index)
    }

    fn write_bit(&mut self, byte_index: u32, bit_index: u8, value: bool) -> Result<()> {
        self.borrow_mut().write_bit(byte_index, bit_index, value)
    }

    fn is_connected(&self) -> bool {
        self.borrow().is_connected()
    }
}

#[derive(Debug, Clone)]
enum PendingWrite {
    Bytes { byte_index: u32, data: Vec<u8> },
    Bit { byte_index: u32, bit_index: u8, value: bool },
}

/// In-process register image with device-like write latency.
///
/// Reads are served from a local mirror. Writes are queued and only land in the mirror on
/// the next [`tick`](RegisterImage::tick), the way a real device only exposes a written
/// value after its next refresh cycle. With [`set_immediate`](RegisterImage::set_immediate)
/// writes apply synchronously instead.
#[derive(Debug, Clone)]
pub struct RegisterImage {
    mirror: Vec<u8>,
    pending: Vec<PendingWrite>,
    connected: bool,
    immediate: bool,
    reads: Cell<usize>,
    writes: usize,
}

impl RegisterImage {
    /// A connected, zero-filled image of `size` bytes.
    pub fn new(size: usize) -> Self {
        RegisterImage {
            mirror: vec![0; size],
            pending: Vec::new(),
            connected: true,
            immediate: false,
            reads: Cell::new(0),
            writes: 0,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let mut image = RegisterImage::new(0);
        image.mirror = bytes;
        image
    }

    /// Convenience for sharing one image between accessors.
    pub fn shared(size: usize) -> Rc<RefCell<RegisterImage>> {
        Rc::new(RefCell::new(RegisterImage::new(size)))
    }

    pub fn size(&self) -> usize {
        self.mirror.len()
    }

    /// Current mirror contents (pending writes excluded).
    pub fn bytes(&self) -> &[u8] {
        &self.mirror
    }

    /// Overwrite mirror bytes directly, as if the device changed them on its own.
    pub fn poke(&mut self, byte_index: u32, data: &[u8]) -> Result<()> {
        let range = self.range(byte_index, data.len() as u32)?;
        self.mirror[range].copy_from_slice(data);
        Ok(())
    }

    pub fn set_immediate(&mut self, immediate: bool) {
        self.immediate = immediate;
    }

    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Number of read calls served (bytes or bits).
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    /// Number of write calls accepted (bytes or bits).
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Apply all queued writes to the mirror, in order.
    pub fn tick(&mut self) -> Result<()> {
        self.ensure_connected()?;
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            trace!("tick: applying {} pending write(s)", pending.len());
        }
        for write in pending {
            self.apply(write);
        }
        Ok(())
    }

    pub fn connect(&mut self) {
        self.connected = true;
    }

    /// Drop the connection; queued writes are lost.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.pending.clear();
    }

    fn ensure_connected(&self) -> Result<()> {
        if !self.connected {
            return Err(Error::DeviceUnavailable("register image disconnected".to_string()));
        }
        Ok(())
    }

    fn range(&self, byte_index: u32, length: u32) -> Result<std::ops::Range<usize>> {
        let start = byte_index as usize;
        let end = start + length as usize;
        if end > self.mirror.len() {
            return Err(Error::AddressOutOfRange {
                byte_index,
                length,
                size: self.mirror.len(),
            });
        }
        Ok(start..end)
    }

    fn apply(&mut self, write: PendingWrite) {
        match write {
            PendingWrite::Bytes { byte_index, data } => {
                let start = byte_index as usize;
                self.mirror[start..start + data.len()].copy_from_slice(&data);
            }
            PendingWrite::Bit {
                byte_index,
                bit_index,
                value,
            } => {
                let byte = &mut self.mirror[byte_index as usize];
                if value {
                    *byte |= 1 << bit_index;
                } else {
                    *byte &= !(1 << bit_index);
                }
            }
        }
    }

    fn queue(&mut self, write: PendingWrite) {
        self.writes += 1;
        if self.immediate {
            self.apply(write);
        } else {
            self.pending.push(write);
        }
    }
}

impl DeviceAccessPort for RegisterImage {
    fn read_bytes(&self, byte_index: u32, length: u32) -> Result<Vec<u8>> {
        self.ensure_connected()?;
        let range = self.range(byte_index, length)?;
        self.reads.set(self.reads.get() + 1);
        Ok(self.mirror[range].to_vec())
    }

    fn write_bytes(&mut self, byte_index: u32, data: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        self.range(byte_index, data.len() as u32)?;
        self.queue(PendingWrite::Bytes {
            byte_index,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn read_bit(&self, byte_index: u32, bit_index: u8) -> Result<bool> {
        assert!(bit_index < 8, "bit index {} out of range", bit_index);
        self.ensure_connected()?;
        let range = self.range(byte_index, 1)?;
        self.reads.set(self.reads.get() + 1);
        Ok(self.mirror[range.start] & (1 << bit_index) != 0)
    }

    fn write_bit(&mut self, byte_index: u32, bit_index: u8, value: bool) -> Result<()> {
        assert!(bit_index < 8, "bit index {} out of range", bit_index);
        self.ensure_connected()?;
        self.range(byte_index, 1)?;
        self.queue(PendingWrite::Bit {
            byte_index,
            bit_index,
            value,
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_land_on_tick() {
        let mut image = RegisterImage::new(4);
        image.write_bytes(1, &[7, 8]).unwrap();
        assert_eq!(image.read_bytes(1, 2).unwrap(), vec![0, 0]);
        assert_eq!(image.pending_writes(), 1);
        image.tick().unwrap();
        assert_eq!(image.read_bytes(1, 2).unwrap(), vec![7, 8]);
    }

    #[test]
    fn bits() {
        let mut image = RegisterImage::new(1);
        image.set_immediate(true);
        image.write_bit(0, 3, true).unwrap();
        image.write_bit(0, 0, true).unwrap();
        assert_eq!(image.bytes(), &[0b0000_1001]);
        image.write_bit(0, 3, false).unwrap();
        assert!(!image.read_bit(0, 3).unwrap());
        assert!(image.read_bit(0, 0).unwrap());
    }

    #[test]
    fn out_of_range() {
        let mut image = RegisterImage::new(4);
        assert!(matches!(
            image.read_bytes(2, 4),
            Err(Error::AddressOutOfRange { byte_index: 2, length: 4, size: 4 })
        ));
        assert!(image.write_bit(4, 0, true).is_err());
    }

    #[test]
    fn disconnected() {
        let mut image = RegisterImage::new(4);
        image.write_bytes(0, &[1]).unwrap();
        image.disconnect();
        assert!(!image.is_connected());
        assert!(image.read_bytes(0, 1).unwrap_err().is_device_unavailable());
        assert!(image.write_bit(0, 0, true).is_err());
        image.connect();
        image.tick().unwrap();
        assert_eq!(image.bytes()[0], 0);
    }

    #[test]
    fn shared_handle() {
        let shared = RegisterImage::shared(2);
        let mut a = shared.clone();
        a.write_bytes(0, &[5]).unwrap();
        shared.borrow_mut().tick().unwrap();
        assert_eq!(shared.read_bytes(0, 1).unwrap(), vec![5]);
    }
}
