pub use crate::segoff::SegOff;
use crate::error::MemError;
use std::path::Path;

// Large enough to allow address ffff:ffff
pub const MEM_SIZE: usize = 0x10fff0;

/// Byte and word access to a segmented address space owned by someone else.
///
/// Words are little-endian. Accesses outside the backing store must fail with
/// `MemError` rather than touching anything.
pub trait MemoryAccess {
  fn read_u8(&self, addr: SegOff) -> Result<u8, MemError>;
  fn read_u16(&self, addr: SegOff) -> Result<u16, MemError>;
  fn write_u16(&mut self, addr: SegOff, val: u16) -> Result<(), MemError>;
}

impl<M: MemoryAccess + ?Sized> MemoryAccess for &mut M {
  fn read_u8(&self, addr: SegOff) -> Result<u8, MemError> {
    (**self).read_u8(addr)
  }

  fn read_u16(&self, addr: SegOff) -> Result<u16, MemError> {
    (**self).read_u16(addr)
  }

  fn write_u16(&mut self, addr: SegOff, val: u16) -> Result<(), MemError> {
    (**self).write_u16(addr, val)
  }
}

/// Flat real-mode memory image.
pub struct Memory(pub Vec<u8>);

impl Default for Memory {
  fn default() -> Self { Self::new() }
}

impl Memory {
  pub fn new() -> Memory {
    let mut raw = vec![];
    raw.resize(MEM_SIZE, 0);
    Memory(raw)
  }

  pub fn from_bytes(data: Vec<u8>) -> Memory {
    Memory(data)
  }

  pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Memory> {
    let data = std::fs::read(path.as_ref())?;
    log::debug!("loaded {} byte memory image from {}", data.len(), path.as_ref().display());
    Ok(Memory(data))
  }

  pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
    std::fs::write(path, &self.0)
  }

  pub fn write_u8(&mut self, addr: SegOff, val: u8) -> Result<(), MemError> {
    let start = self.check(addr, 1)?;
    self.0[start] = val;
    Ok(())
  }

  pub fn write_bytes(&mut self, addr: SegOff, data: &[u8]) -> Result<(), MemError> {
    let start = self.check(addr, data.len())?;
    self.0[start..start+data.len()].copy_from_slice(data);
    Ok(())
  }

  fn check(&self, addr: SegOff, len: usize) -> Result<usize, MemError> {
    let start = addr.abs();
    if start + len > self.0.len() {
      return Err(MemError::OutOfBounds { addr, len });
    }
    Ok(start)
  }
}

impl MemoryAccess for Memory {
  fn read_u8(&self, addr: SegOff) -> Result<u8, MemError> {
    let start = self.check(addr, 1)?;
    Ok(self.0[start])
  }

  fn read_u16(&self, addr: SegOff) -> Result<u16, MemError> {
    let start = self.check(addr, 2)?;
    Ok(u16::from_le_bytes([self.0[start], self.0[start+1]]))
  }

  fn write_u16(&mut self, addr: SegOff, val: u16) -> Result<(), MemError> {
    let start = self.check(addr, 2)?;
    self.0[start..start+2].copy_from_slice(&val.to_le_bytes());
    Ok(())
  }
}
