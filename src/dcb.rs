//! Device control blocks, as laid out by the kernel.
//!
//! A DCB is never copied out of memory. `DcbView` names a record by its
//! segment and base offset and reads each field on demand.
use std::fmt;

use crate::error::{MemError, SkipReason};
use crate::mem::MemoryAccess;
use crate::segoff::SegOff;

// Pointer chain, relative to the kernel segment
pub const KERNEL_DCB_SEG_OFF: u16 = 0x242;
pub const KERNEL_DCB_LIST_PTR_OFF: u16 = 0x27c;

pub const NAME_LEN_OFF: u16 = 6;
pub const NAME_OFF: u16 = 7;
pub const MAX_NAME_LEN: usize = 12;

pub const BYTES_PER_SECTOR_OFF: u16 = 68;
pub const SECTORS_PER_TRACK_OFF: u16 = 70;
pub const TRACKS_PER_CYLINDER_OFF: u16 = 72;
pub const CYLINDERS_PER_DISK_OFF: u16 = 74;

// Everything up to and including the cylinder word
pub const DCB_HEAD_LEN: usize = CYLINDERS_PER_DISK_OFF as usize + 2;

sa::const_assert!(NAME_OFF as usize + MAX_NAME_LEN <= BYTES_PER_SECTOR_OFF as usize);

/// Device name as stored in a DCB: 1 to 12 opaque bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DcbName {
  len: u8,
  bytes: [u8; MAX_NAME_LEN],
}

impl DcbName {
  /// `None` unless `1 <= bytes.len() <= 12`.
  pub fn new(bytes: &[u8]) -> Option<DcbName> {
    if bytes.is_empty() || bytes.len() > MAX_NAME_LEN {
      return None;
    }
    let mut buf = [0; MAX_NAME_LEN];
    buf[..bytes.len()].copy_from_slice(bytes);
    Some(DcbName { len: bytes.len() as u8, bytes: buf })
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes[..self.len as usize]
  }
}

impl fmt::Display for DcbName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
  }
}

impl fmt::Debug for DcbName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "DcbName({:?})", String::from_utf8_lossy(self.as_bytes()))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
  pub bytes_per_sector: u16,
  pub sectors_per_track: u16,
  pub tracks_per_cylinder: u16,
  pub cylinders_per_disk: u16,
}

impl fmt::Display for Geometry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "SecSize: {}, Sec: {}, Head: {}, Cyl: {}",
           self.bytes_per_sector,
           self.sectors_per_track,
           self.tracks_per_cylinder,
           self.cylinders_per_disk)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DcbView {
  base: SegOff,
}

impl DcbView {
  pub fn new(seg: u16, off: u16) -> DcbView {
    DcbView { base: SegOff::new(seg, off) }
  }

  pub fn addr(&self) -> SegOff {
    self.base
  }

  fn field(&self, off: u16) -> SegOff {
    self.base.add_offset(off)
  }

  pub fn name_len<M: MemoryAccess + ?Sized>(&self, mem: &M) -> Result<u8, MemError> {
    mem.read_u8(self.field(NAME_LEN_OFF))
  }

  /// Outer error aborts the walk, inner one only skips this record.
  pub fn name<M: MemoryAccess + ?Sized>(&self, mem: &M) -> Result<Result<DcbName, SkipReason>, MemError> {
    let len = self.name_len(mem)?;
    if len == 0 {
      return Ok(Err(SkipReason::EmptyName));
    }
    if len as usize > MAX_NAME_LEN {
      return Ok(Err(SkipReason::NameTooLong(len)));
    }
    let mut buf = [0u8; MAX_NAME_LEN];
    for (i, b) in buf[..len as usize].iter_mut().enumerate() {
      *b = mem.read_u8(self.field(NAME_OFF + i as u16))?;
    }
    Ok(Ok(DcbName { len, bytes: buf }))
  }

  pub fn bytes_per_sector<M: MemoryAccess + ?Sized>(&self, mem: &M) -> Result<u16, MemError> {
    mem.read_u16(self.field(BYTES_PER_SECTOR_OFF))
  }

  pub fn sectors_per_track<M: MemoryAccess + ?Sized>(&self, mem: &M) -> Result<u16, MemError> {
    mem.read_u16(self.field(SECTORS_PER_TRACK_OFF))
  }

  pub fn tracks_per_cylinder<M: MemoryAccess + ?Sized>(&self, mem: &M) -> Result<u16, MemError> {
    mem.read_u16(self.field(TRACKS_PER_CYLINDER_OFF))
  }

  pub fn cylinders_per_disk<M: MemoryAccess + ?Sized>(&self, mem: &M) -> Result<u16, MemError> {
    mem.read_u16(self.field(CYLINDERS_PER_DISK_OFF))
  }

  pub fn set_cylinders_per_disk<M: MemoryAccess + ?Sized>(&self, mem: &mut M, cyls: u16) -> Result<(), MemError> {
    mem.write_u16(self.field(CYLINDERS_PER_DISK_OFF), cyls)
  }

  pub fn geometry<M: MemoryAccess + ?Sized>(&self, mem: &M) -> Result<Geometry, MemError> {
    Ok(Geometry {
      bytes_per_sector:    self.bytes_per_sector(mem)?,
      sectors_per_track:   self.sectors_per_track(mem)?,
      tracks_per_cylinder: self.tracks_per_cylinder(mem)?,
      cylinders_per_disk:  self.cylinders_per_disk(mem)?,
    })
  }

  /// Fixed head of the record, byte by byte. Diagnostics only.
  pub fn raw_head<M: MemoryAccess + ?Sized>(&self, mem: &M) -> Result<Vec<u8>, MemError> {
    (0..DCB_HEAD_LEN as u16).map(|i| mem.read_u8(self.field(i))).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mem::Memory;

  fn mem_with_dcb(off: u16, name: &[u8]) -> Memory {
    let mut mem = Memory::new();
    let base = SegOff::new(0x70, off);
    mem.write_u8(base.add_offset(NAME_LEN_OFF), name.len() as u8).unwrap();
    mem.write_bytes(base.add_offset(NAME_OFF), name).unwrap();
    mem.write_u16(base.add_offset(BYTES_PER_SECTOR_OFF), 512).unwrap();
    mem.write_u16(base.add_offset(SECTORS_PER_TRACK_OFF), 18).unwrap();
    mem.write_u16(base.add_offset(TRACKS_PER_CYLINDER_OFF), 2).unwrap();
    mem.write_u16(base.add_offset(CYLINDERS_PER_DISK_OFF), 80).unwrap();
    mem
  }

  #[test]
  fn reads_name_and_geometry() {
    let mem = mem_with_dcb(0x200, b"f0");
    let dcb = DcbView::new(0x70, 0x200);
    assert_eq!(dcb.name(&mem).unwrap().unwrap().as_bytes(), b"f0");
    assert_eq!(dcb.geometry(&mem).unwrap(), Geometry {
      bytes_per_sector: 512,
      sectors_per_track: 18,
      tracks_per_cylinder: 2,
      cylinders_per_disk: 80,
    });
    assert_eq!(dcb.geometry(&mem).unwrap().to_string(), "SecSize: 512, Sec: 18, Head: 2, Cyl: 80");
  }

  #[test]
  fn name_length_limits() {
    let dcb = DcbView::new(0x70, 0x200);

    let mem = mem_with_dcb(0x200, b"");
    assert_eq!(dcb.name(&mem).unwrap(), Err(SkipReason::EmptyName));

    let mem = mem_with_dcb(0x200, b"abcdefghijkl");
    assert_eq!(dcb.name(&mem).unwrap().unwrap().to_string(), "abcdefghijkl");

    let mut mem = mem_with_dcb(0x200, b"abcdefghijkl");
    mem.write_u8(SegOff::new(0x70, 0x200 + NAME_LEN_OFF), 13).unwrap();
    assert_eq!(dcb.name(&mem).unwrap(), Err(SkipReason::NameTooLong(13)));
  }

  #[test]
  fn set_cylinders_touches_only_that_word() {
    let mut mem = mem_with_dcb(0x200, b"f0");
    let dcb = DcbView::new(0x70, 0x200);
    let before = dcb.raw_head(&mem).unwrap();
    dcb.set_cylinders_per_disk(&mut mem, 180).unwrap();
    let after = dcb.raw_head(&mem).unwrap();
    assert_eq!(after.len(), DCB_HEAD_LEN);
    assert_eq!(&before[..74], &after[..74]);
    assert_eq!(&after[74..], &[180, 0]);
  }

  #[test]
  fn name_is_compared_as_bytes() {
    let a = DcbName::new(b"f0").unwrap();
    assert_eq!(a, DcbName::new(b"f0").unwrap());
    assert_ne!(a, DcbName::new(b"F0").unwrap());
    assert_ne!(a, DcbName::new(b"f0 ").unwrap());
    assert!(DcbName::new(b"").is_none());
    assert!(DcbName::new(b"thirteen_long").is_none());
    assert_eq!(DcbName::new(&[0x66, 0xff]).unwrap().to_string(), "f\u{fffd}");
  }
}
