use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegOff {
  pub seg: u16,
  pub off: u16,
}

impl SegOff {
  pub const fn new(seg: u16, off: u16) -> SegOff {
    SegOff { seg, off }
  }

  pub fn abs(&self) -> usize {
    (self.seg as usize) * 16 + (self.off as usize)
  }

  // Offsets wrap within the segment, like the real address unit
  pub fn add_offset(&self, off: u16) -> SegOff {
    SegOff { seg: self.seg, off: self.off.wrapping_add(off) }
  }
}

impl fmt::Display for SegOff {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:x}:{:x}", self.seg, self.off)
  }
}
