use crate::dcb::{self, DcbName, DcbView, Geometry};
use crate::error::{MemError, SkipReason, WalkError};
use crate::mem::MemoryAccess;
use crate::segoff::SegOff;
use crate::util::hexdump::hexdump;

// Each list slot holds one 16-bit DCB offset
const LIST_SLOT_SIZE: u16 = 2;

/// Where the DCB list lives, and the pointer that led there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListHead {
  pub ptr: SegOff,
  pub list: SegOff,
}

pub fn resolve_list_head<M: MemoryAccess + ?Sized>(mem: &M, kernel_seg: u16) -> Result<ListHead, MemError> {
  let base_seg = mem.read_u16(SegOff::new(kernel_seg, dcb::KERNEL_DCB_SEG_OFF))?;
  let ptr_ofs = mem.read_u16(SegOff::new(kernel_seg, dcb::KERNEL_DCB_LIST_PTR_OFF))?;
  let ptr = SegOff::new(base_seg, ptr_ofs);
  let list_ofs = mem.read_u16(ptr)?;
  Ok(ListHead { ptr, list: SegOff::new(base_seg, list_ofs) })
}

pub fn read_name<M: MemoryAccess + ?Sized>(mem: &M, seg: u16, record_ofs: u16) -> Result<Result<DcbName, SkipReason>, MemError> {
  DcbView::new(seg, record_ofs).name(mem)
}

pub fn read_geometry<M: MemoryAccess + ?Sized>(mem: &M, seg: u16, record_ofs: u16) -> Result<Geometry, MemError> {
  DcbView::new(seg, record_ofs).geometry(mem)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkConfig {
  pub target: Vec<u8>,
  /// Non-positive means report only.
  pub desired_cyls: i32,
  /// `None` walks until the terminator, however long that takes.
  pub max_entries: Option<usize>,
}

impl WalkConfig {
  pub fn new(target: &[u8], desired_cyls: i32) -> WalkConfig {
    WalkConfig { target: target.to_vec(), desired_cyls, max_entries: None }
  }
}

/// Things that happen during a walk, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Record(SegOff),
  Skipped { addr: SegOff, reason: SkipReason },
  Dcb { addr: SegOff, name: DcbName, geometry: Geometry },
  Patched { addr: SegOff, cyls: u16 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkReport {
  pub visited: usize,
  pub skipped: usize,
  pub matched: usize,
  pub patched: Vec<SegOff>,
}

pub struct Walker<'a, M: MemoryAccess + ?Sized> {
  mem: &'a mut M,
  cfg: &'a WalkConfig,
}

impl<'a, M: MemoryAccess + ?Sized> Walker<'a, M> {
  pub fn new(mem: &'a mut M, cfg: &'a WalkConfig) -> Self {
    Walker { mem, cfg }
  }

  pub fn walk(&mut self, list: SegOff, on_event: &mut dyn FnMut(&Event)) -> Result<WalkReport, WalkError> {
    let mut report = WalkReport::default();
    let mut pos = list;
    let mut slots = 0;

    loop {
      if let Some(limit) = self.cfg.max_entries {
        if slots >= limit {
          return Err(WalkError::TooManyEntries { limit, at: pos });
        }
      }
      slots += 1;

      let record_ofs = self.mem.read_u16(pos)?;
      log::debug!("list slot {} -> {:x}", pos, record_ofs);
      if record_ofs == 0 {
        return Ok(report);
      }
      let this_pos = pos;
      pos = pos.add_offset(LIST_SLOT_SIZE);

      let view = DcbView::new(this_pos.seg, record_ofs);
      let addr = view.addr();
      report.visited += 1;
      on_event(&Event::Record(addr));

      let name = match view.name(&*self.mem)? {
        Ok(name) => name,
        Err(reason) => {
          log::warn!("{} (dcb at {})", reason, addr);
          report.skipped += 1;
          on_event(&Event::Skipped { addr, reason });
          continue;
        }
      };

      let geometry = view.geometry(&*self.mem)?;
      if log::log_enabled!(log::Level::Debug) {
        log::debug!("dcb {} raw:\n{}", addr, hexdump(addr, &view.raw_head(&*self.mem)?));
      }
      on_event(&Event::Dcb { addr, name: name.clone(), geometry });

      if name.as_bytes() != self.cfg.target.as_slice() {
        continue;
      }
      report.matched += 1;

      if self.cfg.desired_cyls <= 0 {
        continue;
      }

      // Same as a 16-bit poke: keep the low word
      let cyls = self.cfg.desired_cyls as u16;
      view.set_cylinders_per_disk(&mut *self.mem, cyls)?;
      log::info!("patched dcb {} ({}) cylinders {} -> {}", addr, name, geometry.cylinders_per_disk, cyls);
      report.patched.push(addr);
      on_event(&Event::Patched { addr, cyls });
    }
  }
}
