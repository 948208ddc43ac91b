// Error types, one per layer.
use thiserror::Error;

use crate::segoff::SegOff;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
/// Failures of the memory backend itself.
pub enum MemError {
  #[error("access of {len} byte(s) at {addr} is outside the memory image")]
  OutOfBounds { addr: SegOff, len: usize },
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
/// Why a DCB's name could not be read. The record is skipped, the walk goes on.
pub enum SkipReason {
  #[error("zero length dcb name")]
  EmptyName,
  #[error("too long dcb name ({0})")]
  NameTooLong(u8),
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
/// Anything that aborts a walk. Nothing is read or written after one of these.
pub enum WalkError {
  #[error("memory access failed: {0}")]
  Memory(#[from] MemError),
  #[error("no list terminator within {limit} entries (stopped at {at})")]
  TooManyEntries { limit: usize, at: SegOff },
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Args(#[from] pico_args::Error),
  #[error("invalid kernel segment '{0}': {1}")]
  KernelSeg(String, &'static str),
  #[error("invalid cylinder count '{0}'")]
  BadCylinders(String),
  #[error("cylinder count {0} does not fit in 16 bits")]
  CylindersOutOfRange(i64),
  #[error("unused arguments left: {0:?}")]
  UnusedArgs(Vec<std::ffi::OsString>),
  #[error("memory image {path}: {source}")]
  Image { path: String, source: std::io::Error },
  #[error("writing trace: {0}")]
  Output(#[from] std::io::Error),
  #[error(transparent)]
  Walk(#[from] WalkError),
}
