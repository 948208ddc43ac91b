use crate::error::AppError;
use crate::mem::Memory;
use crate::util::parse;
use crate::walker::{self, Event, WalkConfig, WalkReport, Walker};
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

pub const DEFAULT_DEVICE: &str = "f0";
pub const DEFAULT_CYLINDERS: i32 = 0xb4;
// Every 2-byte slot of one 64K segment
pub const DEFAULT_MAX_DCBS: usize = 0x8000;

fn print_help() {
  let appname = std::env::args().next().unwrap_or_else(|| "dcbpatch".to_string());
  println!("usage: {} OPTIONS [DEVICE] [CYLINDERS]", appname);
  println!();
  println!("Find the DCB for DEVICE (default {}) and set its cylinder count", DEFAULT_DEVICE);
  println!("to CYLINDERS (default {}). A count <= 0 only reports.", DEFAULT_CYLINDERS);
  println!();
  println!("REQUIRED OPTIONS:");
  println!("  --image           path to a raw real-mode memory image (required)");
  println!();
  println!("OPTIONS:");
  println!("  --kernel-seg      hex segment of the kernel data area (default 0)");
  println!("  --max-dcbs        give up after this many list slots, 0 for no limit (default {})", DEFAULT_MAX_DCBS);
  println!("  --dry-run         patch in memory only, never write the image back");
  println!("  -v                more logging on stderr (repeatable)");
}

#[derive(Debug)]
pub struct Args {
  pub image: PathBuf,
  pub kernel_seg: u16,
  pub max_dcbs: usize,
  pub dry_run: bool,
  pub verbose: u8,
  pub device: String,
  pub cylinders: i32,
}

fn parse_cylinders(s: &str) -> Result<i32, AppError> {
  let n: i64 = s.trim().parse().map_err(|_| AppError::BadCylinders(s.to_string()))?;
  if n > u16::MAX as i64 {
    return Err(AppError::CylindersOutOfRange(n));
  }
  // Anything non-positive just disables patching
  Ok(n.max(i32::MIN as i64) as i32)
}

pub fn parse_args_from(args: Vec<OsString>) -> Result<Args, AppError> {
  let mut pargs = pico_args::Arguments::from_vec(args);

  // Help has a higher priority and should be handled separately.
  if pargs.contains(["-h", "--help"]) {
    print_help();
    std::process::exit(0);
  }

  let mut verbose = 0;
  while pargs.contains("-vv") {
    verbose += 2;
  }
  while pargs.contains("-v") {
    verbose += 1;
  }

  let kernel_seg: Option<String> = pargs.opt_value_from_str("--kernel-seg")?;
  let kernel_seg = match kernel_seg {
    Some(s) => parse::hex_u16(&s).map_err(|e| AppError::KernelSeg(s.clone(), e))?,
    None => 0,
  };

  let image = pargs.value_from_str("--image")?;
  let max_dcbs = pargs.opt_value_from_str("--max-dcbs")?.unwrap_or(DEFAULT_MAX_DCBS);
  let dry_run = pargs.contains("--dry-run");

  // Empty positionals fall back to the defaults
  let device: Option<String> = pargs.opt_free_from_str()?;
  let device = device.filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_DEVICE.to_string());
  let cylinders: Option<String> = pargs.opt_free_from_str()?;
  let cylinders = match cylinders.filter(|s| !s.is_empty()) {
    Some(s) => parse_cylinders(&s)?,
    None => DEFAULT_CYLINDERS,
  };

  let remaining = pargs.finish();
  if !remaining.is_empty() {
    return Err(AppError::UnusedArgs(remaining));
  }

  Ok(Args { image, kernel_seg, max_dcbs, dry_run, verbose, device, cylinders })
}

fn trace_event(out: &mut dyn Write, event: &Event) -> std::io::Result<()> {
  match event {
    Event::Record(addr) => writeln!(out, "dcb at = {}", addr),
    Event::Skipped { .. } => Ok(()),
    Event::Dcb { name, geometry, .. } => writeln!(out, "Name: {}, {}", name, geometry),
    Event::Patched { cyls, .. } => writeln!(out, "patching dcb cyls to {}", cyls),
  }
}

/// Load the image, walk it and write it back if anything was patched.
pub fn run_with(args: &Args, out: &mut dyn Write) -> Result<WalkReport, AppError> {
  let image_err = |source| AppError::Image { path: args.image.display().to_string(), source };

  writeln!(out, "dcbpatch {}", env!("CARGO_PKG_VERSION"))?;
  writeln!(out, "lookForDeviceName={}, desiredCyls={}", args.device, args.cylinders)?;

  let mut mem = Memory::load(&args.image).map_err(image_err)?;

  let head = walker::resolve_list_head(&mem, args.kernel_seg).map_err(crate::error::WalkError::from)?;
  writeln!(out, "dcb_list_ptr_ptr = {}", head.ptr)?;
  writeln!(out, "dcb_list = {}", head.list)?;

  let cfg = WalkConfig {
    target: args.device.as_bytes().to_vec(),
    desired_cyls: args.cylinders,
    max_entries: if args.max_dcbs == 0 { None } else { Some(args.max_dcbs) },
  };

  let mut trace_err = None;
  let report = Walker::new(&mut mem, &cfg).walk(head.list, &mut |event| {
    if let Err(e) = trace_event(out, event) {
      trace_err.get_or_insert(e);
    }
  })?;
  if let Some(e) = trace_err {
    return Err(e.into());
  }

  log::info!("visited {} dcbs, skipped {}, matched {}", report.visited, report.skipped, report.matched);

  if !report.patched.is_empty() {
    if args.dry_run {
      log::info!("dry run: {} left unchanged", args.image.display());
    } else {
      mem.save(&args.image).map_err(image_err)?;
      log::info!("wrote patched image to {}", args.image.display());
    }
  }

  Ok(report)
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => log::LevelFilter::Warn,
    1 => log::LevelFilter::Info,
    _ => log::LevelFilter::Debug,
  };
  env_logger::builder()
    .filter_level(level)
    .parse_default_env()
    .init();
}

pub fn run() -> i32 {
  let args = match parse_args_from(std::env::args_os().skip(1).collect()) {
    Ok(v) => v,
    Err(e) => {
      eprintln!("Error: {}.", e);
      return 1;
    }
  };

  init_logging(args.verbose);

  let stdout = std::io::stdout();
  let mut out = stdout.lock();
  match run_with(&args, &mut out) {
    Ok(_) => (),
    Err(err) => {
      eprintln!("Error: {}", err);
      return 1;
    }
  }

  0
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args(list: &[&str]) -> Result<Args, AppError> {
    parse_args_from(list.iter().map(OsString::from).collect())
  }

  #[test]
  fn defaults() {
    let a = args(&["--image", "mem.img"]).unwrap();
    assert_eq!(a.image, PathBuf::from("mem.img"));
    assert_eq!(a.device, "f0");
    assert_eq!(a.cylinders, 180);
    assert_eq!(a.kernel_seg, 0);
    assert_eq!(a.max_dcbs, DEFAULT_MAX_DCBS);
    assert!(!a.dry_run);
    assert_eq!(a.verbose, 0);
  }

  #[test]
  fn positionals_and_flags() {
    let a = args(&["-v", "--image", "m", "--kernel-seg", "0x40", "--dry-run", "--max-dcbs", "0", "d1", "80"]).unwrap();
    assert_eq!(a.device, "d1");
    assert_eq!(a.cylinders, 80);
    assert_eq!(a.kernel_seg, 0x40);
    assert_eq!(a.max_dcbs, 0);
    assert!(a.dry_run);
    assert_eq!(a.verbose, 1);
  }

  #[test]
  fn empty_positionals_use_defaults() {
    let a = args(&["--image", "m", "", ""]).unwrap();
    assert_eq!(a.device, "f0");
    assert_eq!(a.cylinders, 180);
  }

  #[test]
  fn cylinder_values() {
    assert_eq!(args(&["--image", "m", "f0", "0"]).unwrap().cylinders, 0);
    assert_eq!(args(&["--image", "m", "f0", "-5"]).unwrap().cylinders, -5);
    assert_eq!(args(&["--image", "m", "f0", "-99999999999"]).unwrap().cylinders, i32::MIN);
    assert_eq!(args(&["--image", "m", "f0", "65535"]).unwrap().cylinders, 65535);
    assert!(matches!(args(&["--image", "m", "f0", "65536"]), Err(AppError::CylindersOutOfRange(65536))));
    assert!(matches!(args(&["--image", "m", "f0", "lots"]), Err(AppError::BadCylinders(_))));
  }

  #[test]
  fn argument_errors() {
    assert!(matches!(args(&["f0"]), Err(AppError::Args(_))));
    assert!(matches!(args(&["--image", "m", "--kernel-seg", "xyz"]), Err(AppError::KernelSeg(..))));
    assert!(matches!(args(&["--image", "m", "f0", "80", "extra"]), Err(AppError::UnusedArgs(_))));
  }
}
