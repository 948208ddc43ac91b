pub fn hex_u64(s: &str) -> Result<u64, &'static str> {
  let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
  if s.is_empty() {
    return Err("Empty hex string");
  }
  if s.len() > 16 {
    return Err("Hex string too long to fit in u64");
  }
  let mut ret: u64 = 0;
  for c in s.chars() {
    let d = c.to_digit(16).ok_or("Non-hexdigit char in string")?;
    ret = ret*16 + d as u64;
  }
  Ok(ret)
}

pub fn hex_u16(s: &str) -> Result<u16, &'static str> {
  let n = hex_u64(s)?;
  u16::try_from(n).map_err(|_| "Hex string too long to fit in u16")
}
