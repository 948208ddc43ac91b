use crate::segoff::SegOff;

pub fn hexdump(base: SegOff, data: &[u8]) -> String {
  let mut s = String::new();
  for (i, chunk) in data.chunks(16).enumerate() {
    let addr = base.add_offset((i * 16) as u16);
    let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
    let ascii: String = chunk.iter()
      .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
      .collect();
    s.push_str(&format!("{:04x}:{:04x}  {:<47}  {}\n", addr.seg, addr.off, hex.join(" "), ascii));
  }
  s
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn two_lines() {
    let mut data = vec![0u8; 18];
    data[6] = 2;
    data[7] = b'f';
    data[8] = b'0';
    let out = hexdump(SegOff::new(0x70, 0xc8), &data);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("0070:00c8  00 00 00 00 00 00 02 66 30"));
    assert!(lines[0].ends_with("......f0......."));
    assert!(lines[1].starts_with("0070:00d8  00 00 "));
  }
}
