use std::io;
use std::io::prelude::*;

use byteorder::{ReadBytesExt, WriteBytesExt};

// floor(log2(x)), for x > 0
pub fn floor_log2(x: usize) -> u32 {
  assert!(x > 0);
  usize::BITS - 1 - x.leading_zeros()
}

pub fn clamp<T: PartialOrd>(value: T, low: T, high: T) -> T {
  if value < low {
    low
  } else if value > high {
    high
  } else {
    value
  }
}

// Clip a sample value to the legal range for a given bit depth
pub fn clip_pel(value: i32, bit_depth: u32) -> i32 {
  clamp(value, 0, (1 << bit_depth) - 1)
}

// Projection slopes which are a whole number of samples per row
pub fn is_integer_slope(abs_angle: i32) -> bool {
  (abs_angle & 0x1F) == 0
}

// Write a value in LEB128 format
// In this format, each byte provides 7 bits of the value,
// along with a flag bit which indicates whether there are more bytes to read
pub fn write_leb128<W: Write>(w: &mut W, mut value: usize) -> io::Result<()> {
  if value == 0 {
    return w.write_u8(0);
  }

  while value != 0 {
    let more_flag = if (value >> 7) > 0 { 0x80 } else { 0x00 };
    w.write_u8(more_flag | (value & 0x7F) as u8)?;
    value >>= 7;
  }
  Ok(())
}

pub fn read_leb128<R: Read>(r: &mut R) -> io::Result<usize> {
  let mut value = 0usize;
  for i in 0..8 {
    let byte = r.read_u8()?;
    value |= ((byte & 0x7F) as usize) << (7 * i);
    if byte & 0x80 == 0 {
      return Ok(value);
    }
  }
  Err(io::Error::new(io::ErrorKind::InvalidData, "LEB128 value longer than 8 bytes"))
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn floor_log2_of_block_sizes() {
    assert_eq!(floor_log2(1), 0);
    assert_eq!(floor_log2(4), 2);
    assert_eq!(floor_log2(7), 2);
    assert_eq!(floor_log2(128), 7);
  }

  #[test]
  fn leb128_multibyte() {
    let mut buf = Vec::new();
    write_leb128(&mut buf, 300).unwrap();
    assert_eq!(buf, [0xAC, 0x02]);
    assert_eq!(read_leb128(&mut &buf[..]).unwrap(), 300);
  }

  #[test]
  fn leb128_truncated_is_an_error() {
    let buf = [0x80u8];
    assert!(read_leb128(&mut &buf[..]).is_err());
  }
}
