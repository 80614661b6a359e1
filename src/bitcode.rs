// Plain (non-arithmetic-coded) bit packing, MSB first

pub struct BitWriter {
  data: Vec<u8>,
  // Bits accumulated but not yet flushed to `data`
  bit_buffer: u64,
  bit_count: u32,
}

impl BitWriter {
  pub fn new() -> Self {
    Self {
      data: Vec::new(),
      bit_buffer: 0,
      bit_count: 0
    }
  }

  pub fn write_bit(&mut self, bit: u8) {
    self.write_bits(bit as u64, 1);
  }

  pub fn write_bits(&mut self, value: u64, nbits: u32) {
    assert!(nbits <= 32);
    assert!(nbits == 32 || (value >> nbits) == 0);

    self.bit_buffer = (self.bit_buffer << nbits) | value;
    self.bit_count += nbits;
    while self.bit_count >= 8 {
      self.bit_count -= 8;
      self.data.push((self.bit_buffer >> self.bit_count) as u8);
    }
    self.bit_buffer &= (1 << self.bit_count) - 1;
  }

  pub fn bits_written(&self) -> usize {
    8 * self.data.len() + self.bit_count as usize
  }

  // Pad to a whole number of bytes and hand back the data
  // With `trailing_one` set, the padding starts with a single 1 bit so that
  // the end of the payload can be located by a reader
  pub fn finalize(mut self, trailing_one: bool) -> Box<[u8]> {
    if trailing_one {
      self.write_bit(1);
    }
    if self.bit_count > 0 {
      let pad = 8 - self.bit_count;
      self.write_bits(0, pad);
    }
    self.data.into_boxed_slice()
  }
}

pub struct BitReader<'a> {
  data: &'a [u8],
  bit_pos: usize,
}

impl<'a> BitReader<'a> {
  pub fn new(data: &'a [u8]) -> Self {
    Self {
      data: data,
      bit_pos: 0
    }
  }

  pub fn bits_left(&self) -> usize {
    8 * self.data.len() - self.bit_pos
  }

  // Returns None if the buffer runs out
  pub fn read_bits(&mut self, nbits: u32) -> Option<u64> {
    if (nbits as usize) > self.bits_left() {
      return None;
    }
    let mut value = 0u64;
    for _ in 0..nbits {
      let byte = self.data[self.bit_pos >> 3];
      let bit = (byte >> (7 - (self.bit_pos & 7))) & 1;
      value = (value << 1) | bit as u64;
      self.bit_pos += 1;
    }
    Some(value)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn packs_msb_first() {
    let mut w = BitWriter::new();
    w.write_bits(0b101, 3);
    w.write_bits(0b0011, 4);
    assert_eq!(w.bits_written(), 7);
    let data = w.finalize(true);
    assert_eq!(&data[..], &[0b1010_0111]);

    let mut r = BitReader::new(&data);
    assert_eq!(r.read_bits(3), Some(0b101));
    assert_eq!(r.read_bits(4), Some(0b0011));
    assert_eq!(r.read_bits(1), Some(1));
    assert_eq!(r.read_bits(1), None);
  }
}
