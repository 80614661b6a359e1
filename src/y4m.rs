use std::io::prelude::*;

use byteorder::{ReadBytesExt, WriteBytesExt};

use crate::enums::ChromaFormat;
use crate::error::{Error, Result};
use crate::frame::Frame;

const Y4M_FILE_MAGIC: &str = "YUV4MPEG2 ";
const Y4M_FRAME_MAGIC: &str = "FRAME";

pub struct Y4MReader<R> {
  inner: R,
  width: usize,
  height: usize,
  chroma_format: ChromaFormat,
  bit_depth: u32
}

pub struct Y4MWriter<W> {
  inner: W,
  width: usize,
  height: usize,
  chroma_format: ChromaFormat,
  bit_depth: u32
}

// Read one whitespace-terminated token
// Returns the token along with the terminating character
fn read_token<R: Read>(r: &mut R) -> Result<(String, u8)> {
  let mut token = String::new();
  loop {
    let byte = r.read_u8()?;
    match byte {
      b' ' | b'\t' | b'\n' => {
        return Ok((token, byte));
      },
      _ => {
        token.push(byte as char);
      }
    }
  }
}

fn parse_dimension(value: &str) -> Result<usize> {
  value.parse::<usize>().map_err(|_| Error::Y4M(format!("invalid dimension '{}'", value)))
}

// Map a colourspace tag (without the leading 'C') to a chroma format and bit depth
fn parse_colorspace(tag: &str) -> Result<(ChromaFormat, u32)> {
  let (format, rest) = if let Some(rest) = tag.strip_prefix("420") {
    (ChromaFormat::Cs420, rest)
  } else if let Some(rest) = tag.strip_prefix("444") {
    (ChromaFormat::Cs444, rest)
  } else if let Some(rest) = tag.strip_prefix("mono") {
    (ChromaFormat::Cs400, rest)
  } else {
    return Err(Error::Unsupported(format!("colourspace C{}", tag)));
  };

  let bit_depth = match rest {
    "" | "jpeg" | "mpeg2" | "paldv" => 8,
    _ => match rest.strip_prefix('p') {
      Some(bits) => bits.parse::<u32>().map_err(|_| Error::Y4M(format!("invalid colourspace C{}", tag)))?,
      None => return Err(Error::Unsupported(format!("colourspace C{}", tag)))
    }
  };

  Ok((format, bit_depth))
}

fn colorspace_tag(chroma_format: ChromaFormat, bit_depth: u32) -> String {
  let base = match chroma_format {
    ChromaFormat::Cs400 => "mono",
    ChromaFormat::Cs420 => "420",
    ChromaFormat::Cs444 => "444"
  };
  if bit_depth == 8 {
    if chroma_format == ChromaFormat::Cs420 {
      "420jpeg".to_string()
    } else {
      base.to_string()
    }
  } else {
    format!("{}p{}", base, bit_depth)
  }
}

impl<R: Read> Y4MReader<R> {
  pub fn new(mut inner: R) -> Result<Self> {
    // Read header line
    let mut file_magic = [0u8; 10];
    inner.read_exact(&mut file_magic)?;
    if file_magic != Y4M_FILE_MAGIC.as_bytes() {
      return Err(Error::Y4M("invalid file header".to_string()));
    }

    let mut width = 0;
    let mut height = 0;
    let mut chroma_format = ChromaFormat::Cs420;
    let mut bit_depth = 8;

    // Parse parameter line
    loop {
      let (token, terminator) = read_token(&mut inner)?;
      match token.as_bytes().first() {
        Some(b'W') => width = parse_dimension(&token[1..])?,
        Some(b'H') => height = parse_dimension(&token[1..])?,
        Some(b'C') => (chroma_format, bit_depth) = parse_colorspace(&token[1..])?,
        // Other parameters (frame rate, interlacing, aspect ratio) don't affect us
        _ => {}
      }
      if terminator == b'\n' {
        break;
      }
    }

    if width == 0 || height == 0 {
      // Didn't find a width/height parameter, or it was zero
      return Err(Error::Y4M(format!("invalid size {}x{}", width, height)));
    }

    Ok(Y4MReader {
      inner: inner,
      width: width,
      height: height,
      chroma_format: chroma_format,
      bit_depth: bit_depth
    })
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn chroma_format(&self) -> ChromaFormat {
    self.chroma_format
  }

  pub fn bit_depth(&self) -> u32 {
    self.bit_depth
  }

  // Read the next frame, padding each plane out to a multiple of `align` luma samples
  pub fn read_frame(&mut self, align: usize) -> Result<Box<Frame>> {
    // Read frame line
    // Technically this can have parameters, but they aren't useful to us.
    // So just check the magic number to ensure we're in the right place
    // and skip the rest of the line
    let mut frame_magic = [0u8; 5];
    self.inner.read_exact(&mut frame_magic)?;
    if frame_magic != Y4M_FRAME_MAGIC.as_bytes() {
      return Err(Error::Y4M("invalid frame header".to_string()));
    }

    while self.inner.read_u8()? != b'\n' {}

    let mut frame = Frame::new(self.width, self.height, self.chroma_format, self.bit_depth, align);
    for plane in frame.planes_mut() {
      plane.read_from(&mut self.inner)?;
    }

    return Ok(Box::new(frame));
  }
}

impl<W: Write> Y4MWriter<W> {
  pub fn new(mut inner: W, width: usize, height: usize, chroma_format: ChromaFormat, bit_depth: u32) -> Result<Self> {
    inner.write_all(Y4M_FILE_MAGIC.as_bytes())?;
    write!(inner, "W{} H{} F25:1 Ip A1:1 C{}\n", width, height, colorspace_tag(chroma_format, bit_depth))?;

    Ok(Y4MWriter {
      inner: inner,
      width: width,
      height: height,
      chroma_format: chroma_format,
      bit_depth: bit_depth
    })
  }

  pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
    assert!(frame.y().crop_width() == self.width);
    assert!(frame.y().crop_height() == self.height);
    assert!(frame.chroma_format() == self.chroma_format);
    assert!(frame.y().bit_depth() == self.bit_depth);

    self.inner.write_all(Y4M_FRAME_MAGIC.as_bytes())?;
    self.inner.write_u8(b'\n')?;

    for plane in frame.planes() {
      plane.write_to(&mut self.inner)?;
    }
    Ok(())
  }
}
