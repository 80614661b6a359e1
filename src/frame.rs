use std::io;
use std::io::prelude::*;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::array2d::Array2D;
use crate::enums::*;

pub struct Plane {
  // Pixel data
  // The width() / height() methods of this array give the padded size.
  // For the real size, use the .crop_width / .crop_height members below
  pixels: Array2D<u16>,

  crop_width: usize,
  crop_height: usize,
  bit_depth: u32
}

impl Plane {
  pub fn new(crop_width: usize, crop_height: usize, width: usize, height: usize, bit_depth: u32) -> Self {
    assert!(crop_width <= width && crop_height <= height);
    Self {
      pixels: Array2D::zeroed(height, width),
      crop_width: crop_width,
      crop_height: crop_height,
      bit_depth: bit_depth
    }
  }

  pub fn pixels(&self) -> &Array2D<u16> {
    &self.pixels
  }

  pub fn pixels_mut(&mut self) -> &mut Array2D<u16> {
    &mut self.pixels
  }

  pub fn width(&self) -> usize {
    self.pixels.cols()
  }

  pub fn height(&self) -> usize {
    self.pixels.rows()
  }

  pub fn crop_width(&self) -> usize {
    self.crop_width
  }

  pub fn crop_height(&self) -> usize {
    self.crop_height
  }

  pub fn bit_depth(&self) -> u32 {
    self.bit_depth
  }

  // Fill in the pixels outside the crop region, by copying the rightmost and
  // bottommost pixels from within the crop region
  // This *must* be called after any modification which may potentially affect
  // the last row/column of pixels, or which may disturb the padding region
  pub fn fill_padding(&mut self) {
    let crop_width = self.crop_width;
    let crop_height = self.crop_height;
    let width = self.width();
    let height = self.height();

    for row in 0..crop_height {
      let rightmost_pixel = self.pixels[row][crop_width - 1];
      self.pixels[row][crop_width .. width].fill(rightmost_pixel);
    }

    for row in crop_height .. height {
      for col in 0 .. width {
        self.pixels[row][col] = self.pixels[crop_height - 1][col];
      }
    }
  }

  // Samples are stored as single bytes up to 8 bits, otherwise
  // as little-endian 16-bit words
  pub fn read_from<R: Read>(&mut self, r: &mut R) -> Result<(), io::Error> {
    for row in 0 .. self.crop_height {
      let dst = &mut self.pixels[row][0 .. self.crop_width];
      if self.bit_depth <= 8 {
        for px in dst.iter_mut() {
          *px = r.read_u8()? as u16;
        }
      } else {
        r.read_u16_into::<LittleEndian>(dst)?;
      }
    }
    self.fill_padding();
    Ok(())
  }

  pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), io::Error> {
    for row in 0 .. self.crop_height {
      for &px in &self.pixels[row][0 .. self.crop_width] {
        if self.bit_depth <= 8 {
          w.write_u8(px as u8)?;
        } else {
          w.write_u16::<LittleEndian>(px)?;
        }
      }
    }
    Ok(())
  }
}

pub struct Frame {
  chroma_format: ChromaFormat,
  planes: Vec<Plane>
}

impl Frame {
  // The padded size of the luma plane is rounded up to a multiple of `align`,
  // so that the picture can be tiled exactly by blocks of that size
  pub fn new(y_crop_width: usize, y_crop_height: usize, chroma_format: ChromaFormat,
             bit_depth: u32, align: usize) -> Self {
    let y_width = y_crop_width.next_multiple_of(align);
    let y_height = y_crop_height.next_multiple_of(align);

    let mut planes = Vec::with_capacity(3);
    for &comp in &ComponentID::ALL[.. chroma_format.num_components()] {
      let (sx, sy) = chroma_format.scale(comp);
      let crop_width = (y_crop_width + (1 << sx) - 1) >> sx;
      let crop_height = (y_crop_height + (1 << sy) - 1) >> sy;
      planes.push(Plane::new(crop_width, crop_height, y_width >> sx, y_height >> sy, bit_depth));
    }

    Self {
      chroma_format: chroma_format,
      planes: planes
    }
  }

  pub fn chroma_format(&self) -> ChromaFormat {
    self.chroma_format
  }

  pub fn plane(&self, comp: ComponentID) -> &Plane {
    &self.planes[comp.idx()]
  }

  pub fn plane_mut(&mut self, comp: ComponentID) -> &mut Plane {
    &mut self.planes[comp.idx()]
  }

  pub fn y(&self) -> &Plane {
    &self.planes[0]
  }

  pub fn y_mut(&mut self) -> &mut Plane {
    &mut self.planes[0]
  }

  pub fn planes(&self) -> &[Plane] {
    &self.planes
  }

  pub fn planes_mut(&mut self) -> &mut [Plane] {
    &mut self.planes
  }
}
