// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Neighbor availability: which fixed-size units around a block have already
// been decoded and can therefore supply reference samples

use arrayvec::ArrayVec;

use crate::array2d::Array2D;
use crate::consts::*;
use crate::enums::*;

// Upper bound on the number of units along one side (top or left) of the
// reference area, which spans twice the block size
pub const MAX_NEIGHBOR_UNITS: usize = MAX_CU_SIZE;

// Anything that can answer "has the sample at (x, y) been reconstructed yet?"
// Coordinates are in samples of the queried channel and may be negative;
// positions outside the picture must report false
pub trait NeighborAvailability {
  fn is_available(&self, x: isize, y: isize, ch: ChannelType) -> bool;
}

// Unit-granular record of decoded areas, one grid per channel type
pub struct DecodedMap {
  grids: [Array2D<bool>; 2],
  unit_size: [(usize, usize); 2],
  dims: [(usize, usize); 2],
}

impl DecodedMap {
  // `dims` and `unit_size` are (width, height) in samples of each channel type
  pub fn new(dims: [(usize, usize); 2], unit_size: [(usize, usize); 2]) -> Self {
    let grid = |i: usize| {
      let (w, h) = dims[i];
      let (uw, uh) = unit_size[i];
      Array2D::zeroed(h.div_ceil(uh), w.div_ceil(uw))
    };
    Self {
      grids: [grid(0), grid(1)],
      unit_size: unit_size,
      dims: dims
    }
  }

  pub fn mark_decoded(&mut self, ch: ChannelType, x0: usize, y0: usize, width: usize, height: usize) {
    let (uw, uh) = self.unit_size[ch.idx()];
    let grid = &mut self.grids[ch.idx()];
    let col_end = (x0 + width).div_ceil(uw).min(grid.cols());
    let row_end = (y0 + height).div_ceil(uh).min(grid.rows());
    for row in y0 / uh .. row_end {
      for col in x0 / uw .. col_end {
        grid[row][col] = true;
      }
    }
  }

  pub fn clear(&mut self) {
    for grid in self.grids.iter_mut() {
      grid.fill_with(|_, _| false);
    }
  }
}

impl NeighborAvailability for DecodedMap {
  fn is_available(&self, x: isize, y: isize, ch: ChannelType) -> bool {
    let (w, h) = self.dims[ch.idx()];
    if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
      return false;
    }
    let (uw, uh) = self.unit_size[ch.idx()];
    self.grids[ch.idx()][y as usize / uh][x as usize / uw]
  }
}

// Unit counts for the reference area of one block
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitLayout {
  pub unit_width: usize,
  pub unit_height: usize,
  pub num_above: usize,
  pub num_above_right: usize,
  pub num_left: usize,
  pub num_below_left: usize,
  // The top reference spans 2 * width samples, the left 2 * height
  pub top_len: usize,
  pub left_len: usize,
}

impl UnitLayout {
  pub fn new(width: usize, height: usize, unit_width: usize, unit_height: usize) -> Self {
    let top_len = 2 * width;
    let left_len = 2 * height;
    let total_above = top_len.div_ceil(unit_width);
    let total_left = left_len.div_ceil(unit_height);
    let num_above = (width / unit_width).max(1);
    let num_left = (height / unit_height).max(1);
    assert!(total_above > num_above && total_left > num_left, "block size {}x{} not supported", width, height);
    assert!(total_above <= MAX_NEIGHBOR_UNITS && total_left <= MAX_NEIGHBOR_UNITS);

    Self {
      unit_width: unit_width,
      unit_height: unit_height,
      num_above: num_above,
      num_above_right: total_above - num_above,
      num_left: num_left,
      num_below_left: total_left - num_left,
      top_len: top_len,
      left_len: left_len
    }
  }

  pub fn total_above(&self) -> usize {
    self.num_above + self.num_above_right
  }

  pub fn total_left(&self) -> usize {
    self.num_left + self.num_below_left
  }

  // Including the above-left corner unit
  pub fn total_units(&self) -> usize {
    self.total_above() + self.total_left() + 1
  }
}

// Per-unit availability of the five neighbor regions of a block
// Each region's flags run outward from the corner: left to right along the
// top, top to bottom down the left side
#[derive(Clone, Debug)]
pub struct NeighborFlags {
  pub layout: UnitLayout,
  pub above_left: bool,
  pub above: ArrayVec<bool, MAX_NEIGHBOR_UNITS>,
  pub above_right: ArrayVec<bool, MAX_NEIGHBOR_UNITS>,
  pub left: ArrayVec<bool, MAX_NEIGHBOR_UNITS>,
  pub below_left: ArrayVec<bool, MAX_NEIGHBOR_UNITS>,
}

fn count(flags: &[bool]) -> usize {
  flags.iter().filter(|&&f| f).count()
}

impl NeighborFlags {
  pub fn num_available(&self) -> usize {
    self.above_left as usize
      + count(&self.above) + count(&self.above_right)
      + count(&self.left) + count(&self.below_left)
  }

  pub fn none_available(&self) -> bool {
    self.num_available() == 0
  }

  pub fn all_available(&self) -> bool {
    self.num_available() == self.layout.total_units()
  }

  // Flags for every unit in padding scan order: from the bottom of the
  // below-left region up the left side, through the corner, then along
  // the top towards the above-right end
  // The corner ends up at index layout.total_left()
  pub fn scan_order(&self) -> ArrayVec<bool, { 4 * MAX_NEIGHBOR_UNITS + 1 }> {
    let mut flags = ArrayVec::new();
    flags.extend(self.below_left.iter().rev().copied());
    flags.extend(self.left.iter().rev().copied());
    flags.push(self.above_left);
    flags.extend(self.above.iter().copied());
    flags.extend(self.above_right.iter().copied());
    flags
  }
}

// Probe `count` units starting at (x, y), stepping by (dx, dy), stopping
// at the first unavailable one
// Returns the number of available units; the remaining flags stay false
fn probe_run<A: NeighborAvailability + ?Sized>(avail: &A, ch: ChannelType, x: isize, y: isize,
                                               dx: isize, dy: isize, count: usize,
                                               flags: &mut ArrayVec<bool, MAX_NEIGHBOR_UNITS>) -> usize {
  flags.clear();
  flags.extend(std::iter::repeat(false).take(count));
  for i in 0..count {
    if !avail.is_available(x + dx * i as isize, y + dy * i as isize, ch) {
      return i;
    }
    flags[i] = true;
  }
  count
}

// Classify the neighbor units of the width x height block at (x0, y0)
pub fn resolve_neighbors<A: NeighborAvailability + ?Sized>(avail: &A, ch: ChannelType,
                                                           x0: usize, y0: usize, width: usize, height: usize,
                                                           unit_width: usize, unit_height: usize) -> NeighborFlags {
  let layout = UnitLayout::new(width, height, unit_width, unit_height);
  let (x, y) = (x0 as isize, y0 as isize);
  let (uw, uh) = (unit_width as isize, unit_height as isize);

  let mut flags = NeighborFlags {
    layout: layout,
    above_left: avail.is_available(x - 1, y - 1, ch),
    above: ArrayVec::new(),
    above_right: ArrayVec::new(),
    left: ArrayVec::new(),
    below_left: ArrayVec::new()
  };

  let num_above = probe_run(avail, ch, x, y - 1, uw, 0, layout.num_above, &mut flags.above);
  if num_above == layout.num_above {
    probe_run(avail, ch, x + width as isize, y - 1, uw, 0, layout.num_above_right, &mut flags.above_right);
  } else {
    flags.above_right.extend(std::iter::repeat(false).take(layout.num_above_right));
  }

  let num_left = probe_run(avail, ch, x - 1, y, 0, uh, layout.num_left, &mut flags.left);
  if num_left == layout.num_left {
    probe_run(avail, ch, x - 1, y + height as isize, 0, uh, layout.num_below_left, &mut flags.below_left);
  } else {
    flags.below_left.extend(std::iter::repeat(false).take(layout.num_below_left));
  }

  flags
}

#[cfg(test)]
mod test {
  use super::*;

  fn luma_map(width: usize, height: usize) -> DecodedMap {
    DecodedMap::new([(width, height), (width / 2, height / 2)], [(4, 4), (2, 2)])
  }

  #[test]
  fn picture_corner_has_no_neighbors() {
    let map = luma_map(64, 64);
    let flags = resolve_neighbors(&map, ChannelType::Luma, 0, 0, 8, 8, 4, 4);
    assert!(flags.none_available());
    assert_eq!(flags.layout.total_units(), 9);
  }

  #[test]
  fn interior_block_with_decoded_surroundings() {
    let mut map = luma_map(64, 64);
    // Everything above, and the left column down to the block's bottom edge
    map.mark_decoded(ChannelType::Luma, 0, 0, 64, 16);
    map.mark_decoded(ChannelType::Luma, 0, 16, 16, 16);

    let flags = resolve_neighbors(&map, ChannelType::Luma, 16, 16, 16, 16, 4, 4);
    assert!(flags.above_left);
    assert_eq!(&flags.above[..], &[true; 4]);
    assert_eq!(&flags.above_right[..], &[true; 4]);
    assert_eq!(&flags.left[..], &[true; 4]);
    assert_eq!(&flags.below_left[..], &[false; 4]);
    assert_eq!(flags.num_available(), 13);
  }

  #[test]
  fn above_right_not_probed_unless_above_complete() {
    let mut map = luma_map(64, 64);
    map.mark_decoded(ChannelType::Luma, 0, 0, 20, 16);
    // A decoded island above-right that must not be reported
    map.mark_decoded(ChannelType::Luma, 32, 0, 16, 16);

    let flags = resolve_neighbors(&map, ChannelType::Luma, 16, 16, 16, 16, 4, 4);
    assert_eq!(&flags.above[..], &[true, false, false, false]);
    assert_eq!(&flags.above_right[..], &[false; 4]);
  }

  #[test]
  fn scan_order_puts_corner_between_left_and_top() {
    let mut map = luma_map(32, 32);
    map.mark_decoded(ChannelType::Luma, 0, 0, 4, 32);
    let flags = resolve_neighbors(&map, ChannelType::Luma, 4, 4, 4, 4, 4, 4);
    // below-left, left, corner, above, above-right
    assert_eq!(&flags.scan_order()[..], &[true, true, true, false, false]);
  }

  #[test]
  fn out_of_picture_is_unavailable() {
    let mut map = luma_map(16, 16);
    map.mark_decoded(ChannelType::Luma, 0, 0, 16, 16);
    assert!(!map.is_available(-1, 0, ChannelType::Luma));
    assert!(!map.is_available(16, 3, ChannelType::Luma));
    assert!(map.is_available(15, 15, ChannelType::Luma));
    assert!(!map.is_available(0, 0, ChannelType::Chroma));
  }
}
