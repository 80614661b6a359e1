// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Reference sample construction: gather the row above and the column to the
// left of a block, pad whatever is missing, and optionally smooth the result

use bytemuck::allocation::zeroed_slice_box;

use crate::array2d::Array2D;
use crate::consts::*;
use crate::neighbors::NeighborFlags;

// Which of the two reference lines to address
pub const TOP: usize = 0;
pub const LEFT: usize = 1;

// One block's reference samples: a top line and a left line which share
// their first sample (the above-left corner)
//
// at(i, TOP) is the sample above column i - 1 - multi_ref_idx of the block
// and at(i, LEFT) the sample left of row i - 1 - multi_ref_idx, so that
// index 0 is the corner on both lines
#[derive(Clone)]
pub struct RefLine {
  data: Box<[u16]>,
  top_len: usize,
  left_len: usize,
  multi_ref_idx: usize,
}

impl RefLine {
  pub fn new() -> Self {
    Self {
      data: zeroed_slice_box(2 * MAX_REF_LINE_LEN),
      top_len: 0,
      left_len: 0,
      multi_ref_idx: 0
    }
  }

  fn reset(&mut self, width: usize, height: usize, multi_ref_idx: usize) {
    assert!(width <= MAX_CU_SIZE && height <= MAX_CU_SIZE);
    assert!(multi_ref_idx < MAX_REF_LINE_IDX);
    self.top_len = 2 * width;
    self.left_len = 2 * height;
    self.multi_ref_idx = multi_ref_idx;
  }

  // Nominal reference lengths, not counting the corner or line offset
  pub fn top_len(&self) -> usize {
    self.top_len
  }

  pub fn left_len(&self) -> usize {
    self.left_len
  }

  pub fn multi_ref_idx(&self) -> usize {
    self.multi_ref_idx
  }

  // Number of valid entries on a given line
  pub fn line_len(&self, line: usize) -> usize {
    match line {
      TOP => self.top_len + self.multi_ref_idx + 1,
      LEFT => self.left_len + self.multi_ref_idx + 1,
      _ => panic!("Reference line index {} out of range", line)
    }
  }

  pub fn at(&self, i: usize, line: usize) -> i32 {
    let len = self.line_len(line);
    if i >= len {
      panic!("Reference sample index out of bounds (index {} vs. length {})", i, len);
    }
    self.data[line * MAX_REF_LINE_LEN + i] as i32
  }

  pub fn line(&self, line: usize) -> &[u16] {
    let len = self.line_len(line);
    &self.data[line * MAX_REF_LINE_LEN .. line * MAX_REF_LINE_LEN + len]
  }

  fn line_mut(&mut self, line: usize) -> &mut [u16] {
    let len = self.line_len(line);
    &mut self.data[line * MAX_REF_LINE_LEN .. line * MAX_REF_LINE_LEN + len]
  }

  pub fn top(&self) -> &[u16] {
    self.line(TOP)
  }

  pub fn left(&self) -> &[u16] {
    self.line(LEFT)
  }

  // Fill the reference lines of the width x height block at (x0, y0) from
  // `src`, which is the reconstructed picture when predicting normally or
  // the original picture when the selector searches on source samples
  //
  // Units marked unavailable in `flags` are never read from `src`. They
  // are padded from their neighbors in the scan order of
  // NeighborFlags::scan_order(): every unit before the first available one
  // copies that unit's first sample, and each later gap repeats the last
  // sample preceding it
  //
  // (x0, y0) must lie on the 4-sample grid checked by
  // PredictionBlock::check_geometry(). Off the grid, an available above-left
  // unit does not guarantee that the offset line lies inside the picture
  pub fn fill(&mut self, src: &Array2D<u16>, x0: usize, y0: usize, width: usize, height: usize,
              flags: &NeighborFlags, bit_depth: u32, multi_ref_idx: usize) {
    self.reset(width, height, multi_ref_idx);
    let layout = flags.layout;
    debug_assert!(layout.top_len == self.top_len && layout.left_len == self.left_len);

    let mrl = multi_ref_idx;
    let top_count = self.line_len(TOP);
    let left_count = self.line_len(LEFT);

    if flags.none_available() {
      let value_dc = 1u16 << (bit_depth - 1);
      self.line_mut(TOP).fill(value_dc);
      self.line_mut(LEFT).fill(value_dc);
      return;
    }

    // Picture coordinates of index 0 on both lines. These are negative on
    // the picture edges, where the corresponding units are never available
    let origin_x = x0 as isize - 1 - mrl as isize;
    let origin_y = y0 as isize - 1 - mrl as isize;
    let px = |i: usize| (origin_x + i as isize) as usize;
    let py = |i: usize| (origin_y + i as isize) as usize;

    if flags.all_available() {
      let row = &src[py(0)][px(0) .. px(top_count)];
      self.line_mut(TOP).copy_from_slice(row);
      for i in 0..left_count {
        self.data[MAX_REF_LINE_LEN + i] = src[py(i)][px(0)];
      }
      return;
    }

    // Copy whatever is available
    let (uw, uh) = (layout.unit_width, layout.unit_height);
    let scan = flags.scan_order();
    let total_left = layout.total_left();
    let total_units = layout.total_units();

    if flags.above_left {
      for i in 0..=mrl {
        self.data[i] = src[py(0)][px(i)];
        self.data[MAX_REF_LINE_LEN + i] = src[py(i)][px(0)];
      }
    }

    for k in 0..total_left {
      if scan[total_left - 1 - k] {
        let start = 1 + mrl + k * uh;
        let end = (start + uh).min(left_count);
        for i in start..end {
          self.data[MAX_REF_LINE_LEN + i] = src[py(i)][px(0)];
        }
      }
    }

    for k in 0..layout.total_above() {
      if scan[total_left + 1 + k] {
        let start = 1 + mrl + k * uw;
        let end = (start + uw).min(top_count);
        self.data[start .. end].copy_from_slice(&src[py(0)][px(start) .. px(end)]);
      }
    }

    // Pad everything before the first available unit with its first sample
    let mut last_avail = 0;
    if !scan[0] {
      let first_avail = (1..total_units).find(|&u| scan[u]).unwrap_or(total_units);
      debug_assert!(first_avail < total_units);

      let first_sample = if first_avail < total_left {
        let row = (total_left - first_avail) * uh + mrl;
        let row = row.min(left_count - 1);
        let value = self.data[MAX_REF_LINE_LEN + row];
        self.data[MAX_REF_LINE_LEN + row + 1 .. MAX_REF_LINE_LEN + left_count].fill(value);
        value
      } else if first_avail == total_left {
        let value = self.data[MAX_REF_LINE_LEN + mrl];
        self.data[MAX_REF_LINE_LEN + mrl + 1 .. MAX_REF_LINE_LEN + left_count].fill(value);
        value
      } else {
        let col = (first_avail - total_left - 1) * uw + 1 + mrl;
        let value = self.data[col];
        self.data[MAX_REF_LINE_LEN .. MAX_REF_LINE_LEN + left_count].fill(value);
        self.data[0 .. col].fill(value);
        value
      };
      log::trace!("reference padding starts at unit {} with value {}", first_avail, first_sample);
      last_avail = first_avail;
    }

    // Then fill each later gap with the sample just before it in scan order
    for curr in last_avail + 1 .. total_units {
      if scan[curr] {
        continue;
      }
      // Units are filled in order, so curr - 1 always holds valid samples
      let prev = curr - 1;
      if curr < total_left {
        // Moving up the left line: repeat the top sample of the unit below
        let prev_top = (total_left - prev - 1) * uh + mrl + 1;
        let value = self.data[MAX_REF_LINE_LEN + prev_top];
        self.data[MAX_REF_LINE_LEN + prev_top - uh .. MAX_REF_LINE_LEN + prev_top].fill(value);
      } else if curr == total_left {
        let value = self.data[MAX_REF_LINE_LEN + mrl + 1];
        self.data[MAX_REF_LINE_LEN .. MAX_REF_LINE_LEN + mrl + 1].fill(value);
        self.data[0 .. mrl + 1].fill(value);
      } else {
        let prev_last = (prev - total_left) * uw + mrl;
        let value = self.data[prev_last];
        let end = (prev_last + 1 + uw).min(top_count);
        self.data[prev_last + 1 .. end].fill(value);
      }
    }
  }

  // Apply the [1, 2, 1] / 4 smoothing filter along both lines of `src`,
  // keeping the far end samples and averaging the 2x2 samples around the
  // corner
  pub fn filter_from(&mut self, src: &RefLine) {
    self.top_len = src.top_len;
    self.left_len = src.left_len;
    self.multi_ref_idx = src.multi_ref_idx;

    let corner = (src.at(0, TOP) + src.at(1, TOP) + src.at(0, LEFT) + src.at(1, LEFT) + 2) >> 2;

    for line in [TOP, LEFT] {
      let input = src.line(line);
      let last = input.len() - 1;
      let output = self.line_mut(line);
      output[0] = corner as u16;
      for i in 1..last {
        let sum = input[i - 1] as u32 + 2 * input[i] as u32 + input[i + 1] as u32;
        output[i] = ((sum + 2) >> 2) as u16;
      }
      output[last] = input[last];
    }
  }
}
