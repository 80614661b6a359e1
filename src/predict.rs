// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Intra prediction kernels: Planar, DC, angular (with boundary correction)
// and BDPCM, plus the per-session predictor context that owns all scratch

use bytemuck::allocation::zeroed_slice_box;

use crate::array2d::Array2D;
use crate::config::SequenceParams;
use crate::consts::*;
use crate::enums::*;
use crate::neighbors::{resolve_neighbors, NeighborAvailability};
use crate::params::*;
use crate::refs::*;
use crate::util::*;

pub const UNFILTERED: usize = 0;
pub const FILTERED: usize = 1;

// Working storage shared by all kernels, allocated once at the largest
// block size and never resized
pub struct KernelScratch {
  pub(crate) top_row: Box<[i32]>,
  pub(crate) left_column: Box<[i32]>,
  pub(crate) bottom_row: Box<[i32]>,
  pub(crate) right_column: Box<[i32]>,
  // Extended main and side reference lines for angular prediction
  pub(crate) ref_main: Box<[i32]>,
  pub(crate) ref_side: Box<[i32]>,
  // Horizontal modes are predicted transposed into here
  pub(crate) temp: Array2D<u16>,
}

impl KernelScratch {
  pub fn new() -> Self {
    Self {
      top_row: zeroed_slice_box(MAX_CU_SIZE + 1),
      left_column: zeroed_slice_box(MAX_CU_SIZE + 1),
      bottom_row: zeroed_slice_box(MAX_CU_SIZE),
      right_column: zeroed_slice_box(MAX_CU_SIZE),
      ref_main: zeroed_slice_box(2 * MAX_REF_LINE_LEN),
      ref_side: zeroed_slice_box(2 * MAX_REF_LINE_LEN),
      temp: Array2D::zeroed(MAX_CU_SIZE, MAX_CU_SIZE)
    }
  }
}

// Predictor state for one coding session
//
// Holds the reference lines of the block most recently prepared for each
// component, the parameters derived for it, and the kernel scratch. A
// prediction call overwrites everything it reads, so nothing carries over
// between blocks, but two predictions must not share one context at once
pub struct IntraPredictor {
  pub(crate) refs: [[RefLine; 2]; 3],
  pub(crate) params: ModeParameters,
  pub(crate) scratch: KernelScratch,
}

impl IntraPredictor {
  pub fn new() -> Self {
    Self {
      refs: std::array::from_fn(|_| [RefLine::new(), RefLine::new()]),
      params: ModeParameters::default(),
      scratch: KernelScratch::new()
    }
  }

  pub fn ref_line(&self, comp: ComponentID, which: usize) -> &RefLine {
    &self.refs[comp.idx()][which]
  }

  pub fn params(&self) -> &ModeParameters {
    &self.params
  }

  // Derive the mode parameters for `block` and build its reference lines
  // from `picture`. The smoothed copy is only produced when the derived
  // parameters ask for it
  pub fn prepare<A: NeighborAvailability + ?Sized>(&mut self, picture: &Array2D<u16>, avail: &A,
                                                   block: &PredictionBlock, info: &IntraCodingInfo,
                                                   sps: &SequenceParams) {
    block.check_geometry();
    self.params = ModeParameters::derive(block, info, sps);
    self.fill_references(picture, avail, block, sps);
    if self.params.ref_filter_flag {
      let [unfiltered, filtered] = &mut self.refs[block.comp.idx()];
      filtered.filter_from(unfiltered);
    }
  }

  // Build only the unfiltered reference lines, as used by the ring selector
  pub fn prepare_unfiltered<A: NeighborAvailability + ?Sized>(&mut self, picture: &Array2D<u16>, avail: &A,
                                                              block: &PredictionBlock, sps: &SequenceParams) {
    block.check_geometry();
    self.fill_references(picture, avail, block, sps);
  }

  fn fill_references<A: NeighborAvailability + ?Sized>(&mut self, picture: &Array2D<u16>, avail: &A,
                                                       block: &PredictionBlock, sps: &SequenceParams) {
    let (unit_width, unit_height) = sps.unit_size(block.comp, block.width);
    let flags = resolve_neighbors(avail, block.channel_type(), block.x, block.y,
                                  block.width, block.height, unit_width, unit_height);
    self.refs[block.comp.idx()][UNFILTERED].fill(picture, block.x, block.y, block.width, block.height,
                                                 &flags, block.bit_depth, block.multi_ref_idx);
  }

  // Predict `block` into the top-left width x height region of `dst`
  // Must follow prepare() for the same block and coding info
  pub fn predict(&mut self, block: &PredictionBlock, info: &IntraCodingInfo, dst: &mut Array2D<u16>) {
    block.check_geometry();
    assert!(!info.mip, "Matrix-based prediction is not handled by the angular predictor");

    let params = self.params;
    let which = if params.ref_filter_flag { FILTERED } else { UNFILTERED };
    let refs = &self.refs[block.comp.idx()][which];
    let (width, height) = (block.width, block.height);

    if info.bdpcm != BdpcmDir::Off {
      pred_bdpcm(refs, width, height, info.bdpcm, dst);
      return;
    }

    match info.mode {
      PLANAR_IDX => pred_planar(refs, width, height, &mut self.scratch, dst),
      DC_IDX => pred_dc(refs, width, height, params.multi_ref_idx, dst),
      _ => pred_angular(refs, width, height, block.channel_type(), &params, block.bit_depth,
                        &mut self.scratch, dst)
    }

    if params.apply_pdpc && (info.mode == PLANAR_IDX || info.mode == DC_IDX) {
      planar_dc_pdpc(refs, width, height, dst);
    }
  }
}

// Average of the longer reference side, or of both sides for square blocks,
// divided by shifting
pub fn dc_value(refs: &RefLine, width: usize, height: usize, multi_ref_idx: usize) -> i32 {
  let denom = if width == height { width << 1 } else { width.max(height) };
  let div_shift = floor_log2(denom);
  let div_offset = (denom >> 1) as i32;

  let mut sum = 0;
  if width >= height {
    for idx in 0..width {
      sum += refs.at(multi_ref_idx + 1 + idx, TOP);
    }
  }
  if width <= height {
    for idx in 0..height {
      sum += refs.at(multi_ref_idx + 1 + idx, LEFT);
    }
  }
  (sum + div_offset) >> div_shift
}

pub fn pred_dc(refs: &RefLine, width: usize, height: usize, multi_ref_idx: usize, dst: &mut Array2D<u16>) {
  let dc = dc_value(refs, width, height, multi_ref_idx);
  dst.fill_region(0, 0, height, width, &(dc as u16));
}

pub fn pred_planar(refs: &RefLine, width: usize, height: usize, scratch: &mut KernelScratch,
                   dst: &mut Array2D<u16>) {
  let log2_w = floor_log2(width);
  let log2_h = floor_log2(height);

  let top_row = &mut scratch.top_row;
  let left_column = &mut scratch.left_column;
  let bottom_row = &mut scratch.bottom_row;
  let right_column = &mut scratch.right_column;

  for k in 0..=width {
    top_row[k] = refs.at(k + 1, TOP);
  }
  for k in 0..=height {
    left_column[k] = refs.at(k + 1, LEFT);
  }

  let bottom_left = left_column[height];
  let top_right = top_row[width];

  for k in 0..width {
    bottom_row[k] = bottom_left - top_row[k];
    top_row[k] <<= log2_h;
  }
  for k in 0..height {
    right_column[k] = top_right - left_column[k];
    left_column[k] <<= log2_w;
  }

  // The final blend can exceed 32 bits at 16-bit depth
  let offset = 1i64 << (log2_w + log2_h);
  let final_shift = 1 + log2_w + log2_h;
  for y in 0..height {
    let mut hor_pred = left_column[y];
    for x in 0..width {
      hor_pred += right_column[y];
      top_row[x] += bottom_row[x];
      let vert_pred = top_row[x];
      let val = ((hor_pred as i64) << log2_h) + ((vert_pred as i64) << log2_w) + offset;
      dst[y][x] = (val >> final_shift) as u16;
    }
  }
}

// Boundary correction for Planar and DC: pull samples near the top and left
// edges towards the reference sample in line with them
fn planar_dc_pdpc(refs: &RefLine, width: usize, height: usize, dst: &mut Array2D<u16>) {
  let scale = (floor_log2(width) - 2 + floor_log2(height) - 2 + 2) >> 2;
  debug_assert!(scale <= 31);

  for y in 0..height {
    let w_t = 32 >> 31.min((y << 1) >> scale);
    let left = refs.at(y + 1, LEFT);
    for x in 0..width {
      let w_l = 32 >> 31.min((x << 1) >> scale);
      let top = refs.at(x + 1, TOP);
      let val = dst[y][x] as i32;
      dst[y][x] = (val + ((w_l * (left - val) + w_t * (top - val) + 32) >> 6)) as u16;
    }
  }
}

// 4-tap filter weights for one fractional position
pub fn interpolation_taps(delta_fract: i32, smoothing: bool) -> [i32; 4] {
  if smoothing {
    [16 - (delta_fract >> 1), 32 - (delta_fract >> 1), 16 + (delta_fract >> 1), delta_fract >> 1]
  } else {
    intra_cubic_filter[delta_fract as usize]
  }
}

pub fn pred_angular(refs: &RefLine, width: usize, height: usize, ch: ChannelType, params: &ModeParameters,
                    bit_depth: u32, scratch: &mut KernelScratch, dst: &mut Array2D<u16>) {
  let is_ver = params.is_mode_ver;
  let mrl = params.multi_ref_idx;
  let angle = params.intra_pred_angle;
  let inv_angle = params.abs_inv_angle;

  let KernelScratch { ref_main, ref_side, temp, .. } = scratch;

  // Work along the main direction: `w` samples per line, `h` lines
  let (main_line, side_line) = if is_ver { (TOP, LEFT) } else { (LEFT, TOP) };
  let (w, h) = if is_ver { (width, height) } else { (height, width) };

  // Index of reference position 0 within ref_main / ref_side
  let (mut main_origin, mut side_origin);
  if angle < 0 {
    main_origin = h;
    side_origin = w;
    for k in 0..=w + 1 + mrl {
      ref_main[main_origin + k] = refs.at(k, main_line);
    }
    for k in 0..=h + 1 + mrl {
      ref_side[side_origin + k] = refs.at(k, side_line);
    }
    // Project the side line onto the main line, beyond the corner
    for k in 1..=h {
      let side_idx = ((k as i32 * inv_angle + 256) >> 9).min(h as i32) as usize;
      ref_main[main_origin - k] = ref_side[side_origin + side_idx];
    }
  } else {
    main_origin = 0;
    side_origin = 0;
    let main_len = 2 * w;
    for k in 0..=main_len + mrl {
      ref_main[k] = refs.at(k, main_line);
    }
    for k in 0..=2 * h + mrl {
      ref_side[k] = refs.at(k, side_line);
    }
    // Extend past the far end by replication
    let s = (floor_log2(w) as i32 - floor_log2(h) as i32).max(0);
    let max_index = (mrl << s) + 2;
    let val = ref_main[main_len + mrl];
    ref_main[main_len + mrl + 1 ..= main_len + mrl + max_index].fill(val);
  }

  // Compensate for the line offset
  main_origin += mrl;
  side_origin += mrl;

  let out: &mut Array2D<u16> = if is_ver { &mut *dst } else { &mut *temp };
  let main_at = |k: i32| ref_main[(main_origin as i32 + k) as usize];

  if angle == 0 {
    let scale = ((floor_log2(w) + floor_log2(h)) as i32 - 2) >> 2;
    let top_left = main_at(0);
    for y in 0..h {
      for x in 0..w {
        out[y][x] = main_at(x as i32 + 1) as u16;
      }
      if params.apply_pdpc {
        let left = ref_side[side_origin + 1 + y];
        for x in 0..(3usize << scale).min(w) {
          let w_l = 32 >> ((2 * x as i32) >> scale);
          let val = out[y][x] as i32;
          out[y][x] = clip_pel(val + ((w_l * (left - top_left) + 32) >> 6), bit_depth) as u16;
        }
      }
    }
  } else {
    let integer_slope = is_integer_slope(angle.abs());
    let mut delta_pos = angle * (1 + mrl as i32);
    for y in 0..h {
      let delta_int = delta_pos >> 5;
      let delta_fract = delta_pos & 31;

      if integer_slope {
        for x in 0..w {
          out[y][x] = main_at(x as i32 + delta_int + 1) as u16;
        }
      } else if ch.is_luma() {
        let f = interpolation_taps(delta_fract, params.interpolation_flag);
        for x in 0..w {
          let base = delta_int + x as i32;
          let val = f[0] * main_at(base) + f[1] * main_at(base + 1)
                  + f[2] * main_at(base + 2) + f[3] * main_at(base + 3);
          out[y][x] = clip_pel((val + 32) >> 6, bit_depth) as u16;
        }
      } else {
        // Linear interpolation between the two nearest samples
        for x in 0..w {
          let p0 = main_at(delta_int + x as i32 + 1);
          let p1 = main_at(delta_int + x as i32 + 2);
          out[y][x] = (p0 + ((delta_fract * (p1 - p0) + 16) >> 5)) as u16;
        }
      }

      if params.apply_pdpc {
        let scale = params.angular_scale;
        let mut inv_angle_sum = 256;
        for x in 0..(3usize << scale).min(w) {
          inv_angle_sum += inv_angle;
          let w_l = 32 >> ((2 * x as i32) >> scale);
          let left = ref_side[side_origin + y + (inv_angle_sum >> 9) as usize + 1];
          let val = out[y][x] as i32;
          out[y][x] = (val + ((w_l * (left - val) + 32) >> 6)) as u16;
        }
      }
      delta_pos += angle;
    }
  }

  // Flip the block if this is a horizontal mode
  if !is_ver {
    for y in 0..h {
      for x in 0..w {
        dst[x][y] = temp[y][x];
      }
    }
  }
}

// Copy one reference line straight across the block
pub fn pred_bdpcm(refs: &RefLine, width: usize, height: usize, dir: BdpcmDir, dst: &mut Array2D<u16>) {
  match dir {
    BdpcmDir::Hor => {
      for y in 0..height {
        let val = refs.at(y + 1, LEFT) as u16;
        dst[y][0 .. width].fill(val);
      }
    },
    BdpcmDir::Ver => {
      let top = &refs.top()[1 ..= width];
      for y in 0..height {
        dst[y][0 .. width].copy_from_slice(top);
      }
    },
    BdpcmDir::Off => panic!("Incorrect BDPCM mode parameter")
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::neighbors::DecodedMap;

  fn full_map(width: usize, height: usize) -> DecodedMap {
    let mut map = DecodedMap::new([(width, height), (width / 2, height / 2)], [(4, 4), (2, 2)]);
    map.mark_decoded(ChannelType::Luma, 0, 0, width, height);
    map.mark_decoded(ChannelType::Chroma, 0, 0, width / 2, height / 2);
    map
  }

  fn predict(picture: &Array2D<u16>, avail: &DecodedMap, block: &PredictionBlock,
             info: &IntraCodingInfo, sps: &SequenceParams) -> (Array2D<u16>, IntraPredictor) {
    let mut ip = IntraPredictor::new();
    let mut dst = Array2D::zeroed(block.height, block.width);
    ip.prepare(picture, avail, block, info, sps);
    ip.predict(block, info, &mut dst);
    (dst, ip)
  }

  fn assert_uniform(dst: &Array2D<u16>, value: u16) {
    for y in 0..dst.rows() {
      assert!(dst[y].iter().all(|&v| v == value), "row {} = {:?}", y, &dst[y]);
    }
  }

  #[test]
  fn flat_dc_stays_flat() {
    let picture = Array2D::new_with(32, 32, |_, _| 128u16);
    let map = full_map(32, 32);
    let block = PredictionBlock::new(ComponentID::Y, 8, 8, 8, 8, 8);
    let (dst, _) = predict(&picture, &map, &block, &IntraCodingInfo::with_mode(DC_IDX), &SequenceParams::default());
    assert_uniform(&dst, 128);
  }

  #[test]
  fn no_neighbors_predicts_mid_grey() {
    let picture = Array2D::new_with(16, 16, |i, j| (i * 16 + j) as u16);
    let map = DecodedMap::new([(16, 16), (8, 8)], [(4, 4), (2, 2)]);
    let sps = SequenceParams { bit_depth_luma: 10, ..SequenceParams::default() };
    let block = PredictionBlock::new(ComponentID::Y, 0, 0, 4, 4, 10);
    for mode in [PLANAR_IDX, DC_IDX] {
      let (dst, _) = predict(&picture, &map, &block, &IntraCodingInfo::with_mode(mode), &sps);
      assert_uniform(&dst, 512);
    }
  }

  #[test]
  fn dc_uses_longer_side_with_shift_rounding() {
    // Top references 10, left references 20: a wide block only sees the top
    let picture = Array2D::new_with(32, 32, |i, j| if i < 8 { 10 } else if j < 8 { 20 } else { 0 });
    let map = full_map(32, 32);
    let sps = SequenceParams::default();

    let wide = PredictionBlock::new(ComponentID::Y, 8, 8, 16, 4, 8);
    let mut ip = IntraPredictor::new();
    ip.prepare(&picture, &map, &wide, &IntraCodingInfo::with_mode(DC_IDX), &sps);
    assert_eq!(dc_value(ip.ref_line(ComponentID::Y, UNFILTERED), 16, 4, 0), 10);

    let square = PredictionBlock::new(ComponentID::Y, 8, 8, 4, 4, 8);
    ip.prepare(&picture, &map, &square, &IntraCodingInfo::with_mode(DC_IDX), &sps);
    // (4 * 10 + 4 * 20 + 4) >> 3
    assert_eq!(dc_value(ip.ref_line(ComponentID::Y, UNFILTERED), 4, 4, 0), 15);
  }

  #[test]
  fn planar_corners_track_references() {
    let picture = Array2D::new_with(64, 64, |i, j| (4 * i + 2 * j) as u16);
    let map = full_map(64, 64);
    let sps = SequenceParams { intra_smoothing_disabled: true, ..SequenceParams::default() };
    let block = PredictionBlock::new(ComponentID::Y, 16, 16, 16, 16, 8);
    let info = IntraCodingInfo { mode: PLANAR_IDX, ..Default::default() };

    let mut ip = IntraPredictor::new();
    let mut dst = Array2D::zeroed(16, 16);
    ip.prepare(&picture, &map, &block, &info, &sps);
    // Plain kernel, without the boundary correction
    pred_planar(&ip.refs[0][UNFILTERED], 16, 16, &mut ip.scratch, &mut dst);

    // Top references run 92, 94, .. 124 and left references 94, 98, .. 158
    let refs = ip.ref_line(ComponentID::Y, UNFILTERED);
    assert_eq!((refs.at(1, TOP), refs.at(17, TOP)), (92, 124));
    assert_eq!((refs.at(1, LEFT), refs.at(17, LEFT)), (94, 158));
    assert_eq!(dst[0][0], 96);
    assert_eq!(dst[0][15], 124);
    assert_eq!(dst[15][0], 155);
    assert_eq!(dst[15][15], 141);
    assert_eq!(dst[7][7], 128);
  }

  #[test]
  fn pure_vertical_copies_main_line() {
    let picture = Array2D::new_with(32, 32, |i, j| ((i * 7 + j * 13) % 256) as u16);
    let map = full_map(32, 32);
    // Chroma: no smoothing and no boundary correction in play
    let block = PredictionBlock::new(ComponentID::Cb, 4, 4, 8, 4, 8);
    let sps = SequenceParams { chroma_format: ChromaFormat::Cs444, ..SequenceParams::default() };
    let info = IntraCodingInfo::with_mode(VER_IDX);

    let mut ip = IntraPredictor::new();
    let mut dst = Array2D::zeroed(4, 8);
    ip.prepare(&picture, &map, &block, &info, &sps);
    assert!(!ip.params().ref_filter_flag);
    let mut params = *ip.params();
    params.apply_pdpc = false;
    let refs = ip.refs[ComponentID::Cb.idx()][UNFILTERED].clone();
    pred_angular(&refs, 8, 4, ChannelType::Chroma, &params, 8, &mut ip.scratch, &mut dst);

    for y in 0..4 {
      assert_eq!(&dst[y][..], &refs.top()[1 ..= 8]);
    }
  }

  #[test]
  fn pure_horizontal_copies_left_line() {
    let picture = Array2D::new_with(32, 32, |i, j| ((i * 11 + j * 3) % 256) as u16);
    let map = full_map(32, 32);
    let block = PredictionBlock::new(ComponentID::Y, 8, 8, 4, 8, 8);
    let sps = SequenceParams::default();
    let info = IntraCodingInfo::with_mode(HOR_IDX);

    let mut ip = IntraPredictor::new();
    let mut dst = Array2D::zeroed(8, 4);
    ip.prepare(&picture, &map, &block, &info, &sps);
    let mut params = *ip.params();
    params.apply_pdpc = false;
    let refs = ip.refs[0][UNFILTERED].clone();
    pred_angular(&refs, 4, 8, ChannelType::Luma, &params, 8, &mut ip.scratch, &mut dst);

    for y in 0..8 {
      assert!(dst[y].iter().all(|&v| v as i32 == refs.at(y + 1, LEFT)));
    }
  }

  #[test]
  fn diagonal_reads_shifted_references() {
    let picture = Array2D::new_with(32, 32, |i, j| ((i * 5 + j * 9) % 256) as u16);
    let map = full_map(32, 32);
    let sps = SequenceParams { intra_smoothing_disabled: true, ..SequenceParams::default() };
    let block = PredictionBlock::new(ComponentID::Y, 8, 8, 8, 8, 8);
    let info = IntraCodingInfo::with_mode(VDIA_IDX);
    let (dst, ip) = predict(&picture, &map, &block, &info, &sps);
    let refs = ip.ref_line(ComponentID::Y, UNFILTERED);
    // Away from the left edge the boundary correction has no effect
    for y in 0..8 {
      for x in 6..8 {
        assert_eq!(dst[y][x] as i32, refs.at(x + y + 2, TOP));
      }
    }
  }

  #[test]
  fn offset_reference_lines() {
    let picture = Array2D::new_with(64, 64, |i, j| ((3 * i * i + 5 * j * j + i * j) % 1000) as u16);
    let map = full_map(64, 64);
    let sps = SequenceParams { bit_depth_luma: 10, ..SequenceParams::default() };
    let (x0, y0) = (16, 16);

    for size in [8, 16] {
      for mrl in 1..=2 {
        let mut block = PredictionBlock::new(ComponentID::Y, x0, y0, size, size, 10);
        block.multi_ref_idx = mrl;
        let above = |x: usize| picture[y0 - 1 - mrl][x] as i32;
        let left = |y: usize| picture[y][x0 - 1 - mrl] as i32;

        let (dst, ip) = predict(&picture, &map, &block, &IntraCodingInfo::with_mode(VER_IDX), &sps);
        assert!(!ip.params().apply_pdpc && !ip.params().ref_filter_flag);
        for y in 0..size {
          for x in 0..size {
            assert_eq!(dst[y][x] as i32, above(x0 + x));
          }
        }

        let (dst, _) = predict(&picture, &map, &block, &IntraCodingInfo::with_mode(HOR_IDX), &sps);
        for y in 0..size {
          assert!(dst[y].iter().all(|&v| v as i32 == left(y0 + y)));
        }

        let sum: i32 = (0..size).map(|k| above(x0 + k) + left(y0 + k)).sum();
        let dc = (sum + size as i32) >> floor_log2(2 * size);
        let (dst, _) = predict(&picture, &map, &block, &IntraCodingInfo::with_mode(DC_IDX), &sps);
        assert_uniform(&dst, dc as u16);

        // Mode 54 steps 4/32 of a sample per row, starting mrl rows further out
        let (dst, _) = predict(&picture, &map, &block, &IntraCodingInfo::with_mode(54), &sps);
        for y in 0..size {
          let delta_pos = 4 * (y + 1 + mrl) as i32;
          let f = intra_cubic_filter[(delta_pos & 31) as usize];
          for x in 0..size {
            let base = x0 - 1 + (delta_pos >> 5) as usize + x;
            let val: i32 = (0..4).map(|k| f[k] * above(base + k)).sum();
            assert_eq!(dst[y][x] as i32, clip_pel((val + 32) >> 6, 10));
          }
        }
      }
    }
  }

  #[test]
  fn bdpcm_broadcasts_reference_lines() {
    let picture = Array2D::new_with(16, 16, |i, j| (i * 16 + j) as u16);
    let map = full_map(16, 16);
    let sps = SequenceParams::default();
    let block = PredictionBlock::new(ComponentID::Y, 4, 4, 4, 4, 8);

    let info = IntraCodingInfo { mode: PLANAR_IDX, bdpcm: BdpcmDir::Ver, ..Default::default() };
    let (dst, _) = predict(&picture, &map, &block, &info, &sps);
    for y in 0..4 {
      assert_eq!(&dst[y][..], &[52, 53, 54, 55]);
    }

    let info = IntraCodingInfo { mode: PLANAR_IDX, bdpcm: BdpcmDir::Hor, ..Default::default() };
    let (dst, _) = predict(&picture, &map, &block, &info, &sps);
    for y in 0..4 {
      assert!(dst[y].iter().all(|&v| v as usize == (4 + y) * 16 + 3));
    }
  }

  #[test]
  #[should_panic(expected = "Width of 2")]
  fn width_two_is_rejected() {
    let mut ip = IntraPredictor::new();
    let mut dst = Array2D::zeroed(4, 4);
    let block = PredictionBlock::new(ComponentID::Cb, 0, 0, 2, 4, 8);
    ip.predict(&block, &IntraCodingInfo::with_mode(DC_IDX), &mut dst);
  }
}
