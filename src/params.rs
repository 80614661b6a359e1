// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Per-block derived prediction parameters

use crate::config::SequenceParams;
use crate::consts::*;
use crate::enums::*;
use crate::util::*;

// Geometry and identity of one block to predict
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredictionBlock {
  pub comp: ComponentID,
  // Position and size in samples of `comp`
  pub x: usize,
  pub y: usize,
  pub width: usize,
  pub height: usize,
  pub bit_depth: u32,
  // Reference line offset, always 0 for chroma
  pub multi_ref_idx: usize,
}

impl PredictionBlock {
  pub fn new(comp: ComponentID, x: usize, y: usize, width: usize, height: usize, bit_depth: u32) -> Self {
    Self {
      comp: comp,
      x: x,
      y: y,
      width: width,
      height: height,
      bit_depth: bit_depth,
      multi_ref_idx: 0
    }
  }

  pub fn channel_type(&self) -> ChannelType {
    self.comp.channel_type()
  }

  // Size limits shared by every intra path; violating these is a caller bug
  pub fn check_geometry(&self) {
    assert!(self.width != 2, "Width of 2 is not supported");
    assert!(self.width >= 4 && self.height >= 4, "Block size {}x{} not allowed", self.width, self.height);
    assert!(floor_log2(self.width) <= MAX_LOG2_CU_SIZE && floor_log2(self.height) <= MAX_LOG2_CU_SIZE,
            "Block size {}x{} not allowed", self.width, self.height);
    assert!(self.width.is_power_of_two() && self.height.is_power_of_two());
    assert!(self.multi_ref_idx == 0 || self.comp == ComponentID::Y);
    assert!(self.multi_ref_idx < MAX_REF_LINE_IDX, "Reference line {} not supported", self.multi_ref_idx);
    // Keeps every offset reference line inside the neighbor units probed for the block
    assert!(self.x % 4 == 0 && self.y % 4 == 0, "Block at ({}, {}) is not on the 4-sample grid", self.x, self.y);
  }
}

// Coding decisions for the block, as signalled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntraCodingInfo {
  // Nominal mode, 0..=66
  pub mode: u32,
  pub bdpcm: BdpcmDir,
  // Luma split into intra sub-partitions
  pub isp: bool,
  // Matrix-based prediction; handled outside this crate
  pub mip: bool,
}

impl IntraCodingInfo {
  pub fn with_mode(mode: u32) -> Self {
    Self {
      mode: mode,
      ..Default::default()
    }
  }
}

// Remap modes which point outside a non-square block onto the wide angles
// beyond the nominal range. Only meaningful for deriving the angle
pub fn wide_angle_mode(width: usize, height: usize, mode: i32) -> i32 {
  if mode > DC_IDX as i32 && mode <= VDIA_IDX as i32 {
    let delta_size = floor_log2(width).abs_diff(floor_log2(height)) as usize;
    let shift = wide_angle_mode_shift[delta_size] as i32;
    if width > height && mode < 2 + shift {
      return mode + (VDIA_IDX as i32 - 1);
    } else if height > width && mode > VDIA_IDX as i32 - shift {
      return mode - (VDIA_IDX as i32 - 1);
    }
  }
  mode
}

// Signed projection slope and its reciprocal for a (possibly wide-angle)
// mode. Returns (is_mode_ver, intra_pred_angle, abs_inv_angle)
pub fn mode_angle(pred_mode: i32) -> (bool, i32, i32) {
  let is_mode_ver = pred_mode >= DIA_IDX as i32;
  let angle_mode = if is_mode_ver {
    pred_mode - VER_IDX as i32
  } else {
    -(pred_mode - HOR_IDX as i32)
  };
  let abs_mode = angle_mode.unsigned_abs() as usize;
  let abs_ang = angTable[abs_mode];
  let sign = if angle_mode < 0 { -1 } else { 1 };
  (is_mode_ver, sign * abs_ang, invAngTable[abs_mode])
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModeParameters {
  pub is_mode_ver: bool,
  pub multi_ref_idx: usize,
  // Predict from the [1, 2, 1] smoothed reference lines
  pub ref_filter_flag: bool,
  // Use the smoothing 4-tap filter for fractional positions instead of the cubic one
  pub interpolation_flag: bool,
  pub apply_pdpc: bool,
  pub intra_pred_angle: i32,
  pub abs_inv_angle: i32,
  pub angular_scale: i32,
}

impl ModeParameters {
  pub fn derive(block: &PredictionBlock, info: &IntraCodingInfo, sps: &SequenceParams) -> Self {
    let ch = block.channel_type();
    let is_luma = ch.is_luma();
    let dir_mode = info.mode;
    let pred_mode = wide_angle_mode(block.width, block.height, dir_mode as i32);

    let mut params = ModeParameters {
      is_mode_ver: pred_mode >= DIA_IDX as i32,
      multi_ref_idx: if is_luma { block.multi_ref_idx } else { 0 },
      ..Default::default()
    };
    params.apply_pdpc = block.width >= 4 && block.height >= 4 && params.multi_ref_idx == 0;

    let mut abs_ang = 0;
    if dir_mode > DC_IDX && dir_mode < NUM_LUMA_MODE {
      let (_, angle, inv_angle) = mode_angle(pred_mode);
      abs_ang = angle.abs();
      params.intra_pred_angle = angle;
      params.abs_inv_angle = inv_angle;
      if angle < 0 {
        params.apply_pdpc = false;
      } else if angle > 0 {
        let side_size = if params.is_mode_ver { block.height } else { block.width };
        let max_scale = 2;
        params.angular_scale = max_scale.min(
          floor_log2(side_size) as i32 - (floor_log2((3 * inv_angle - 2) as usize) as i32 - 8));
        params.apply_pdpc &= params.angular_scale >= 0;
      }
    }

    let filter = reference_filter(block, info, sps, pred_mode, abs_ang);
    params.ref_filter_flag = filter.ref_filter;
    params.interpolation_flag = filter.interpolation;
    params
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct FilterChoice {
  ref_filter: bool,
  interpolation: bool,
}

// Decide between unfiltered references, [1, 2, 1] smoothed references,
// and the smoothing interpolation filter
fn reference_filter(block: &PredictionBlock, info: &IntraCodingInfo, sps: &SequenceParams,
                    pred_mode: i32, abs_ang: i32) -> FilterChoice {
  let is_luma = block.channel_type().is_luma();
  if sps.intra_smoothing_disabled || !is_luma || info.isp || info.mip
     || block.multi_ref_idx != 0 || info.mode == DC_IDX {
    return FilterChoice::default();
  }
  if info.bdpcm != BdpcmDir::Off {
    return FilterChoice::default();
  }

  let area = block.width * block.height;
  if info.mode == PLANAR_IDX {
    return FilterChoice {
      ref_filter: area > 32,
      interpolation: false
    };
  }

  let diff = (pred_mode - HOR_IDX as i32).abs().min((pred_mode - VER_IDX as i32).abs());
  let log2_size = ((floor_log2(block.width) + floor_log2(block.height)) >> 1) as usize;
  if diff <= intra_filter_threshold[log2_size] as i32 {
    return FilterChoice::default();
  }

  debug_assert!(area > 32, "Interpolation filter is always used for blocks of 32 samples or fewer");
  let is_ref_filter = is_integer_slope(abs_ang);
  FilterChoice {
    ref_filter: is_ref_filter,
    interpolation: !is_ref_filter
  }
}
