// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Sequence-level parameters consumed by the prediction core

use crate::consts::*;
use crate::enums::*;
use crate::error::InvalidConfig;
use crate::util::floor_log2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LipParams {
  // Sub-block area below which the ring selector stops selecting per ring
  pub reserve_threshold: usize,
  // Candidate modes, indexed by the values stored in a decision record
  pub candidates: Vec<u32>,
}

impl Default for LipParams {
  fn default() -> Self {
    Self {
      reserve_threshold: LIP_RESERVE_CNT,
      candidates: LIP_MODE_LIST.to_vec()
    }
  }
}

impl LipParams {
  // Number of bits used to store one candidate index
  pub fn bits_per_mode(&self) -> u32 {
    floor_log2(self.candidates.len())
  }

  pub fn validate(&self) -> Result<(), InvalidConfig> {
    if self.reserve_threshold == 0 {
      return Err(InvalidConfig::ReserveThreshold);
    }
    let n = self.candidates.len();
    if n < 2 || n > 16 || !n.is_power_of_two() {
      return Err(InvalidConfig::CandidateCount(n));
    }
    for (i, &mode) in self.candidates.iter().enumerate() {
      if mode >= NUM_LUMA_MODE {
        return Err(InvalidConfig::CandidateMode(mode));
      }
      if self.candidates[..i].contains(&mode) {
        return Err(InvalidConfig::DuplicateCandidate(mode));
      }
    }
    Ok(())
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceParams {
  pub chroma_format: ChromaFormat,
  pub bit_depth_luma: u32,
  pub bit_depth_chroma: u32,
  pub intra_smoothing_disabled: bool,
  // Luma size of one availability unit
  pub min_cu_size: usize,
  // 4-wide chroma blocks keep luma-sized availability units
  pub no_chroma_2x2: bool,
  pub lip: LipParams,
}

impl Default for SequenceParams {
  fn default() -> Self {
    Self {
      chroma_format: ChromaFormat::Cs420,
      bit_depth_luma: 8,
      bit_depth_chroma: 8,
      intra_smoothing_disabled: false,
      min_cu_size: 4,
      no_chroma_2x2: true,
      lip: LipParams::default()
    }
  }
}

impl SequenceParams {
  pub fn validate(&self) -> Result<(), InvalidConfig> {
    for bd in [self.bit_depth_luma, self.bit_depth_chroma] {
      if bd < 8 || bd > 16 {
        return Err(InvalidConfig::BitDepth(bd));
      }
    }
    if self.min_cu_size < 4 || !self.min_cu_size.is_power_of_two() || self.min_cu_size > MAX_CU_SIZE {
      return Err(InvalidConfig::MinCuSize(self.min_cu_size));
    }
    self.lip.validate()
  }

  pub fn bit_depth(&self, ch: ChannelType) -> u32 {
    match ch {
      ChannelType::Luma => self.bit_depth_luma,
      ChannelType::Chroma => self.bit_depth_chroma
    }
  }

  // Availability unit size (width, height) for a block of the given component
  // and width, in that component's samples
  pub fn unit_size(&self, comp: ComponentID, block_width: usize) -> (usize, usize) {
    let (sx, sy) = self.chroma_format.scale(comp);
    let no_shift = self.no_chroma_2x2 && block_width == 4 && comp != ComponentID::Y;
    if no_shift {
      (self.min_cu_size, self.min_cu_size)
    } else {
      (self.min_cu_size >> sx, self.min_cu_size >> sy)
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn defaults_are_valid() {
    let sps = SequenceParams::default();
    assert_eq!(sps.validate(), Ok(()));
    assert_eq!(sps.lip.bits_per_mode(), 3);
  }

  #[test]
  fn rejects_bad_candidate_lists() {
    let mut lip = LipParams::default();
    lip.candidates.pop();
    assert_eq!(lip.validate(), Err(InvalidConfig::CandidateCount(7)));

    let mut lip = LipParams::default();
    lip.candidates[7] = PLANAR_IDX;
    assert_eq!(lip.validate(), Err(InvalidConfig::DuplicateCandidate(PLANAR_IDX)));

    let mut lip = LipParams::default();
    lip.candidates[7] = 70;
    assert_eq!(lip.validate(), Err(InvalidConfig::CandidateMode(70)));
  }

  #[test]
  fn chroma_units_follow_subsampling() {
    let sps = SequenceParams::default();
    assert_eq!(sps.unit_size(ComponentID::Y, 4), (4, 4));
    assert_eq!(sps.unit_size(ComponentID::Cb, 8), (2, 2));
    assert_eq!(sps.unit_size(ComponentID::Cb, 4), (4, 4));
  }
}
