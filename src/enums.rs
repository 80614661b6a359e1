// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentID {
  Y = 0,
  Cb = 1,
  Cr = 2
}

impl ComponentID {
  pub const ALL: [ComponentID; 3] = [ComponentID::Y, ComponentID::Cb, ComponentID::Cr];

  pub fn idx(self) -> usize {
    self as usize
  }

  pub fn channel_type(self) -> ChannelType {
    match self {
      ComponentID::Y => ChannelType::Luma,
      _ => ChannelType::Chroma
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelType {
  Luma = 0,
  Chroma = 1
}

impl ChannelType {
  pub fn idx(self) -> usize {
    self as usize
  }

  pub fn is_luma(self) -> bool {
    self == ChannelType::Luma
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChromaFormat {
  Cs400 = 0,
  Cs420 = 1,
  Cs444 = 3
}

impl ChromaFormat {
  pub fn num_components(self) -> usize {
    match self {
      ChromaFormat::Cs400 => 1,
      _ => 3
    }
  }

  // log2 subsampling factors (x, y) for a given component
  pub fn scale(self, comp: ComponentID) -> (u32, u32) {
    match (self, comp) {
      (ChromaFormat::Cs420, ComponentID::Cb | ComponentID::Cr) => (1, 1),
      _ => (0, 0)
    }
  }
}

// Block-based DPCM direction, signalled with one flag plus one direction bit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BdpcmDir {
  #[default]
  Off = 0,
  Hor = 1,
  Ver = 2
}

// Intra mode indices
pub const PLANAR_IDX: u32 = 0;
pub const DC_IDX: u32 = 1;
pub const HOR_IDX: u32 = 18;
pub const DIA_IDX: u32 = 34;
pub const VER_IDX: u32 = 50;
pub const VDIA_IDX: u32 = 66;
pub const NUM_LUMA_MODE: u32 = 67;
