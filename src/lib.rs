// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Intra prediction core with an incremental ring selector
//
// The conventional path builds reference lines around a block from
// whatever neighbors are already decoded, optionally smooths them, and runs
// one of the planar, DC, angular or BDPCM kernels. The ring selector instead
// splits the block into concentric L-shaped rings and picks a candidate mode
// per ring, either by searching against the source or by replaying a
// stored decision record.

// Disable name styling checks, so that tables can keep their usual names
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

pub mod array2d;
pub mod bitcode;
pub mod config;
pub mod consts;
pub mod enums;
pub mod error;
pub mod frame;
pub mod lip;
pub mod neighbors;
pub mod params;
pub mod picture;
pub mod predict;
pub mod refs;
pub mod util;
pub mod y4m;

pub use crate::config::{LipParams, SequenceParams};
pub use crate::error::{Error, InvalidConfig, Result};
pub use crate::picture::PictureCoder;
