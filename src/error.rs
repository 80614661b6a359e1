// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use std::io;

use thiserror::Error;

/// Rejected sequence-level or selector configuration
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidConfig {
  /// Bit depth outside the supported range
  #[error("invalid bit depth {0} (expected 8..=16)")]
  BitDepth(u32),
  /// The availability unit must be a power of two of at least 4
  #[error("invalid minimum coding unit size {0}")]
  MinCuSize(usize),
  /// Block size outside 4..=128 or not a power of two
  #[error("invalid block size {0} (expected a power of two in 4..=128)")]
  BlockSize(usize),
  /// The reserve threshold must be nonzero
  #[error("LIP reserve threshold must be at least 1")]
  ReserveThreshold,
  /// Candidate list length must be a power of two in 2..=16
  #[error("LIP candidate list has {0} entries (expected a power of two in 2..=16)")]
  CandidateCount(usize),
  /// Candidate modes must be conventional mode indices
  #[error("LIP candidate mode {0} is not in 0..=66")]
  CandidateMode(u32),
  /// The same mode appears twice in the candidate list
  #[error("LIP candidate mode {0} is listed more than once")]
  DuplicateCandidate(u32),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("I/O error")]
  Io(#[from] io::Error),
  #[error("malformed Y4M stream: {0}")]
  Y4M(String),
  #[error("unsupported input: {0}")]
  Unsupported(String),
  #[error("invalid configuration")]
  Config(#[from] InvalidConfig),
  #[error("malformed decision record stream: {0}")]
  Record(String),
}

pub type Result<T> = std::result::Result<T, Error>;
