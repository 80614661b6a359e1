use crate::enums::*;

pub const MAX_CU_SIZE: usize = 128;
pub const MAX_LOG2_CU_SIZE: u32 = 7;
pub const MAX_REF_LINE_IDX: usize = 3;

// Length of one reference line (top or left) including margin for
// multi-reference-line extension and angular replication
pub const MAX_REF_LINE_LEN: usize = 2 * MAX_CU_SIZE + 3 + 33 * MAX_REF_LINE_IDX;

// Projection slope per mode, in 1/32 sample units,
// indexed by distance from the nearest axis mode
pub const angTable: [i32; 32] = [
  0,  1,  2,  3,  4,  6,  8,  10, 12, 14,  16,  18,  20,  23,  26,  29,
  32, 35, 39, 45, 51, 57, 64, 73, 86, 102, 128, 171, 256, 341, 512, 1024
];

// 512 * 32 / angle, paired with angTable
pub const invAngTable: [i32; 32] = [
  0,   16384, 8192, 5461, 4096, 2731, 2048, 1638, 1365, 1170, 1024,
  910, 819,   712,  630,  565,  512,  468,  420,  364,  321,  287,
  256, 224,   191,  161,  128,  96,   64,   48,   32,   16
];

// 4-tap fractional-position interpolation filter, one row per 1/32 phase
pub const intra_cubic_filter: [[i32; 4]; 32] = [
  [  0, 64,  0,  0 ],
  [ -1, 63,  2,  0 ],
  [ -2, 62,  4,  0 ],
  [ -2, 60,  7, -1 ],
  [ -2, 58, 10, -2 ],
  [ -3, 57, 12, -2 ],
  [ -4, 56, 14, -2 ],
  [ -4, 55, 15, -2 ],
  [ -4, 54, 16, -2 ],
  [ -5, 53, 18, -2 ],
  [ -6, 52, 20, -2 ],
  [ -6, 49, 24, -3 ],
  [ -6, 46, 28, -4 ],
  [ -5, 44, 29, -4 ],
  [ -4, 42, 30, -4 ],
  [ -4, 39, 33, -4 ],
  [ -4, 36, 36, -4 ],
  [ -4, 33, 39, -4 ],
  [ -4, 30, 42, -4 ],
  [ -4, 29, 44, -5 ],
  [ -4, 28, 46, -6 ],
  [ -3, 24, 49, -6 ],
  [ -2, 20, 52, -6 ],
  [ -2, 18, 53, -5 ],
  [ -2, 16, 54, -4 ],
  [ -2, 15, 55, -4 ],
  [ -2, 14, 56, -4 ],
  [ -2, 12, 57, -3 ],
  [ -2, 10, 58, -2 ],
  [ -1,  7, 60, -2 ],
  [  0,  4, 62, -2 ],
  [  0,  2, 63, -1 ],
];

// Minimum distance from the horizontal/vertical axis above which reference
// smoothing kicks in, indexed by (log2W + log2H) >> 1
pub const intra_filter_threshold: [u32; 8] = [24, 24, 24, 14, 2, 0, 0, 0];

// Number of modes remapped to wide angles, indexed by |log2W - log2H|
pub const wide_angle_mode_shift: [u32; 6] = [0, 6, 10, 12, 14, 15];

// Ring selector defaults
pub const LIP_RESERVE_CNT: usize = 16;
pub const LIP_MODE_LIST: [u32; 8] = [PLANAR_IDX, DC_IDX, HOR_IDX, VER_IDX, DIA_IDX, 2, VDIA_IDX, 42];
