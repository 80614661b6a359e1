// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Incremental ring selector
//
// A block is predicted as a sequence of nested L-shaped rings: ring `l` is
// the top row and left column of the (width - l) x (height - l) sub-block at
// (l, l). Each ring is predicted from the samples immediately outside it,
// using one mode from a small candidate list, so later rings can follow
// texture that the block's own outer rings have established.
//
// The encoder picks the cheapest candidate per ring and writes the choices
// to a DecisionRecord. The decoder replays the record. Both run through
// predict_rings(), differing only in the RingStrategy and SampleSource.

use std::io::{Read, Write};
use std::ops::Range;

use arrayvec::ArrayVec;
use log::{debug, trace};

use crate::array2d::Array2D;
use crate::bitcode::{BitReader, BitWriter};
use crate::config::LipParams;
use crate::consts::*;
use crate::enums::*;
use crate::error::{Error, Result};
use crate::params::{mode_angle, IntraCodingInfo, PredictionBlock};
use crate::predict::{IntraPredictor, KernelScratch, UNFILTERED};
use crate::refs::{RefLine, LEFT, TOP};
use crate::util::*;

// Number of rings selected individually: the largest k such that every
// ring before k covers a sub-block of at least `reserve_threshold` samples.
// Rings k onwards are handled together by one final decision
pub fn num_rings(width: usize, height: usize, reserve_threshold: usize) -> usize {
  let loop_all = width.min(height);
  (0..loop_all)
    .find(|&l| (width - l) * (height - l) < reserve_threshold)
    .unwrap_or(loop_all)
}

// Length of the decision record of a width x height block
pub fn num_decisions(width: usize, height: usize, reserve_threshold: usize) -> usize {
  let split = num_rings(width, height, reserve_threshold).max(1);
  if split < width.min(height) { split + 1 } else { split }
}

// One candidate index per decision slot
//
// Slot 0 is the full-block ring, slots 1..k the individually selected rings
// (k = num_rings(), at least 1), and slot k, if present, the single choice
// shared by every remaining ring
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecisionRecord {
  indices: ArrayVec<u8, MAX_CU_SIZE>,
}

impl DecisionRecord {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_indices(indices: &[u8]) -> Self {
    let mut record = Self::new();
    for &idx in indices {
      record.push(idx as usize);
    }
    record
  }

  pub fn push(&mut self, idx: usize) {
    assert!(idx <= u8::MAX as usize);
    self.indices.push(idx as u8);
  }

  pub fn get(&self, slot: usize) -> usize {
    match self.indices.get(slot) {
      Some(&idx) => idx as usize,
      None => panic!("Decision record has no entry for slot {} (length {})", slot, self.indices.len())
    }
  }

  pub fn len(&self) -> usize {
    self.indices.len()
  }

  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  pub fn indices(&self) -> &[u8] {
    &self.indices
  }

  // Serialized form: LEB128 slot count, then each index in `bits_per_mode`
  // bits, MSB first, padded with zeros to a whole byte
  pub fn write_to<W: Write>(&self, w: &mut W, bits_per_mode: u32) -> std::io::Result<()> {
    write_leb128(w, self.len())?;
    let mut bits = BitWriter::new();
    for &idx in self.indices.iter() {
      bits.write_bits(idx as u64, bits_per_mode);
    }
    w.write_all(&bits.finalize(false))
  }

  pub fn read_from<R: Read>(r: &mut R, bits_per_mode: u32, num_candidates: usize) -> Result<Self> {
    let count = read_leb128(r)?;
    if count == 0 || count > MAX_CU_SIZE {
      return Err(Error::Record(format!("invalid slot count {}", count)));
    }

    let num_bytes = (count * bits_per_mode as usize).div_ceil(8);
    let mut payload = vec![0u8; num_bytes];
    r.read_exact(&mut payload).map_err(|e| match e.kind() {
      std::io::ErrorKind::UnexpectedEof => Error::Record(format!("truncated record of {} slots", count)),
      _ => Error::Io(e)
    })?;

    let mut bits = BitReader::new(&payload);
    let mut record = Self::new();
    for slot in 0..count {
      let idx = bits.read_bits(bits_per_mode)
        .ok_or_else(|| Error::Record(format!("record ends before slot {}", slot)))? as usize;
      if idx >= num_candidates {
        return Err(Error::Record(format!("slot {} holds index {} but only {} candidates exist",
                                         slot, idx, num_candidates)));
      }
      record.push(idx);
    }
    Ok(record)
  }
}

// Cost of the L-shape of ring `ring` in `pred`, against `target`
// Both are addressed relative to the block's top-left corner
pub fn ring_sad(pred: &Array2D<u16>, target: &Array2D<u16>, ring: usize) -> u64 {
  let (rows, cols) = (target.rows(), target.cols());
  let mut sad = 0u64;
  for x in ring..cols {
    sad += pred[ring][x].abs_diff(target[ring][x]) as u64;
  }
  for y in ring + 1 .. rows {
    sad += pred[y][ring].abs_diff(target[y][ring]) as u64;
  }
  sad
}

// How the candidate for each decision slot is obtained
pub trait RingStrategy {
  // Pick the candidate for `slot` out of `num_candidates`
  // `eval(c, cost)` predicts the slot's rings with candidate c and returns
  // the sum of `cost(pred, ring)` over them. Strategies which already know
  // the answer need not call it at all
  fn select<F>(&mut self, slot: usize, num_candidates: usize, eval: F) -> usize
    where F: FnMut(usize, &dyn Fn(&Array2D<u16>, usize) -> u64) -> u64;

  // Accumulated cost of the choices made so far, if this strategy measures one
  fn total_cost(&self) -> Option<u64> {
    None
  }
}

// Encoder side: try every candidate and keep the cheapest, recording it
pub struct SearchStrategy<'a> {
  target: &'a Array2D<u16>,
  record: DecisionRecord,
  total_cost: u64,
}

impl<'a> SearchStrategy<'a> {
  // `target` holds the source samples of the block
  pub fn new(target: &'a Array2D<u16>) -> Self {
    Self {
      target: target,
      record: DecisionRecord::new(),
      total_cost: 0
    }
  }

  pub fn record(&self) -> &DecisionRecord {
    &self.record
  }

  pub fn into_record(self) -> DecisionRecord {
    self.record
  }
}

impl<'a> RingStrategy for SearchStrategy<'a> {
  fn select<F>(&mut self, slot: usize, num_candidates: usize, mut eval: F) -> usize
    where F: FnMut(usize, &dyn Fn(&Array2D<u16>, usize) -> u64) -> u64 {
    debug_assert_eq!(slot, self.record.len());
    let target = self.target;
    let cost = |pred: &Array2D<u16>, ring: usize| ring_sad(pred, target, ring);

    let mut best_idx = 0;
    let mut best_cost = u64::MAX;
    for idx in 0..num_candidates {
      let c = eval(idx, &cost);
      // Ties keep the earlier candidate
      if c < best_cost {
        best_cost = c;
        best_idx = idx;
      }
    }
    trace!("slot {}: candidate {} with cost {}", slot, best_idx, best_cost);

    self.record.push(best_idx);
    self.total_cost += best_cost;
    best_idx
  }

  fn total_cost(&self) -> Option<u64> {
    Some(self.total_cost)
  }
}

// Decoder side: read each choice back from a record
pub struct ReplayStrategy<'a> {
  record: &'a DecisionRecord,
}

impl<'a> ReplayStrategy<'a> {
  pub fn new(record: &'a DecisionRecord) -> Self {
    Self {
      record: record
    }
  }
}

impl<'a> RingStrategy for ReplayStrategy<'a> {
  fn select<F>(&mut self, slot: usize, num_candidates: usize, _eval: F) -> usize
    where F: FnMut(usize, &dyn Fn(&Array2D<u16>, usize) -> u64) -> u64 {
    let idx = self.record.get(slot);
    assert!(idx < num_candidates, "Recorded index {} out of range for {} candidates", idx, num_candidates);
    trace!("slot {}: replaying candidate {}", slot, idx);
    idx
  }
}

// Where the samples seeding rings 1 onwards come from
// Ring 0 always uses the block's reference lines
#[derive(Clone, Copy, Debug)]
pub enum SampleSource<'a> {
  // The block's source samples, as available to an encoder
  Original(&'a Array2D<u16>),
  // The prediction produced so far for this block, plus the decoded
  // residual at the same positions when there is one
  Reconstructed { residual: Option<&'a Array2D<i32>> },
}

impl<'a> SampleSource<'a> {
  fn sample(&self, pred: &Array2D<u16>, x: usize, y: usize) -> i32 {
    match *self {
      SampleSource::Original(src) => src[y][x] as i32,
      SampleSource::Reconstructed { residual: None } => pred[y][x] as i32,
      SampleSource::Reconstructed { residual: Some(res) } => pred[y][x] as i32 + res[y][x]
    }
  }
}

// Geometry of one ring within its block
#[derive(Clone, Copy, Debug)]
struct Ring {
  index: usize,
  width: usize,
  height: usize,
}

impl Ring {
  fn new(block_width: usize, block_height: usize, index: usize) -> Self {
    Self {
      index: index,
      width: block_width - index,
      height: block_height - index
    }
  }
}

// Load the samples bordering `ring` into scratch.top_row / left_column and
// return the corner sample. Both lines get one extra entry repeating their
// last sample
fn load_ring_seeds(scratch: &mut KernelScratch, refs: &RefLine, ring: Ring,
                   source: SampleSource, pred: &Array2D<u16>) -> i32 {
  let (w, h, l) = (ring.width, ring.height, ring.index);
  let top = &mut scratch.top_row;
  let left = &mut scratch.left_column;

  let corner = if l == 0 {
    for k in 0..w {
      top[k] = refs.at(k + 1, TOP);
    }
    for k in 0..h {
      left[k] = refs.at(k + 1, LEFT);
    }
    refs.at(0, TOP)
  } else {
    for k in 0..w {
      top[k] = source.sample(pred, l + k, l - 1);
    }
    for k in 0..h {
      left[k] = source.sample(pred, l - 1, l + k);
    }
    source.sample(pred, l - 1, l - 1)
  };
  top[w] = top[w - 1];
  left[h] = left[h - 1];
  corner
}

// Planar restricted to the ring's L-shape, using plain multiplication and
// truncating division in place of the power-of-two shifts
fn ring_planar(scratch: &mut KernelScratch, ring: Ring, dst: &mut Array2D<u16>) {
  let (w, h, l) = (ring.width, ring.height, ring.index);
  let KernelScratch { top_row, left_column, bottom_row, right_column, .. } = scratch;

  let bottom_left = left_column[h];
  let top_right = top_row[w];
  for k in 0..w {
    bottom_row[k] = bottom_left - top_row[k];
    top_row[k] *= h as i32;
  }
  for k in 0..h {
    right_column[k] = top_right - left_column[k];
    left_column[k] *= w as i32;
  }

  let (wi, hi) = (w as i64, h as i64);
  let denom = 2 * wi * hi;
  let blend = |hor: i32, vert: i32| ((hor as i64 * hi + vert as i64 * wi) / denom) as u16;

  let mut hor_pred = left_column[0];
  for x in 0..w {
    hor_pred += right_column[0];
    top_row[x] += bottom_row[x];
    dst[l][l + x] = blend(hor_pred, top_row[x]);
  }
  for y in 1..h {
    let hor_pred = left_column[y] + right_column[y];
    top_row[0] += bottom_row[0];
    dst[l + y][l] = blend(hor_pred, top_row[0]);
  }
}

// DC over the ring's seeds, with truncating division
fn ring_dc(scratch: &KernelScratch, ring: Ring, dst: &mut Array2D<u16>) {
  let (w, h, l) = (ring.width, ring.height, ring.index);
  let denom = (if w == h { 2 * w } else { w.max(h) }) as i32;

  let mut sum = 0;
  if w >= h {
    sum += scratch.top_row[..w].iter().sum::<i32>();
  }
  if w <= h {
    sum += scratch.left_column[..h].iter().sum::<i32>();
  }
  let dc = (sum / denom) as u16;

  dst[l][l .. l + w].fill(dc);
  for y in 1..h {
    dst[l + y][l] = dc;
  }
}

// Angular prediction of the ring's L-shape. No wide-angle remapping and no
// boundary correction; luma always uses the cubic filter
fn ring_angular(scratch: &mut KernelScratch, ring: Ring, corner: i32, mode: u32, ch: ChannelType,
                bit_depth: u32, dst: &mut Array2D<u16>) {
  let (is_ver, angle, inv_angle) = mode_angle(mode as i32);
  let l = ring.index;
  let KernelScratch { top_row, left_column, ref_main, ref_side, .. } = scratch;

  // Work along the main direction: `w` samples on the first line, `h` lines
  let (main_seeds, side_seeds) = if is_ver { (&top_row[..], &left_column[..]) } else { (&left_column[..], &top_row[..]) };
  let (w, h) = if is_ver { (ring.width, ring.height) } else { (ring.height, ring.width) };

  // Position 0 is the corner, 1..=w the seeds, w + 1 repeats the last seed
  let main_origin = h;
  let side_origin = w;
  ref_main[main_origin] = corner;
  ref_main[main_origin + 1 ..= main_origin + w + 1].copy_from_slice(&main_seeds[..=w]);
  ref_side[side_origin] = corner;
  ref_side[side_origin + 1 ..= side_origin + h + 1].copy_from_slice(&side_seeds[..=h]);

  // Project the side line beyond the corner
  for k in 1..=h {
    let side_idx = ((k as i32 * inv_angle + 256) >> 9).min(h as i32) as usize;
    ref_main[main_origin - k] = ref_side[side_origin + side_idx];
  }
  // Steep positive angles read past the seeds on the first column
  let far_end = main_origin + w + 1;
  let last = ref_main[far_end];
  ref_main[far_end + 1 ..= main_origin + w.max(h) + 4].fill(last);

  let main_at = |k: i32| ref_main[(main_origin as i32 + k) as usize];
  let integer_slope = is_integer_slope(angle.abs());
  let taps = interpolation_taps_cubic;

  // (position along the line, line index) -> sample
  let project = |x: usize, delta_pos: i32| -> i32 {
    let delta_int = delta_pos >> 5;
    let delta_fract = delta_pos & 31;
    let base = delta_int + x as i32;
    if angle == 0 || integer_slope {
      main_at(base + 1)
    } else if ch.is_luma() {
      let f = taps(delta_fract);
      let val = f[0] * main_at(base) + f[1] * main_at(base + 1)
              + f[2] * main_at(base + 2) + f[3] * main_at(base + 3);
      clip_pel((val + 32) >> 6, bit_depth)
    } else {
      let p0 = main_at(base + 1);
      let p1 = main_at(base + 2);
      p0 + ((delta_fract * (p1 - p0) + 16) >> 5)
    }
  };

  let mut put = |pos: usize, line: usize, val: i32| {
    if is_ver {
      dst[l + line][l + pos] = val as u16;
    } else {
      dst[l + pos][l + line] = val as u16;
    }
  };

  for x in 0..w {
    put(x, 0, project(x, angle));
  }
  for y in 1..h {
    put(0, y, project(0, angle * (y as i32 + 1)));
  }
}

fn interpolation_taps_cubic(delta_fract: i32) -> [i32; 4] {
  intra_cubic_filter[delta_fract as usize]
}

// Predict the L-shape of `ring` with candidate mode `mode` into `pred`
fn predict_ring(ip: &mut IntraPredictor, block: &PredictionBlock, ring: Ring, mode: u32,
                source: SampleSource, pred: &mut Array2D<u16>) {
  let refs = &ip.refs[block.comp.idx()][UNFILTERED];
  let scratch = &mut ip.scratch;
  let corner = load_ring_seeds(scratch, refs, ring, source, pred);
  match mode {
    PLANAR_IDX => ring_planar(scratch, ring, pred),
    DC_IDX => ring_dc(scratch, ring, pred),
    _ => ring_angular(scratch, ring, corner, mode, block.channel_type(), block.bit_depth, pred)
  }
}

// Run the ring selector over `block`, writing its prediction into the
// top-left width x height region of `dst`. Returns the nominal mode of the
// block, which is the candidate chosen for the full-block ring
//
// The block's unfiltered reference lines must already have been built with
// IntraPredictor::prepare_unfiltered()
pub fn predict_rings<S: RingStrategy>(ip: &mut IntraPredictor, block: &PredictionBlock, info: &IntraCodingInfo,
                                      lip: &LipParams, source: SampleSource, strategy: &mut S,
                                      dst: &mut Array2D<u16>) -> u32 {
  block.check_geometry();
  assert!(!info.mip, "Matrix-based prediction cannot be used with the ring selector");

  let (width, height) = (block.width, block.height);
  let candidates = &lip.candidates;
  let loop_all = width.min(height);
  let split = num_rings(width, height, lip.reserve_threshold).max(1);

  let mut step = |slot: usize, rings: Range<usize>| -> usize {
    let choice = strategy.select(slot, candidates.len(), |idx, cost| {
      let mut total = 0;
      for r in rings.clone() {
        predict_ring(ip, block, Ring::new(width, height, r), candidates[idx], source, dst);
        total += cost(&*dst, r);
      }
      total
    });
    // Evaluation may have left another candidate's output behind
    for r in rings {
      predict_ring(ip, block, Ring::new(width, height, r), candidates[choice], source, dst);
    }
    choice
  };

  let first = step(0, 0..1);
  for ring in 1..split {
    step(ring, ring..ring + 1);
  }
  let num_slots = if split < loop_all {
    step(split, split..loop_all);
    split + 1
  } else {
    split
  };

  let nominal_mode = candidates[first];
  match strategy.total_cost() {
    Some(cost) => debug!("ring selector {:?} {}x{} at ({}, {}): mode {}, {} rings, {} decisions, SAD {}",
                         block.comp, width, height, block.x, block.y, nominal_mode, loop_all, num_slots, cost),
    None => debug!("ring selector {:?} {}x{} at ({}, {}): mode {}, {} rings, {} decisions",
                   block.comp, width, height, block.x, block.y, nominal_mode, loop_all, num_slots)
  }
  nominal_mode
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::config::SequenceParams;
  use crate::neighbors::DecodedMap;
  use rand::{Rng, SeedableRng};
  use rand_chacha::ChaCha8Rng;

  const SIZES: [usize; 5] = [4, 8, 16, 32, 64];

  #[test]
  fn ring_count_bounds() {
    for &w in SIZES.iter() {
      for &h in SIZES.iter() {
        for threshold in [1, 4, 16, 64] {
          let k = num_rings(w, h, threshold);
          assert!(k <= w.min(h));
          if k > 0 {
            assert!((w - k + 1) * (h - k + 1) >= threshold, "{}x{} t={} k={}", w, h, threshold, k);
          }
          if k < w.min(h) {
            assert!((w - k) * (h - k) < threshold, "{}x{} t={} k={}", w, h, threshold, k);
          }
        }
      }
    }
    assert_eq!(num_rings(8, 8, 16), 5);
    assert_eq!(num_rings(4, 4, 16), 1);
    assert_eq!(num_rings(64, 4, 16), 4);

    assert_eq!(num_decisions(8, 8, 16), 6);
    assert_eq!(num_decisions(4, 4, 16), 2);
    assert_eq!(num_decisions(64, 4, 16), 4);
    assert_eq!(num_decisions(4, 4, 64), 2);
  }

  struct Setup {
    picture: Array2D<u16>,
    map: DecodedMap,
    sps: SequenceParams,
  }

  // A random plane with everything decoded; blocks are placed at (16, 16)
  fn setup(rng: &mut ChaCha8Rng, smooth: bool) -> Setup {
    let picture = Array2D::new_with(160, 160, |i, j| {
      if smooth {
        ((i * 3 + j * 2) % 200) as u16 + rng.gen_range(0..8u16)
      } else {
        rng.gen_range(0..256u16)
      }
    });
    let mut map = DecodedMap::new([(160, 160), (80, 80)], [(4, 4), (2, 2)]);
    map.mark_decoded(ChannelType::Luma, 0, 0, 160, 160);
    map.mark_decoded(ChannelType::Chroma, 0, 0, 80, 80);
    Setup {
      picture: picture,
      map: map,
      sps: SequenceParams { chroma_format: ChromaFormat::Cs444, ..SequenceParams::default() }
    }
  }

  fn search(s: &Setup, block: &PredictionBlock, source: &Array2D<u16>)
            -> (Array2D<u16>, DecisionRecord, u32) {
    let mut ip = IntraPredictor::new();
    ip.prepare_unfiltered(&s.picture, &s.map, block, &s.sps);
    let mut strategy = SearchStrategy::new(source);
    let mut pred = Array2D::zeroed(block.height, block.width);
    let mode = predict_rings(&mut ip, block, &IntraCodingInfo::default(), &s.sps.lip,
                             SampleSource::Original(source), &mut strategy, &mut pred);
    (pred, strategy.into_record(), mode)
  }

  fn replay(s: &Setup, block: &PredictionBlock, record: &DecisionRecord,
            residual: Option<&Array2D<i32>>) -> Array2D<u16> {
    let mut ip = IntraPredictor::new();
    ip.prepare_unfiltered(&s.picture, &s.map, block, &s.sps);
    let mut strategy = ReplayStrategy::new(record);
    let mut pred = Array2D::zeroed(block.height, block.width);
    predict_rings(&mut ip, block, &IntraCodingInfo::default(), &s.sps.lip,
                  SampleSource::Reconstructed { residual: residual }, &mut strategy, &mut pred);
    pred
  }

  #[test]
  fn replay_reproduces_search() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x1d1b);
    for iter in 0..40 {
      let s = setup(&mut rng, iter % 2 == 0);
      let comp = [ComponentID::Y, ComponentID::Cb][iter % 4 / 2];
      let w = SIZES[rng.gen_range(0..SIZES.len())];
      let h = SIZES[rng.gen_range(0..SIZES.len())];
      let block = PredictionBlock::new(comp, 16, 16, w, h, 8);
      let source = s.picture.region(16, 16, h, w);

      let (pred, record, _) = search(&s, &block, &source);
      assert_eq!(record.len(), num_decisions(w, h, s.sps.lip.reserve_threshold));

      let residual = Array2D::new_with(h, w, |i, j| source[i][j] as i32 - pred[i][j] as i32);
      let decoded = replay(&s, &block, &record, Some(&residual));
      for y in 0..h {
        assert_eq!(&decoded[y][..], &pred[y][..], "{:?} {}x{} row {}", comp, w, h, y);
      }
    }
  }

  #[test]
  fn replay_from_own_prediction() {
    // Seeding from predicted samples only, with no residual on either side
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let s = setup(&mut rng, true);
    for (w, h) in [(8, 8), (16, 4), (4, 32)] {
      let block = PredictionBlock::new(ComponentID::Y, 16, 16, w, h, 8);
      let source = s.picture.region(16, 16, h, w);

      let mut ip = IntraPredictor::new();
      ip.prepare_unfiltered(&s.picture, &s.map, &block, &s.sps);
      let mut strategy = SearchStrategy::new(&source);
      let mut pred = Array2D::zeroed(h, w);
      predict_rings(&mut ip, &block, &IntraCodingInfo::default(), &s.sps.lip,
                    SampleSource::Reconstructed { residual: None }, &mut strategy, &mut pred);
      let record = strategy.into_record();

      assert_eq!(replay(&s, &block, &record, None), pred.clone());
    }
  }

  #[test]
  fn total_cost_is_block_sad() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let s = setup(&mut rng, false);
    let block = PredictionBlock::new(ComponentID::Y, 16, 16, 16, 8, 8);
    let source = s.picture.region(16, 16, 8, 16);

    let mut ip = IntraPredictor::new();
    ip.prepare_unfiltered(&s.picture, &s.map, &block, &s.sps);
    let mut strategy = SearchStrategy::new(&source);
    let mut pred = Array2D::zeroed(8, 16);
    predict_rings(&mut ip, &block, &IntraCodingInfo::default(), &s.sps.lip,
                  SampleSource::Original(&source), &mut strategy, &mut pred);

    let mut sad = 0u64;
    for y in 0..8 {
      for x in 0..16 {
        sad += pred[y][x].abs_diff(source[y][x]) as u64;
      }
    }
    assert_eq!(strategy.total_cost(), Some(sad));
  }

  #[test]
  fn flat_block_picks_first_candidate() {
    let picture = Array2D::new_with(32, 32, |_, _| 100u16);
    let mut map = DecodedMap::new([(32, 32), (16, 16)], [(4, 4), (2, 2)]);
    map.mark_decoded(ChannelType::Luma, 0, 0, 32, 32);
    let s = Setup { picture: picture, map: map, sps: SequenceParams::default() };

    let block = PredictionBlock::new(ComponentID::Y, 8, 8, 8, 8, 8);
    let source = s.picture.region(8, 8, 8, 8);
    let (pred, record, mode) = search(&s, &block, &source);
    assert_eq!(mode, PLANAR_IDX);
    assert!(record.indices().iter().all(|&idx| idx == 0));
    for y in 0..8 {
      assert!(pred[y].iter().all(|&v| v == 100));
    }
  }

  #[test]
  fn vertical_candidate_follows_columns() {
    // Columns of constant value: pure vertical is exact on every ring
    let picture = Array2D::new_with(48, 48, |_, j| (j * 5) as u16);
    let mut map = DecodedMap::new([(48, 48), (24, 24)], [(4, 4), (2, 2)]);
    map.mark_decoded(ChannelType::Luma, 0, 0, 48, 48);
    let s = Setup { picture: picture, map: map, sps: SequenceParams::default() };

    let block = PredictionBlock::new(ComponentID::Y, 16, 16, 16, 16, 8);
    let source = s.picture.region(16, 16, 16, 16);
    let (pred, record, mode) = search(&s, &block, &source);
    assert_eq!(mode, VER_IDX);
    assert_eq!(pred, source);
    let ver = s.sps.lip.candidates.iter().position(|&m| m == VER_IDX).unwrap();
    assert!(record.indices().iter().all(|&idx| idx as usize == ver));
  }

  #[test]
  fn record_serialization() {
    let record = DecisionRecord::from_indices(&[3, 0, 7, 7, 1]);
    let mut data = Vec::new();
    record.write_to(&mut data, 3).unwrap();
    // Count byte, then 15 bits of indices padded to 2 bytes
    assert_eq!(data, vec![5, 0b011_000_11, 0b1_111_001_0]);

    let parsed = DecisionRecord::read_from(&mut &data[..], 3, 8).unwrap();
    assert_eq!(parsed, record);

    let truncated = DecisionRecord::read_from(&mut &data[..2], 3, 8);
    assert!(matches!(truncated, Err(Error::Record(_))));

    let out_of_range = DecisionRecord::read_from(&mut &data[..], 3, 4);
    assert!(matches!(out_of_range, Err(Error::Record(_))));
  }

  #[test]
  #[should_panic(expected = "no entry for slot")]
  fn replay_past_end_of_record() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let s = setup(&mut rng, false);
    let block = PredictionBlock::new(ComponentID::Y, 16, 16, 8, 8, 8);
    replay(&s, &block, &DecisionRecord::from_indices(&[0, 1]), None);
  }

  #[test]
  #[should_panic(expected = "Matrix-based prediction")]
  fn matrix_mode_is_rejected() {
    let mut ip = IntraPredictor::new();
    let block = PredictionBlock::new(ComponentID::Y, 0, 0, 8, 8, 8);
    let info = IntraCodingInfo { mip: true, ..Default::default() };
    let record = DecisionRecord::new();
    let mut pred = Array2D::zeroed(8, 8);
    predict_rings(&mut ip, &block, &info, &LipParams::default(), SampleSource::Reconstructed { residual: None },
                  &mut ReplayStrategy::new(&record), &mut pred);
  }

  #[test]
  #[should_panic(expected = "Width of 2")]
  fn width_two_is_rejected() {
    let mut ip = IntraPredictor::new();
    let block = PredictionBlock::new(ComponentID::Cb, 0, 0, 2, 8, 8);
    let record = DecisionRecord::new();
    let mut pred = Array2D::zeroed(8, 8);
    predict_rings(&mut ip, &block, &IntraCodingInfo::default(), &LipParams::default(),
                  SampleSource::Reconstructed { residual: None }, &mut ReplayStrategy::new(&record), &mut pred);
  }
}
