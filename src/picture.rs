// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Whole-picture driver for the ring selector
//
// Blocks are visited in raster order, one component at a time. The encoder
// searches each block against the source picture and keeps the residual,
// so its reconstruction is exact. The decoder rebuilds the picture from the
// decision records and that residual alone.

use std::io::{Read, Write};

use log::{debug, warn};

use crate::array2d::Array2D;
use crate::config::SequenceParams;
use crate::enums::*;
use crate::error::{Error, InvalidConfig, Result};
use crate::frame::{Frame, Plane};
use crate::lip::*;
use crate::neighbors::DecodedMap;
use crate::params::{IntraCodingInfo, PredictionBlock};
use crate::predict::IntraPredictor;
use crate::util::clip_pel;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeStats {
  pub blocks: usize,
  // Total SAD of the ring selector's prediction
  pub ring_sad: u64,
  // Total SAD of the best single conventional mode per block
  pub conventional_sad: u64,
  // Blocks where the ring selector did at least as well
  pub ring_wins: usize,
}

pub struct EncodedPicture {
  pub prediction: Frame,
  // Source minus prediction, one array per plane
  pub residual: Vec<Array2D<i32>>,
  // One per block, in coding order
  pub records: Vec<DecisionRecord>,
  pub stats: EncodeStats,
}

pub struct DecodedPicture {
  pub prediction: Frame,
  pub reconstruction: Frame,
}

pub struct PictureCoder {
  sps: SequenceParams,
  block_size: usize,
  ip: IntraPredictor,
}

fn block_sad(a: &Array2D<u16>, b: &Array2D<u16>) -> u64 {
  let mut sad = 0;
  for i in 0..b.rows() {
    for j in 0..b.cols() {
      sad += a[i][j].abs_diff(b[i][j]) as u64;
    }
  }
  sad
}

// Top-left corners of the width x height blocks tiling `plane`, in raster order
fn raster_blocks(plane: &Plane, width: usize, height: usize) -> impl Iterator<Item = (usize, usize)> {
  let (plane_width, plane_height) = (plane.width(), plane.height());
  (0..plane_height).step_by(height)
    .flat_map(move |y| (0..plane_width).step_by(width).map(move |x| (x, y)))
}

impl PictureCoder {
  // `block_size` is in luma samples; chroma blocks are scaled down to match
  // but never below 4x4
  pub fn new(sps: SequenceParams, block_size: usize) -> Result<Self> {
    sps.validate()?;
    if block_size < 4 || block_size > 128 || !block_size.is_power_of_two() {
      return Err(InvalidConfig::BlockSize(block_size).into());
    }
    Ok(Self {
      sps: sps,
      block_size: block_size,
      ip: IntraPredictor::new()
    })
  }

  pub fn sps(&self) -> &SequenceParams {
    &self.sps
  }

  // Luma padding granularity which lets every plane tile exactly
  pub fn align(&self) -> usize {
    self.block_size.max(8)
  }

  fn block_dims(&self, comp: ComponentID) -> (usize, usize) {
    let (sx, sy) = self.sps.chroma_format.scale(comp);
    ((self.block_size >> sx).max(4), (self.block_size >> sy).max(4))
  }

  fn new_map(&self, frame: &Frame) -> DecodedMap {
    let y = frame.y();
    let (sx, sy) = self.sps.chroma_format.scale(ComponentID::Cb);
    let min_cu = self.sps.min_cu_size;
    DecodedMap::new([(y.width(), y.height()), (y.width() >> sx, y.height() >> sy)],
                    [(min_cu, min_cu), (min_cu >> sx, min_cu >> sy)])
  }

  fn new_frame(&self, crop_width: usize, crop_height: usize) -> Frame {
    Frame::new(crop_width, crop_height, self.sps.chroma_format, self.sps.bit_depth_luma, self.align())
  }

  pub fn num_blocks(&self, crop_width: usize, crop_height: usize) -> usize {
    let frame = self.new_frame(crop_width, crop_height);
    frame.planes().iter().zip(ComponentID::ALL).map(|(plane, comp)| {
      let (bw, bh) = self.block_dims(comp);
      (plane.width() / bw) * (plane.height() / bh)
    }).sum()
  }

  fn components(&self) -> &'static [ComponentID] {
    &ComponentID::ALL[.. self.sps.chroma_format.num_components()]
  }

  pub fn encode(&mut self, source: &Frame) -> EncodedPicture {
    assert!(source.chroma_format() == self.sps.chroma_format);
    let y = source.y();
    if y.crop_width() != y.width() || y.crop_height() != y.height() {
      warn!("picture {}x{} does not tile exactly, coding padded size {}x{}",
            y.crop_width(), y.crop_height(), y.width(), y.height());
    }

    let mut prediction = self.new_frame(y.crop_width(), y.crop_height());
    let mut residual = Vec::with_capacity(3);
    let mut records = Vec::new();
    let mut stats = EncodeStats::default();
    let mut map = self.new_map(source);

    for &comp in self.components() {
      let src = source.plane(comp).pixels();
      let (bw, bh) = self.block_dims(comp);
      let bit_depth = self.sps.bit_depth(comp.channel_type());
      let mut plane_residual = Array2D::zeroed(src.rows(), src.cols());
      let mut block_pred = Array2D::zeroed(bh, bw);
      let mut conventional_pred = Array2D::zeroed(bh, bw);
      map.clear();

      for (x, y) in raster_blocks(source.plane(comp), bw, bh) {
        let block = PredictionBlock::new(comp, x, y, bw, bh, bit_depth);
        let target = src.region(y, x, bh, bw);

        self.ip.prepare_unfiltered(src, &map, &block, &self.sps);
        let mut search = SearchStrategy::new(&target);
        let mode = predict_rings(&mut self.ip, &block, &IntraCodingInfo::default(), &self.sps.lip,
                                 SampleSource::Original(&target), &mut search, &mut block_pred);
        let ring_sad = search.total_cost().unwrap_or(0);

        let (best_mode, best_sad) = self.best_conventional(src, &map, &block, &target, &mut conventional_pred);
        debug!("{:?} block at ({}, {}): ring mode {} SAD {}, best single mode {} SAD {}",
               comp, x, y, mode, ring_sad, best_mode, best_sad);

        stats.blocks += 1;
        stats.ring_sad += ring_sad;
        stats.conventional_sad += best_sad;
        if ring_sad <= best_sad {
          stats.ring_wins += 1;
        }

        prediction.plane_mut(comp).pixels_mut().copy_region_from(y, x, bh, bw, &block_pred);
        for i in 0..bh {
          for j in 0..bw {
            plane_residual[y + i][x + j] = target[i][j] as i32 - block_pred[i][j] as i32;
          }
        }
        records.push(search.into_record());
        map.mark_decoded(comp.channel_type(), x, y, bw, bh);
      }
      residual.push(plane_residual);
    }

    EncodedPicture {
      prediction: prediction,
      residual: residual,
      records: records,
      stats: stats
    }
  }

  // Lowest full-block SAD over all conventional modes, with references
  // taken from the source picture
  fn best_conventional(&mut self, src: &Array2D<u16>, map: &DecodedMap, block: &PredictionBlock,
                       target: &Array2D<u16>, scratch: &mut Array2D<u16>) -> (u32, u64) {
    let mut best = (PLANAR_IDX, u64::MAX);
    for mode in 0..NUM_LUMA_MODE {
      let info = IntraCodingInfo::with_mode(mode);
      self.ip.prepare(src, map, block, &info, &self.sps);
      self.ip.predict(block, &info, scratch);
      let sad = block_sad(scratch, target);
      if sad < best.1 {
        best = (mode, sad);
      }
    }
    best
  }

  pub fn decode(&mut self, crop_width: usize, crop_height: usize, records: &[DecisionRecord],
                residual: &[Array2D<i32>]) -> Result<DecodedPicture> {
    let mut prediction = self.new_frame(crop_width, crop_height);
    let mut reconstruction = self.new_frame(crop_width, crop_height);
    let mut map = self.new_map(&reconstruction);
    let mut records = records.iter();

    for &comp in self.components() {
      let (bw, bh) = self.block_dims(comp);
      let bit_depth = self.sps.bit_depth(comp.channel_type());
      let plane_residual = residual.get(comp.idx())
        .ok_or_else(|| Error::Record(format!("no residual for {:?}", comp)))?;
      let mut block_pred = Array2D::zeroed(bh, bw);
      map.clear();

      let positions: Vec<_> = raster_blocks(reconstruction.plane(comp), bw, bh).collect();
      for (x, y) in positions {
        let record = records.next()
          .ok_or_else(|| Error::Record("fewer records than blocks".to_string()))?;
        let expected = num_decisions(bw, bh, self.sps.lip.reserve_threshold);
        if record.len() != expected {
          return Err(Error::Record(format!("{:?} block at ({}, {}) has {} decisions, expected {}",
                                           comp, x, y, record.len(), expected)));
        }

        let block = PredictionBlock::new(comp, x, y, bw, bh, bit_depth);
        let block_residual = plane_residual.region(y, x, bh, bw);
        self.ip.prepare_unfiltered(reconstruction.plane(comp).pixels(), &map, &block, &self.sps);
        let mut replay = ReplayStrategy::new(record);
        predict_rings(&mut self.ip, &block, &IntraCodingInfo::default(), &self.sps.lip,
                      SampleSource::Reconstructed { residual: Some(&block_residual) }, &mut replay,
                      &mut block_pred);

        prediction.plane_mut(comp).pixels_mut().copy_region_from(y, x, bh, bw, &block_pred);
        let recon = reconstruction.plane_mut(comp).pixels_mut();
        for i in 0..bh {
          for j in 0..bw {
            let val = block_pred[i][j] as i32 + block_residual[i][j];
            recon[y + i][x + j] = clip_pel(val, bit_depth) as u16;
          }
        }
        map.mark_decoded(comp.channel_type(), x, y, bw, bh);
      }
    }

    if records.next().is_some() {
      return Err(Error::Record("more records than blocks".to_string()));
    }
    Ok(DecodedPicture {
      prediction: prediction,
      reconstruction: reconstruction
    })
  }

  pub fn write_records<W: Write>(&self, w: &mut W, records: &[DecisionRecord]) -> Result<()> {
    let bits_per_mode = self.sps.lip.bits_per_mode();
    for record in records {
      record.write_to(w, bits_per_mode)?;
    }
    Ok(())
  }

  // Parse exactly `count` records, rejecting trailing data
  pub fn read_records<R: Read>(&self, r: &mut R, count: usize) -> Result<Vec<DecisionRecord>> {
    let bits_per_mode = self.sps.lip.bits_per_mode();
    let num_candidates = self.sps.lip.candidates.len();
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
      records.push(DecisionRecord::read_from(r, bits_per_mode, num_candidates)?);
    }
    let mut rest = Vec::new();
    r.read_to_end(&mut rest)?;
    if !rest.is_empty() {
      return Err(Error::Record(format!("{} trailing bytes after the last record", rest.len())));
    }
    Ok(records)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use rand::{Rng, SeedableRng};
  use rand_chacha::ChaCha8Rng;

  fn random_frame(rng: &mut ChaCha8Rng, width: usize, height: usize, format: ChromaFormat, align: usize) -> Frame {
    let mut frame = Frame::new(width, height, format, 8, align);
    for plane in frame.planes_mut() {
      let (cw, ch) = (plane.crop_width(), plane.crop_height());
      // Smooth ramp plus noise, so the selector has something to follow
      let base = rng.gen_range(0..64usize);
      let pixels = plane.pixels_mut();
      for i in 0..ch {
        for j in 0..cw {
          pixels[i][j] = ((base + 2 * i + 3 * j) as u16 % 250 + rng.gen_range(0..6u16)).min(255);
        }
      }
      plane.fill_padding();
    }
    frame
  }

  #[test]
  fn decoder_rebuilds_encoder_output() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    for (format, block_size) in [(ChromaFormat::Cs420, 8), (ChromaFormat::Cs444, 16), (ChromaFormat::Cs400, 4)] {
      let sps = SequenceParams { chroma_format: format, ..SequenceParams::default() };
      let mut coder = PictureCoder::new(sps, block_size).unwrap();
      let source = random_frame(&mut rng, 36, 20, format, coder.align());

      let encoded = coder.encode(&source);
      assert_eq!(encoded.records.len(), coder.num_blocks(36, 20));
      assert_eq!(encoded.stats.blocks, encoded.records.len());

      let mut stream = Vec::new();
      coder.write_records(&mut stream, &encoded.records).unwrap();
      let records = coder.read_records(&mut &stream[..], encoded.records.len()).unwrap();
      assert_eq!(records, encoded.records);

      let decoded = coder.decode(36, 20, &records, &encoded.residual).unwrap();
      for (comp, src) in ComponentID::ALL.iter().zip(source.planes()) {
        assert_eq!(decoded.prediction.plane(*comp).pixels(), encoded.prediction.plane(*comp).pixels());
        assert_eq!(decoded.reconstruction.plane(*comp).pixels(), src.pixels());
      }
    }
  }

  #[test]
  fn record_count_mismatch_is_an_error() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut coder = PictureCoder::new(SequenceParams::default(), 16).unwrap();
    let source = random_frame(&mut rng, 32, 32, ChromaFormat::Cs420, coder.align());
    let encoded = coder.encode(&source);

    let short = &encoded.records[1..];
    assert!(matches!(coder.decode(32, 32, short, &encoded.residual), Err(Error::Record(_))));

    let mut stream = Vec::new();
    coder.write_records(&mut stream, &encoded.records).unwrap();
    stream.push(0);
    assert!(matches!(coder.read_records(&mut &stream[..], encoded.records.len()), Err(Error::Record(_))));
  }

  #[test]
  fn rejects_bad_block_size() {
    assert!(matches!(PictureCoder::new(SequenceParams::default(), 12),
                     Err(Error::Config(InvalidConfig::BlockSize(12)))));
  }
}
