// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use std::io::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::exit;
use std::str::FromStr;

use clap::Parser;
use log::{error, info};

use tinyintra::config::{LipParams, SequenceParams};
use tinyintra::consts::LIP_RESERVE_CNT;
use tinyintra::enums::ComponentID;
use tinyintra::frame::Frame;
use tinyintra::picture::PictureCoder;
use tinyintra::y4m::{Y4MReader, Y4MWriter};

#[derive(Parser)]
#[command(override_usage = "tinyintra <INPUT> [--block-size <SIZE>] [--records <FILE>] [--prediction <FILE>]")]
struct CommandlineArgs {
  /// Input file, must end in .y4m
  input: PathBuf,
  /// Luma block size. Must be a power of two from 4 to 128, inclusive
  #[arg(short, long, default_value_t = 8)]
  block_size: usize,
  /// Sub-block area below which the remaining rings share one decision
  #[arg(long, default_value_t = LIP_RESERVE_CNT)]
  reserve_threshold: usize,
  /// Disable reference smoothing in the conventional modes
  #[arg(long)]
  no_smoothing: bool,
  /// Write the serialized decision records here
  #[arg(short, long)]
  records: Option<PathBuf>,
  /// Write the ring selector's prediction here, as .y4m
  #[arg(short, long)]
  prediction: Option<PathBuf>,
  /// More log output. Repeat for per-block detail
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn init_logger(verbose: u8) {
  let level = std::env::var("TINYINTRA_LOG")
    .ok()
    .and_then(|l| log::LevelFilter::from_str(&l).ok())
    .unwrap_or(match verbose {
      0 => log::LevelFilter::Info,
      1 => log::LevelFilter::Debug,
      _ => log::LevelFilter::Trace
    });

  fern::Dispatch::new()
    .format(|out, message, record| {
      out.finish(format_args!("[{}] {}", record.level(), message))
    })
    .level(log::LevelFilter::Warn)
    .level_for("tinyintra", level)
    .chain(std::io::stderr())
    .apply()
    .unwrap();
}

fn write_outputs(records_path: Option<&Path>, prediction_path: Option<&Path>, stream: &[u8], prediction: &Frame,
                 crop_width: usize, crop_height: usize, bit_depth: u32) -> tinyintra::Result<()> {
  if let Some(path) = records_path {
    let mut records_file = File::create(path)?;
    records_file.write_all(stream)?;
  }
  if let Some(path) = prediction_path {
    let prediction_file = File::create(path)?;
    let mut writer = Y4MWriter::new(prediction_file, crop_width, crop_height, prediction.chroma_format(), bit_depth)?;
    writer.write_frame(prediction)?;
  }
  Ok(())
}

fn main() {
  let args = CommandlineArgs::parse();
  init_logger(args.verbose);

  let input_path = args.input;
  if input_path.extension().and_then(|ext| ext.to_str()) != Some("y4m") {
    error!("Input file must end in .y4m");
    exit(2);
  }

  let mut y4m = match File::open(&input_path).map_err(tinyintra::Error::from).and_then(Y4MReader::new) {
    Ok(y4m) => y4m,
    Err(e) => {
      error!("Could not read {}: {}", input_path.display(), e);
      exit(2);
    }
  };

  let sps = SequenceParams {
    chroma_format: y4m.chroma_format(),
    bit_depth_luma: y4m.bit_depth(),
    bit_depth_chroma: y4m.bit_depth(),
    intra_smoothing_disabled: args.no_smoothing,
    lip: LipParams {
      reserve_threshold: args.reserve_threshold,
      ..LipParams::default()
    },
    ..SequenceParams::default()
  };
  let mut coder = match PictureCoder::new(sps, args.block_size) {
    Ok(coder) => coder,
    Err(e) => {
      error!("{}", e);
      exit(2);
    }
  };

  let source = match y4m.read_frame(coder.align()) {
    Ok(frame) => frame,
    Err(e) => {
      error!("Could not read a frame from {}: {}", input_path.display(), e);
      exit(2);
    }
  };
  let crop_width = source.y().crop_width();
  let crop_height = source.y().crop_height();
  info!("{}x{} {:?} at {} bits, {}x{} blocks",
        crop_width, crop_height, source.chroma_format(), y4m.bit_depth(), args.block_size, args.block_size);

  // Encode
  let encoded = coder.encode(&source);
  let mut stream = Vec::new();
  if let Err(e) = coder.write_records(&mut stream, &encoded.records) {
    error!("Could not serialize decision records: {}", e);
    exit(1);
  }

  let outputs = write_outputs(args.records.as_deref(), args.prediction.as_deref(), &stream, &encoded.prediction,
                              crop_width, crop_height, y4m.bit_depth());
  if let Err(e) = outputs {
    error!("Could not write output: {}", e);
    exit(2);
  }

  // Decode from the serialized records and check the result
  let records = match coder.read_records(&mut &stream[..], encoded.records.len()) {
    Ok(records) => records,
    Err(e) => {
      error!("{}", e);
      exit(1);
    }
  };
  let decoded = match coder.decode(crop_width, crop_height, &records, &encoded.residual) {
    Ok(decoded) => decoded,
    Err(e) => {
      error!("{}", e);
      exit(1);
    }
  };

  for (&comp, plane) in ComponentID::ALL.iter().zip(source.planes()) {
    if decoded.reconstruction.plane(comp).pixels() != plane.pixels()
       || decoded.prediction.plane(comp).pixels() != encoded.prediction.plane(comp).pixels() {
      error!("Decoder output differs from the encoder in the {:?} plane", comp);
      exit(1);
    }
  }

  let stats = encoded.stats;
  info!("{} blocks, {} bytes of decision records ({:.2} bits per block)",
        stats.blocks, stream.len(), (stream.len() * 8) as f64 / stats.blocks as f64);
  info!("ring selector SAD {}, best single mode SAD {}, ring selector as good or better in {} blocks",
        stats.ring_sad, stats.conventional_sad, stats.ring_wins);
}
