//! Row-stripe parallel decoding for RGBA8 images.
//!
//! A scanline filtered with None or Sub never looks at the line above it,
//! so any such line can start an independent stripe. The driver cuts the
//! filtered buffer at those lines, un-filters and unpacks every stripe on
//! its own worker, and each stripe writes to its own disjoint slice of the
//! output. The merge is free: the slices were carved from the final buffer
//! up front, so finishing the stripes finishes the image.

use alloc::vec::Vec;

use log::trace;
use rayon::prelude::*;

use crate::{
  decode::{decode_png, gather_chunks, inflate_idats},
  error::{PngError, PngResult},
  header::ColorFormat,
  image::Bitmap,
  pixels::RGBA8,
  unfilter::unfilter_scanlines,
  unpack::unpack_rows,
};

/// One independently decodable run of scanlines, paired with its slice of
/// the output.
struct Stripe<'a> {
  filtered: &'a mut [u8],
  out: &'a mut [RGBA8],
}

/// The scanline indices where a new stripe may begin: every line whose
/// filter type doesn't reference the line above.
fn stripe_starts(filtered: &[u8], line_len: usize) -> Vec<usize> {
  let mut starts = Vec::new();
  for (y, line) in filtered.chunks_exact(line_len).enumerate() {
    if y == 0 || line[0] <= 1 {
      starts.push(y);
    }
  }
  starts
}

/// Picks about `want` cut points out of the legal stripe starts, spaced as
/// evenly as the filters allow.
fn choose_cuts(starts: &[usize], height: usize, want: usize) -> Vec<usize> {
  let mut cuts = Vec::with_capacity(want);
  cuts.push(0);
  if want < 2 {
    return cuts;
  }
  let target_rows = height.div_ceil(want);
  for &y in &starts[1..] {
    if y - cuts.last().unwrap() >= target_rows {
      cuts.push(y);
    }
  }
  cuts
}

/// Decodes an RGBA8 PNG using up to `workers` threads (`0` means one per
/// host CPU, rayon's default).
///
/// Only 8-bit RGBA images actually run striped; every other format falls
/// back to the sequential [`decode_png`], as does an image whose filters
/// never allow a cut. Output is bit-identical to the sequential path either
/// way.
pub fn decode_png_parallel(png: &[u8], workers: usize) -> PngResult<Bitmap<RGBA8>> {
  let gather = gather_chunks(png)?;
  let ihdr = gather.ihdr;
  if ihdr.format != ColorFormat::Rgba8 {
    return decode_png(png);
  }
  let mut filtered = inflate_idats(&gather)?;
  let line_len = ihdr.format.bytes_per_filterline(ihdr.width);
  let height = ihdr.height as usize;
  let width = ihdr.width as usize;

  let starts = stripe_starts(&filtered, line_len);
  let degree = if workers == 0 { rayon::current_num_threads() } else { workers };
  let cuts = choose_cuts(&starts, height, degree);
  trace!("parallel decode: {} stripes over {} workers", cuts.len(), degree);

  let pixel_count = ihdr.pixel_count()?;
  let mut pixels: Vec<RGBA8> = Vec::new();
  pixels.try_reserve_exact(pixel_count)?;
  pixels.resize(pixel_count, RGBA8::ZERO);

  let mut stripes: Vec<Stripe<'_>> = Vec::with_capacity(cuts.len());
  {
    let mut filtered_rest: &mut [u8] = &mut filtered;
    let mut out_rest: &mut [RGBA8] = &mut pixels;
    for pair in cuts.windows(2) {
      let rows = pair[1] - pair[0];
      let (f, fr) = filtered_rest.split_at_mut(rows * line_len);
      let (o, or) = out_rest.split_at_mut(rows * width);
      filtered_rest = fr;
      out_rest = or;
      stripes.push(Stripe { filtered: f, out: o });
    }
    stripes.push(Stripe { filtered: filtered_rest, out: out_rest });
  }

  let run = || {
    stripes.into_par_iter().try_for_each(|stripe| -> PngResult<()> {
      unfilter_scanlines(ihdr.format, ihdr.width, stripe.filtered)?;
      unpack_rows(ihdr.format, ihdr.width, None, None, stripe.filtered, stripe.out)
    })
  };
  if workers == 0 {
    run()?;
  } else {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(workers)
      .build()
      .map_err(|_| PngError::ThreadPool)?;
    pool.install(run)?;
  }
  Ok(Bitmap { width: ihdr.width, height: ihdr.height, pixels })
}

#[test]
fn test_stripe_starts_and_cuts() {
  // 6 one-byte scanlines (gray8, width 1) with filters: none, up, sub,
  // paeth, none, sub.
  let filtered = [0_u8, 9, 2, 9, 1, 9, 4, 9, 0, 9, 1, 9];
  let starts = stripe_starts(&filtered, 2);
  assert_eq!(starts, alloc::vec![0, 2, 4, 5]);
  // ask for 3 stripes over 6 rows: cuts land on legal starts only.
  let cuts = choose_cuts(&starts, 6, 3);
  assert_eq!(cuts, alloc::vec![0, 2, 4]);
  // a single worker leaves everything in one stripe.
  assert_eq!(choose_cuts(&starts, 6, 1), alloc::vec![0]);
}

#[test]
fn test_parallel_header_mismatch_falls_back() {
  // an indexed image goes through the sequential path and still decodes.
  use crate::encode::{encode_png, EncodeColor, EncodeOptions};
  let rgba: Vec<u8> = (0_u8..16).flat_map(|i| [i * 16, 0, 0, 255]).collect();
  let opts = EncodeOptions { color: EncodeColor::Indexed, ..EncodeOptions::default() };
  let png = encode_png(&rgba, 4, 4, opts).unwrap();
  let seq = decode_png(&png).unwrap();
  let par = decode_png_parallel(&png, 2).unwrap();
  assert_eq!(seq, par);
}
