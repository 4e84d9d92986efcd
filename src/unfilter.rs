//! Undoing the per-scanline filters, turning filtered bytes back into raw
//! sample bytes.
//!
//! Filters work on **bytes**, not pixels: each filtered byte is recovered
//! from its own value plus some mix of the byte one [`filter_unit`] to the
//! left, the byte directly above, and the byte above-left, all mod 256.
//! Everything happens in the raw scanline domain, before any unpacking to
//! RGBA.
//!
//! [`filter_unit`]: ColorFormat::filter_unit

use crate::{
  error::{PngError, PngResult},
  header::ColorFormat,
};

/// The Paeth predictor: whichever of `a` (left), `b` (up), `c` (up-left) is
/// closest to `a + b - c`.
///
/// The order of the comparisons below is load-bearing; ties go to `a`, then
/// `b`.
#[inline]
#[must_use]
pub const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let p = a as i32 + b as i32 - c as i32;
  let pa = (p - a as i32).abs();
  let pb = (p - b as i32).abs();
  let pc = (p - c as i32).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Un-filters any whole number of scanlines, in place.
///
/// `raw` holds filtered scanlines back to back, each one a filter type byte
/// followed by `bytes_per_scanline` sample bytes. On success every scanline
/// holds recovered sample bytes and every filter byte has been reset to 0
/// (so running this twice is harmless).
///
/// The first scanline of `raw` is treated as having an all-zero line above
/// it. That's correct for the top of an image, and it's equally correct for
/// any stripe whose first line uses a filter that never looks up (None or
/// Sub), which is exactly how the parallel driver partitions.
///
/// ## Failure
/// * `Truncated` when `raw` isn't a whole number of scanlines.
/// * `BadFilter` when a filter type byte isn't in `0..=4`.
pub fn unfilter_scanlines(
  format: ColorFormat, width: u32, raw: &mut [u8],
) -> PngResult<()> {
  let line_len = format.bytes_per_filterline(width);
  if raw.len() % line_len != 0 {
    return Err(PngError::Truncated);
  }
  let unit = format.filter_unit();
  let lines = raw.chunks_exact_mut(line_len).map(|line| {
    let (f, samples) = line.split_at_mut(1);
    (&mut f[0], samples)
  });
  let mut prev: Option<&[u8]> = None;
  for (ftype, cur) in lines {
    match (*ftype, prev) {
      (0, _) | (2, None) => (),
      // Sub, and Paeth against an all-zero line (which predicts the left
      // byte every time).
      (1, _) | (4, None) => {
        for i in unit..cur.len() {
          cur[i] = cur[i].wrapping_add(cur[i - unit]);
        }
      }
      (2, Some(up)) => {
        cur.iter_mut().zip(up.iter().copied()).for_each(|(x, b)| *x = x.wrapping_add(b));
      }
      (3, None) => {
        for i in unit..cur.len() {
          cur[i] = cur[i].wrapping_add(cur[i - unit] / 2);
        }
      }
      (3, Some(up)) => {
        for i in 0..cur.len() {
          let a = if i >= unit { cur[i - unit] as u16 } else { 0 };
          let b = up[i] as u16;
          cur[i] = cur[i].wrapping_add(((a + b) / 2) as u8);
        }
      }
      (4, Some(up)) => {
        for i in 0..cur.len() {
          let a = if i >= unit { cur[i - unit] } else { 0 };
          let b = up[i];
          let c = if i >= unit { up[i - unit] } else { 0 };
          cur[i] = cur[i].wrapping_add(paeth_predict(a, b, c));
        }
      }
      _ => return Err(PngError::BadFilter),
    }
    *ftype = 0;
    prev = Some(cur);
  }
  Ok(())
}

#[test]
fn test_paeth_tie_breaking() {
  // all zero distances: take `a`.
  assert_eq!(paeth_predict(0, 0, 0), 0);
  // p = 30, distances (20, 10, 30): take `b`.
  assert_eq!(paeth_predict(10, 20, 0), 20);
  // a and b tie: take `a`.
  assert_eq!(paeth_predict(7, 7, 7), 7);
}

#[test]
fn test_unfilter_sub_row() {
  // 2x2 RGB8: both rows Sub-filtered.
  let mut raw = [
    0x01, 0x0A, 0x14, 0x1E, 0x1E, 0x1E, 0x1E, //
    0x01, 0x46, 0x50, 0x5A, 0x1E, 0x1E, 0x1E,
  ];
  unfilter_scanlines(ColorFormat::Rgb8, 2, &mut raw).unwrap();
  assert_eq!(raw, [
    0, 10, 20, 30, 40, 50, 60, //
    0, 70, 80, 90, 100, 110, 120,
  ]);
}

#[test]
fn test_unfilter_rejects_unknown_filter() {
  let mut raw = [5, 0, 0, 0, 0];
  assert_eq!(
    unfilter_scanlines(ColorFormat::Rgba8, 1, &mut raw),
    Err(PngError::BadFilter)
  );
}

#[test]
fn test_unfilter_average_and_paeth_track_both_neighbours() {
  // 2 rows of 2 RGBA8 pixels; row 0 Up (no-op), row 1 Average.
  let mut raw = [
    0x02, 10, 10, 10, 10, 30, 30, 30, 30, //
    0x03, 10, 10, 10, 10, 10, 10, 10, 10,
  ];
  unfilter_scanlines(ColorFormat::Rgba8, 2, &mut raw).unwrap();
  // row 1 first pixel: 10 + (0 + 10)/2 = 15; second: 10 + (15 + 30)/2 = 32.
  assert_eq!(&raw[10..], &[15, 15, 15, 15, 32, 32, 32, 32]);
  let mut raw = [
    0x00, 1, 2, 3, 4, 5, 6, 7, 8, //
    0x04, 1, 1, 1, 1, 1, 1, 1, 1,
  ];
  unfilter_scanlines(ColorFormat::Rgba8, 2, &mut raw).unwrap();
  // row 1 first pixel predicts straight up (1..=4), second predicts via
  // paeth(left, up, up_left).
  let mut expect = [0_u8; 8];
  for i in 0..4 {
    expect[i] = 1 + (i as u8 + 1);
  }
  for i in 4..8 {
    expect[i] = 1 + paeth_predict(expect[i - 4], i as u8 + 1, i as u8 - 3);
  }
  assert_eq!(&raw[10..], &expect);
}
