//! Applying the per-scanline filters for encoding, including the adaptive
//! per-row choice.

use alloc::vec::Vec;

use crate::unfilter::paeth_predict;

/// One of the five scanline filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowFilter {
  /// Bytes pass through unchanged.
  None = 0,
  /// Difference from the byte one filter unit to the left.
  Sub = 1,
  /// Difference from the byte directly above.
  Up = 2,
  /// Difference from the floored average of left and above.
  Average = 3,
  /// Difference from the Paeth prediction of left, above, and above-left.
  Paeth = 4,
}

impl RowFilter {
  /// The filter type byte written into the scanline.
  #[inline]
  #[must_use]
  pub const fn type_byte(self) -> u8 {
    self as u8
  }
}

/// How the encoder picks a filter for each row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStrategy {
  /// Per row, try Sub, Up, Average, and Paeth and keep whichever gives the
  /// smallest sum of filtered bytes. None is deliberately never tried; the
  /// sum heuristic is a proxy for compressed size and a row that would win
  /// as None compresses about as well under Sub.
  Adaptive,
  /// Use the one given filter for every row.
  Fixed(RowFilter),
}

/// Filters one row of samples into `out`, pushing the filtered bytes only
/// (no filter type byte).
pub(crate) fn filter_row_into(
  out: &mut Vec<u8>, cur: &[u8], prev: &[u8], unit: usize, filter: RowFilter,
) {
  debug_assert_eq!(cur.len(), prev.len());
  match filter {
    RowFilter::None => out.extend_from_slice(cur),
    RowFilter::Sub => {
      for (i, &x) in cur.iter().enumerate() {
        let a = if i >= unit { cur[i - unit] } else { 0 };
        out.push(x.wrapping_sub(a));
      }
    }
    RowFilter::Up => {
      for (&x, &b) in cur.iter().zip(prev.iter()) {
        out.push(x.wrapping_sub(b));
      }
    }
    RowFilter::Average => {
      for (i, &x) in cur.iter().enumerate() {
        let a = if i >= unit { cur[i - unit] as u16 } else { 0 };
        let b = prev[i] as u16;
        out.push(x.wrapping_sub(((a + b) / 2) as u8));
      }
    }
    RowFilter::Paeth => {
      for (i, &x) in cur.iter().enumerate() {
        let a = if i >= unit { cur[i - unit] } else { 0 };
        let b = prev[i];
        let c = if i >= unit { prev[i - unit] } else { 0 };
        out.push(x.wrapping_sub(paeth_predict(a, b, c)));
      }
    }
  }
}

/// Filters every row of `samples` according to `strategy`, producing
/// complete filtered scanlines (filter type byte included).
///
/// `samples` is `height` rows of `row_bytes` unfiltered sample bytes; rows
/// above the image are all zero for filtering purposes.
pub(crate) fn filter_scanlines(
  samples: &[u8], row_bytes: usize, unit: usize, strategy: FilterStrategy,
) -> Vec<u8> {
  let height = samples.len() / row_bytes;
  debug_assert_eq!(samples.len(), row_bytes * height);
  let mut out = Vec::with_capacity((row_bytes + 1) * height);
  let zero_row = alloc::vec![0_u8; row_bytes];
  let mut candidate: Vec<u8> = Vec::with_capacity(row_bytes);
  let mut best: Vec<u8> = Vec::with_capacity(row_bytes);
  let mut prev: &[u8] = &zero_row;
  for cur in samples.chunks_exact(row_bytes) {
    match strategy {
      FilterStrategy::Fixed(filter) => {
        out.push(filter.type_byte());
        filter_row_into(&mut out, cur, prev, unit, filter);
      }
      FilterStrategy::Adaptive => {
        let mut best_filter = RowFilter::Sub;
        let mut best_sum = u64::MAX;
        for filter in [RowFilter::Sub, RowFilter::Up, RowFilter::Average, RowFilter::Paeth] {
          candidate.clear();
          filter_row_into(&mut candidate, cur, prev, unit, filter);
          let sum: u64 = candidate.iter().map(|&b| u64::from(b)).sum();
          if sum < best_sum {
            best_sum = sum;
            best_filter = filter;
            core::mem::swap(&mut best, &mut candidate);
          }
        }
        out.push(best_filter.type_byte());
        out.extend_from_slice(&best);
      }
    }
    prev = cur;
  }
  out
}

#[test]
fn test_filter_then_unfilter_is_identity() {
  use crate::{header::ColorFormat, unfilter::unfilter_scanlines};
  // two rows of RGB8 with deliberate wrap-around material in them.
  let samples: [u8; 12] = [250, 3, 7, 255, 128, 0, 2, 254, 130, 66, 66, 66];
  for filter in
    [RowFilter::None, RowFilter::Sub, RowFilter::Up, RowFilter::Average, RowFilter::Paeth]
  {
    let filtered = filter_scanlines(&samples, 6, 3, FilterStrategy::Fixed(filter));
    assert_eq!(filtered.len(), 14);
    let mut recovered = filtered.clone();
    unfilter_scanlines(ColorFormat::Rgb8, 2, &mut recovered).unwrap();
    assert_eq!(&recovered[1..7], &samples[..6], "filter {filter:?}");
    assert_eq!(&recovered[8..], &samples[6..], "filter {filter:?}");
  }
}

#[test]
fn test_adaptive_picks_the_smallest_sum() {
  // a flat row: Sub zeroes everything after the first pixel, beating Up
  // against the implied zero row above, which leaves the row unchanged.
  let samples = [200_u8; 8];
  let filtered = filter_scanlines(&samples, 8, 4, FilterStrategy::Adaptive);
  assert_eq!(filtered[0], RowFilter::Sub.type_byte());
  // a second row identical to the first: Up zeroes the entire row.
  let two = [[200_u8; 8], [200_u8; 8]].concat();
  let filtered = filter_scanlines(&two, 8, 4, FilterStrategy::Adaptive);
  assert_eq!(filtered[9], RowFilter::Up.type_byte());
  let row1 = &filtered[10..18];
  assert!(row1.iter().all(|&b| b == 0));
}
