//! The image header and the pixel formats PNG allows.

use crate::error::{PngError, PngResult};

/// A color type and bit depth pairing that PNG actually allows.
///
/// PNG stores the two as separate header bytes but only 15 of the
/// combinations are legal, so this crate folds them into one enum and any
/// other pairing fails at header parse time.
///
/// * `Gray`/`Pal` formats below 8 bits pack several samples into each byte,
///   with the leftmost pixel in the highest bits.
/// * `Pal` samples are indices into the `PLTE` palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ColorFormat {
  Gray1,
  Gray2,
  Gray4,
  Gray8,
  Gray16,
  Rgb8,
  Rgb16,
  Pal1,
  Pal2,
  Pal4,
  Pal8,
  GrayAlpha8,
  GrayAlpha16,
  Rgba8,
  Rgba16,
}

impl ColorFormat {
  /// Builds the format from the raw `bit_depth` and `color_type` header
  /// bytes, or `None` for any pairing PNG forbids.
  #[inline]
  #[must_use]
  pub const fn from_wire(bit_depth: u8, color_type: u8) -> Option<Self> {
    Some(match (bit_depth, color_type) {
      (1, 0) => Self::Gray1,
      (2, 0) => Self::Gray2,
      (4, 0) => Self::Gray4,
      (8, 0) => Self::Gray8,
      (16, 0) => Self::Gray16,
      (8, 2) => Self::Rgb8,
      (16, 2) => Self::Rgb16,
      (1, 3) => Self::Pal1,
      (2, 3) => Self::Pal2,
      (4, 3) => Self::Pal4,
      (8, 3) => Self::Pal8,
      (8, 4) => Self::GrayAlpha8,
      (16, 4) => Self::GrayAlpha16,
      (8, 6) => Self::Rgba8,
      (16, 6) => Self::Rgba16,
      _ => return None,
    })
  }

  /// Bits per sample.
  #[inline]
  #[must_use]
  pub const fn bit_depth(self) -> u8 {
    match self {
      Self::Gray1 | Self::Pal1 => 1,
      Self::Gray2 | Self::Pal2 => 2,
      Self::Gray4 | Self::Pal4 => 4,
      Self::Gray8 | Self::Pal8 | Self::Rgb8 | Self::GrayAlpha8 | Self::Rgba8 => 8,
      Self::Gray16 | Self::Rgb16 | Self::GrayAlpha16 | Self::Rgba16 => 16,
    }
  }

  /// The raw `color_type` header byte for this format.
  #[inline]
  #[must_use]
  pub const fn color_type(self) -> u8 {
    match self {
      Self::Gray1 | Self::Gray2 | Self::Gray4 | Self::Gray8 | Self::Gray16 => 0,
      Self::Rgb8 | Self::Rgb16 => 2,
      Self::Pal1 | Self::Pal2 | Self::Pal4 | Self::Pal8 => 3,
      Self::GrayAlpha8 | Self::GrayAlpha16 => 4,
      Self::Rgba8 | Self::Rgba16 => 6,
    }
  }

  /// Samples per pixel.
  #[inline]
  #[must_use]
  pub const fn channels(self) -> usize {
    match self.color_type() {
      0 | 3 => 1,
      4 => 2,
      2 => 3,
      _ => 4,
    }
  }

  /// Is this one of the `Pal*` formats?
  #[inline]
  #[must_use]
  pub const fn is_indexed(self) -> bool {
    self.color_type() == 3
  }

  /// Is this a grayscale format (with or without alpha)?
  #[inline]
  #[must_use]
  pub const fn is_gray(self) -> bool {
    matches!(self.color_type(), 0 | 4)
  }

  /// The distance, in bytes, between a scanline byte and its "left"
  /// neighbour during filtering.
  ///
  /// Sub-byte formats filter whole packed bytes, so their unit is 1.
  /// Everything else uses one byte per channel, doubled at 16 bits.
  #[inline]
  #[must_use]
  pub const fn filter_unit(self) -> usize {
    let per_channel = if self.bit_depth() == 16 { 2 } else { 1 };
    match self.bit_depth() {
      1 | 2 | 4 => 1,
      _ => self.channels() * per_channel,
    }
  }

  /// Bytes in one scanline of `width` pixels, excluding the filter byte.
  #[inline]
  #[must_use]
  pub const fn bytes_per_scanline(self, width: u32) -> usize {
    let bits = width as u64 * (self.channels() as u64) * (self.bit_depth() as u64);
    ((bits + 7) / 8) as usize
  }

  /// Bytes in one filtered scanline: the filter byte plus the samples.
  #[inline]
  #[must_use]
  pub const fn bytes_per_filterline(self, width: u32) -> usize {
    1 + self.bytes_per_scanline(width)
  }
}

/// `IHDR`: image header.
///
/// Immutable once parsed. Interlaced files are rejected at parse time since
/// nothing downstream can decode them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ihdr {
  /// Width in pixels, `1..=i32::MAX`.
  pub width: u32,
  /// Height in pixels, `1..=i32::MAX`.
  pub height: u32,
  /// The color type / bit depth pairing.
  pub format: ColorFormat,
}

impl Ihdr {
  /// Parses the 13-byte `IHDR` chunk body.
  ///
  /// ## Failure
  /// * `ChunkLengthMismatch` when the body isn't exactly 13 bytes.
  /// * `UnsupportedInterlace` for Adam7 streams.
  /// * `BadHeader` for everything else wrong: zero or oversized dimensions,
  ///   an illegal format pairing, nonzero compression or filter method,
  ///   junk in the interlace byte.
  pub fn from_body(body: &[u8]) -> PngResult<Self> {
    if body.len() != 13 {
      return Err(PngError::ChunkLengthMismatch);
    }
    let width = u32::from_be_bytes(body[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(body[4..8].try_into().unwrap());
    if width == 0 || width > i32::MAX as u32 || height == 0 || height > i32::MAX as u32 {
      return Err(PngError::BadHeader);
    }
    let format = ColorFormat::from_wire(body[8], body[9]).ok_or(PngError::BadHeader)?;
    if body[10] != 0 || body[11] != 0 {
      return Err(PngError::BadHeader);
    }
    match body[12] {
      0 => (),
      1 => return Err(PngError::UnsupportedInterlace),
      _ => return Err(PngError::BadHeader),
    }
    Ok(Self { width, height, format })
  }

  /// The 13-byte chunk body for this header, for the encode direction.
  #[inline]
  #[must_use]
  pub fn to_body(self) -> [u8; 13] {
    let [w0, w1, w2, w3] = self.width.to_be_bytes();
    let [h0, h1, h2, h3] = self.height.to_be_bytes();
    [w0, w1, w2, w3, h0, h1, h2, h3, self.format.bit_depth(), self.format.color_type(), 0, 0, 0]
  }

  /// Total bytes of the filtered image data once inflated: `height` times
  /// the filtered scanline size.
  pub fn decompressed_size(self) -> PngResult<usize> {
    self
      .format
      .bytes_per_filterline(self.width)
      .checked_mul(self.height as usize)
      .ok_or(PngError::DimensionsTooLarge)
  }

  /// `width * height`, checked.
  pub fn pixel_count(self) -> PngResult<usize> {
    (self.width as usize)
      .checked_mul(self.height as usize)
      .ok_or(PngError::DimensionsTooLarge)
  }
}

#[test]
fn test_ihdr_round_trips_through_its_body() {
  let ihdr = Ihdr { width: 300, height: 70_000, format: ColorFormat::Rgba8 };
  assert_eq!(Ihdr::from_body(&ihdr.to_body()), Ok(ihdr));
}

#[test]
fn test_ihdr_rejections() {
  let mut body = Ihdr { width: 2, height: 2, format: ColorFormat::Gray8 }.to_body();
  body[12] = 1;
  assert_eq!(Ihdr::from_body(&body), Err(PngError::UnsupportedInterlace));
  body[12] = 0;
  body[8] = 4; // Gray4 is fine,
  assert!(Ihdr::from_body(&body).is_ok());
  body[9] = 6; // but Rgba4 is not a thing.
  assert_eq!(Ihdr::from_body(&body), Err(PngError::BadHeader));
  assert_eq!(Ihdr::from_body(&[0; 12]), Err(PngError::ChunkLengthMismatch));
}

#[test]
fn test_scanline_geometry() {
  // 5 pixels of 1-bit gray round up to one byte.
  assert_eq!(ColorFormat::Gray1.bytes_per_scanline(5), 1);
  assert_eq!(ColorFormat::Gray1.bytes_per_scanline(9), 2);
  assert_eq!(ColorFormat::Pal4.bytes_per_scanline(3), 2);
  assert_eq!(ColorFormat::Rgb8.bytes_per_filterline(2), 7);
  assert_eq!(ColorFormat::Rgba16.bytes_per_scanline(1), 8);
  // filter units: packed formats move byte by byte.
  assert_eq!(ColorFormat::Pal2.filter_unit(), 1);
  assert_eq!(ColorFormat::Rgb8.filter_unit(), 3);
  assert_eq!(ColorFormat::Rgba16.filter_unit(), 8);
  assert_eq!(ColorFormat::GrayAlpha8.filter_unit(), 2);
}
