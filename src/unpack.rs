//! Turning recovered scanline bytes into RGBA8 pixels, for every color
//! type and bit depth combination.
//!
//! Conventions that hold across every path here:
//!
//! * Sub-byte samples are packed MSB-first: the leftmost pixel lives in the
//!   highest bits of its byte.
//! * 16-bit samples narrow to 8 bits by keeping the high byte.
//! * Gray samples below 8 bits widen by bit replication, which is exactly
//!   `round(s * 255 / (2^depth - 1))` for these depths.

use bitfrob::u8_replicate_bits;

use crate::{
  error::{PngError, PngResult},
  header::ColorFormat,
  palette::Transparency,
  pixels::{RGB8, RGBA8},
};

/// Unpacks any whole number of recovered scanlines into RGBA8 pixels.
///
/// `raw` holds un-filtered scanlines (see
/// [`unfilter_scanlines`](crate::unfilter::unfilter_scanlines)); the filter
/// byte that leads each line is ignored here. `out` must hold exactly
/// `width` pixels per scanline.
///
/// Quirks faithfully kept:
///
/// * The gray chroma key matches against raw (unwidened) sample values, and
///   16-bit grayscale never applies it at all.
/// * A palette index past the end of the palette produces opaque black
///   rather than an error.
pub fn unpack_rows(
  format: ColorFormat, width: u32, palette: Option<&[RGB8]>, trns: Option<Transparency<'_>>,
  raw: &[u8], out: &mut [RGBA8],
) -> PngResult<()> {
  if width == 0 {
    return Err(PngError::BadHeader);
  }
  let line_len = format.bytes_per_filterline(width);
  let w = width as usize;
  if raw.len() % line_len != 0 || out.len() != (raw.len() / line_len) * w {
    return Err(PngError::Truncated);
  }
  let gray_key: Option<u16> = match trns {
    Some(Transparency::Gray { y }) => Some(y),
    _ => None,
  };
  let rgb_key: Option<(u8, u8, u8)> = match trns {
    Some(Transparency::Rgb { r, g, b }) => Some((r, g, b)),
    _ => None,
  };
  let alphas: Option<&[u8]> = match trns {
    Some(Transparency::Alphas(a)) => Some(a),
    _ => None,
  };
  let pal: &[RGB8] = match palette {
    Some(p) => p,
    None if format.is_indexed() => return Err(PngError::MissingPalette),
    None => &[],
  };

  for (line, row_out) in raw.chunks_exact(line_len).zip(out.chunks_exact_mut(w)) {
    let data = &line[1..];
    match format {
      ColorFormat::Rgba8 => {
        for (px, s) in row_out.iter_mut().zip(data.chunks_exact(4)) {
          *px = RGBA8 { r: s[0], g: s[1], b: s[2], a: s[3] };
        }
      }
      ColorFormat::Rgba16 => {
        for (px, s) in row_out.iter_mut().zip(data.chunks_exact(8)) {
          *px = RGBA8 { r: s[0], g: s[2], b: s[4], a: s[6] };
        }
      }
      ColorFormat::Rgb8 => {
        for (px, s) in row_out.iter_mut().zip(data.chunks_exact(3)) {
          let a = if rgb_key == Some((s[0], s[1], s[2])) { 0 } else { 255 };
          *px = RGBA8 { r: s[0], g: s[1], b: s[2], a };
        }
      }
      ColorFormat::Rgb16 => {
        for (px, s) in row_out.iter_mut().zip(data.chunks_exact(6)) {
          let (r, g, b) = (s[0], s[2], s[4]);
          let a = if rgb_key == Some((r, g, b)) { 0 } else { 255 };
          *px = RGBA8 { r, g, b, a };
        }
      }
      ColorFormat::Gray8 => {
        for (px, &y) in row_out.iter_mut().zip(data.iter()) {
          let a = if gray_key == Some(u16::from(y)) { 0 } else { 255 };
          *px = RGBA8 { r: y, g: y, b: y, a };
        }
      }
      ColorFormat::Gray16 => {
        // the gray chroma key is never consulted at 16 bits.
        for (px, s) in row_out.iter_mut().zip(data.chunks_exact(2)) {
          *px = RGBA8 { r: s[0], g: s[0], b: s[0], a: 255 };
        }
      }
      ColorFormat::GrayAlpha8 => {
        for (px, s) in row_out.iter_mut().zip(data.chunks_exact(2)) {
          *px = RGBA8 { r: s[0], g: s[0], b: s[0], a: s[1] };
        }
      }
      ColorFormat::GrayAlpha16 => {
        for (px, s) in row_out.iter_mut().zip(data.chunks_exact(4)) {
          *px = RGBA8 { r: s[0], g: s[0], b: s[0], a: s[2] };
        }
      }
      ColorFormat::Gray1 | ColorFormat::Gray2 | ColorFormat::Gray4 => {
        let depth = format.bit_depth();
        let mut slots = row_out.iter_mut();
        'line: for &byte in data {
          for s in PackedSamples::new(byte, depth) {
            let Some(px) = slots.next() else { break 'line };
            let y = u8_replicate_bits(depth as u32, s);
            let a = if gray_key == Some(u16::from(s)) { 0 } else { 255 };
            *px = RGBA8 { r: y, g: y, b: y, a };
          }
        }
      }
      ColorFormat::Pal8 => {
        for (px, &i) in row_out.iter_mut().zip(data.iter()) {
          *px = palette_pixel(pal, alphas, i);
        }
      }
      ColorFormat::Pal1 | ColorFormat::Pal2 | ColorFormat::Pal4 => {
        let depth = format.bit_depth();
        let mut slots = row_out.iter_mut();
        'line: for &byte in data {
          for i in PackedSamples::new(byte, depth) {
            let Some(px) = slots.next() else { break 'line };
            *px = palette_pixel(pal, alphas, i);
          }
        }
      }
    }
  }
  Ok(())
}

#[inline]
fn palette_pixel(pal: &[RGB8], alphas: Option<&[u8]>, index: u8) -> RGBA8 {
  let RGB8 { r, g, b } = pal.get(usize::from(index)).copied().unwrap_or_default();
  let a = alphas.and_then(|al| al.get(usize::from(index)).copied()).unwrap_or(255);
  RGBA8 { r, g, b, a }
}

/// The sub-byte samples of one packed byte, leftmost pixel first.
struct PackedSamples {
  byte: u8,
  depth: u8,
  shift: i8,
}

impl PackedSamples {
  #[inline]
  fn new(byte: u8, depth: u8) -> Self {
    debug_assert!(matches!(depth, 1 | 2 | 4));
    Self { byte, depth, shift: 8 - depth as i8 }
  }
}

impl Iterator for PackedSamples {
  type Item = u8;

  #[inline]
  fn next(&mut self) -> Option<u8> {
    if self.shift < 0 {
      return None;
    }
    let mask = (1_u8 << self.depth) - 1;
    let s = (self.byte >> self.shift) & mask;
    self.shift -= self.depth as i8;
    Some(s)
  }
}

#[test]
fn test_packed_samples_msb_first() {
  // 2 bits at a time out of 0b11_01_00_10.
  assert!(PackedSamples::new(0b1101_0010, 2).eq([3, 1, 0, 2]));
  assert_eq!(PackedSamples::new(0xAA, 1).count(), 8);
  assert!(PackedSamples::new(0x13, 4).eq([1, 3]));
}

#[test]
fn test_gray2_widening_uses_2bpp_masks() {
  // one scanline, 4 pixels of 2-bit gray packed into one byte.
  let raw = [0, 0b1101_0010];
  let mut out = [RGBA8::ZERO; 4];
  unpack_rows(ColorFormat::Gray2, 4, None, None, &raw, &mut out).unwrap();
  let grays: [u8; 4] = [out[0].r, out[1].r, out[2].r, out[3].r];
  // 0..=3 scale to 0, 85, 170, 255.
  assert_eq!(grays, [255, 85, 0, 170]);
  assert!(out.iter().all(|p| p.a == 255));
}

#[test]
fn test_gray1_alternating() {
  let raw = [0, 0b1010_1010];
  let mut out = [RGBA8::ZERO; 8];
  unpack_rows(ColorFormat::Gray1, 8, None, None, &raw, &mut out).unwrap();
  for (i, px) in out.iter().enumerate() {
    let y = if i % 2 == 0 { 255 } else { 0 };
    assert_eq!(*px, RGBA8 { r: y, g: y, b: y, a: 255 });
  }
}

#[test]
fn test_pal4_lookup_with_padding_bits() {
  let pal = [[0, 0, 0], [255, 0, 0], [0, 255, 0], [0, 0, 255]].map(RGB8::from);
  // 4 pixels at 4bpp: indices 1, 3, 0, 0.
  let raw = [0, 0x13, 0x00];
  let mut out = [RGBA8::ZERO; 4];
  unpack_rows(ColorFormat::Pal4, 4, Some(&pal), None, &raw, &mut out).unwrap();
  assert_eq!(out[0], RGBA8 { r: 255, g: 0, b: 0, a: 255 });
  assert_eq!(out[1], RGBA8 { r: 0, g: 0, b: 255, a: 255 });
  assert_eq!(out[2], RGBA8 { r: 0, g: 0, b: 0, a: 255 });
  assert_eq!(out[3], RGBA8 { r: 0, g: 0, b: 0, a: 255 });
  // 3 pixels wide leaves a padding nibble that must not spill anywhere.
  let mut out3 = [RGBA8::ZERO; 3];
  unpack_rows(ColorFormat::Pal4, 3, Some(&pal), None, &[0, 0x13, 0x20], &mut out3).unwrap();
  assert_eq!(out3[2], RGBA8 { r: 0, g: 255, b: 0, a: 255 });
}

#[test]
fn test_gray_key_matches_raw_sample_and_skips_16_bit() {
  let key = Some(Transparency::Gray { y: 1 });
  // 1-bit gray: sample 1 is keyed out even though it widens to 255.
  let mut out = [RGBA8::ZERO; 2];
  unpack_rows(ColorFormat::Gray1, 2, None, key, &[0, 0b0100_0000], &mut out).unwrap();
  assert_eq!(out[0].a, 255);
  assert_eq!(out[1], RGBA8 { r: 255, g: 255, b: 255, a: 0 });
  // 16-bit gray ignores the key entirely.
  let mut out = [RGBA8::ZERO; 1];
  unpack_rows(ColorFormat::Gray16, 1, None, key, &[0, 0, 1], &mut out).unwrap();
  assert_eq!(out[0].a, 255);
}

#[test]
fn test_rgb_chroma_key() {
  let key = Some(Transparency::Rgb { r: 0, g: 0, b: 0 });
  let raw = [0, 0, 0, 0, 9, 9, 9];
  let mut out = [RGBA8::ZERO; 2];
  unpack_rows(ColorFormat::Rgb8, 2, None, key, &raw, &mut out).unwrap();
  assert_eq!(out[0].a, 0);
  assert_eq!(out[1], RGBA8 { r: 9, g: 9, b: 9, a: 255 });
}

#[test]
fn test_16_bit_narrows_to_high_byte() {
  let raw = [0, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];
  let mut out = [RGBA8::ZERO; 1];
  unpack_rows(ColorFormat::Rgba16, 1, None, None, &raw, &mut out).unwrap();
  assert_eq!(out[0], RGBA8 { r: 0x12, g: 0x56, b: 0x9A, a: 0xDE });
}
