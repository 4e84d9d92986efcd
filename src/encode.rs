//! The encoder: pack RGBA8 pixels back into a PNG datastream.
//!
//! Three output modes: direct RGBA8, direct RGB8 (alpha dropped), and
//! indexed color with a palette built from the image. Indexed output packs
//! its indices at the chosen bit depth and always uses filter None on every
//! row; the direct modes run the adaptive (or a fixed) row filter.

use alloc::{collections::BTreeMap, vec::Vec};

use log::trace;

use crate::{
  chunk::{push_chunk, ChunkTy, PNG_SIGNATURE},
  error::{PngError, PngResult},
  filter::{filter_scanlines, FilterStrategy},
  header::{ColorFormat, Ihdr},
  zlib::zlib_compress,
};

/// The pixel format the encoder should write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeColor {
  /// Four samples per pixel, straight from the input.
  Rgba8,
  /// Three samples per pixel; input alpha is dropped.
  Rgb8,
  /// Palette indices; the palette is collected from the image.
  Indexed,
}

/// Settings for [`encode_png`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
  /// What pixel format to write.
  pub color: EncodeColor,
  /// Row filter choice for the direct modes. Indexed output ignores this
  /// and writes filter None everywhere.
  pub filter: FilterStrategy,
  /// When set, input pixels are read as `A,B,G,R` bytes instead of
  /// `R,G,B,A`.
  pub source_is_abgr: bool,
  /// Bit depth for indexed output: 1, 2, 4, 8, or 0 to pick the smallest
  /// depth that fits the palette.
  pub indexed_depth: u8,
  /// An extra cap on the palette size, below what the bit depth allows.
  pub max_palette_size: Option<usize>,
  /// When the palette overflows its cap, merge nearest colors until it
  /// fits instead of failing.
  pub reduce_palette: bool,
  /// Write a `tRNS` chunk for indexed output when any palette entry is not
  /// fully opaque.
  pub write_trns: bool,
}

impl Default for EncodeOptions {
  #[inline]
  fn default() -> Self {
    Self {
      color: EncodeColor::Rgba8,
      filter: FilterStrategy::Adaptive,
      source_is_abgr: false,
      indexed_depth: 0,
      max_palette_size: None,
      reduce_palette: false,
      write_trns: true,
    }
  }
}

#[inline]
fn read_pixel(px: &[u8], abgr: bool) -> [u8; 4] {
  if abgr {
    [px[3], px[2], px[1], px[0]]
  } else {
    [px[0], px[1], px[2], px[3]]
  }
}

/// Encodes `width * height * 4` bytes of RGBA8 (or ABGR8) pixel data as a
/// complete PNG datastream.
///
/// ## Failure
/// * `BadHeader` for zero or oversized dimensions.
/// * `Truncated` when `rgba` isn't exactly `width * height * 4` bytes.
/// * Indexed mode can also fail with `BadBitDepth`, `BadPalette`, or
///   `PaletteMiss`; see [`EncodeOptions`].
pub fn encode_png(
  rgba: &[u8], width: u32, height: u32, opts: EncodeOptions,
) -> PngResult<Vec<u8>> {
  if width == 0 || width > i32::MAX as u32 || height == 0 || height > i32::MAX as u32 {
    return Err(PngError::BadHeader);
  }
  let pixel_count = (width as usize)
    .checked_mul(height as usize)
    .ok_or(PngError::DimensionsTooLarge)?;
  if rgba.len() != pixel_count.checked_mul(4).ok_or(PngError::DimensionsTooLarge)? {
    return Err(PngError::Truncated);
  }
  match opts.color {
    EncodeColor::Rgba8 => encode_direct(rgba, width, height, ColorFormat::Rgba8, opts),
    EncodeColor::Rgb8 => encode_direct(rgba, width, height, ColorFormat::Rgb8, opts),
    EncodeColor::Indexed => encode_indexed(rgba, width, height, opts),
  }
}

fn encode_direct(
  rgba: &[u8], width: u32, height: u32, format: ColorFormat, opts: EncodeOptions,
) -> PngResult<Vec<u8>> {
  let spp = format.channels();
  let row_bytes = format.bytes_per_scanline(width);
  let mut samples: Vec<u8> = Vec::new();
  samples.try_reserve_exact(row_bytes * height as usize)?;
  for px in rgba.chunks_exact(4) {
    let [r, g, b, a] = read_pixel(px, opts.source_is_abgr);
    samples.push(r);
    samples.push(g);
    samples.push(b);
    if spp == 4 {
      samples.push(a);
    }
  }
  let filtered = filter_scanlines(&samples, row_bytes, spp, opts.filter);
  let ihdr = Ihdr { width, height, format };
  Ok(assemble_png(ihdr, None, None, &filtered))
}

fn encode_indexed(
  rgba: &[u8], width: u32, height: u32, opts: EncodeOptions,
) -> PngResult<Vec<u8>> {
  // ordered first-seen palette of the distinct colors.
  let mut palette: Vec<[u8; 4]> = Vec::new();
  let mut index_of: BTreeMap<[u8; 4], usize> = BTreeMap::new();
  for px in rgba.chunks_exact(4) {
    let color = read_pixel(px, opts.source_is_abgr);
    if !index_of.contains_key(&color) {
      if palette.len() == 256 && !opts.reduce_palette {
        // already past any representable palette, give up early.
        return Err(PngError::BadPalette);
      }
      index_of.insert(color, palette.len());
      palette.push(color);
    }
  }
  let depth = match opts.indexed_depth {
    0 => match palette.len() {
      0..=2 => 1,
      3..=4 => 2,
      5..=16 => 4,
      _ => 8,
    },
    d @ (1 | 2 | 4 | 8) => d,
    _ => return Err(PngError::BadBitDepth),
  };
  let mut limit = 256.min(1_usize << depth);
  if let Some(cap) = opts.max_palette_size {
    limit = limit.min(cap);
  }
  trace!("indexed encode: {} distinct colors, depth {depth}, limit {limit}", palette.len());
  let mut remap: BTreeMap<[u8; 4], [u8; 4]> = BTreeMap::new();
  if palette.len() > limit {
    if !opts.reduce_palette {
      return Err(PngError::BadPalette);
    }
    reduce_palette(&mut palette, &mut remap, limit);
    index_of = palette.iter().enumerate().map(|(i, &c)| (c, i)).collect();
  }

  // pack the index of every pixel, MSB-first at `depth` bits, each row led
  // by a literal None filter byte.
  let index_for = |color: [u8; 4]| -> PngResult<usize> {
    if let Some(&i) = index_of.get(&color) {
      return Ok(i);
    }
    remap.get(&color).and_then(|kept| index_of.get(kept)).copied().ok_or(PngError::PaletteMiss)
  };
  let row_len = 4 * width as usize;
  let packed_row = (width as usize * depth as usize + 7) / 8;
  let mut filtered: Vec<u8> = Vec::new();
  filtered.try_reserve_exact(height as usize * (1 + packed_row))?;
  for row in rgba.chunks_exact(row_len) {
    filtered.push(0);
    let mut acc = 0_u8;
    let mut used = 0_u8;
    for px in row.chunks_exact(4) {
      let i = index_for(read_pixel(px, opts.source_is_abgr))? as u8;
      acc |= i << (8 - used - depth);
      used += depth;
      if used == 8 {
        filtered.push(acc);
        acc = 0;
        used = 0;
      }
    }
    if used > 0 {
      filtered.push(acc);
    }
  }

  let format = match depth {
    1 => ColorFormat::Pal1,
    2 => ColorFormat::Pal2,
    4 => ColorFormat::Pal4,
    _ => ColorFormat::Pal8,
  };
  let plte_body: Vec<u8> = palette.iter().flat_map(|&[r, g, b, _]| [r, g, b]).collect();
  let trns_body: Option<Vec<u8>> = if opts.write_trns {
    let mut alphas: Vec<u8> = palette.iter().map(|c| c[3]).collect();
    while alphas.last() == Some(&255) {
      alphas.pop();
    }
    if alphas.is_empty() {
      None
    } else {
      Some(alphas)
    }
  } else {
    None
  };
  let ihdr = Ihdr { width, height, format };
  Ok(assemble_png(ihdr, Some(&plte_body), trns_body.as_deref(), &filtered))
}

/// Merges the two nearest palette entries (squared euclidean distance over
/// all four channels) until the palette fits `limit`, recording which
/// dropped color each merge stands in for.
///
/// Each removal rescans all pairs, so this is quadratic per step and cubic
/// overall; with at most a few thousand distinct colors feeding a 256-entry
/// cap it stays tolerable.
fn reduce_palette(
  palette: &mut Vec<[u8; 4]>, remap: &mut BTreeMap<[u8; 4], [u8; 4]>, limit: usize,
) {
  fn dist2(x: [u8; 4], y: [u8; 4]) -> u32 {
    let mut d = 0_u32;
    for ch in 0..4 {
      let delta = i32::from(x[ch]) - i32::from(y[ch]);
      d += (delta * delta) as u32;
    }
    d
  }
  while palette.len() > limit {
    let (mut keep, mut drop_at, mut best) = (0, 1, u32::MAX);
    for i in 0..palette.len() {
      for j in (i + 1)..palette.len() {
        let d = dist2(palette[i], palette[j]);
        if d < best {
          best = d;
          keep = i;
          drop_at = j;
        }
      }
    }
    let dropped = palette.remove(drop_at);
    let kept = palette[keep];
    // anything that previously merged into the dropped color follows it.
    for target in remap.values_mut() {
      if *target == dropped {
        *target = kept;
      }
    }
    remap.insert(dropped, kept);
  }
}

fn assemble_png(
  ihdr: Ihdr, plte_body: Option<&[u8]>, trns_body: Option<&[u8]>, filtered: &[u8],
) -> Vec<u8> {
  let mut png: Vec<u8> = Vec::new();
  png.extend_from_slice(&PNG_SIGNATURE);
  push_chunk(&mut png, ChunkTy::IHDR, &ihdr.to_body());
  if let Some(body) = plte_body {
    push_chunk(&mut png, ChunkTy::PLTE, body);
  }
  if let Some(body) = trns_body {
    push_chunk(&mut png, ChunkTy::TRNS, body);
  }
  push_chunk(&mut png, ChunkTy::IDAT, &zlib_compress(filtered));
  push_chunk(&mut png, ChunkTy::IEND, &[]);
  png
}

#[test]
fn test_reduce_palette_merges_nearest_and_repoints() {
  let mut palette = alloc::vec![[0, 0, 0, 255], [1, 0, 0, 255], [2, 0, 0, 255], [90, 0, 0, 255]];
  let mut remap = BTreeMap::new();
  reduce_palette(&mut palette, &mut remap, 2);
  // first merge folds [1,0,0] into [0,0,0]; second folds [2,0,0] in too.
  assert_eq!(palette, alloc::vec![[0, 0, 0, 255], [90, 0, 0, 255]]);
  assert_eq!(remap.get(&[1, 0, 0, 255]), Some(&[0, 0, 0, 255]));
  assert_eq!(remap.get(&[2, 0, 0, 255]), Some(&[0, 0, 0, 255]));
}

#[test]
fn test_reduce_palette_repoints_chains() {
  // the entry an earlier merge pointed at can itself be dropped later.
  let mut palette = alloc::vec![[0_u8, 0, 0, 0], [10, 0, 0, 0], [11, 0, 0, 0], [255, 255, 255, 0]];
  let mut remap = BTreeMap::new();
  reduce_palette(&mut palette, &mut remap, 1);
  assert_eq!(palette.len(), 1);
  let last = palette[0];
  for (_, target) in remap.iter() {
    assert_eq!(*target, last);
  }
}

#[test]
fn test_indexed_depth_selection() {
  // 5 colors needs 4 bits; a forced depth below that fails without
  // reduction enabled.
  let pixels: Vec<u8> =
    (0_u8..5).flat_map(|i| [i, 0, 0, 255]).chain([0, 0, 0, 255]).collect();
  let opts =
    EncodeOptions { color: EncodeColor::Indexed, ..EncodeOptions::default() };
  let png = encode_png(&pixels, 3, 2, opts).unwrap();
  let ihdr = crate::decode::decode_png_header(&png).unwrap();
  assert_eq!(ihdr.format, ColorFormat::Pal4);
  let forced = EncodeOptions { indexed_depth: 2, ..opts };
  assert_eq!(encode_png(&pixels, 3, 2, forced), Err(PngError::BadPalette));
  let forced_reducing = EncodeOptions { indexed_depth: 2, reduce_palette: true, ..opts };
  let png = encode_png(&pixels, 3, 2, forced_reducing).unwrap();
  assert_eq!(crate::decode::decode_png_header(&png).unwrap().format, ColorFormat::Pal2);
  assert_eq!(
    encode_png(&pixels, 3, 2, EncodeOptions { indexed_depth: 3, ..opts }),
    Err(PngError::BadBitDepth)
  );
}
