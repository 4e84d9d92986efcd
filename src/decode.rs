//! The whole-stream decoder: walk the chunks, join and inflate the image
//! data, un-filter, unpack.

use alloc::vec::Vec;

use log::trace;

use crate::{
  chunk::{strip_png_signature, RawChunkIter},
  chunks::PngChunk,
  error::{PngError, PngResult},
  header::Ihdr,
  image::Bitmap,
  palette::Transparency,
  pixels::{RGB8, RGBA8},
  unfilter::unfilter_scanlines,
  unpack::unpack_rows,
  zlib::inflate_into,
};

/// Everything gathered from one pass over the chunk stream.
///
/// The borrowed fields all point back into the input bytes; nothing is
/// copied until inflation.
#[derive(Debug, Clone)]
pub(crate) struct ChunkGather<'b> {
  pub ihdr: Ihdr,
  pub palette: Option<&'b [RGB8]>,
  pub trns: Option<Transparency<'b>>,
  pub idats: Vec<&'b [u8]>,
}

/// Where the chunk walk currently is. `Body` only starts once the IHDR has
/// been taken, and `Done` only on IEND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkStage {
  ExpectIhdr,
  Body(Ihdr),
  Done(Ihdr),
}

/// One pass over the chunk stream, enforcing the ordering rules.
///
/// Hard errors: a missing signature, a first chunk that isn't IHDR, a
/// duplicated IHDR/PLTE/tRNS, a PLTE after image data has started or on a
/// grayscale image, and a stream with no image data at all. Chunks of
/// unknown type are skipped. A non-IDAT chunk wedged between two IDATs is
/// tolerated (only the IDAT order matters), and so is a stream that simply
/// stops without an IEND.
pub(crate) fn gather_chunks(png: &[u8]) -> PngResult<ChunkGather<'_>> {
  let mut stage = ChunkStage::ExpectIhdr;
  let mut palette: Option<&[RGB8]> = None;
  let mut trns: Option<Transparency<'_>> = None;
  let mut idats: Vec<&[u8]> = Vec::new();
  let mut it = RawChunkIter::new(strip_png_signature(png)?);
  loop {
    let Some(raw) = it.next() else { break };
    let chunk = PngChunk::try_from(raw?)?;
    match (stage, chunk) {
      (ChunkStage::ExpectIhdr, PngChunk::Ihdr(h)) => stage = ChunkStage::Body(h),
      (ChunkStage::ExpectIhdr, _) | (ChunkStage::Body(_), PngChunk::Ihdr(_)) => {
        return Err(PngError::BadHeader)
      }
      (ChunkStage::Body(h), PngChunk::Plte(entries)) => {
        if palette.is_some() || !idats.is_empty() || h.format.is_gray() {
          return Err(PngError::BadPalette);
        }
        palette = Some(entries);
      }
      (ChunkStage::Body(h), PngChunk::Trns(body)) => {
        if trns.is_some() {
          return Err(PngError::BadTransparency);
        }
        trns = Some(Transparency::from_body(h.format, body, palette)?);
      }
      (ChunkStage::Body(_), PngChunk::Idat(data)) => idats.push(data),
      (ChunkStage::Body(h), PngChunk::Iend) => {
        stage = ChunkStage::Done(h);
        break;
      }
      (ChunkStage::Body(_), PngChunk::Unknown(raw)) => {
        trace!("skipping chunk: {:?} ({} bytes)", raw.ty, raw.body.len());
      }
      (ChunkStage::Done(_), _) => unreachable!("the chunk walk stops at IEND"),
    }
  }
  let ihdr = match stage {
    ChunkStage::ExpectIhdr => return Err(PngError::BadHeader),
    ChunkStage::Body(h) | ChunkStage::Done(h) => h,
  };
  if idats.is_empty() {
    return Err(PngError::MissingData);
  }
  if ihdr.format.is_indexed() && palette.is_none() {
    return Err(PngError::MissingPalette);
  }
  Ok(ChunkGather { ihdr, palette, trns, idats })
}

/// Joins and inflates the image data into a fresh buffer of filtered
/// scanlines.
pub(crate) fn inflate_idats(gather: &ChunkGather<'_>) -> PngResult<Vec<u8>> {
  let size = gather.ihdr.decompressed_size()?;
  let mut filtered: Vec<u8> = Vec::new();
  filtered.try_reserve_exact(size)?;
  filtered.resize(size, 0);
  inflate_into(&mut filtered, gather.idats.iter().copied())?;
  trace!("inflated {} IDAT chunks to {} filtered bytes", gather.idats.len(), size);
  Ok(filtered)
}

/// Parses just far enough to return the image header.
pub fn decode_png_header(png: &[u8]) -> PngResult<Ihdr> {
  let mut it = RawChunkIter::new(strip_png_signature(png)?);
  match it.next() {
    Some(raw) => match PngChunk::try_from(raw?)? {
      PngChunk::Ihdr(ihdr) => Ok(ihdr),
      _ => Err(PngError::BadHeader),
    },
    None => Err(PngError::Truncated),
  }
}

/// Decodes a PNG datastream into an RGBA8 bitmap.
///
/// Any color type and bit depth combination PNG allows comes out as 8-bit
/// RGBA, with 16-bit samples narrowed to their high byte.
pub fn decode_png(png: &[u8]) -> PngResult<Bitmap<RGBA8>> {
  let gather = gather_chunks(png)?;
  let mut filtered = inflate_idats(&gather)?;
  let ihdr = gather.ihdr;
  unfilter_scanlines(ihdr.format, ihdr.width, &mut filtered)?;
  let pixel_count = ihdr.pixel_count()?;
  let mut pixels: Vec<RGBA8> = Vec::new();
  pixels.try_reserve_exact(pixel_count)?;
  pixels.resize(pixel_count, RGBA8::ZERO);
  unpack_rows(ihdr.format, ihdr.width, gather.palette, gather.trns, &filtered, &mut pixels)?;
  Ok(Bitmap { width: ihdr.width, height: ihdr.height, pixels })
}

/// Decodes a PNG datastream into raw bytes plus dimensions.
///
/// The bytes are row-major `R,G,B,A`, `width * height * 4` of them.
pub fn decode_png_rgba(png: &[u8]) -> PngResult<(Vec<u8>, u32, u32)> {
  let bitmap = decode_png(png)?;
  let (width, height) = (bitmap.width, bitmap.height);
  Ok((bitmap.to_bytes(), width, height))
}
