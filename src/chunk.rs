//! Splitting a PNG datastream into raw `length | type | body | crc` frames,
//! and emitting such frames back out.

use crate::{
  crc32::png_crc,
  error::{PngError, PngResult},
  util::{try_pull_array, try_pull_bytes, try_pull_u32_be},
};

/// The PNG signature, the 8 bytes every stream must open with.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks the signature and gives back the chunk data after it.
#[inline]
pub fn strip_png_signature(png: &[u8]) -> PngResult<&[u8]> {
  match png {
    [137, 80, 78, 71, 13, 10, 26, 10, rest @ ..] => Ok(rest),
    _ => Err(PngError::BadSignature),
  }
}

/// A four-byte chunk type code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ChunkTy(pub [u8; 4]);

impl ChunkTy {
  /// Image header.
  pub const IHDR: Self = Self(*b"IHDR");
  /// Palette.
  pub const PLTE: Self = Self(*b"PLTE");
  /// Transparency.
  pub const TRNS: Self = Self(*b"tRNS");
  /// Image data.
  pub const IDAT: Self = Self(*b"IDAT");
  /// Image trailer.
  pub const IEND: Self = Self(*b"IEND");
}

impl core::fmt::Debug for ChunkTy {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Debug::fmt(core::str::from_utf8(&self.0).unwrap_or("????"), f)
  }
}

/// One raw frame of a PNG datastream.
///
/// Nothing here has examined whether `body` fits `ty` yet; convert to a
/// [`PngChunk`](crate::chunks::PngChunk) for that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'b> {
  /// The chunk type code.
  pub ty: ChunkTy,
  /// The chunk body, already length-delimited.
  pub body: &'b [u8],
  /// The CRC the stream claims for this chunk. Not verified during normal
  /// decoding.
  pub crc_claim: u32,
}

impl RawChunk<'_> {
  /// Computes the actual CRC of this chunk's type and body.
  #[inline]
  #[must_use]
  pub fn compute_crc(&self) -> u32 {
    png_crc(self.ty.0.iter().copied().chain(self.body.iter().copied()))
  }

  /// Does the claimed CRC match the data?
  ///
  /// Decoding accepts chunks without checking this. Call it yourself if you
  /// care about bitrot.
  #[inline]
  #[must_use]
  pub fn crc_matches(&self) -> bool {
    self.compute_crc() == self.crc_claim
  }
}

/// Iterates the raw chunks of a PNG datastream (signature already removed).
///
/// Running out of bytes in the middle of a frame yields one
/// `Err(Truncated)` and then the iterator fuses. A declared body length
/// above `i32::MAX` yields `Err(ChunkLengthMismatch)` the same way.
#[derive(Debug, Clone)]
pub struct RawChunkIter<'b> {
  spare: &'b [u8],
}

impl<'b> RawChunkIter<'b> {
  /// Makes the iterator over chunk data.
  ///
  /// Use [`strip_png_signature`] first; this type wants only the bytes after
  /// the signature.
  #[inline]
  #[must_use]
  pub const fn new(chunk_bytes: &'b [u8]) -> Self {
    Self { spare: chunk_bytes }
  }

  fn pull_chunk(&mut self) -> PngResult<RawChunk<'b>> {
    let (len, rest) = try_pull_u32_be(self.spare)?;
    if len > i32::MAX as u32 {
      return Err(PngError::ChunkLengthMismatch);
    }
    let (ty, rest) = try_pull_array::<4>(rest)?;
    let (body, rest) = try_pull_bytes(rest, len as usize)?;
    let (crc_claim, rest) = try_pull_u32_be(rest)?;
    self.spare = rest;
    Ok(RawChunk { ty: ChunkTy(ty), body, crc_claim })
  }
}

impl<'b> Iterator for RawChunkIter<'b> {
  type Item = PngResult<RawChunk<'b>>;

  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.spare.is_empty() {
      return None;
    }
    let r = self.pull_chunk();
    if r.is_err() {
      self.spare = &[];
    }
    Some(r)
  }
}

/// Appends one framed chunk to `png`: length, type, body, and the CRC over
/// type plus body.
#[cfg(feature = "alloc")]
pub fn push_chunk(png: &mut alloc::vec::Vec<u8>, ty: ChunkTy, body: &[u8]) {
  crate::util::push_u32_be(png, body.len() as u32);
  png.extend_from_slice(&ty.0);
  png.extend_from_slice(body);
  let crc = png_crc(ty.0.iter().copied().chain(body.iter().copied()));
  crate::util::push_u32_be(png, crc);
}

#[test]
#[cfg(feature = "alloc")]
fn test_raw_chunk_iter_reads_what_push_chunk_wrote() {
  let mut bytes = alloc::vec::Vec::new();
  push_chunk(&mut bytes, ChunkTy::IDAT, &[1, 2, 3]);
  push_chunk(&mut bytes, ChunkTy::IEND, &[]);
  let mut it = RawChunkIter::new(&bytes);
  let idat = it.next().unwrap().unwrap();
  assert_eq!(idat.ty, ChunkTy::IDAT);
  assert_eq!(idat.body, &[1, 2, 3]);
  assert!(idat.crc_matches());
  let iend = it.next().unwrap().unwrap();
  assert_eq!(iend.ty, ChunkTy::IEND);
  assert!(iend.body.is_empty());
  assert_eq!(iend.crc_claim, 0xAE42_6082);
  assert!(it.next().is_none());
}

#[test]
fn test_raw_chunk_iter_truncation() {
  // a declared length that runs past the end of input.
  let bytes = [0, 0, 0, 9, b'I', b'D', b'A', b'T', 1, 2];
  let mut it = RawChunkIter::new(&bytes);
  assert_eq!(it.next(), Some(Err(PngError::Truncated)));
  assert!(it.next().is_none());
}

#[test]
fn test_strip_png_signature() {
  assert_eq!(strip_png_signature(&PNG_SIGNATURE), Ok(&[][..]));
  assert_eq!(strip_png_signature(b"not a png"), Err(PngError::BadSignature));
  assert_eq!(strip_png_signature(&[]), Err(PngError::BadSignature));
}
