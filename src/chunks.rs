//! The typed view of a chunk: one tagged sum over the chunk types this
//! codec interprets.

use bytemuck::cast_slice;

use crate::{
  chunk::{ChunkTy, RawChunk},
  error::{PngError, PngResult},
  header::Ihdr,
  pixels::RGB8,
};

/// The longest `PLTE` body allowed: 256 entries of 3 bytes.
pub const MAX_PLTE_BYTES: usize = 768;

/// A chunk after its body has been checked against its type.
///
/// Chunk types outside the decode path are carried as [`Unknown`] so the
/// caller can skip them; their bytes are consumed but never interpreted.
///
/// [`Unknown`]: PngChunk::Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngChunk<'b> {
  /// The image header.
  Ihdr(Ihdr),
  /// The palette entries, in order.
  Plte(&'b [RGB8]),
  /// The transparency body, still raw: its layout depends on the color type
  /// so the decoder resolves it against the header later.
  Trns(&'b [u8]),
  /// One slice of the compressed image datastream.
  Idat(&'b [u8]),
  /// End of stream.
  Iend,
  /// Any other chunk type. Skipped by this codec.
  Unknown(RawChunk<'b>),
}

impl<'b> TryFrom<RawChunk<'b>> for PngChunk<'b> {
  type Error = PngError;

  fn try_from(raw: RawChunk<'b>) -> PngResult<Self> {
    Ok(match raw.ty {
      ChunkTy::IHDR => PngChunk::Ihdr(Ihdr::from_body(raw.body)?),
      ChunkTy::PLTE => {
        if raw.body.is_empty() || raw.body.len() % 3 != 0 || raw.body.len() > MAX_PLTE_BYTES {
          return Err(PngError::BadPalette);
        }
        PngChunk::Plte(cast_slice(raw.body))
      }
      ChunkTy::TRNS => PngChunk::Trns(raw.body),
      ChunkTy::IDAT => PngChunk::Idat(raw.body),
      ChunkTy::IEND => {
        if !raw.body.is_empty() {
          return Err(PngError::ChunkLengthMismatch);
        }
        PngChunk::Iend
      }
      _ => PngChunk::Unknown(raw),
    })
  }
}

#[test]
fn test_plte_body_constraints() {
  let plte = |body: &'static [u8]| PngChunk::try_from(RawChunk {
    ty: ChunkTy::PLTE,
    body,
    crc_claim: 0,
  });
  assert_eq!(plte(&[]), Err(PngError::BadPalette));
  assert_eq!(plte(&[1, 2]), Err(PngError::BadPalette));
  assert_eq!(
    plte(&[10, 20, 30]),
    Ok(PngChunk::Plte(&[RGB8 { r: 10, g: 20, b: 30 }]))
  );
  static TOO_LONG: [u8; 771] = [0; 771];
  assert_eq!(plte(&TOO_LONG), Err(PngError::BadPalette));
}

#[test]
fn test_iend_body_must_be_empty() {
  let raw = RawChunk { ty: ChunkTy::IEND, body: &[0], crc_claim: 0 };
  assert_eq!(PngChunk::try_from(raw), Err(PngError::ChunkLengthMismatch));
}
