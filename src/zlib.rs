//! Glue between PNG's zlib-wrapped image data and the DEFLATE codec.
//!
//! Decoding treats every `IDAT` body as one continuous zlib stream: two
//! header bytes, a DEFLATE payload, and an Adler-32 trailer that is
//! deliberately never checked. Encoding writes the same container back
//! with the `0x78 0x01` header.

use miniz_oxide::inflate::decompress_slice_iter_to_slice;

use crate::error::{PngError, PngResult};

/// The zlib header bytes this crate emits: deflate, 32 KiB window, fastest
/// flevel hint.
pub const ZLIB_HEADER: [u8; 2] = [0x78, 0x01];

/// Inflates a zlib stream, split across any number of slices, into `out`.
///
/// This is the join step for multi-`IDAT` images: hand it the chunk bodies
/// in stream order and they are treated as one datastream with no copying
/// up front. The zlib header is consumed and the Adler-32 trailer is
/// ignored.
///
/// `out` must be exactly the expected inflated size; producing any other
/// amount of data is an `InflateError`.
pub fn inflate_into<'inp>(
  out: &mut [u8], zlib_slices: impl Iterator<Item = &'inp [u8]>,
) -> PngResult<()> {
  let n = decompress_slice_iter_to_slice(out, zlib_slices, true, true)?;
  if n != out.len() {
    return Err(PngError::InflateError);
  }
  Ok(())
}

/// Deflates `bytes` and wraps them in a zlib container.
///
/// The container is the fixed [`ZLIB_HEADER`], the raw DEFLATE payload, and
/// the big-endian Adler-32 of the uncompressed input.
#[cfg(feature = "alloc")]
#[must_use]
pub fn zlib_compress(bytes: &[u8]) -> alloc::vec::Vec<u8> {
  let mut out = alloc::vec::Vec::with_capacity(bytes.len() / 2 + 16);
  out.extend_from_slice(&ZLIB_HEADER);
  out.extend_from_slice(&miniz_oxide::deflate::compress_to_vec(bytes, 6));
  crate::util::push_u32_be(&mut out, crate::adler32::adler32(bytes));
  out
}

#[test]
#[cfg(feature = "alloc")]
fn test_zlib_round_trip_across_split_slices() {
  let message = b"the quick brown fox jumps over the lazy dog, repeatedly, for compression";
  let z = zlib_compress(message);
  assert_eq!(z[0..2], ZLIB_HEADER);
  assert_eq!(
    u32::from_be_bytes(z[z.len() - 4..].try_into().unwrap()),
    crate::adler32::adler32(message)
  );
  // inflate it back from awkwardly split pieces, like multiple IDATs.
  let mut recovered = alloc::vec![0_u8; message.len()];
  let (a, rest) = z.split_at(1);
  let (b, c) = rest.split_at(7);
  inflate_into(&mut recovered, [a, b, c].into_iter()).unwrap();
  assert_eq!(&recovered[..], &message[..]);
}

#[test]
#[cfg(feature = "alloc")]
fn test_inflate_wrong_size_is_an_error() {
  let z = zlib_compress(&[5; 100]);
  let mut too_small = [0_u8; 99];
  assert!(inflate_into(&mut too_small, [z.as_slice()].into_iter()).is_err());
}
