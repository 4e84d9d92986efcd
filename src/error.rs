/// An error from PNG decoding or encoding.
///
/// The codec has no partial-success mode: the first error aborts the whole
/// operation and nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PngError {
  /// The first 8 bytes of the input are not the PNG signature.
  BadSignature,

  /// The input ended in the middle of a chunk or a field.
  Truncated,

  /// A chunk body length doesn't fit the chunk type, or a declared chunk
  /// length exceeds the format's maximum of `i32::MAX`.
  ChunkLengthMismatch,

  /// The `IHDR` is invalid: zero or oversized dimensions, a disallowed color
  /// type / bit depth combination, or junk in the method bytes.
  BadHeader,

  /// The `PLTE` chunk is empty, not a multiple of 3 bytes, longer than 768
  /// bytes, duplicated, late, or present for a grayscale color type.
  BadPalette,

  /// The image is indexed color but no `PLTE` chunk appeared.
  MissingPalette,

  /// The stream ended without any `IDAT` chunk.
  MissingData,

  /// A `tRNS` chunk appeared for a color type that forbids it, was
  /// duplicated, didn't match the color type's expected layout, or (for
  /// indexed color) arrived before the palette or outgrew it.
  BadTransparency,

  /// A scanline's filter type byte was not in `0..=4`.
  BadFilter,

  /// The encoder was asked for a bit depth outside its supported set.
  BadBitDepth,

  /// The image is interlaced, which this crate does not decode.
  UnsupportedInterlace,

  /// The encoder was asked for a color type it can't produce.
  UnsupportedColorType,

  /// The encoder was asked for an output mode it can't produce.
  UnsupportedMode,

  /// The encoder found a pixel with no palette entry and no reduction
  /// mapping to fall back on.
  PaletteMiss,

  /// The compressed image data didn't inflate to the expected size.
  InflateError,

  /// Compressing the filtered image data failed.
  DeflateError,

  /// The allocator couldn't give us enough space.
  #[cfg(feature = "alloc")]
  Alloc,

  /// Width times height overflowed the address space.
  DimensionsTooLarge,

  /// A worker pool with the requested level of parallelism couldn't be
  /// built.
  #[cfg(feature = "parallel")]
  ThreadPool,
}

/// Alias for getting a [PngError] out of an operation.
pub type PngResult<T> = Result<T, PngError>;

#[cfg(feature = "alloc")]
impl From<alloc::collections::TryReserveError> for PngError {
  #[inline]
  fn from(_: alloc::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}

impl From<miniz_oxide::inflate::TINFLStatus> for PngError {
  #[inline]
  fn from(_: miniz_oxide::inflate::TINFLStatus) -> Self {
    Self::InflateError
  }
}
