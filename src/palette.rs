//! Transparency info, which `tRNS` stores in a different shape for every
//! color type.

use crate::{
  error::{PngError, PngResult},
  header::ColorFormat,
  pixels::RGB8,
  util::try_pull_u16_be,
};

/// Parsed transparency data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transparency<'b> {
  /// Grayscale images carry a single 16-bit gray value as a chroma key.
  ///
  /// The key is compared against raw sample values. 16-bit images keep the
  /// key but never apply it during unpacking.
  Gray {
    /// The keyed gray sample value.
    y: u16,
  },
  /// RGB images carry one chroma-keyed color.
  ///
  /// The chunk stores 16 bits per channel but the match happens against
  /// 8-bit output, so only the low byte of each channel is kept.
  Rgb {
    /// Red, low byte.
    r: u8,
    /// Green, low byte.
    g: u8,
    /// Blue, low byte.
    b: u8,
  },
  /// Indexed images carry one alpha byte per palette entry, possibly fewer.
  ///
  /// Entries past the end of this slice are fully opaque.
  Alphas(&'b [u8]),
}

impl<'b> Transparency<'b> {
  /// Interprets a raw `tRNS` body against the image's color format.
  ///
  /// ## Failure
  /// * `BadTransparency` when the color type forbids `tRNS` (grayscale+alpha
  ///   and RGBA), when an indexed image has no palette yet, or when there
  ///   are more alpha entries than palette entries.
  /// * `ChunkLengthMismatch` when the body isn't the exact size the color
  ///   type calls for.
  pub fn from_body(
    format: ColorFormat, body: &'b [u8], palette: Option<&[RGB8]>,
  ) -> PngResult<Self> {
    match format.color_type() {
      0 => {
        if body.len() != 2 {
          return Err(PngError::ChunkLengthMismatch);
        }
        let (y, _) = try_pull_u16_be(body)?;
        Ok(Self::Gray { y })
      }
      2 => match *body {
        [_, r, _, g, _, b] => Ok(Self::Rgb { r, g, b }),
        _ => Err(PngError::ChunkLengthMismatch),
      },
      3 => {
        let palette = palette.ok_or(PngError::BadTransparency)?;
        if body.len() > palette.len() {
          return Err(PngError::BadTransparency);
        }
        Ok(Self::Alphas(body))
      }
      _ => Err(PngError::BadTransparency),
    }
  }
}

#[test]
fn test_trns_dispatches_on_color_type() {
  let pal = [RGB8::default(); 4];
  assert_eq!(
    Transparency::from_body(ColorFormat::Gray4, &[0x01, 0x02], None),
    Ok(Transparency::Gray { y: 0x0102 })
  );
  // RGB keeps the low byte of each 16-bit channel.
  assert_eq!(
    Transparency::from_body(ColorFormat::Rgb8, &[0xAA, 1, 0xBB, 2, 0xCC, 3], None),
    Ok(Transparency::Rgb { r: 1, g: 2, b: 3 })
  );
  assert_eq!(
    Transparency::from_body(ColorFormat::Pal2, &[7, 8], Some(&pal)),
    Ok(Transparency::Alphas(&[7, 8]))
  );
  // indexed without a palette, or with too many entries.
  assert_eq!(
    Transparency::from_body(ColorFormat::Pal2, &[7, 8], None),
    Err(PngError::BadTransparency)
  );
  assert_eq!(
    Transparency::from_body(ColorFormat::Pal2, &[1, 2, 3, 4, 5], Some(&pal)),
    Err(PngError::BadTransparency)
  );
  // color types that forbid the chunk entirely.
  assert_eq!(
    Transparency::from_body(ColorFormat::Rgba8, &[0, 0], None),
    Err(PngError::BadTransparency)
  );
  assert_eq!(
    Transparency::from_body(ColorFormat::GrayAlpha8, &[0, 0], None),
    Err(PngError::BadTransparency)
  );
  // wrong body size for the color type.
  assert_eq!(
    Transparency::from_body(ColorFormat::Gray8, &[1, 2, 3], None),
    Err(PngError::ChunkLengthMismatch)
  );
}
