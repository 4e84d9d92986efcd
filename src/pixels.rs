//! The pixel types this crate moves data through.

use bytemuck::{Pod, Zeroable};

/// Red/Green/Blue, one byte per channel.
///
/// This is the layout of a palette entry, so `PLTE` bodies cast directly to
/// slices of this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// Red/Green/Blue/Alpha, one byte per channel.
///
/// The canonical output (and encoder input) pixel of this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl RGBA8 {
  /// An all-zero pixel, transparent black.
  pub const ZERO: Self = Self { r: 0, g: 0, b: 0, a: 0 };
}

impl From<[u8; 4]> for RGBA8 {
  #[inline]
  fn from([r, g, b, a]: [u8; 4]) -> Self {
    Self { r, g, b, a }
  }
}

impl From<RGBA8> for [u8; 4] {
  #[inline]
  fn from(RGBA8 { r, g, b, a }: RGBA8) -> Self {
    [r, g, b, a]
  }
}

impl From<[u8; 3]> for RGB8 {
  #[inline]
  fn from([r, g, b]: [u8; 3]) -> Self {
    Self { r, g, b }
  }
}
