#![no_std]
#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

//! A PNG codec: decode any PNG into RGBA8 pixels, encode RGBA8 pixels back
//! into a PNG.
//!
//! * [Portable Network Graphics (PNG) Specification][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/png/
//!
//! ## Library Design Assumptions
//!
//! The entire encoded PNG datastream is one byte slice, and each stage of
//! decoding goes to a single buffer big enough for that whole stage. There
//! is no support for streaming in partial data.
//!
//! ## Automatic Decoding
//!
//! With the (default) `alloc` feature, call [`decode_png`] for a
//! [`Bitmap<RGBA8>`](Bitmap), or [`decode_png_rgba`] if you'd rather have
//! plain bytes plus dimensions. Every color type and bit depth combination
//! PNG allows comes out as 8 bits per channel RGBA; 16-bit samples are
//! narrowed by keeping their high byte. Interlaced files are rejected
//! rather than decoded wrong.
//!
//! With the `parallel` feature,
//! [`decode_png_parallel`](parallel::decode_png_parallel) splits an RGBA8
//! image into independent row stripes and decodes them on a thread pool.
//!
//! ## Manual Decoding
//!
//! If you want full control over allocation you can run the stages
//! yourself, none of which allocate:
//!
//! 1) [`decode_png_header`] gives the [`Ihdr`] describing dimensions and
//!    pixel format.
//! 2) Walk [`RawChunkIter`] and collect the `IDAT` chunks, then inflate
//!    them as one stream with [`zlib::inflate_into`] into a buffer of
//!    [`Ihdr::decompressed_size`] bytes.
//! 3) [`unfilter_scanlines`] recovers the raw scanline bytes in place.
//! 4) [`unpack_rows`] converts recovered scanlines into RGBA8 pixels.
//!
//! ## Encoding
//!
//! [`encode_png`] writes RGBA8 (or byte-swapped ABGR8) input as RGBA8,
//! RGB8, or palette-indexed PNG data; see [`EncodeOptions`]. Indexed output
//! builds its palette from the image, packs indices at 1, 2, 4, or 8 bits,
//! and can merge nearest colors down to a size cap instead of failing.
//!
//! ## Checksums
//!
//! The decoder deliberately checks neither the CRC of each chunk (see
//! [`RawChunk::crc_matches`] if you want to) nor the Adler-32 of the zlib
//! stream; both date from an era of much less reliable disks and networks.
//! The encoder writes both correctly.

#[cfg(feature = "alloc")]
extern crate alloc;

mod adler32;
mod crc32;
mod util;

mod error;
pub use error::*;

pub mod chunk;
pub use chunk::*;

pub mod chunks;
pub use chunks::*;

pub mod header;
pub use header::*;

pub mod palette;
pub use palette::*;

pub mod pixels;
pub use pixels::*;

pub mod unfilter;
pub use unfilter::*;

pub mod unpack;
pub use unpack::*;

pub mod zlib;

#[cfg(feature = "alloc")]
pub mod image;
#[cfg(feature = "alloc")]
pub use image::*;

#[cfg(feature = "alloc")]
pub mod filter;
#[cfg(feature = "alloc")]
pub use filter::*;

#[cfg(feature = "alloc")]
pub mod decode;
#[cfg(feature = "alloc")]
pub use decode::*;

#[cfg(feature = "alloc")]
pub mod encode;
#[cfg(feature = "alloc")]
pub use encode::*;

#[cfg(feature = "parallel")]
pub mod parallel;
#[cfg(feature = "parallel")]
pub use parallel::*;
