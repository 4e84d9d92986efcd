#![allow(bad_style)]

use pngine::*;

fn rand_bytes(count: usize) -> Vec<u8> {
  let mut buffer = vec![0; count];
  getrandom::getrandom(&mut buffer).unwrap();
  buffer
}

/// Hand-assembles a PNG from header fields, optional extra chunks, and the
/// pre-compression payload (filtered scanlines).
fn build_png(
  width: u32, height: u32, bit_depth: u8, color_type: u8, extra: &[(ChunkTy, &[u8])],
  payload: &[u8],
) -> Vec<u8> {
  let mut png = Vec::from(PNG_SIGNATURE);
  let mut ihdr = Vec::new();
  ihdr.extend_from_slice(&width.to_be_bytes());
  ihdr.extend_from_slice(&height.to_be_bytes());
  ihdr.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
  push_chunk(&mut png, ChunkTy::IHDR, &ihdr);
  for (ty, body) in extra {
    push_chunk(&mut png, *ty, body);
  }
  push_chunk(&mut png, ChunkTy::IDAT, &zlib::zlib_compress(payload));
  push_chunk(&mut png, ChunkTy::IEND, &[]);
  png
}

#[test]
fn test_decode_1x1_opaque_red_rgba8() {
  let png = build_png(1, 1, 8, 6, &[], &[0x00, 0xFF, 0x00, 0x00, 0xFF]);
  let (bytes, width, height) = decode_png_rgba(&png).unwrap();
  assert_eq!((width, height), (1, 1));
  assert_eq!(bytes, vec![0xFF, 0x00, 0x00, 0xFF]);
}

#[test]
fn test_decode_2x2_gradient_rgb8_sub_filtered() {
  let payload = [
    0x01, 0x0A, 0x14, 0x1E, 0x1E, 0x1E, 0x1E, //
    0x01, 0x46, 0x50, 0x5A, 0x1E, 0x1E, 0x1E,
  ];
  let png = build_png(2, 2, 8, 2, &[], &payload);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  #[rustfmt::skip]
  assert_eq!(bytes, vec![
    10, 20, 30, 255, 40, 50, 60, 255,
    70, 80, 90, 255, 100, 110, 120, 255,
  ]);
}

#[test]
fn test_decode_indexed_4bpp() {
  let plte: &[u8] = &[0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];
  let png = build_png(4, 1, 4, 3, &[(ChunkTy::PLTE, plte)], &[0x00, 0x13, 0x00]);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  #[rustfmt::skip]
  assert_eq!(bytes, vec![
    0xFF, 0x00, 0x00, 0xFF, 0x00, 0x00, 0xFF, 0xFF,
    0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0xFF,
  ]);
}

#[test]
fn test_decode_gray1_alternating() {
  let png = build_png(8, 1, 1, 0, &[], &[0x00, 0xAA]);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  for (i, px) in bytes.chunks_exact(4).enumerate() {
    let y = if i % 2 == 0 { 255 } else { 0 };
    assert_eq!(px, &[y, y, y, 255], "pixel {i}");
  }
}

#[test]
fn test_decode_rgb8_with_black_chroma_key() {
  let trns: &[u8] = &[0, 0, 0, 0, 0, 0];
  let payload = [0x00, 0, 0, 0, 9, 9, 9];
  let png = build_png(2, 1, 8, 2, &[(ChunkTy::TRNS, trns)], &payload);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert_eq!(bytes, vec![0, 0, 0, 0, 9, 9, 9, 255]);
}

#[test]
fn test_decode_gray_alpha_16_narrows_high_bytes() {
  let png = build_png(1, 1, 16, 4, &[], &[0x00, 0xAB, 0xCD, 0x12, 0x34]);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert_eq!(bytes, vec![0xAB, 0xAB, 0xAB, 0x12]);
}

#[test]
fn test_decode_output_size_is_always_4wh() {
  for (w, h, d, ct, spl) in [(3_u32, 5_u32, 8_u8, 0_u8, 3_usize), (5, 2, 1, 0, 1), (2, 3, 16, 6, 16)]
  {
    let mut payload = Vec::new();
    for _ in 0..h {
      payload.push(0);
      payload.extend(core::iter::repeat(0x5A).take(spl));
    }
    let png = build_png(w, h, d, ct, &[], &payload);
    let bitmap = decode_png(&png).unwrap();
    assert_eq!(bitmap.as_bytes().len(), (4 * w * h) as usize);
  }
}

#[test]
fn test_multiple_idats_and_interleaved_ancillary_chunks() {
  // the same 2x2 gradient, but with its zlib stream split across two IDATs
  // that have a text chunk wedged between them, plus one before the data.
  let payload = [
    0x01, 0x0A, 0x14, 0x1E, 0x1E, 0x1E, 0x1E, //
    0x01, 0x46, 0x50, 0x5A, 0x1E, 0x1E, 0x1E,
  ];
  let z = zlib::zlib_compress(&payload);
  let (z0, z1) = z.split_at(z.len() / 2);
  let mut png = Vec::from(PNG_SIGNATURE);
  let mut ihdr = Vec::new();
  ihdr.extend_from_slice(&2_u32.to_be_bytes());
  ihdr.extend_from_slice(&2_u32.to_be_bytes());
  ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
  push_chunk(&mut png, ChunkTy::IHDR, &ihdr);
  push_chunk(&mut png, ChunkTy(*b"tEXt"), b"Comment\0who needs one");
  push_chunk(&mut png, ChunkTy::IDAT, z0);
  push_chunk(&mut png, ChunkTy(*b"tIME"), &[0x07, 0xD0, 1, 1, 0, 0, 0]);
  push_chunk(&mut png, ChunkTy::IDAT, z1);
  push_chunk(&mut png, ChunkTy::IEND, &[]);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert_eq!(&bytes[..4], &[10, 20, 30, 255]);
  assert_eq!(&bytes[12..], &[100, 110, 120, 255]);
}

#[test]
fn test_rgba8_round_trip() {
  let (w, h) = (13_u32, 7_u32);
  let rgba = rand_bytes((w * h * 4) as usize);
  let png = encode_png(&rgba, w, h, EncodeOptions::default()).unwrap();
  let (bytes, rw, rh) = decode_png_rgba(&png).unwrap();
  assert_eq!((rw, rh), (w, h));
  assert_eq!(bytes, rgba);
}

#[test]
fn test_rgba8_round_trip_under_every_fixed_filter() {
  let (w, h) = (9_u32, 4_u32);
  let rgba = rand_bytes((w * h * 4) as usize);
  for filter in
    [RowFilter::None, RowFilter::Sub, RowFilter::Up, RowFilter::Average, RowFilter::Paeth]
  {
    let opts = EncodeOptions { filter: FilterStrategy::Fixed(filter), ..EncodeOptions::default() };
    let png = encode_png(&rgba, w, h, opts).unwrap();
    let (bytes, ..) = decode_png_rgba(&png).unwrap();
    assert_eq!(bytes, rgba, "filter {filter:?}");
  }
}

#[test]
fn test_rgb8_round_trip_drops_alpha() {
  let (w, h) = (5_u32, 5_u32);
  let rgba = rand_bytes((w * h * 4) as usize);
  let opts = EncodeOptions { color: EncodeColor::Rgb8, ..EncodeOptions::default() };
  let png = encode_png(&rgba, w, h, opts).unwrap();
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  for (got, want) in bytes.chunks_exact(4).zip(rgba.chunks_exact(4)) {
    assert_eq!(&got[..3], &want[..3]);
    assert_eq!(got[3], 255);
  }
}

#[test]
fn test_abgr_source_order() {
  let abgr = [9, 8, 7, 6]; // a=9 b=8 g=7 r=6
  let opts = EncodeOptions { source_is_abgr: true, ..EncodeOptions::default() };
  let png = encode_png(&abgr, 1, 1, opts).unwrap();
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert_eq!(bytes, vec![6, 7, 8, 9]);
}

#[test]
fn test_indexed_round_trip_9_distinct_colors() {
  // 3x3, nine distinct colors, some translucent, so PLTE and tRNS both
  // carry weight.
  let mut rgba = Vec::new();
  for i in 0_u8..9 {
    rgba.extend_from_slice(&[i * 20, 255 - i * 20, i, if i < 5 { 255 } else { 100 + i }]);
  }
  let opts = EncodeOptions { color: EncodeColor::Indexed, ..EncodeOptions::default() };
  let png = encode_png(&rgba, 3, 3, opts).unwrap();
  assert_eq!(decode_png_header(&png).unwrap().format, ColorFormat::Pal4);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert_eq!(bytes, rgba);
}

#[test]
fn test_indexed_round_trip_256_colors_at_depth_8() {
  let mut rgba = Vec::new();
  for i in 0..256 {
    rgba.extend_from_slice(&[i as u8, (i / 2) as u8, 0, 255]);
  }
  let opts = EncodeOptions { color: EncodeColor::Indexed, ..EncodeOptions::default() };
  let png = encode_png(&rgba, 16, 16, opts).unwrap();
  assert_eq!(decode_png_header(&png).unwrap().format, ColorFormat::Pal8);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert_eq!(bytes, rgba);
}

#[test]
fn test_indexed_reduction_maps_to_nearest_kept_color() {
  // three tight pairs of reds; capped at 3 entries each pair collapses to
  // its first-seen member.
  let reds = [0_u8, 2, 100, 102, 200, 202];
  let rgba: Vec<u8> = reds.iter().flat_map(|&r| [r, 0, 0, 255]).collect();
  let opts = EncodeOptions {
    color: EncodeColor::Indexed,
    max_palette_size: Some(3),
    reduce_palette: true,
    ..EncodeOptions::default()
  };
  let png = encode_png(&rgba, 6, 1, opts).unwrap();
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  let got_reds: Vec<u8> = bytes.chunks_exact(4).map(|px| px[0]).collect();
  assert_eq!(got_reds, vec![0, 0, 100, 100, 200, 200]);
  assert!(bytes.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn test_indexed_overflow_without_reduction_fails() {
  let rgba: Vec<u8> = (0_u16..300).flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 9, 255]).collect();
  let opts = EncodeOptions {
    color: EncodeColor::Indexed,
    max_palette_size: Some(16),
    ..EncodeOptions::default()
  };
  assert_eq!(encode_png(&rgba, 300, 1, opts), Err(PngError::BadPalette));
}

#[test]
fn test_indexed_round_trip_at_1_and_2_bits() {
  // two colors pack to 1 bpp, four colors to 2 bpp, and both survive a
  // round trip with their sub-byte rows intact.
  let bw: Vec<u8> = [0_u8, 255, 255, 0, 255, 0, 0, 255, 255, 0]
    .iter()
    .flat_map(|&y| [y, y, y, 255])
    .collect();
  let opts = EncodeOptions { color: EncodeColor::Indexed, ..EncodeOptions::default() };
  let png = encode_png(&bw, 5, 2, opts).unwrap();
  assert_eq!(decode_png_header(&png).unwrap().format, ColorFormat::Pal1);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert_eq!(bytes, bw);

  let four: Vec<u8> = (0_u8..12).flat_map(|i| [(i % 4) * 80, 7, 7, 255]).collect();
  let png = encode_png(&four, 4, 3, opts).unwrap();
  assert_eq!(decode_png_header(&png).unwrap().format, ColorFormat::Pal2);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert_eq!(bytes, four);
}

#[test]
fn test_indexed_trns_shorter_than_palette() {
  // two palette entries but only one alpha byte: the second entry defaults
  // to fully opaque.
  let plte: &[u8] = &[10, 20, 30, 40, 50, 60];
  let trns: &[u8] = &[128];
  let png = build_png(
    2,
    1,
    8,
    3,
    &[(ChunkTy::PLTE, plte), (ChunkTy::TRNS, trns)],
    &[0x00, 0x00, 0x01],
  );
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert_eq!(bytes, vec![10, 20, 30, 128, 40, 50, 60, 255]);
}

#[test]
fn test_decode_gray4_ramp() {
  // 4 pixels of 4-bit gray: 0, 5, 10, 15 widen to 0, 85, 170, 255.
  let png = build_png(4, 1, 4, 0, &[], &[0x00, 0x05, 0xAF]);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  let grays: Vec<u8> = bytes.chunks_exact(4).map(|px| px[0]).collect();
  assert_eq!(grays, vec![0, 85, 170, 255]);
}

#[test]
fn test_decode_every_row_filter_in_one_image() {
  // 4x5 RGBA8 where each row after the first uses a different filter, all
  // recovering the same flat color.
  let flat = [0x40_u8; 16];
  let mut payload = Vec::new();
  payload.push(0x00);
  payload.extend_from_slice(&flat);
  // Sub: first pixel literal, the rest zero.
  payload.extend_from_slice(&[0x01, 0x40, 0x40, 0x40, 0x40, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
  // Up: identical to the row above, all zero.
  payload.push(0x02);
  payload.extend_from_slice(&[0; 16]);
  // Average: first pixel gets floor((0 + 0x40)/2) = 0x20 from above.
  payload.extend_from_slice(&[0x03, 0x20, 0x20, 0x20, 0x20, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
  // Paeth: previous row wins everywhere, all zero.
  payload.push(0x04);
  payload.extend_from_slice(&[0; 16]);
  let png = build_png(4, 5, 8, 6, &[], &payload);
  let (bytes, ..) = decode_png_rgba(&png).unwrap();
  assert!(bytes.iter().all(|&b| b == 0x40), "every sample of every row recovers to 0x40");
}

#[test]
fn test_error_bad_signature() {
  assert_eq!(decode_png(b"definitely not a png"), Err(PngError::BadSignature));
  assert_eq!(decode_png(&[]), Err(PngError::BadSignature));
}

#[test]
fn test_error_no_idat() {
  let mut png = Vec::from(PNG_SIGNATURE);
  let ihdr = Ihdr { width: 1, height: 1, format: ColorFormat::Gray8 };
  push_chunk(&mut png, ChunkTy::IHDR, &ihdr.to_body());
  push_chunk(&mut png, ChunkTy::IEND, &[]);
  assert_eq!(decode_png(&png), Err(PngError::MissingData));
}

#[test]
fn test_error_indexed_without_plte() {
  let png = build_png(1, 1, 8, 3, &[], &[0x00, 0x00]);
  assert_eq!(decode_png(&png), Err(PngError::MissingPalette));
}

#[test]
fn test_error_plte_after_idat() {
  let payload = [0_u8, 7];
  let z = zlib::zlib_compress(&payload);
  let mut png = Vec::from(PNG_SIGNATURE);
  let ihdr = Ihdr { width: 1, height: 1, format: ColorFormat::Pal8 };
  push_chunk(&mut png, ChunkTy::IHDR, &ihdr.to_body());
  push_chunk(&mut png, ChunkTy::IDAT, &z);
  push_chunk(&mut png, ChunkTy::PLTE, &[1, 2, 3]);
  push_chunk(&mut png, ChunkTy::IEND, &[]);
  assert_eq!(decode_png(&png), Err(PngError::BadPalette));
}

#[test]
fn test_error_interlaced_stream() {
  let mut png = Vec::from(PNG_SIGNATURE);
  let mut ihdr_body = Ihdr { width: 8, height: 8, format: ColorFormat::Rgba8 }.to_body();
  ihdr_body[12] = 1;
  push_chunk(&mut png, ChunkTy::IHDR, &ihdr_body);
  assert_eq!(decode_png(&png), Err(PngError::UnsupportedInterlace));
}

#[test]
fn test_error_truncated_stream() {
  let full = build_png(1, 1, 8, 6, &[], &[0x00, 1, 2, 3, 4]);
  // cut into the middle of the IDAT chunk.
  assert_eq!(decode_png(&full[..full.len() - 20]), Err(PngError::Truncated));
}

#[test]
fn test_error_bad_filter_byte() {
  let png = build_png(1, 1, 8, 6, &[], &[0x07, 1, 2, 3, 4]);
  assert_eq!(decode_png(&png), Err(PngError::BadFilter));
}

#[test]
fn test_chunk_iter_and_decoder_never_panic_on_garbage() {
  for _ in 0..10 {
    let v = rand_bytes(1024);
    for _ in RawChunkIter::new(&v) {
      //
    }
    let _ = decode_png(&v);
  }
}

#[test]
fn test_encoded_chunks_carry_valid_crcs() {
  let rgba = rand_bytes(4 * 4 * 4);
  let png = encode_png(&rgba, 4, 4, EncodeOptions::default()).unwrap();
  let mut saw = 0;
  for raw in RawChunkIter::new(strip_png_signature(&png).unwrap()) {
    assert!(raw.unwrap().crc_matches());
    saw += 1;
  }
  assert_eq!(saw, 3); // IHDR, IDAT, IEND
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_decode_matches_sequential() {
  let (w, h) = (64_u32, 64_u32);
  let rgba = rand_bytes((w * h * 4) as usize);
  let png = encode_png(&rgba, w, h, EncodeOptions::default()).unwrap();
  let seq = decode_png(&png).unwrap();
  for workers in [0, 1, 3] {
    let par = parallel::decode_png_parallel(&png, workers).unwrap();
    assert_eq!(seq, par, "workers: {workers}");
  }
}
