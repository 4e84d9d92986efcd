//! The CRC-32 that PNG seals each chunk with.
//!
//! Reflected polynomial `0xEDB8_8320`, initial value and final xor all-ones,
//! computed over the chunk type followed by the chunk body.

const CRC_TABLE: [u32; 256] = {
  let mut table = [0_u32; 256];
  let mut n = 0;
  while n < 256 {
    let mut c = n as u32;
    let mut k = 0;
    while k < 8 {
      c = if (c & 1) != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
      k += 1;
    }
    table[n] = c;
    //
    n += 1;
  }
  table
};

/// CRC-32 of a byte sequence, as PNG writes it after each chunk body.
#[inline]
pub(crate) fn png_crc(iter: impl Iterator<Item = u8>) -> u32 {
  let mut crc = u32::MAX;
  for byte in iter {
    let i = (crc ^ u32::from(byte)) as u8 as usize;
    crc = CRC_TABLE[i] ^ (crc >> 8);
  }
  crc ^ u32::MAX
}

#[test]
fn test_png_crc_known_vectors() {
  // the CRC of an empty IEND chunk, seen at the tail of nearly every PNG on
  // the internet.
  assert_eq!(png_crc(b"IEND".iter().copied()), 0xAE42_6082);
  assert_eq!(png_crc(core::iter::empty()), 0);
}
