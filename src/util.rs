//! Shorthands for pulling big-endian values off a byte slice and pushing
//! them back onto a byte vec.

use crate::error::{PngError, PngResult};

pub(crate) fn try_pull_array<const N: usize>(bytes: &[u8]) -> PngResult<([u8; N], &[u8])> {
  if bytes.len() >= N {
    let (head, tail) = bytes.split_at(N);
    let a: [u8; N] = head.try_into().unwrap();
    Ok((a, tail))
  } else {
    Err(PngError::Truncated)
  }
}

pub(crate) fn try_pull_bytes(bytes: &[u8], count: usize) -> PngResult<(&[u8], &[u8])> {
  if bytes.len() >= count {
    Ok(bytes.split_at(count))
  } else {
    Err(PngError::Truncated)
  }
}

#[inline]
pub(crate) fn try_pull_u16_be(bytes: &[u8]) -> PngResult<(u16, &[u8])> {
  let (a, rest) = try_pull_array::<2>(bytes)?;
  Ok((u16::from_be_bytes(a), rest))
}

#[inline]
pub(crate) fn try_pull_u32_be(bytes: &[u8]) -> PngResult<(u32, &[u8])> {
  let (a, rest) = try_pull_array::<4>(bytes)?;
  Ok((u32::from_be_bytes(a), rest))
}

#[inline]
#[cfg(feature = "alloc")]
pub(crate) fn push_u32_be(vec: &mut alloc::vec::Vec<u8>, u: u32) {
  vec.extend_from_slice(&u.to_be_bytes());
}

#[test]
fn test_pulls_give_truncated_when_short() {
  assert_eq!(try_pull_array::<4>(&[1, 2, 3]), Err(PngError::Truncated));
  assert_eq!(try_pull_u32_be(&[0, 0, 1, 2]), Ok((258, &[][..])));
  assert_eq!(try_pull_u16_be(&[0xAB, 0xCD, 9]), Ok((0xABCD, &[9_u8][..])));
  assert_eq!(try_pull_bytes(&[1, 2], 3), Err(PngError::Truncated));
}
