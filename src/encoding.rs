//! Byte-level encodings shared by the wire formats: variable-length integers,
//! little-endian integers and fixed-width big-endian numbers.

use std::io::{Cursor, Read};

use num_bigint::{BigInt, Sign};

use crate::error::{BitcoinError, Result};

/// Read exactly `n` bytes
pub fn read_bytes(cursor: &mut Cursor<&[u8]>, n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| BitcoinError::Parse(format!("unexpected end of data reading {n} bytes")))?;
    Ok(buf)
}

/// Read a fixed-size array
pub fn read_array<const N: usize>(cursor: &mut Cursor<&[u8]>) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| BitcoinError::Parse(format!("unexpected end of data reading {N} bytes")))?;
    Ok(buf)
}

/// Decode a variable-length integer
pub fn decode_varint(cursor: &mut Cursor<&[u8]>) -> Result<u64> {
    let [prefix] = read_array::<1>(cursor)?;
    match prefix {
        0xfd => Ok(u16::from_le_bytes(read_array(cursor)?) as u64),
        0xfe => Ok(u32::from_le_bytes(read_array(cursor)?) as u64),
        0xff => Ok(u64::from_le_bytes(read_array(cursor)?)),
        n => Ok(n as u64),
    }
}

/// Encode a variable-length integer. Every `u64` fits in the 0xff form.
pub fn encode_varint(n: u64) -> Vec<u8> {
    if n < 0xfd {
        vec![n as u8]
    } else if n < 0x10000 {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(n as u16).to_le_bytes());
        result
    } else if n < 0x100000000 {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(n as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&n.to_le_bytes());
        result
    }
}

/// Decode a little-endian integer of `nbytes` (at most 8)
pub fn decode_int(cursor: &mut Cursor<&[u8]>, nbytes: usize) -> Result<u64> {
    debug_assert!(nbytes <= 8);
    let buf = read_bytes(cursor, nbytes)?;
    Ok(little_endian_to_u64(&buf))
}

/// Encode a little-endian integer into exactly `nbytes`
pub fn encode_int(n: u64, nbytes: usize) -> Vec<u8> {
    let mut result = Vec::with_capacity(nbytes);
    for i in 0..nbytes {
        result.push(if i < 8 { (n >> (i * 8)) as u8 } else { 0 });
    }
    result
}

/// Interpret up to 8 little-endian bytes as an unsigned integer
pub fn little_endian_to_u64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take(8)
        .enumerate()
        .fold(0u64, |acc, (i, &b)| acc | ((b as u64) << (i * 8)))
}

/// Interpret big-endian bytes as a non-negative integer
pub fn bytes_to_int(bytes: &[u8]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, bytes)
}

/// Convert a non-negative integer to a 32-byte big-endian array
pub fn int_to_32_bytes(n: &BigInt) -> [u8; 32] {
    let (_, bytes) = n.to_bytes_be();
    let mut result = [0u8; 32];
    let len = bytes.len().min(32);
    result[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_encoding() {
        assert_eq!(encode_varint(15), hex::decode("0f").unwrap());
        assert_eq!(encode_varint(300), hex::decode("fd2c01").unwrap());
        assert_eq!(encode_varint(70_015), hex::decode("fe7f110100").unwrap());
        assert_eq!(
            encode_varint(18_005_558_675_309),
            hex::decode("ff6dc7ed3e60100000").unwrap()
        );
    }

    #[test]
    fn test_varint_boundaries() {
        let cases = [
            (0xfc, 1),
            (0xfd, 3),
            (0xffff, 3),
            (0x10000, 5),
            (0xffff_ffff, 5),
            (0x1_0000_0000, 9),
            (u64::MAX, 9),
        ];
        for (n, len) in cases {
            let encoded = encode_varint(n);
            assert_eq!(encoded.len(), len, "length of {n:#x}");
            let mut cursor = Cursor::new(encoded.as_slice());
            assert_eq!(decode_varint(&mut cursor).unwrap(), n);
        }
    }

    #[test]
    fn test_truncated_varint() {
        let data = [0xfdu8, 0x01];
        let mut cursor = Cursor::new(data.as_slice());
        assert!(decode_varint(&mut cursor).is_err());
    }

    #[test]
    fn test_little_endian_ints() {
        assert_eq!(encode_int(410393, 4), vec![0x19, 0x43, 0x06, 0x00]);
        let data = [0x19u8, 0x43, 0x06, 0x00];
        let mut cursor = Cursor::new(data.as_slice());
        assert_eq!(decode_int(&mut cursor, 4).unwrap(), 410393);
    }

    #[test]
    fn test_int_to_32_bytes() {
        let bytes = int_to_32_bytes(&BigInt::from(0x0102));
        assert_eq!(bytes[30..], [0x01, 0x02]);
        assert!(bytes[..30].iter().all(|&b| b == 0));
        assert_eq!(bytes_to_int(&bytes), BigInt::from(0x0102));
    }
}
