//! Base58 and Base58Check encoding, and the legacy address formats built on them

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};

use crate::encoding::bytes_to_int;
use crate::error::{BitcoinError, Result};
use crate::hash::hash256;
use crate::keys::Network;

const ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn alphabet_inv(c: u8) -> Option<u8> {
    ALPHABET.iter().position(|&x| x == c).map(|i| i as u8)
}

/// Base58 encode bytes; each leading zero byte becomes a '1'
pub fn encode_base58(bytes: &[u8]) -> String {
    let mut n = bytes_to_int(bytes);
    let fifty_eight = BigInt::from(58);
    let mut chars = Vec::new();

    while !n.is_zero() {
        let (quotient, remainder) = n.div_rem(&fifty_eight);
        // remainder < 58
        let idx = remainder.to_usize().unwrap_or_default();
        chars.push(ALPHABET[idx]);
        n = quotient;
    }

    let num_leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    chars.extend(std::iter::repeat_n(ALPHABET[0], num_leading_zeros));
    chars.reverse();
    chars.into_iter().map(char::from).collect()
}

/// Base58 decode to bytes; each leading '1' becomes a zero byte
pub fn decode_base58(s: &str) -> Result<Vec<u8>> {
    let mut n = BigInt::zero();
    let fifty_eight = BigInt::from(58);

    for c in s.bytes() {
        let val = alphabet_inv(c).ok_or(BitcoinError::InvalidBase58Character(c as char))?;
        n = n * &fifty_eight + BigInt::from(val);
    }

    let num_leading_ones = s.bytes().take_while(|&c| c == ALPHABET[0]).count();
    let mut result = vec![0u8; num_leading_ones];
    if !n.is_zero() {
        let (_, bytes) = n.to_bytes_be();
        result.extend(bytes);
    }
    Ok(result)
}

/// Append the first four bytes of hash256 and Base58-encode
pub fn encode_base58_check(payload: &[u8]) -> String {
    let mut data = payload.to_vec();
    data.extend_from_slice(&hash256(payload)[..4]);
    encode_base58(&data)
}

/// Decode Base58Check text, verify the checksum and return the payload
pub fn decode_base58_check(s: &str) -> Result<Vec<u8>> {
    let mut data = decode_base58(s)?;
    if data.len() < 4 {
        return Err(BitcoinError::BadChecksum);
    }
    let checksum = data.split_off(data.len() - 4);
    if hash256(&data)[..4] != checksum[..] {
        return Err(BitcoinError::BadChecksum);
    }
    Ok(data)
}

/// Pay-to-public-key-hash address for a hash160
pub fn h160_to_p2pkh_address(h160: &[u8; 20], net: Network) -> String {
    let mut payload = vec![net.p2pkh_prefix()];
    payload.extend_from_slice(h160);
    encode_base58_check(&payload)
}

/// Pay-to-script-hash address for a hash160
pub fn h160_to_p2sh_address(h160: &[u8; 20], net: Network) -> String {
    let mut payload = vec![net.p2sh_prefix()];
    payload.extend_from_slice(h160);
    encode_base58_check(&payload)
}

/// Extract the hash160 from a Base58Check address, validating its checksum
pub fn decode_address(address: &str) -> Result<[u8; 20]> {
    let payload = decode_base58_check(address)?;
    if payload.len() != 21 {
        return Err(BitcoinError::Parse(format!(
            "address payload is {} bytes, expected 21",
            payload.len()
        )));
    }
    let mut h160 = [0u8; 20];
    h160.copy_from_slice(&payload[1..]);
    Ok(h160)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encode_base58() {
        let cases = [
            (
                "7c076ff316692a3d7eb3c3bb0f8b1488cf72e1afcd929e29307032997a838a3d",
                "9MA8fRQrT4u8Zj8ZRd6MAiiyaxb2Y1CMpvVkHQu5hVM6",
            ),
            (
                "eff69ef2b1bd93a66ed5219add4fb51e11a840f404876325a1e8ffe0529a2c",
                "4fE3H2E6XMp4SsxtwinF7w9a34ooUrwWe4WsW1458Pd",
            ),
            (
                "c7207fee197d27c618aea621406f6bf5ef6fca38681d82b2f06fddbdce6feab6",
                "EQJsjkd6JaGwxrjEhfeqPenqHwrBmPQZjJGNSCHBkcF7",
            ),
        ];
        for (hex_str, expected) in cases {
            let bytes = hex::decode(hex_str).unwrap();
            assert_eq!(encode_base58(&bytes), expected);
            assert_eq!(decode_base58(expected).unwrap(), bytes);
        }
    }

    #[test]
    fn test_leading_zeros() {
        let bytes = [0u8, 0, 1, 2];
        let encoded = encode_base58(&bytes);
        assert!(encoded.starts_with("11"));
        assert_eq!(decode_base58(&encoded).unwrap(), bytes);
        assert_eq!(decode_base58("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_invalid_character() {
        assert!(matches!(
            decode_base58("0OIl"),
            Err(BitcoinError::InvalidBase58Character('0'))
        ));
    }

    #[test]
    fn test_address_helpers() {
        let h160: [u8; 20] = hex::decode("74d691da1574e6b3c192ecfb52cc8984ee7b6c56")
            .unwrap()
            .try_into()
            .unwrap();
        let p2pkh = h160_to_p2pkh_address(&h160, Network::Main);
        assert_eq!(p2pkh, "1BenRpVUFK65JFWcQSuHnJKzc4M8ZP8Eqa");
        assert_eq!(
            h160_to_p2pkh_address(&h160, Network::Test),
            "mrAjisaT4LXL5MzE81sfcDYKU3wqWSvf9q"
        );
        assert_eq!(decode_address(&p2pkh).unwrap(), h160);

        assert_eq!(
            h160_to_p2sh_address(&h160, Network::Main),
            "3CLoMMyuoDQTPRD3XYZtCvgvkadrAdvdXh"
        );
        assert_eq!(
            h160_to_p2sh_address(&h160, Network::Test),
            "2N3u1R6uwQfuobCqbCgBkpsgBxvr1tZpe7B"
        );
    }

    #[test]
    fn test_decode_testnet_address() {
        let h160 = decode_address("mnrVtF8DWjMu839VW3rBfgYaAfKk8983Xf").unwrap();
        assert_eq!(hex::encode(h160), "507b27411ccf7f16f10297de6cef3f291623eddf");
        assert_eq!(
            h160_to_p2pkh_address(&h160, Network::Test),
            "mnrVtF8DWjMu839VW3rBfgYaAfKk8983Xf"
        );
    }

    #[test]
    fn test_bad_address_checksum() {
        let mut address = "1BenRpVUFK65JFWcQSuHnJKzc4M8ZP8Eqa".to_string();
        address.pop();
        address.push('b');
        assert!(matches!(
            decode_address(&address),
            Err(BitcoinError::BadChecksum)
        ));
    }

    proptest! {
        #[test]
        fn prop_base58_check_roundtrip(bytes in prop::collection::vec(any::<u8>(), 0..40)) {
            let encoded = encode_base58_check(&bytes);
            prop_assert_eq!(decode_base58_check(&encoded).unwrap(), bytes);
        }

        #[test]
        fn prop_corruption_fails_checksum(
            bytes in prop::collection::vec(any::<u8>(), 1..40),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let mut raw = bytes.clone();
            raw.extend_from_slice(&hash256(&bytes)[..4]);
            let i = index.index(raw.len());
            raw[i] ^= flip;
            let corrupted = encode_base58(&raw);
            prop_assert!(decode_base58_check(&corrupted).is_err());
        }
    }
}
