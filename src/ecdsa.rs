//! Elliptic Curve Digital Signature Algorithm (ECDSA)
//! Signatures with their DER encoding, and private keys that sign with
//! RFC 6979 deterministic nonces.

use std::fmt;
use std::io::{Cursor, Read};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use rand::RngCore;

use crate::base58::encode_base58_check;
use crate::bitcoin::{G, N};
use crate::encoding::{bytes_to_int, int_to_32_bytes};
use crate::error::{BitcoinError, Result};
use crate::hash::{hash256, hmac_sha256};
use crate::keys::{Network, S256Point};

/// ECDSA Signature (r, s)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub r: BigInt,
    pub s: BigInt,
}

impl Signature {
    pub fn new(r: BigInt, s: BigInt) -> Self {
        Signature { r, s }
    }

    /// Decode from DER format
    /// Format: 0x30 [total-length] 0x02 [R-length] [R] 0x02 [S-length] [S]
    pub fn parse(der: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(der);

        if read_byte(&mut cursor, "missing marker")? != 0x30 {
            return Err(BitcoinError::BadSignatureEncoding("invalid DER marker"));
        }
        let total_len = read_byte(&mut cursor, "missing length")? as usize;
        if total_len + 2 != der.len() {
            return Err(BitcoinError::BadSignatureEncoding("invalid DER length"));
        }

        let r = read_integer(&mut cursor)?;
        let s = read_integer(&mut cursor)?;

        if cursor.position() as usize != der.len() {
            return Err(BitcoinError::BadSignatureEncoding("DER length mismatch"));
        }
        Ok(Signature { r, s })
    }

    /// Encode to DER format. Fails unless both values are non-negative
    /// and fit in 32 bytes.
    pub fn der(&self) -> Result<Vec<u8>> {
        let r_bytes = encode_integer(&self.r)?;
        let s_bytes = encode_integer(&self.s)?;

        let mut content = Vec::with_capacity(r_bytes.len() + s_bytes.len() + 4);
        for bytes in [r_bytes, s_bytes] {
            content.push(0x02);
            content.push(bytes.len() as u8);
            content.extend(bytes);
        }

        let mut result = Vec::with_capacity(content.len() + 2);
        result.push(0x30);
        result.push(content.len() as u8);
        result.extend(content);
        Ok(result)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:x},{:x})", self.r, self.s)
    }
}

fn read_byte(cursor: &mut Cursor<&[u8]>, what: &'static str) -> Result<u8> {
    let mut buf = [0u8; 1];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| BitcoinError::BadSignatureEncoding(what))?;
    Ok(buf[0])
}

fn read_integer(cursor: &mut Cursor<&[u8]>) -> Result<BigInt> {
    if read_byte(cursor, "missing integer marker")? != 0x02 {
        return Err(BitcoinError::BadSignatureEncoding("invalid integer marker"));
    }
    let len = read_byte(cursor, "missing integer length")? as usize;
    let mut bytes = vec![0u8; len];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| BitcoinError::BadSignatureEncoding("integer runs past end"))?;
    Ok(bytes_to_int(&bytes))
}

/// Minimal big-endian magnitude, padded with 0x00 when the high bit is set
fn encode_integer(n: &BigInt) -> Result<Vec<u8>> {
    if n.is_negative() || n.bits() > 256 {
        return Err(BitcoinError::BadSignatureEncoding("integer out of range"));
    }
    let (_, mut bytes) = n.to_bytes_be();
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    bytes.drain(..leading_zeros.min(bytes.len().saturating_sub(1)));
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0x00);
    }
    Ok(bytes)
}

/// A secret scalar in [1, N) together with its public point
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    secret: BigInt,
    public_key: S256Point,
}

impl PrivateKey {
    pub fn new(secret: BigInt) -> Result<Self> {
        if secret < BigInt::one() || secret >= *N {
            return Err(BitcoinError::InvalidPrivateKey);
        }
        let public_key = G.mul(&secret)?;
        Ok(PrivateKey { secret, public_key })
    }

    /// Derive a key from the hash256 of a passphrase
    pub fn from_passphrase(passphrase: &str) -> Result<Self> {
        let secret = bytes_to_int(&hash256(passphrase.as_bytes())).mod_floor(&N);
        PrivateKey::new(secret)
    }

    /// Generate a secret key with uniform random distribution in [1, N)
    pub fn generate() -> Result<Self> {
        let mut rng = rand::rng();
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let secret = bytes_to_int(&bytes);
            if !secret.is_zero() && secret < *N {
                return PrivateKey::new(secret);
            }
        }
    }

    #[inline]
    pub fn secret(&self) -> &BigInt {
        &self.secret
    }

    #[inline]
    pub fn public_key(&self) -> &S256Point {
        &self.public_key
    }

    /// Sign a 256-bit message hash. The nonce is deterministic and the
    /// resulting s is always in the lower half of the order.
    pub fn sign(&self, z: &BigInt) -> Result<Signature> {
        let n = &*N;
        let k = self.deterministic_k(z);
        let r = G
            .mul(&k)?
            .x()
            .cloned()
            .ok_or(BitcoinError::InvalidPrivateKey)?;
        let k_inv = k.modpow(&(n - BigInt::from(2)), n);
        let mut s = ((z + &r * &self.secret) * k_inv).mod_floor(n);

        // Low-S (BIP-62)
        if s > n / BigInt::from(2) {
            s = n - s;
        }
        Ok(Signature::new(r, s))
    }

    /// hash256 the message, then sign
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        self.sign(&bytes_to_int(&hash256(message)))
    }

    /// RFC 6979 nonce using HMAC-SHA256
    fn deterministic_k(&self, z: &BigInt) -> BigInt {
        let n = &*N;
        let z = if z >= n { z - n } else { z.clone() };
        let z_bytes = int_to_32_bytes(&z);
        let secret_bytes = int_to_32_bytes(&self.secret);

        let mut k = [0u8; 32];
        let mut v = [1u8; 32];
        for tag in [0x00u8, 0x01] {
            let mut data = Vec::with_capacity(97);
            data.extend_from_slice(&v);
            data.push(tag);
            data.extend_from_slice(&secret_bytes);
            data.extend_from_slice(&z_bytes);
            k = hmac_sha256(&k, &data);
            v = hmac_sha256(&k, &v);
        }

        loop {
            v = hmac_sha256(&k, &v);
            let candidate = bytes_to_int(&v);
            if candidate >= BigInt::one() && &candidate < n {
                return candidate;
            }
            let mut data = v.to_vec();
            data.push(0x00);
            k = hmac_sha256(&k, &data);
            v = hmac_sha256(&k, &v);
        }
    }

    /// Wallet Import Format
    pub fn wif(&self, compressed: bool, net: Network) -> String {
        let mut payload = Vec::with_capacity(34);
        payload.push(net.wif_prefix());
        payload.extend_from_slice(&int_to_32_bytes(&self.secret));
        if compressed {
            payload.push(0x01);
        }
        encode_base58_check(&payload)
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:064x}", self.secret)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hex_int(s: &str) -> BigInt {
        BigInt::parse_bytes(s.as_bytes(), 16).unwrap()
    }

    #[test]
    fn test_sig_der_parse() {
        // From Programming Bitcoin Chapter 4
        let der = hex::decode("3045022037206a0610995c58074999cb9767b87af4c4978db68c06e8e6e81d282047a7c60221008ca63759c1157ebeaec0d03cecca119fc9a75bf8e6d0fa65c841c8e2738cdaec").unwrap();
        let sig = Signature::parse(&der).unwrap();

        assert_eq!(
            sig.r,
            hex_int("37206a0610995c58074999cb9767b87af4c4978db68c06e8e6e81d282047a7c6")
        );
        assert_eq!(
            sig.s,
            hex_int("8ca63759c1157ebeaec0d03cecca119fc9a75bf8e6d0fa65c841c8e2738cdaec")
        );
        assert_eq!(sig.der().unwrap(), der);
    }

    #[test]
    fn test_der_minimal_integers() {
        let sig = Signature::new(BigInt::from(1), BigInt::from(0x80));
        assert_eq!(hex::encode(sig.der().unwrap()), "3007020101020200 80".replace(' ', ""));
        assert_eq!(Signature::parse(&sig.der().unwrap()).unwrap(), sig);
    }

    #[test]
    fn test_der_rejects_out_of_range() {
        let wide = BigInt::one() << 256;
        assert!(matches!(
            Signature::new(wide, BigInt::from(1)).der(),
            Err(BitcoinError::BadSignatureEncoding(_))
        ));
        assert!(Signature::new(BigInt::from(1), BigInt::from(-5)).der().is_err());

        // the largest 32-byte values still encode, with their 0x00 pad
        let max: BigInt = (BigInt::one() << 256) - 1;
        let der = Signature::new(max.clone(), max).der().unwrap();
        assert_eq!(der.len(), 2 + 2 * (2 + 33));
        assert_eq!(der[1] as usize, der.len() - 2);
    }

    #[test]
    fn test_der_rejects_malformed() {
        let good = Signature::new(BigInt::from(5), BigInt::from(6)).der().unwrap();

        let mut bad_marker = good.clone();
        bad_marker[0] = 0x31;
        assert!(matches!(
            Signature::parse(&bad_marker),
            Err(BitcoinError::BadSignatureEncoding(_))
        ));

        let mut bad_length = good.clone();
        bad_length[1] += 1;
        assert!(Signature::parse(&bad_length).is_err());

        let mut bad_int_marker = good.clone();
        bad_int_marker[2] = 0x03;
        assert!(Signature::parse(&bad_int_marker).is_err());

        assert!(Signature::parse(&good[..good.len() - 1]).is_err());
        assert!(Signature::parse(&[]).is_err());
    }

    #[test]
    fn test_private_key_range() {
        assert!(matches!(
            PrivateKey::new(BigInt::zero()),
            Err(BitcoinError::InvalidPrivateKey)
        ));
        assert!(PrivateKey::new(N.clone()).is_err());
        assert!(PrivateKey::new(&*N - 1).is_ok());
    }

    #[test]
    fn test_rfc6979_vector() {
        // secret 1, sha256("Satoshi Nakamoto")
        let key = PrivateKey::new(BigInt::one()).unwrap();
        let z = bytes_to_int(&crate::hash::sha256(b"Satoshi Nakamoto"));
        assert_eq!(
            key.deterministic_k(&z),
            hex_int("8f8a276c19f4149656b280621e358cce24f5f52542772691ee69063b74f15d15")
        );
        let sig = key.sign(&z).unwrap();
        assert_eq!(
            sig.r,
            hex_int("934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d8")
        );
        assert_eq!(
            sig.s,
            hex_int("2442ce9d2b916064108014783e923ec36b49743e2ffa1c4496f01a512aafd9e5")
        );
    }

    #[test]
    fn test_sign_message_is_deterministic() {
        let key = PrivateKey::from_passphrase("my secret").unwrap();
        assert_eq!(
            key.to_string(),
            "8b387de39861728c92ec9f589c303b1038ff60eb3963b12cd212263a1d1e0f00"
        );
        let sig = key.sign_message(b"Programming Bitcoin!").unwrap();
        assert_eq!(sig, key.sign_message(b"Programming Bitcoin!").unwrap());
        assert_eq!(
            sig.r,
            hex_int("307c81ff93f11bff76783d067dab59a5b994cee4f5422873cf0b5f0b715e2888")
        );
        assert_eq!(
            sig.s,
            hex_int("1dfd3d89abc1b3bf13aeee80f78b6b41c10a1937be599e25f014e29227cd164d")
        );

        let z = bytes_to_int(&hash256(b"Programming Bitcoin!"));
        let wrong = bytes_to_int(&hash256(b"Wrong Message!"));
        assert!(key.public_key().verify(&z, &sig));
        assert!(!key.public_key().verify(&wrong, &sig));
    }

    #[test]
    fn test_wif() {
        let cases = [
            (
                BigInt::from(5003),
                true,
                Network::Test,
                "cMahea7zqjxrtgAbB7LSGbcQUr1uX1ojuat9jZodMN8rFTv2sfUK",
            ),
            (
                BigInt::from(2021).pow(5),
                false,
                Network::Test,
                "91avARGdfge8E4tZfYLoxeJ5sGBdNJQH4kvjpWAxgzczjbCwxic",
            ),
            (
                hex_int("54321deadbeef"),
                true,
                Network::Main,
                "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgiuQJv1h8Ytr2S53a",
            ),
        ];
        for (secret, compressed, net, expected) in cases {
            let key = PrivateKey::new(secret).unwrap();
            assert_eq!(key.wif(compressed, net), expected);
        }
    }

    #[test]
    fn test_generated_key_signs() {
        let key = PrivateKey::generate().unwrap();
        let other = PrivateKey::generate().unwrap();
        let z = bytes_to_int(&hash256(b"user pk1 would like to pay user pk2 1 BTC kkthx"));

        let sig = key.sign(&z).unwrap();
        assert!(key.public_key().verify(&z, &sig));
        assert!(!other.public_key().verify(&z, &sig));
        assert!(sig.s <= &*N / BigInt::from(2));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_sign_verify_roundtrip(message in prop::collection::vec(any::<u8>(), 0..64), seed in 1u64..) {
            let key = PrivateKey::new(BigInt::from(seed)).unwrap();
            let sig = key.sign_message(&message).unwrap();
            let z = bytes_to_int(&hash256(&message));
            prop_assert!(key.public_key().verify(&z, &sig));
            prop_assert!(sig.s <= &*N / BigInt::from(2));
            prop_assert_eq!(Signature::parse(&sig.der().unwrap()).unwrap(), sig);
        }
    }
}
