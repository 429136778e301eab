//! Points on secp256k1: public keys with SEC encoding, addresses and
//! ECDSA signature verification.

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;

use crate::base58::h160_to_p2pkh_address;
use crate::bitcoin::{CURVE, G, N, P};
use crate::curves::Point;
use crate::ecdsa::Signature;
use crate::encoding::{bytes_to_int, int_to_32_bytes};
use crate::error::{BitcoinError, Result};
use crate::field::FieldElement;
use crate::hash::hash160;

/// Bitcoin network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    #[default]
    Main,
    Test,
}

impl Network {
    /// Version byte for pay-to-public-key-hash addresses
    #[inline]
    pub const fn p2pkh_prefix(self) -> u8 {
        match self {
            Network::Main => 0x00,
            Network::Test => 0x6f,
        }
    }

    /// Version byte for pay-to-script-hash addresses
    #[inline]
    pub const fn p2sh_prefix(self) -> u8 {
        match self {
            Network::Main => 0x05,
            Network::Test => 0xc4,
        }
    }

    /// Version byte for WIF private keys
    #[inline]
    pub const fn wif_prefix(self) -> u8 {
        match self {
            Network::Main => 0x80,
            Network::Test => 0xef,
        }
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Network::Main => "main",
            Network::Test => "test",
        }
    }

    #[inline]
    pub const fn is_testnet(self) -> bool {
        matches!(self, Network::Test)
    }
}

impl TryFrom<&str> for Network {
    type Error = BitcoinError;

    fn try_from(s: &str) -> Result<Self> {
        match s {
            "main" | "mainnet" => Ok(Network::Main),
            "test" | "testnet" => Ok(Network::Test),
            _ => Err(BitcoinError::Parse(format!("Unknown network: {s}"))),
        }
    }
}

/// A point on secp256k1 (a = 0, b = 7 over p = 2^256 - 2^32 - 977)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S256Point(Point);

impl S256Point {
    pub fn new(x: BigInt, y: BigInt) -> Result<Self> {
        let x = FieldElement::new(x, P.clone())?;
        let y = FieldElement::new(y, P.clone())?;
        Ok(S256Point(Point::new(CURVE.clone(), x, y)?))
    }

    #[must_use]
    pub fn infinity() -> Self {
        S256Point(Point::infinity(CURVE.clone()))
    }

    /// Wrap a generic point, checking it lives on secp256k1
    pub fn from_point(point: Point) -> Result<Self> {
        if point.curve() != &*CURVE {
            return Err(BitcoinError::CurveMismatch);
        }
        Ok(S256Point(point))
    }

    #[inline]
    pub fn point(&self) -> &Point {
        &self.0
    }

    #[inline]
    pub fn x(&self) -> Option<&BigInt> {
        self.0.x().map(FieldElement::num)
    }

    #[inline]
    pub fn y(&self) -> Option<&BigInt> {
        self.0.y().map(FieldElement::num)
    }

    fn coordinates(&self) -> Result<(&BigInt, &BigInt)> {
        match (self.x(), self.y()) {
            (Some(x), Some(y)) => Ok((x, y)),
            _ => Err(BitcoinError::InvalidPublicKey("point at infinity")),
        }
    }

    pub fn add(&self, other: &S256Point) -> Result<S256Point> {
        Ok(S256Point(self.0.add(&other.0)?))
    }

    /// Scalar multiplication; the scalar is reduced mod N first since N*G = 0
    pub fn mul(&self, k: &BigInt) -> Result<S256Point> {
        let k = k.mod_floor(&N);
        Ok(S256Point(self.0.scalar_mul(&k)?))
    }

    /// Encode to SEC format
    pub fn sec(&self, compressed: bool) -> Result<Vec<u8>> {
        let (x, y) = self.coordinates()?;
        let mut result = Vec::with_capacity(65);
        if compressed {
            result.push(if y.is_even() { 0x02 } else { 0x03 });
            result.extend_from_slice(&int_to_32_bytes(x));
        } else {
            result.push(0x04);
            result.extend_from_slice(&int_to_32_bytes(x));
            result.extend_from_slice(&int_to_32_bytes(y));
        }
        Ok(result)
    }

    /// Decode from SEC binary format
    pub fn parse(sec: &[u8]) -> Result<Self> {
        match sec.first() {
            Some(0x04) => {
                if sec.len() != 65 {
                    return Err(BitcoinError::InvalidPublicKey(
                        "uncompressed key must be 65 bytes",
                    ));
                }
                S256Point::new(bytes_to_int(&sec[1..33]), bytes_to_int(&sec[33..65]))
            }
            Some(prefix @ (0x02 | 0x03)) => {
                if sec.len() != 33 {
                    return Err(BitcoinError::InvalidPublicKey(
                        "compressed key must be 33 bytes",
                    ));
                }
                let want_even = *prefix == 0x02;
                let x = FieldElement::new(bytes_to_int(&sec[1..]), P.clone())?;

                // y^2 = x^3 + 7; p % 4 == 3 so w^((p+1)/4) is a root
                let w = x.pow(&BigInt::from(3))?.add(&CURVE.b)?;
                let beta = w.sqrt();
                let y = if beta.is_even() == want_even {
                    beta
                } else {
                    FieldElement::new(&*P - beta.num(), P.clone())?
                };
                Ok(S256Point(Point::new(CURVE.clone(), x, y)?))
            }
            Some(_) => Err(BitcoinError::InvalidPublicKey("unknown SEC prefix")),
            None => Err(BitcoinError::InvalidPublicKey("empty public key")),
        }
    }

    /// HASH160 of the SEC encoding
    pub fn hash160(&self, compressed: bool) -> Result<[u8; 20]> {
        Ok(hash160(&self.sec(compressed)?))
    }

    /// Base58Check P2PKH address
    pub fn address(&self, compressed: bool, net: Network) -> Result<String> {
        Ok(h160_to_p2pkh_address(&self.hash160(compressed)?, net))
    }

    /// ECDSA verification: with u = z/s and v = r/s, accept iff (uG + vP).x == r
    #[must_use]
    pub fn verify(&self, z: &BigInt, sig: &Signature) -> bool {
        let n = &*N;
        if sig.r < BigInt::one() || &sig.r >= n || sig.s < BigInt::one() || &sig.s >= n {
            return false;
        }

        let s_inv = sig.s.modpow(&(n - BigInt::from(2)), n);
        let u = (z * &s_inv).mod_floor(n);
        let v = (&sig.r * &s_inv).mod_floor(n);

        let total = G.mul(&u).and_then(|ug| ug.add(&self.mul(&v)?));
        match total {
            Ok(point) => point.x() == Some(&sig.r),
            Err(_) => false,
        }
    }
}

impl fmt::Display for S256Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.coordinates() {
            Ok((x, y)) => write!(f, "S256Point({x:064x}, {y:064x})"),
            Err(_) => write!(f, "S256Point(infinity)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_int(s: &str) -> BigInt {
        BigInt::parse_bytes(s.as_bytes(), 16).unwrap()
    }

    #[test]
    fn test_generator_matches_known_multiple() {
        // Mastering Bitcoin chapter 4
        let k = hex_int("1E99423A4ED27608A15A2616A2B0E9E52CED330AC530EDCC32C8FFC6A526AEDD");
        let pk = G.mul(&k).unwrap();
        assert_eq!(
            format!("{:064X}", pk.x().unwrap()),
            "F028892BAD7ED57D2FB57BF33081D5CFCF6F9ED3D3D7F159C2E2FFF579DC341A"
        );
        assert_eq!(
            format!("{:064X}", pk.y().unwrap()),
            "07CF33DA18BD734C600B96A72BBC4749D5141C90EC8AC328AE52DDFE2E505BDB"
        );
    }

    #[test]
    fn test_mul_reduces_scalar() {
        let k = BigInt::from(7);
        assert_eq!(G.mul(&(&k + &*N)).unwrap(), G.mul(&k).unwrap());
        assert_eq!(G.mul(&N).unwrap(), S256Point::infinity());
    }

    #[test]
    fn test_uncompressed_sec() {
        let cases = [
            (
                BigInt::from(5000),
                "04ffe558e388852f0120e46af2d1b370f85854a8eb0841811ece0e3e03d282d57c315dc72890a4f10a1481c031b03b351b0dc79901ca18a00cf009dbdb157a1d10",
            ),
            (
                BigInt::from(2018).pow(5),
                "04027f3da1918455e03c46f659266a1bb5204e959db7364d2f473bdf8f0a13cc9dff87647fd023c13b4a4994f17691895806e1b40b57f4fd22581a4f46851f3b06",
            ),
            (
                hex_int("deadbeef12345"),
                "04d90cd625ee87dd38656dd95cf79f65f60f7273b67d3096e68bd81e4f5342691f842efa762fd59961d0e99803c61edba8b3e3f7dc3a341836f97733aebf987121",
            ),
        ];
        for (secret, expected) in cases {
            let point = G.mul(&secret).unwrap();
            let sec = point.sec(false).unwrap();
            assert_eq!(hex::encode(&sec), expected);
            assert_eq!(S256Point::parse(&sec).unwrap(), point);
        }
    }

    #[test]
    fn test_compressed_sec() {
        let cases = [
            (
                BigInt::from(5001),
                "0357a4f368868a8a6d572991e484e664810ff14c05c0fa023275251151fe0e53d1",
            ),
            (
                BigInt::from(2019).pow(5),
                "02933ec2d2b111b92737ec12f1c5d20f3233a0ad21cd8b36d0bca7a0cfa5cb8701",
            ),
            (
                hex_int("deadbeef54321"),
                "0296be5b1292f6c856b3c5654e886fc13511462059089cdf9c479623bfcbe77690",
            ),
        ];
        for (secret, expected) in cases {
            let point = G.mul(&secret).unwrap();
            let sec = point.sec(true).unwrap();
            assert_eq!(hex::encode(&sec), expected);
            // odd and even y both recover the same point as the uncompressed form
            let parsed = S256Point::parse(&sec).unwrap();
            assert_eq!(parsed, point);
            assert_eq!(S256Point::parse(&point.sec(false).unwrap()).unwrap(), parsed);
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(S256Point::parse(&[]).is_err());
        assert!(S256Point::parse(&[0x05; 33]).is_err());
        assert!(S256Point::parse(&[0x02; 10]).is_err());
        let mut off_curve = vec![0x04];
        off_curve.extend_from_slice(&[0x01; 64]);
        assert!(matches!(
            S256Point::parse(&off_curve),
            Err(BitcoinError::PointNotOnCurve { .. })
        ));
        assert!(S256Point::infinity().sec(true).is_err());
    }

    #[test]
    fn test_addresses() {
        let cases = [
            (BigInt::from(5002), false, Network::Test, "mmTPbXQFxboEtNRkwfh6K51jvdtHLxGeMA"),
            (BigInt::from(2020).pow(5), true, Network::Test, "mopVkxp8UhXqRYbCYJsbeE1h1fiF64jcoH"),
            (hex_int("12345deadbeef"), true, Network::Main, "1F1Pn2y6pDb68E5nYJJeba4TLg2U7B6KF1"),
            // Mastering Bitcoin chapter 4
            (
                hex_int("3aba4162c7251c891207b747840551a71939b0de081f85c4e44cf7c13e41daa6"),
                true,
                Network::Main,
                "14cxpo3MBCYYWCgF74SWTdcmxipnGUsPw3",
            ),
        ];
        for (secret, compressed, net, expected) in cases {
            let point = G.mul(&secret).unwrap();
            assert_eq!(point.address(compressed, net).unwrap(), expected);
        }
    }

    fn known_point() -> S256Point {
        S256Point::new(
            hex_int("887387e452b8eacc4acfde10d9aaf7f6d9a0f975aabb10d006e4da568744d06c"),
            hex_int("61de6d95231cd89026e286df3b6ae4a894a3378e393e93a0f45b666329a0ae34"),
        )
        .unwrap()
    }

    #[test]
    fn test_verify() {
        let point = known_point();
        let z_a = hex_int("ec208baa0fc1c19f708a9ca96fdeff3ac3f230bb4a7ba4aede4942ad003c0f60");
        let sig_a = Signature::new(
            hex_int("ac8d1c87e51d0d441be8b3dd5b05c8795b48875dffe00b7ffcfac23010d3a395"),
            hex_int("68342ceff8935ededd102dd876ffd6ba72d6a427a3edb13d26eb0781cb423c4"),
        );
        let z_b = hex_int("7c076ff316692a3d7eb3c3bb0f8b1488cf72e1afcd929e29307032997a838a3d");
        let sig_b = Signature::new(
            hex_int("eff69ef2b1bd93a66ed5219add4fb51e11a840f404876325a1e8ffe0529a2c"),
            hex_int("c7207fee197d27c618aea621406f6bf5ef6fca38681d82b2f06fddbdce6feab6"),
        );

        assert!(point.verify(&z_a, &sig_a));
        assert!(point.verify(&z_b, &sig_b));
        assert!(!point.verify(&z_a, &sig_b));
    }

    #[test]
    fn test_verify_rejects_out_of_range() {
        let point = known_point();
        let z = BigInt::from(1);
        assert!(!point.verify(&z, &Signature::new(BigInt::from(0), BigInt::from(1))));
        assert!(!point.verify(&z, &Signature::new(BigInt::from(1), N.clone())));
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!(Network::try_from("mainnet").unwrap(), Network::Main);
        assert_eq!(Network::try_from("test").unwrap(), Network::Test);
        assert!(Network::try_from("regtest").is_err());
    }
}
