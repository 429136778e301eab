//! secp256k1 parameters used throughout Bitcoin
//! Reference: http://www.oid-info.com/get/1.3.132.0.10

use std::sync::LazyLock;

use num_bigint::BigInt;

use crate::curves::Curve;
use crate::field::FieldElement;
use crate::keys::S256Point;

fn hex_int(digits: &[u8]) -> BigInt {
    BigInt::parse_bytes(digits, 16).expect("constant is valid hex")
}

/// Field prime p = 2^256 - 2^32 - 977
pub static P: LazyLock<BigInt> = LazyLock::new(|| {
    (BigInt::from(1) << 256) - (BigInt::from(1) << 32) - BigInt::from(977)
});

/// Order of the generator point
pub static N: LazyLock<BigInt> = LazyLock::new(|| {
    hex_int(b"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141")
});

/// y^2 = x^3 + 7 over F_p
pub static CURVE: LazyLock<Curve> = LazyLock::new(|| Curve {
    a: FieldElement::reduced(&BigInt::from(0), &P),
    b: FieldElement::reduced(&BigInt::from(7), &P),
});

/// Generator point G
pub static G: LazyLock<S256Point> = LazyLock::new(|| {
    let gx = hex_int(b"79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798");
    let gy = hex_int(b"483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8");
    S256Point::new(gx, gy).expect("generator is on secp256k1")
});
