//! Elements of a prime field F_p

use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::error::{BitcoinError, Result};

/// An integer modulo a prime, always kept in `[0, prime)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldElement {
    num: BigInt,
    prime: BigInt,
}

impl FieldElement {
    pub fn new(num: BigInt, prime: BigInt) -> Result<Self> {
        if num.is_negative() || num >= prime {
            return Err(BitcoinError::InvalidFieldElement {
                value: num.to_string(),
                modulus: prime.to_string(),
            });
        }
        Ok(FieldElement { num, prime })
    }

    /// Build an element from any integer by reducing it into the field
    pub fn reduced(num: &BigInt, prime: &BigInt) -> Self {
        FieldElement {
            num: num.mod_floor(prime),
            prime: prime.clone(),
        }
    }

    #[inline]
    pub fn num(&self) -> &BigInt {
        &self.num
    }

    #[inline]
    pub fn prime(&self) -> &BigInt {
        &self.prime
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    #[inline]
    pub fn is_even(&self) -> bool {
        self.num.is_even()
    }

    fn check_same_field(&self, other: &FieldElement) -> Result<()> {
        if self.prime != other.prime {
            return Err(BitcoinError::FieldMismatch);
        }
        Ok(())
    }

    fn with_num(&self, num: BigInt) -> Self {
        FieldElement {
            num: num.mod_floor(&self.prime),
            prime: self.prime.clone(),
        }
    }

    pub fn add(&self, other: &FieldElement) -> Result<Self> {
        self.check_same_field(other)?;
        Ok(self.with_num(&self.num + &other.num))
    }

    /// Subtraction uses a floored modulo, so the result never goes negative.
    pub fn sub(&self, other: &FieldElement) -> Result<Self> {
        self.check_same_field(other)?;
        Ok(self.with_num(&self.num - &other.num))
    }

    pub fn mul(&self, other: &FieldElement) -> Result<Self> {
        self.check_same_field(other)?;
        Ok(self.with_num(&self.num * &other.num))
    }

    /// Multiply by a plain integer coefficient (e.g. the 2 and 3 in point doubling)
    pub fn scale(&self, coefficient: u32) -> Self {
        self.with_num(&self.num * BigInt::from(coefficient))
    }

    pub fn div(&self, other: &FieldElement) -> Result<Self> {
        self.check_same_field(other)?;
        let inverse = other.invert()?;
        Ok(self.with_num(&self.num * &inverse.num))
    }

    /// Multiplicative inverse by Fermat's little theorem: a^(p-2)
    pub fn invert(&self) -> Result<Self> {
        if self.num.is_zero() {
            return Err(BitcoinError::DivisionByZero);
        }
        let exponent = &self.prime - BigInt::from(2);
        Ok(self.with_num(self.num.modpow(&exponent, &self.prime)))
    }

    /// Exponentiation. A negative exponent is folded into `[0, p-1)`,
    /// which needs a non-zero base.
    pub fn pow(&self, exponent: &BigInt) -> Result<Self> {
        if !exponent.is_negative() {
            return Ok(self.with_num(self.num.modpow(exponent, &self.prime)));
        }
        if self.num.is_zero() {
            return Err(BitcoinError::DivisionByZero);
        }
        let order = &self.prime - BigInt::one();
        let n = exponent.mod_floor(&order);
        Ok(self.with_num(self.num.modpow(&n, &self.prime)))
    }

    /// Square root for primes with p % 4 == 3. Returns one of the two roots.
    pub fn sqrt(&self) -> Self {
        let exponent = (&self.prime + BigInt::one()) / BigInt::from(4);
        self.with_num(self.num.modpow(&exponent, &self.prime))
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement_{}({})", self.prime, self.num)
    }
}
