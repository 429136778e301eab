//! Core functions for math over Elliptic Curves over Finite Fields,
//! especially the ability to define Points on Curves and perform
//! addition and scalar multiplication.

use std::fmt;

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

use crate::error::{BitcoinError, Result};
use crate::field::FieldElement;

/// Elliptic Curve over the field of integers modulo a prime.
/// Points on the curve satisfy y^2 = x^3 + a*x + b (mod p).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curve {
    pub a: FieldElement,
    pub b: FieldElement,
}

impl Curve {
    pub fn new(a: FieldElement, b: FieldElement) -> Result<Self> {
        if a.prime() != b.prime() {
            return Err(BitcoinError::FieldMismatch);
        }
        Ok(Curve { a, b })
    }

    #[inline]
    pub fn prime(&self) -> &BigInt {
        self.a.prime()
    }

    /// Whether (x, y) satisfies the curve equation
    pub fn contains(&self, x: &FieldElement, y: &FieldElement) -> Result<bool> {
        let lhs = y.pow(&BigInt::from(2))?;
        let rhs = x
            .pow(&BigInt::from(3))?
            .add(&self.a.mul(x)?)?
            .add(&self.b)?;
        Ok(lhs == rhs)
    }
}

/// A point on a Curve, or the point at infinity (the group identity)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Point {
    Infinity(Curve),
    Finite {
        curve: Curve,
        x: FieldElement,
        y: FieldElement,
    },
}

impl Point {
    /// Build a finite point, rejecting coordinates that are off the curve
    pub fn new(curve: Curve, x: FieldElement, y: FieldElement) -> Result<Self> {
        if !curve.contains(&x, &y)? {
            return Err(BitcoinError::PointNotOnCurve {
                x: x.num().to_string(),
                y: y.num().to_string(),
            });
        }
        Ok(Point::Finite { curve, x, y })
    }

    #[must_use]
    pub const fn infinity(curve: Curve) -> Self {
        Point::Infinity(curve)
    }

    #[must_use]
    #[inline]
    pub const fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity(_))
    }

    #[inline]
    pub fn curve(&self) -> &Curve {
        match self {
            Point::Infinity(curve) | Point::Finite { curve, .. } => curve,
        }
    }

    #[inline]
    pub fn x(&self) -> Option<&FieldElement> {
        match self {
            Point::Infinity(_) => None,
            Point::Finite { x, .. } => Some(x),
        }
    }

    #[inline]
    pub fn y(&self) -> Option<&FieldElement> {
        match self {
            Point::Infinity(_) => None,
            Point::Finite { y, .. } => Some(y),
        }
    }

    /// Group addition
    pub fn add(&self, other: &Point) -> Result<Point> {
        if self.curve() != other.curve() {
            return Err(BitcoinError::CurveMismatch);
        }

        let (curve, x1, y1, x2, y2) = match (self, other) {
            (Point::Infinity(_), _) => return Ok(other.clone()),
            (_, Point::Infinity(_)) => return Ok(self.clone()),
            (
                Point::Finite { curve, x: x1, y: y1 },
                Point::Finite { x: x2, y: y2, .. },
            ) => (curve, x1, y1, x2, y2),
        };

        let slope = if x1 == x2 {
            // Additive inverses, or a vertical tangent at y == 0
            if y1 != y2 || y1.is_zero() {
                return Ok(Point::Infinity(curve.clone()));
            }
            // s = (3x1^2 + a) / (2y1)
            let numerator = x1.pow(&BigInt::from(2))?.scale(3).add(&curve.a)?;
            numerator.div(&y1.scale(2))?
        } else {
            // s = (y2 - y1) / (x2 - x1)
            y2.sub(y1)?.div(&x2.sub(x1)?)?
        };

        // x3 = s^2 - x1 - x2, y3 = s(x1 - x3) - y1
        let x3 = slope.pow(&BigInt::from(2))?.sub(x1)?.sub(x2)?;
        let y3 = slope.mul(&x1.sub(&x3)?)?.sub(y1)?;

        Ok(Point::Finite {
            curve: curve.clone(),
            x: x3,
            y: y3,
        })
    }

    /// Double-and-add scalar multiplication
    pub fn scalar_mul(&self, k: &BigInt) -> Result<Point> {
        debug_assert!(!k.is_negative(), "scalar must be non-negative");
        let mut result = Point::Infinity(self.curve().clone());
        let mut current = self.clone();
        let mut k = k.clone();

        while !k.is_zero() {
            if (&k & BigInt::one()).is_one() {
                result = result.add(&current)?;
            }
            current = current.add(&current)?;
            k >>= 1;
        }
        Ok(result)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Point::Infinity(_) => write!(f, "Point(infinity)"),
            Point::Finite { curve, x, y } => write!(
                f,
                "Point({:x},{:x})_{:x}_{:x} FieldElement({:x})",
                x.num(),
                y.num(),
                curve.a.num(),
                curve.b.num(),
                curve.prime()
            ),
        }
    }
}
