//! Exact rational numbers over `i128`.
//!
//! Bracket endpoints and implied sums of squares are compared against
//! integers at their exact boundaries, so they never pass through floating
//! point. Every arithmetic step is checked; overflow surfaces as
//! [`GrimError::overflow`].

use std::cmp::Ordering;
use std::fmt;

use crate::errors::GrimError;

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn checked(value: Option<i128>, operation: &str) -> Result<i128, GrimError> {
    value.ok_or_else(|| GrimError::overflow(operation))
}

/// Reduced fraction `num / den` with `den > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ratio {
    num: i128,
    den: i128,
}

impl Ratio {
    /// Zero.
    pub const ZERO: Ratio = Ratio { num: 0, den: 1 };

    /// Builds a reduced fraction. Fails on a zero denominator.
    pub fn new(num: i128, den: i128) -> Result<Self, GrimError> {
        if den == 0 {
            return Err(GrimError::invalid(
                "zero-denominator",
                "rational value with zero denominator",
            ));
        }
        let (mut num, mut den) = if den < 0 {
            (
                checked(num.checked_neg(), "ratio-sign")?,
                checked(den.checked_neg(), "ratio-sign")?,
            )
        } else {
            (num, den)
        };
        let g = gcd(num.unsigned_abs(), den.unsigned_abs());
        if g > 1 {
            // g divides den, which is positive and fits i128.
            let g = g as i128;
            num /= g;
            den /= g;
        }
        Ok(Self { num, den })
    }

    /// Wraps an integer.
    pub const fn from_integer(value: i128) -> Self {
        Self { num: value, den: 1 }
    }

    /// Numerator of the reduced fraction.
    pub fn numer(&self) -> i128 {
        self.num
    }

    /// Denominator of the reduced fraction (always positive).
    pub fn denom(&self) -> i128 {
        self.den
    }

    /// Returns true when the value is an integer.
    pub fn is_integer(&self) -> bool {
        self.den == 1
    }

    /// Largest integer not above the value.
    pub fn floor(&self) -> i128 {
        self.num.div_euclid(self.den)
    }

    /// Smallest integer not below the value.
    pub fn ceil(&self) -> i128 {
        let q = self.num.div_euclid(self.den);
        if self.num.rem_euclid(self.den) == 0 {
            q
        } else {
            q + 1
        }
    }

    /// Exact sum.
    pub fn checked_add(&self, other: &Ratio) -> Result<Ratio, GrimError> {
        let g = gcd(self.den as u128, other.den as u128) as i128;
        let lcm = checked((self.den / g).checked_mul(other.den), "ratio-add")?;
        let left = checked(self.num.checked_mul(lcm / self.den), "ratio-add")?;
        let right = checked(other.num.checked_mul(lcm / other.den), "ratio-add")?;
        Ratio::new(checked(left.checked_add(right), "ratio-add")?, lcm)
    }

    /// Exact difference.
    pub fn checked_sub(&self, other: &Ratio) -> Result<Ratio, GrimError> {
        let negated = Ratio {
            num: checked(other.num.checked_neg(), "ratio-sub")?,
            den: other.den,
        };
        self.checked_add(&negated)
    }

    /// Exact product.
    pub fn checked_mul(&self, other: &Ratio) -> Result<Ratio, GrimError> {
        let g1 = gcd(self.num.unsigned_abs(), other.den as u128).max(1) as i128;
        let g2 = gcd(other.num.unsigned_abs(), self.den as u128).max(1) as i128;
        let num = checked((self.num / g1).checked_mul(other.num / g2), "ratio-mul")?;
        let den = checked((self.den / g2).checked_mul(other.den / g1), "ratio-mul")?;
        Ratio::new(num, den)
    }

    /// Exact product with an integer.
    pub fn checked_mul_int(&self, factor: i128) -> Result<Ratio, GrimError> {
        self.checked_mul(&Ratio::from_integer(factor))
    }

    /// Renders the value with `places` fractional digits, rounding the last
    /// digit half away from zero. Intended for reasons and reports only.
    pub fn to_decimal_string(&self, places: u32) -> String {
        let Some(scale) = 10i128.checked_pow(places) else {
            return self.to_string();
        };
        let Some(scaled) = self.num.checked_mul(scale) else {
            return self.to_string();
        };
        let quotient = scaled / self.den;
        let remainder = (scaled % self.den).abs();
        let rounded = if remainder >= self.den - remainder {
            quotient + scaled.signum()
        } else {
            quotient
        };
        let negative = rounded < 0;
        let digits = rounded.unsigned_abs().to_string();
        let places = places as usize;
        let body = if places == 0 {
            digits
        } else if digits.len() > places {
            let split = digits.len() - places;
            format!("{}.{}", &digits[..split], &digits[split..])
        } else {
            format!("0.{}{}", "0".repeat(places - digits.len()), digits)
        };
        if negative {
            format!("-{body}")
        } else {
            body
        }
    }
}

fn compare(mut a: i128, mut b: i128, mut c: i128, mut d: i128) -> Ordering {
    // Continued-fraction comparison of a/b and c/d (b, d > 0); never overflows.
    let mut flipped = false;
    loop {
        let qa = a.div_euclid(b);
        let qc = c.div_euclid(d);
        if qa != qc {
            let ord = qa.cmp(&qc);
            return if flipped { ord.reverse() } else { ord };
        }
        let ra = a.rem_euclid(b);
        let rc = c.rem_euclid(d);
        let ord = match (ra == 0, rc == 0) {
            (true, true) => return Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => {
                // ra/b < rc/d  <=>  b/ra > d/rc
                (a, b, c, d) = (b, ra, d, rc);
                flipped = !flipped;
                continue;
            }
        };
        return if flipped { ord.reverse() } else { ord };
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self.num, self.den, other.num, other.den)
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_and_normalises_sign() {
        let value = Ratio::new(6, -4).unwrap();
        assert_eq!((value.numer(), value.denom()), (-3, 2));
    }

    #[test]
    fn floor_and_ceil_follow_euclid() {
        let value = Ratio::new(-7, 2).unwrap();
        assert_eq!(value.floor(), -4);
        assert_eq!(value.ceil(), -3);
        let exact = Ratio::new(8, 2).unwrap();
        assert_eq!(exact.floor(), 4);
        assert_eq!(exact.ceil(), 4);
    }

    #[test]
    fn comparison_handles_close_fractions() {
        let a = Ratio::new(689, 200).unwrap();
        let b = Ratio::new(3445, 1000).unwrap();
        assert_eq!(a.cmp(&b), Ordering::Equal);
        let c = Ratio::new(1_000_000_001, 1_000_000_000).unwrap();
        assert!(c > Ratio::from_integer(1));
        assert!(Ratio::new(-1, 3).unwrap() < Ratio::new(-1, 4).unwrap());
    }

    #[test]
    fn decimal_rendering_rounds_last_digit() {
        assert_eq!(Ratio::new(62, 18).unwrap().to_decimal_string(4), "3.4444");
        assert_eq!(Ratio::new(1, 8).unwrap().to_decimal_string(2), "0.13");
        assert_eq!(Ratio::new(-1, 8).unwrap().to_decimal_string(2), "-0.13");
        assert_eq!(Ratio::from_integer(5).to_decimal_string(0), "5");
    }
}
