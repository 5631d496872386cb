use core::fmt;
use core::ops::{Add, Mul, Sub};
use core::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_traits::{Signed, ToPrimitive, Zero};

/// Significant digits of IEEE 754-2008 decimal128. Arithmetic results are
/// rounded to this precision.
pub const DECIMAL128_PRECISION: u64 = 34;

/// A BASIC `Number`: a decimal scalar.
///
/// Values are plain data. They are copied freely between stack slots, record
/// fields and map keys; equality and hashing follow the numeric value, not
/// its textual representation (`1.50 == 1.5`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Value {
    num: BigDecimal,
}

impl Value {
    /// The underlying decimal.
    pub fn decimal(&self) -> &BigDecimal {
        &self.num
    }

    /// Boolean reading: any non-zero number is true.
    pub fn as_bool(&self) -> bool {
        !self.num.is_zero()
    }

    /// Boolean storage: `true` is 1, `false` is 0.
    pub fn from_bool(value: bool) -> Self {
        Self::from(i64::from(value))
    }

    /// Largest integral value not greater than this one.
    pub fn floor(&self) -> Self {
        Self {
            num: self.num.with_scale_round(0, RoundingMode::Floor),
        }
    }

    /// Integer reading: the floor, saturated to the `i64` range.
    pub fn as_i64(&self) -> i64 {
        let floored = self.num.with_scale_round(0, RoundingMode::Floor);
        match floored.to_i64() {
            Some(n) => n,
            None if floored.is_negative() => i64::MIN,
            None => i64::MAX,
        }
    }

    /// Integer reading: the floor, saturated to the `i32` range.
    pub fn as_i32(&self) -> i32 {
        let floored = self.num.with_scale_round(0, RoundingMode::Floor);
        match floored.to_i32() {
            Some(n) => n,
            None if floored.is_negative() => i32::MIN,
            None => i32::MAX,
        }
    }

    /// Nearest binary double.
    pub fn as_f64(&self) -> f64 {
        self.num.to_f64().unwrap_or(f64::NAN)
    }

    /// Binary double reading; `None` for NaN or infinities, which have no
    /// decimal representation here.
    pub fn try_from_f64(value: f64) -> Option<Self> {
        BigDecimal::try_from(value).ok().map(|num| Self { num })
    }

    /// Canonical display form: plain notation, trailing zeros stripped.
    pub fn to_display_string(&self) -> String {
        self.num.normalized().to_string()
    }

    /// Division; `None` when the divisor is zero.
    pub fn checked_div(&self, rhs: &Self) -> Option<Self> {
        if rhs.num.is_zero() {
            return None;
        }
        Some(Self {
            num: (&self.num / &rhs.num).with_prec(DECIMAL128_PRECISION),
        })
    }

    /// Remainder of truncated division, sign following the dividend; `None`
    /// when the divisor is zero.
    pub fn checked_rem(&self, rhs: &Self) -> Option<Self> {
        if rhs.num.is_zero() {
            return None;
        }
        let quotient = (&self.num / &rhs.num).with_scale_round(0, RoundingMode::Down);
        let num = (&self.num - &rhs.num * quotient).with_prec(DECIMAL128_PRECISION);
        Some(Self { num })
    }
}

impl Default for Value {
    fn default() -> Self {
        Self {
            num: BigDecimal::zero(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<BigDecimal> for Value {
    fn from(num: BigDecimal) -> Self {
        Self { num }
    }
}

impl From<i64> for Value {
    fn from(num: i64) -> Self {
        Self {
            num: BigDecimal::from(num),
        }
    }
}

impl From<i32> for Value {
    fn from(num: i32) -> Self {
        Self {
            num: BigDecimal::from(num),
        }
    }
}

impl From<u64> for Value {
    fn from(num: u64) -> Self {
        Self {
            num: BigDecimal::from(num),
        }
    }
}

/// Failed to parse a decimal literal.
#[derive(Debug, thiserror::Error)]
#[error("invalid decimal literal: {0}")]
pub struct ParseValueError(#[from] bigdecimal::ParseBigDecimalError);

impl FromStr for Value {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            num: s.parse::<BigDecimal>()?,
        })
    }
}

impl Add for &Value {
    type Output = Value;

    fn add(self, rhs: &Value) -> Value {
        Value {
            num: (&self.num + &rhs.num).with_prec(DECIMAL128_PRECISION),
        }
    }
}

impl Sub for &Value {
    type Output = Value;

    fn sub(self, rhs: &Value) -> Value {
        Value {
            num: (&self.num - &rhs.num).with_prec(DECIMAL128_PRECISION),
        }
    }
}

impl Mul for &Value {
    type Output = Value;

    fn mul(self, rhs: &Value) -> Value {
        Value {
            num: (&self.num * &rhs.num).with_prec(DECIMAL128_PRECISION),
        }
    }
}
