use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

use crate::Value;

/// Class tag of a packed decimal immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TripleClass {
    /// A finite number.
    Normal = 0x00,
    /// Positive or negative infinity.
    Infinity = 0x01,
    /// Quiet NaN.
    QuietNan = 0x02,
    /// Signaling NaN.
    SignalingNan = 0x03,
}

impl TryFrom<u8> for TripleClass {
    type Error = TripleError;

    fn try_from(tag: u8) -> Result<Self, TripleError> {
        match tag {
            0x00 => Ok(Self::Normal),
            0x01 => Ok(Self::Infinity),
            0x02 => Ok(Self::QuietNan),
            0x03 => Ok(Self::SignalingNan),
            _ => Err(TripleError::UnknownClass { tag }),
        }
    }
}

/// Wire form of a decimal immediate: a 128-bit coefficient split into two
/// words, a sign, a base-10 exponent, and a class tag.
///
/// `Normal` triples decode as `±(hi·2⁶⁴ + lo)·10^exp`. The scalar type is
/// finite-only, so the other classes are rejected at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecimalTriple {
    /// Class tag.
    pub class: TripleClass,
    /// Non-zero for negative numbers.
    pub sign: u8,
    /// High 64 bits of the coefficient.
    pub hi: u64,
    /// Low 64 bits of the coefficient.
    pub lo: u64,
    /// Base-10 exponent.
    pub exp: i64,
}

/// A decimal immediate that does not decode to a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TripleError {
    /// The class tag byte is not in the catalog.
    #[error("unknown decimal class tag {tag:#04x}")]
    UnknownClass {
        /// The offending tag byte.
        tag: u8,
    },
    /// Infinity or NaN; the scalar type is finite-only.
    #[error("non-finite decimal immediate ({class:?})")]
    NonFinite {
        /// The non-finite class.
        class: TripleClass,
    },
    /// The exponent cannot be represented as a scale.
    #[error("decimal exponent {exp} out of range")]
    ExponentOutOfRange {
        /// The offending exponent.
        exp: i64,
    },
    /// The coefficient does not fit in 128 bits.
    #[error("decimal coefficient does not fit a triple")]
    CoefficientOverflow,
}

impl DecimalTriple {
    /// A triple holding the given signed 128-bit coefficient and exponent.
    pub fn normal(coefficient: i128, exp: i64) -> Self {
        let magnitude = coefficient.unsigned_abs();
        Self {
            class: TripleClass::Normal,
            sign: u8::from(coefficient < 0),
            hi: (magnitude >> 64) as u64,
            lo: magnitude as u64,
            exp,
        }
    }

    /// Decode into a scalar.
    pub fn to_value(&self) -> Result<Value, TripleError> {
        if self.class != TripleClass::Normal {
            return Err(TripleError::NonFinite { class: self.class });
        }
        let scale = self
            .exp
            .checked_neg()
            .ok_or(TripleError::ExponentOutOfRange { exp: self.exp })?;
        let magnitude = (u128::from(self.hi) << 64) | u128::from(self.lo);
        let sign = if self.sign != 0 { Sign::Minus } else { Sign::Plus };
        let coefficient = BigInt::from_biguint(sign, magnitude.into());
        Ok(Value::from(BigDecimal::new(coefficient, scale)))
    }
}

impl TryFrom<&Value> for DecimalTriple {
    type Error = TripleError;

    /// Encode a scalar as a wire triple. Fails when the normalized
    /// coefficient exceeds 128 bits.
    fn try_from(value: &Value) -> Result<Self, TripleError> {
        let (coefficient, scale) = value.decimal().normalized().into_bigint_and_exponent();
        let exp = scale
            .checked_neg()
            .ok_or(TripleError::ExponentOutOfRange { exp: scale })?;
        let (sign, magnitude) = coefficient.into_parts();
        let magnitude = magnitude
            .to_u128()
            .ok_or(TripleError::CoefficientOverflow)?;
        Ok(Self {
            class: TripleClass::Normal,
            sign: u8::from(sign == Sign::Minus),
            hi: (magnitude >> 64) as u64,
            lo: magnitude as u64,
            exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_small_coefficients() {
        let triple = DecimalTriple::normal(1234, -2);
        assert_eq!(triple.to_value().unwrap(), "12.34".parse().unwrap());
    }

    #[test]
    fn decodes_negative_numbers() {
        let triple = DecimalTriple::normal(-5, 0);
        assert_eq!(triple.to_value().unwrap(), Value::from(-5i64));
    }

    #[test]
    fn decodes_high_word_coefficients() {
        let coefficient = 10_000_000_000_000_000_000_000i128;
        let triple = DecimalTriple::normal(coefficient, 0);
        assert!(triple.hi > 0);
        assert_eq!(
            triple.to_value().unwrap(),
            "1e22".parse::<Value>().unwrap()
        );
    }

    #[test]
    fn rejects_non_finite_classes() {
        let mut triple = DecimalTriple::normal(0, 0);
        triple.class = TripleClass::Infinity;
        assert!(matches!(
            triple.to_value(),
            Err(TripleError::NonFinite { .. })
        ));
    }

    #[test]
    fn round_trips_through_encoding() {
        for text in ["0", "1", "-42", "12.34", "-0.001", "9.999999e20"] {
            let value: Value = text.parse().unwrap();
            let triple = DecimalTriple::try_from(&value).unwrap();
            assert_eq!(triple.to_value().unwrap(), value, "{text}");
        }
    }

    #[test]
    fn unknown_class_tag_is_rejected() {
        assert!(TripleClass::try_from(0x04).is_err());
        assert_eq!(TripleClass::try_from(0x01).unwrap(), TripleClass::Infinity);
    }
}
