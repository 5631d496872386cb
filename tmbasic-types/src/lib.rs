//! Scalar value type of the TMBASIC virtual machine.
//!
//! BASIC's `Number` type is a single decimal scalar. Booleans, integers and
//! dates are all carried in it; the object stack holds everything else.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

mod triple;
mod value;

pub use triple::{DecimalTriple, TripleClass, TripleError};
pub use value::{ParseValueError, Value, DECIMAL128_PRECISION};
