//! This module declares the leaf value types held by the normalized tree.

use crate::iid::InstanceIdentifier;
use crate::qname::QName;
use std::fmt;

/// A decoded leaf value, tagged by its type category.
///
/// Values are produced by the per-type codecs and are never re-interpreted
/// afterwards; a union leaf simply holds whichever member value matched.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Value {
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Decimal64(Decimal64),
    String(String),
    Binary(Vec<u8>),
    /// Member bit names, normalized to schema declaration order.
    Bits(Vec<String>),
    Enum(String),
    IdentityRef(QName),
    InstanceIdentifier(InstanceIdentifier),
    Empty,
}

/// A fixed-point decimal: an unscaled 64-bit integer plus the number of
/// fraction digits it is scaled by.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decimal64 {
    /// The unscaled value; the represented number is
    /// `unscaled / 10^fraction_digits`.
    pub unscaled: i64,
    /// Scale, 1..=18.
    pub fraction_digits: u8,
}

impl Decimal64 {
    /// Create a decimal from its unscaled representation.
    pub fn new(unscaled: i64, fraction_digits: u8) -> Decimal64 {
        Decimal64 {
            unscaled,
            fraction_digits,
        }
    }
}

impl fmt::Display for Decimal64 {
    // Canonical form: no plus sign, a single decimal point, no trailing
    // zeros beyond the first fraction digit.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factor = 10i128.pow(u32::from(self.fraction_digits));
        let unscaled = i128::from(self.unscaled);
        let int_part = (unscaled / factor).unsigned_abs();
        let frac_part = (unscaled % factor).unsigned_abs();

        let sign = if self.unscaled < 0 { "-" } else { "" };
        let mut frac = format!(
            "{:0width$}",
            frac_part,
            width = usize::from(self.fraction_digits)
        );
        while frac.len() > 1 && frac.ends_with('0') {
            frac.pop();
        }
        write!(f, "{}{}.{}", sign, int_part, frac)
    }
}

impl fmt::Display for Value {
    /// The canonical string form of the value, independent of wire quoting.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Uint8(v) => write!(f, "{}", v),
            Value::Uint16(v) => write!(f, "{}", v),
            Value::Uint32(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}", v),
            Value::Decimal64(d) => write!(f, "{}", d),
            Value::String(s) => write!(f, "{}", s),
            Value::Binary(b) => write!(f, "{}", base64::encode(b)),
            Value::Bits(names) => write!(f, "{}", names.join(" ")),
            Value::Enum(name) => write!(f, "{}", name),
            Value::IdentityRef(q) => write!(f, "{}", q),
            Value::InstanceIdentifier(iid) => write!(f, "{}", iid),
            Value::Empty => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal64_canonical_form() {
        assert_eq!(Decimal64::new(1250, 2).to_string(), "12.5");
        assert_eq!(Decimal64::new(1200, 2).to_string(), "12.0");
        assert_eq!(Decimal64::new(-5, 1).to_string(), "-0.5");
        assert_eq!(Decimal64::new(0, 3).to_string(), "0.0");
        assert_eq!(Decimal64::new(i64::MIN, 2).to_string(), "-92233720368547758.08");
    }
}
