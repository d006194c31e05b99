//! Conversions between linear addresses and the 7-bit-per-unit (base-128) SysEx address form.
//!
//! Textually, a wire address is a sequence of two-character lowercase hex digits, most significant
//! first, separated by spaces (`00 01 7f`). Periods are accepted as separators when decoding.

use crate::err::{LayoutError, Result};
use std::fmt;

/// Length of the wire addresses used for subblock and group offsets.
pub const ADDRESS_DIGITS: usize = 3;

/// Fixed-length base-128 digits, most significant first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireDigits(Vec<u8>);

impl WireDigits {
    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for WireDigits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, digit) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", digit)?;
        }
        Ok(())
    }
}

/// Splits `value` into `length` base-128 digits, most significant first.
///
/// Bits that do not fit into `length` digits are dropped.
pub fn to_wire_digits(value: u32, length: usize) -> WireDigits {
    let mut value = value;
    let mut digits = Vec::with_capacity(length);

    for _ in 0..length {
        digits.push((value & 0x7f) as u8);
        value >>= 7;
    }

    digits.reverse();
    WireDigits(digits)
}

/// Parses a textual wire address (`"00 01 00"`, `"00.01.00"`) back into its linear value.
pub fn from_wire_digits(text: &str) -> Result<u32> {
    let malformed = |reason| LayoutError::MalformedAddress {
        text: text.to_owned(),
        reason,
    };

    let parts: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == '.')
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        return Err(malformed("address is empty"));
    }

    let mut total: u32 = 0;
    for (i, part) in parts.iter().rev().enumerate() {
        let digit = u8::from_str_radix(part, 16).map_err(|_| malformed("digit is not hex"))?;
        if digit > 0x7f {
            return Err(malformed("digit exceeds 7 bits"));
        }
        if digit == 0 {
            continue;
        }

        let weight = u32::try_from(i)
            .ok()
            .and_then(|i| 128_u32.checked_pow(i))
            .ok_or_else(|| malformed("address overflows"))?;

        total = u32::from(digit)
            .checked_mul(weight)
            .and_then(|v| total.checked_add(v))
            .ok_or_else(|| malformed("address overflows"))?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_wire_digits() {
        assert_eq!(to_wire_digits(0, 3).digits(), &[0, 0, 0]);
        assert_eq!(to_wire_digits(127, 3).digits(), &[0, 0, 0x7f]);
        assert_eq!(to_wire_digits(128, 3).digits(), &[0, 1, 0]);
        assert_eq!(to_wire_digits(0x4000, 3).digits(), &[1, 0, 0]);
        assert_eq!(to_wire_digits(300, 2).to_string(), "02 2c");
    }

    #[test]
    fn test_to_wire_digits_truncates() {
        assert_eq!(to_wire_digits(128, 1).digits(), &[0]);
        assert_eq!(to_wire_digits(129, 1).digits(), &[1]);
    }

    #[test]
    fn test_from_wire_digits() {
        assert_eq!(from_wire_digits("00 01 00").unwrap(), 128);
        assert_eq!(from_wire_digits("01.00.00").unwrap(), 0x4000);
        assert_eq!(from_wire_digits("7f").unwrap(), 127);
        assert_eq!(from_wire_digits(" 00  02 2c ").unwrap(), 300);
    }

    #[test]
    fn test_from_wire_digits_rejects_empty_text() {
        for text in ["", "   ", " . "] {
            assert!(matches!(
                from_wire_digits(text),
                Err(LayoutError::MalformedAddress { .. })
            ));
        }
    }

    #[test]
    fn test_from_wire_digits_rejects_bad_digits() {
        for text in ["00 zz", "00 80", "100"] {
            assert!(
                matches!(
                    from_wire_digits(text),
                    Err(LayoutError::MalformedAddress { .. })
                ),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_wire_digits_rejects_overflow() {
        assert!(from_wire_digits("7f 7f 7f 7f 7f").is_err());
        assert!(from_wire_digits("01 00 00 00 00 00").is_err());
        assert_eq!(from_wire_digits("00 00 00 00 00 00 01").unwrap(), 1);
    }

    #[test]
    fn test_round_trip_three_digits() {
        for value in 0..128_u32.pow(3) {
            let text = to_wire_digits(value, 3).to_string();
            assert_eq!(from_wire_digits(&text).unwrap(), value);
        }
    }
}
