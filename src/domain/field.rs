//! Field literals for on-chain program inputs.
//!
//! Pool identifiers and titles are passed to the program as `field`
//! values written `<decimal>field`. Arbitrary text is packed big-endian
//! into an unsigned integer, keeping at most 31 bytes so the value stays
//! below the field modulus.

use std::fmt;

use alloy_primitives::U256;

use super::error::DomainError;

/// Maximum number of text bytes packed into a single field.
pub const MAX_FIELD_BYTES: usize = 31;

/// A `<decimal>field` literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldLiteral(String);

impl FieldLiteral {
    /// Encode text as a field literal.
    ///
    /// Text that is already a literal (`123field`) is kept as is. Anything
    /// else is UTF-8 encoded, truncated to [`MAX_FIELD_BYTES`] and read as a
    /// big-endian integer.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::EmptyField`] for empty text.
    pub fn from_text(text: &str) -> Result<Self, DomainError> {
        if Self::is_literal(text) {
            return Ok(Self(text.to_string()));
        }
        let bytes = text.as_bytes();
        if bytes.is_empty() {
            return Err(DomainError::EmptyField);
        }
        let packed = &bytes[..bytes.len().min(MAX_FIELD_BYTES)];
        Ok(Self(format!("{}field", U256::from_be_slice(packed))))
    }

    /// The zero field, used for placeholder program inputs.
    #[must_use]
    pub fn zero() -> Self {
        Self("0field".to_string())
    }

    /// True when `text` is already a `<digits>field` literal.
    #[must_use]
    pub fn is_literal(text: &str) -> bool {
        text.strip_suffix("field")
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Decode a literal back to text, if it holds valid UTF-8.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        let digits = self.0.strip_suffix("field")?;
        let value = U256::from_str_radix(digits, 10).ok()?;
        let bytes = value.to_be_bytes::<32>();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        String::from_utf8(bytes[start..].to_vec()).ok()
    }

    /// The literal as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Format an unsigned program input (`<n>u64`).
#[must_use]
pub fn u64_literal(value: u64) -> String {
    format!("{value}u64")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_literal_is_kept() {
        let f = FieldLiteral::from_text("123456field").unwrap();
        assert_eq!(f.as_str(), "123456field");
    }

    #[test]
    fn single_byte_encodes_to_its_code_point() {
        assert_eq!(FieldLiteral::from_text("A").unwrap().as_str(), "65field");
    }

    #[test]
    fn bytes_are_read_big_endian() {
        // "hi" = 0x6869
        assert_eq!(
            FieldLiteral::from_text("hi").unwrap().as_str(),
            format!("{}field", 0x6869)
        );
    }

    #[test]
    fn long_text_is_truncated_to_31_bytes() {
        let long = "x".repeat(40);
        let truncated = "x".repeat(MAX_FIELD_BYTES);
        assert_eq!(
            FieldLiteral::from_text(&long).unwrap(),
            FieldLiteral::from_text(&truncated).unwrap()
        );
    }

    #[test]
    fn text_round_trips() {
        let f = FieldLiteral::from_text("ETH staking > 28%").unwrap();
        assert_eq!(f.to_text().as_deref(), Some("ETH staking > 28%"));
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(FieldLiteral::from_text(""), Err(DomainError::EmptyField));
    }

    #[test]
    fn literal_detection_requires_digits() {
        assert!(FieldLiteral::is_literal("0field"));
        assert!(!FieldLiteral::is_literal("field"));
        assert!(!FieldLiteral::is_literal("12afield"));
        assert!(!FieldLiteral::is_literal("12"));
    }

    #[test]
    fn u64_literal_has_suffix() {
        assert_eq!(u64_literal(2), "2u64");
    }
}
