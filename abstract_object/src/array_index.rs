//! Pluggable array-index naming policy.
//!
//! The property namespace is split into array-index names and everything
//! else; which names count as array indices is host-language-specific, so
//! callers select a policy as a zero-sized type parameter rather than
//! threading a predicate closure through every [`crate::object::AbstractObject`]
//! method.

/// Deterministic, pure classifier of property names.
pub trait PropertyNamePolicy {
    fn is_array_index(name: &str) -> bool;
}

/// ECMA-262 array-index rule: the canonical decimal representation (no
/// leading zeros other than `"0"` itself) of an integer in `0..=2^32-2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsArrayIndex;

impl PropertyNamePolicy for JsArrayIndex {
    fn is_array_index(name: &str) -> bool {
        if name == "0" {
            return true;
        }
        if name.is_empty() || name.starts_with('0') {
            return false;
        }
        if !name.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        match name.parse::<u64>() {
            Ok(n) => n <= u64::from(u32::MAX) - 1,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_an_index() {
        assert!(JsArrayIndex::is_array_index("0"));
    }

    #[test]
    fn leading_zero_is_not_an_index() {
        assert!(!JsArrayIndex::is_array_index("01"));
    }

    #[test]
    fn ordinary_decimal_is_an_index() {
        assert!(JsArrayIndex::is_array_index("42"));
    }

    #[test]
    fn non_digit_is_not_an_index() {
        assert!(!JsArrayIndex::is_array_index("length"));
        assert!(!JsArrayIndex::is_array_index("-1"));
        assert!(!JsArrayIndex::is_array_index(""));
    }

    #[test]
    fn max_index_boundary() {
        assert!(JsArrayIndex::is_array_index("4294967294"));
        assert!(!JsArrayIndex::is_array_index("4294967295"));
    }
}
