//! Drop-and-continue numeric parsing.
//!
//! Registration servers send 64-bit values as decimal strings, since many
//! JSON producers cannot represent the full unsigned range as numbers. Plain
//! JSON integers are accepted too, and a single leading `+` is allowed on
//! strings. Anything else (floats, exponents, a `-` on unsigned fields,
//! whitespace, out-of-range literals) yields `None` and the caller drops just
//! that key.
//!
//! Unsigned values are parsed directly into `u64` so the upper half of the
//! range never passes through a signed intermediate.
use serde_json::Value;

/// Parses an unsigned 64-bit field (`trigger_data`, `deduplication_key`,
/// `debug_key`).
///
/// ```rust
/// use serde_json::json;
/// use validate::parse_unsigned64;
///
/// assert_eq!(parse_unsigned64(&json!("18446744073709551615")), Some(u64::MAX));
/// assert_eq!(parse_unsigned64(&json!("18446744073709551616")), None);
/// assert_eq!(parse_unsigned64(&json!("-1")), None);
/// ```
pub fn parse_unsigned64(value: &Value) -> Option<u64> {
    match value {
        Value::String(text) => {
            let digits = text.strip_prefix('+').unwrap_or(text);
            if is_decimal_digits(digits) {
                digits.parse::<u64>().ok()
            } else {
                None
            }
        }
        Value::Number(number) => number.as_u64(),
        _ => None,
    }
}

/// Parses a signed 64-bit field (`priority`).
///
/// ```rust
/// use serde_json::json;
/// use validate::parse_signed64;
///
/// assert_eq!(parse_signed64(&json!("-9223372036854775808")), Some(i64::MIN));
/// assert_eq!(parse_signed64(&json!("18446744073709551615")), None);
/// ```
pub fn parse_signed64(value: &Value) -> Option<i64> {
    match value {
        Value::String(text) => {
            let digits = text
                .strip_prefix('-')
                .or_else(|| text.strip_prefix('+'))
                .unwrap_or(text);
            if is_decimal_digits(digits) {
                text.parse::<i64>().ok()
            } else {
                None
            }
        }
        Value::Number(number) => number.as_i64(),
        _ => None,
    }
}

fn is_decimal_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
