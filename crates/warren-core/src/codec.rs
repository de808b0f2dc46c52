//! Positional base-64 codec used for generated short codes.
//!
//! This is not RFC 4648 base64: integers are written most significant digit
//! first with no padding and no leading zero digits, so `0` encodes to the
//! empty string, `1` to `"B"` and `64` to `"BA"`. The code grows by one
//! symbol each time the value crosses a power of 64.

use crate::error::{CoreError, Result};

/// The 64 url-safe symbols, in digit order.
pub const ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

const BASE: u64 = ALPHABET.len() as u64;

/// Returns `true` if `c` is one of the 64 symbols of [`ALPHABET`].
pub fn is_symbol(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Encodes `value` as a short code.
pub fn encode(mut value: u64) -> String {
    // 11 symbols cover u64::MAX
    let mut digits = Vec::with_capacity(11);
    while value > 0 {
        digits.push(ALPHABET[(value % BASE) as usize]);
        value /= BASE;
    }
    digits.reverse();
    // every byte comes from the ASCII alphabet
    digits.into_iter().map(char::from).collect()
}

/// Decodes a short code back into the integer it encodes.
///
/// Leading `A` symbols are zero digits and are accepted, so `decode` is the
/// inverse of [`encode`] but not injective over all strings.
pub fn decode(code: &str) -> Result<u64> {
    code.chars().try_fold(0u64, |acc, c| {
        let digit = digit_of(c).ok_or_else(|| {
            CoreError::InvalidShortCode(format!("'{c}' is not a base-64 symbol in '{code}'"))
        })?;
        acc.checked_mul(BASE)
            .and_then(|shifted| shifted.checked_add(digit))
            .ok_or_else(|| CoreError::Overflow(code.to_string()))
    })
}

fn digit_of(c: char) -> Option<u64> {
    let digit = match c {
        'A'..='Z' => c as u64 - 'A' as u64,
        'a'..='z' => c as u64 - 'a' as u64 + 26,
        '0'..='9' => c as u64 - '0' as u64 + 52,
        '-' => 62,
        '_' => 63,
        _ => return None,
    };
    Some(digit)
}
