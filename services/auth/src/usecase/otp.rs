//! Unbiased random code and nonce generation.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;

// 250 = 25 × 10: bytes at or above it would skew the low digits.
const DIGIT_REJECT_AT: u8 = 250;

/// Generate `length` decimal digits. Single bytes ≥ 250 are discarded
/// before the mod-10 reduction so every digit is equally likely.
pub fn generate_otp(length: usize) -> String {
    let mut rng = rand::rng();
    let mut digits = String::with_capacity(length);
    while digits.len() < length {
        let byte: u8 = rng.random();
        if byte >= DIGIT_REJECT_AT {
            continue;
        }
        digits.push(char::from(b'0' + byte % 10));
    }
    digits
}

/// Generate a 32-byte random nonce, base64-encoded (url-safe, unpadded).
pub fn generate_nonce() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}
