//! EIP-191 hashing and secp256k1 signature recovery.
//!
//! Recovery is isolated behind pure functions with no shared state so the
//! arithmetic can be tested directly against known key/address pairs.

use k256::FieldBytes;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

/// Prefix applied to personal messages before hashing (EIP-191).
pub const EIP191_PREFIX: &str = "\x19Ethereum Signed Message:\n";

#[derive(Debug, thiserror::Error)]
pub enum RecoverError {
    #[error("signature must be 65 bytes, got {0}")]
    BadLength(usize),
    #[error("recovery byte out of range")]
    BadRecoveryByte,
    #[error("invalid signature scalars")]
    BadScalars,
    #[error("point recovery failed")]
    RecoveryFailed,
}

/// Keccak-256 over the EIP-191 envelope:
/// `"\x19Ethereum Signed Message:\n" + len(message) + message`.
pub fn eip191_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(EIP191_PREFIX.as_bytes());
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Recover the uncompressed public key (64 raw bytes, no format byte)
/// from a message hash, the r/s scalars, and a recovery id of 0 or 1.
pub fn recover_public_key(
    message_hash: &[u8; 32],
    r: &[u8; 32],
    s: &[u8; 32],
    recovery_id: u8,
) -> Result<[u8; 64], RecoverError> {
    if recovery_id > 1 {
        return Err(RecoverError::BadRecoveryByte);
    }
    let recovery_id = RecoveryId::from_byte(recovery_id).ok_or(RecoverError::BadRecoveryByte)?;
    let signature = Signature::from_scalars(FieldBytes::from(*r), FieldBytes::from(*s))
        .map_err(|_| RecoverError::BadScalars)?;
    let key = VerifyingKey::recover_from_prehash(message_hash, &signature, recovery_id)
        .map_err(|_| RecoverError::RecoveryFailed)?;

    // Encoded point is 0x04 || x || y; the address hash covers only x || y.
    let point = key.to_encoded_point(false);
    let mut raw = [0u8; 64];
    raw.copy_from_slice(&point.as_bytes()[1..]);
    Ok(raw)
}

/// Derive the `0x`-hex address: last 20 bytes of Keccak-256 over the
/// 64 raw public-key bytes.
pub fn address_from_public_key(raw_key: &[u8; 64]) -> String {
    let digest = Keccak256::digest(raw_key);
    format!("0x{}", hex::encode(&digest[12..]))
}

/// Recover the signer address from a 65-byte signature (r ‖ s ‖ v) over
/// the EIP-191 hash of `message`. v − 27 must be 0 or 1.
pub fn recover_address(message: &str, signature: &[u8]) -> Result<String, RecoverError> {
    if signature.len() != 65 {
        return Err(RecoverError::BadLength(signature.len()));
    }
    let recovery_id = signature[64]
        .checked_sub(27)
        .ok_or(RecoverError::BadRecoveryByte)?;

    let mut r = [0u8; 32];
    r.copy_from_slice(&signature[..32]);
    let mut s = [0u8; 32];
    s.copy_from_slice(&signature[32..64]);

    let hash = eip191_hash(message);
    let raw_key = recover_public_key(&hash, &r, &s, recovery_id)?;
    Ok(address_from_public_key(&raw_key))
}

/// Check a hex-encoded signature against a claimed address,
/// case-insensitively. Malformed input is reported as `false`, never as a
/// panic or error — this function sits on the unauthenticated path.
pub fn verify_message_signature(address: &str, message: &str, signature_hex: &str) -> bool {
    let signature = match hex::decode(signature_hex.trim_start_matches("0x")) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };
    match recover_address(message, &signature) {
        Ok(derived) => derived.eq_ignore_ascii_case(address),
        Err(_) => false,
    }
}
