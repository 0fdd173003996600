//! Cryptographic Utilities

use base64::{Engine, engine::general_purpose};
use rand::{Rng, RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Numeric one-time code of `digits` length, leading zeros kept
pub fn random_numeric_code(digits: u32) -> String {
    let upper = 10u64.pow(digits);
    let value = OsRng.gen_range(0..upper);
    format!("{:0width$}", value, width = digits as usize)
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 as lowercase hex, used for storing bearer secrets
pub fn sha256_hex(data: &[u8]) -> String {
    to_hex(&sha256(data))
}

/// Encode bytes as lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Encode bytes as base64
pub fn to_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode base64 to bytes
pub fn from_base64(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(s)
}

/// Constant-time comparison to prevent timing attacks
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
