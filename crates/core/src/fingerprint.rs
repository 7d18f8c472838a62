//! Prompt fingerprints for duplicate detection.
//!
//! Callers decide what counts as "the same prompt". This default ignores
//! case and whitespace differences; everything else is significant.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of the lowercased, whitespace-normalized prompt.
pub fn fingerprint(prompt: &str) -> String {
    let normalized = prompt
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    hex::encode(Sha256::digest(normalized.as_bytes()))
}
