//! # Random Token Values
//!
//! Sources for `{UUID}` and `{RANDOM:n}`. Random characters use Crockford's
//! Base32 alphabet: 0-9, A-Z excluding I, L, O, U.
//!
//! Copyright (c) 2025 Dominic Rodemer. All rights reserved.
//! Licensed under the MIT License.

use rand::Rng;

/// Crockford's Base32 alphabet (excludes I, L, O, U for readability)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Returns `len` random alphanumeric characters.
pub fn alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            // 256 is a multiple of 32, so the modulo is unbiased
            let byte: u8 = rng.random();
            CROCKFORD_ALPHABET[usize::from(byte) % CROCKFORD_ALPHABET.len()] as char
        })
        .collect()
}

/// Returns a new random (v4) UUID in hyphenated lowercase form.
pub fn uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphanumeric_length() {
        assert_eq!(alphanumeric(0), "");
        assert_eq!(alphanumeric(1).len(), 1);
        assert_eq!(alphanumeric(12).len(), 12);
    }

    #[test]
    fn test_alphanumeric_charset() {
        let value = alphanumeric(256);
        assert!(value.bytes().all(|b| CROCKFORD_ALPHABET.contains(&b)));
        assert!(!value.contains(['I', 'L', 'O', 'U']));
    }

    #[test]
    fn test_alphanumeric_differs() {
        assert_ne!(alphanumeric(16), alphanumeric(16));
    }

    #[test]
    fn test_uuid_shape() {
        let id = uuid();
        assert_eq!(id.len(), 36);
        assert_eq!(id.matches('-').count(), 4);
        assert_ne!(id, uuid());
    }
}
