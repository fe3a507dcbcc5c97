//! Double-SHA256 hashing.

use sha2::{Digest, Sha256};

/// Compute SHA256(SHA256(data)).
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut output = [0u8; 32];
    output.copy_from_slice(&second);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha256d_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let first = hasher.finalize();
    let second = Sha256::digest(first);
    let mut output = [0u8; 32];
    output.copy_from_slice(&second);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256d_deterministic() {
        assert_eq!(sha256d(b"orin"), sha256d(b"orin"));
    }

    #[test]
    fn sha256d_different_inputs() {
        assert_ne!(sha256d(b"hello"), sha256d(b"world"));
    }

    #[test]
    fn multi_matches_concatenation() {
        let concat = sha256d(b"helloworld");
        let multi = sha256d_multi(&[b"hello", b"world"]);
        assert_eq!(concat, multi);
    }
}
