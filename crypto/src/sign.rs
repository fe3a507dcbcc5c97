//! Ed25519 message signing and verification.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

/// Sign a message with a 32-byte private key seed, returning the 64-byte signature.
pub fn sign_message(message: &[u8], private_key: &[u8; 32]) -> [u8; 64] {
    let signing_key = SigningKey::from_bytes(private_key);
    signing_key.sign(message).to_bytes()
}

/// Verify a signature against a message and a 32-byte public key.
///
/// Returns `true` if the signature is valid, `false` otherwise.
/// Also rejects non-canonical signatures (malleability protection).
pub fn verify_signature(message: &[u8], signature: &[u8; 64], public_key: &[u8; 32]) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature);
    verifying_key.verify(message, &sig).is_ok()
}

/// Derive the public key for a 32-byte private key seed.
pub fn public_key(private_key: &[u8; 32]) -> [u8; 32] {
    SigningKey::from_bytes(private_key)
        .verifying_key()
        .to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify() {
        let sk = [7u8; 32];
        let pk = public_key(&sk);
        let msg = b"governance vote payload";
        let sig = sign_message(msg, &sk);
        assert!(verify_signature(msg, &sig, &pk));
    }

    #[test]
    fn wrong_message_fails() {
        let sk = [7u8; 32];
        let pk = public_key(&sk);
        let sig = sign_message(b"correct message", &sk);
        assert!(!verify_signature(b"wrong message", &sig, &pk));
    }

    #[test]
    fn wrong_key_fails() {
        let sig = sign_message(b"test", &[1u8; 32]);
        let other_pk = public_key(&[2u8; 32]);
        assert!(!verify_signature(b"test", &sig, &other_pk));
    }

    #[test]
    fn invalid_public_key_fails() {
        let sig = sign_message(b"test", &[1u8; 32]);
        assert!(!verify_signature(b"test", &sig, &[0xFF; 32]));
    }
}
