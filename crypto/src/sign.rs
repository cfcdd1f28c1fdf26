//! HMAC-SHA256 message signing and verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::SigningKey;

type HmacSha256 = Hmac<Sha256>;

/// A 32-byte HMAC-SHA256 tag.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 32]);

impl Signature {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0[..4]))
    }
}

fn mac_for(key: &SigningKey) -> HmacSha256 {
    // HMAC accepts keys of any length, so this cannot fail.
    <HmacSha256 as Mac>::new_from_slice(key.as_bytes()).expect("HMAC accepts any key length")
}

/// Compute the MAC of `message` under `key`.
pub fn sign_message(message: &[u8], key: &SigningKey) -> Signature {
    let mut mac = mac_for(key);
    mac.update(message);
    let tag = mac.finalize().into_bytes();
    let mut output = [0u8; 32];
    output.copy_from_slice(&tag);
    Signature(output)
}

/// Recompute the MAC of `message` and compare it to `signature`.
///
/// The comparison runs in constant time with respect to the tag contents,
/// so a caller cannot learn how many leading bytes matched. A tag of the
/// wrong length is rejected.
pub fn verify_signature(message: &[u8], signature: &[u8], key: &SigningKey) -> bool {
    let mut mac = mac_for(key);
    mac.update(message);
    mac.verify_slice(signature).is_ok()
}

/// Signs and verifies token payloads with a fixed key.
#[derive(Debug)]
pub struct TokenSigner {
    key: SigningKey,
}

impl TokenSigner {
    pub fn new(key: SigningKey) -> Self {
        Self { key }
    }

    pub fn sign(&self, payload: &[u8]) -> Signature {
        sign_message(payload, &self.key)
    }

    pub fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        verify_signature(payload, signature, &self.key)
    }

    /// Verify a hex-encoded tag as carried in a token.
    ///
    /// Only the canonical lower-case encoding of a full tag is accepted.
    /// Malformed hex is a failed verification, not a separate error.
    pub fn verify_hex(&self, payload: &[u8], signature_hex: &str) -> bool {
        if !is_canonical_hex(signature_hex) {
            return false;
        }
        match hex::decode(signature_hex) {
            Ok(bytes) => self.verify(payload, &bytes),
            Err(_) => false,
        }
    }
}

fn is_canonical_hex(s: &str) -> bool {
    s.len() == 2 * std::mem::size_of::<Signature>()
        && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> SigningKey {
        SigningKey::from_bytes(&[byte; 32]).unwrap()
    }

    #[test]
    fn sign_and_verify() {
        let k = key(7);
        let msg = b"test message for tradepost";
        let sig = sign_message(msg, &k);
        assert!(verify_signature(msg, &sig.0, &k));
    }

    #[test]
    fn wrong_message_fails() {
        let k = key(7);
        let sig = sign_message(b"correct message", &k);
        assert!(!verify_signature(b"wrong message", &sig.0, &k));
    }

    #[test]
    fn wrong_key_fails() {
        let sig = sign_message(b"test", &key(1));
        assert!(!verify_signature(b"test", &sig.0, &key(2)));
    }

    #[test]
    fn signature_deterministic() {
        let k = key(99);
        assert_eq!(sign_message(b"same", &k), sign_message(b"same", &k));
    }

    #[test]
    fn truncated_signature_fails() {
        let k = key(3);
        let sig = sign_message(b"payload", &k);
        assert!(!verify_signature(b"payload", &sig.0[..31], &k));
        assert!(!verify_signature(b"payload", &[], &k));
    }

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2.
        let k = SigningKey::from_bytes(b"Jefe").err();
        assert!(k.is_some(), "short keys are refused even if HMAC allows them");

        let mut mac = <HmacSha256 as Mac>::new_from_slice(b"Jefe").unwrap();
        mac.update(b"what do ya want for nothing?");
        let tag = mac.finalize().into_bytes();
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn hex_verification() {
        let signer = TokenSigner::new(key(5));
        let sig = signer.sign(b"payload");
        assert!(signer.verify_hex(b"payload", &sig.to_hex()));
        assert!(!signer.verify_hex(b"payload", "zz"));

        let mut flipped = sig.to_hex().into_bytes();
        flipped[0] = if flipped[0] == b'0' { b'1' } else { b'0' };
        let flipped = String::from_utf8(flipped).unwrap();
        assert!(!signer.verify_hex(b"payload", &flipped));
    }

    #[test]
    fn verify_hex_rejects_non_canonical_encodings() {
        let signer = TokenSigner::new(key(9));
        let hex = signer.sign(b"payload").to_hex();

        assert!(!signer.verify_hex(b"payload", &hex.to_uppercase()));
        assert!(!signer.verify_hex(b"payload", &format!("{hex}00")));
        assert!(!signer.verify_hex(b"payload", &hex[..62]));
        assert!(!signer.verify_hex(b"payload", &format!(" {}", &hex[1..])));
    }
}
