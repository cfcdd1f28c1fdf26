//! The exchange token: an offer by the initiator to swap their current
//! asset with whoever redeems it first, nearby, before it expires.

use serde::{Deserialize, Serialize};

use tradepost_crypto::TokenSigner;
use tradepost_types::{AssetIndex, Handle, Nonce, Timestamp};

/// Domain tag prefixed to every signed payload.
const SIGNING_DOMAIN: &[u8] = b"tradepost/token/v1\0";

/// The signed part of a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub initiator: Handle,
    pub asset_index: AssetIndex,
    pub nonce: Nonce,
    pub expiry: Timestamp,
}

impl TokenPayload {
    /// Fixed binary encoding the signature covers.
    ///
    /// `domain ++ len(initiator) ++ initiator ++ asset_be ++ nonce ++ expiry_be`.
    /// Independent of the JSON transport, so re-encoding a token never
    /// changes what was signed.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let initiator = self.initiator.as_str().as_bytes();
        let mut out =
            Vec::with_capacity(SIGNING_DOMAIN.len() + 1 + initiator.len() + 4 + Nonce::LEN + 8);
        out.extend_from_slice(SIGNING_DOMAIN);
        // Handles are at most 64 bytes.
        out.push(initiator.len() as u8);
        out.extend_from_slice(initiator);
        out.extend_from_slice(&self.asset_index.to_be_bytes());
        out.extend_from_slice(self.nonce.as_bytes());
        out.extend_from_slice(&self.expiry.to_be_bytes());
        out
    }

    pub fn sign(self, signer: &TokenSigner) -> ExchangeToken {
        let signature = signer.sign(&self.canonical_bytes()).to_hex();
        ExchangeToken {
            payload: self,
            signature,
        }
    }
}

/// A payload plus its detached signature.
///
/// The signature stays a string after decoding: a token whose signature
/// is not even valid hex is a signature failure, not a malformed token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeToken {
    pub payload: TokenPayload,
    pub signature: String,
}

impl ExchangeToken {
    /// Recompute the MAC over the payload and compare in constant time.
    pub fn verify(&self, signer: &TokenSigner) -> bool {
        signer.verify_hex(&self.payload.canonical_bytes(), &self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradepost_crypto::SigningKey;

    fn signer(byte: u8) -> TokenSigner {
        TokenSigner::new(SigningKey::from_bytes(&[byte; 32]).unwrap())
    }

    fn payload() -> TokenPayload {
        TokenPayload {
            initiator: Handle::parse("alice").unwrap(),
            asset_index: AssetIndex::new(10),
            nonce: Nonce::new([5; Nonce::LEN]),
            expiry: Timestamp::from_millis(60_000),
        }
    }

    #[test]
    fn signed_token_verifies_with_same_key_only() {
        let token = payload().sign(&signer(1));
        assert!(token.verify(&signer(1)));
        assert!(!token.verify(&signer(2)));
    }

    #[test]
    fn any_payload_change_breaks_signature() {
        let token = payload().sign(&signer(1));

        let mut t = token.clone();
        t.payload.asset_index = AssetIndex::new(11);
        assert!(!t.verify(&signer(1)));

        let mut t = token.clone();
        t.payload.expiry = t.payload.expiry.plus_millis(1);
        assert!(!t.verify(&signer(1)));

        let mut t = token;
        t.payload.initiator = Handle::parse("mallory").unwrap();
        assert!(!t.verify(&signer(1)));
    }

    #[test]
    fn canonical_bytes_are_length_prefixed() {
        // "ab" + asset 1 must not collide with "a" + something starting with 'b'.
        let mut a = payload();
        a.initiator = Handle::parse("ab").unwrap();
        let mut b = payload();
        b.initiator = Handle::parse("a").unwrap();
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }
}
