//! Binary key layouts shared by the stores and the write transaction.

use tradepost_types::{Handle, Nonce, Timestamp};

/// Separator between a handle and a trade id in participant index keys.
/// Handles never contain NUL, so `"bob\0"` cannot prefix `"bobby\0"`.
const HANDLE_TERMINATOR: u8 = 0;

/// `expiry_be(8) ++ nonce(16)`: iteration order is expiry order.
pub(crate) fn expiry_key(expiry: Timestamp, nonce: &Nonce) -> [u8; 8 + Nonce::LEN] {
    let mut key = [0u8; 8 + Nonce::LEN];
    key[..8].copy_from_slice(&expiry.to_be_bytes());
    key[8..].copy_from_slice(nonce.as_bytes());
    key
}

/// Lowest possible expiry key at `at`; every key for an earlier expiry
/// sorts strictly below it.
pub(crate) fn expiry_floor(at: Timestamp) -> [u8; 8 + Nonce::LEN] {
    let mut key = [0u8; 8 + Nonce::LEN];
    key[..8].copy_from_slice(&at.to_be_bytes());
    key
}

pub(crate) fn handle_prefix(handle: &Handle) -> Vec<u8> {
    let h = handle.as_str().as_bytes();
    let mut key = Vec::with_capacity(h.len() + 9);
    key.extend_from_slice(h);
    key.push(HANDLE_TERMINATOR);
    key
}

/// `handle ++ 0x00 ++ trade_id_be(8)`.
pub(crate) fn participant_key(handle: &Handle, trade_id: u64) -> Vec<u8> {
    let mut key = handle_prefix(handle);
    key.extend_from_slice(&trade_id.to_be_bytes());
    key
}

/// Increment a byte-string prefix to produce an exclusive upper bound for
/// a range scan. Carries like big-endian addition.
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(last) = prefix.last_mut() {
        if *last < 0xFF {
            *last += 1;
            return;
        }
        prefix.pop();
    }
}

pub(crate) fn read_u64(bytes: &[u8]) -> Option<u64> {
    bytes.try_into().ok().map(u64::from_be_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_prefix_carries() {
        let mut p = vec![0x01, 0xFF];
        increment_prefix(&mut p);
        assert_eq!(p, vec![0x02]);

        let mut p = b"bob\0".to_vec();
        increment_prefix(&mut p);
        assert_eq!(p, b"bob\x01".to_vec());
    }

    #[test]
    fn participant_keys_do_not_collide_across_handles() {
        let bob = Handle::parse("bob").unwrap();
        let bobby = Handle::parse("bobby").unwrap();
        let bob_prefix = handle_prefix(&bob);
        assert!(!participant_key(&bobby, 1).starts_with(&bob_prefix));
        assert!(participant_key(&bob, 1).starts_with(&bob_prefix));
    }

    #[test]
    fn expiry_floor_sorts_below_same_instant() {
        let at = Timestamp::from_millis(1_000);
        let nonce = Nonce::new([0xAB; Nonce::LEN]);
        assert!(expiry_floor(at) <= expiry_key(at, &nonce));
        assert!(expiry_key(Timestamp::from_millis(999), &nonce) < expiry_floor(at));
    }
}
