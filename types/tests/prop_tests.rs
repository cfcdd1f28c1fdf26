use proptest::prelude::*;

use tradepost_types::{AssetIndex, GeoPoint, Handle, Nonce, Timestamp};

proptest! {
    /// Nonce hex form parses back to the same bytes.
    #[test]
    fn nonce_hex_roundtrip(bytes in prop::array::uniform16(0u8..)) {
        let nonce = Nonce::new(bytes);
        let parsed = Nonce::from_hex(&nonce.to_hex()).unwrap();
        prop_assert_eq!(parsed.as_bytes(), &bytes);
    }

    /// Nonce survives bincode, which is how the LMDB backend stores it.
    #[test]
    fn nonce_bincode_roundtrip(bytes in prop::array::uniform16(0u8..)) {
        let nonce = Nonce::new(bytes);
        let encoded = bincode::serialize(&nonce).unwrap();
        let decoded: Nonce = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, nonce);
    }

    /// Timestamp ordering: from_millis(a) <= from_millis(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta.to_be_bytes() <= tb.to_be_bytes(), a <= b);
    }

    /// A deadline is passed only strictly after it.
    #[test]
    fn deadline_is_inclusive(deadline in 0u64..u64::MAX - 1) {
        let d = Timestamp::from_millis(deadline);
        prop_assert!(!d.is_passed(d));
        prop_assert!(d.is_passed(d.plus_millis(1)));
    }

    /// Asset index key bytes sort like the numbers they encode.
    #[test]
    fn asset_index_key_order(a in any::<u32>(), b in any::<u32>()) {
        let ka = AssetIndex::new(a).to_be_bytes();
        let kb = AssetIndex::new(b).to_be_bytes();
        prop_assert_eq!(ka.cmp(&kb), a.cmp(&b));
    }

    /// Any in-range coordinate pair is accepted.
    #[test]
    fn in_range_points_validate(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
        prop_assert!(GeoPoint::new(lat, lon).is_ok());
    }

    /// Handles built from the allowed alphabet always parse.
    #[test]
    fn allowed_alphabet_parses(raw in "[A-Za-z0-9_.-]{1,64}") {
        prop_assert!(Handle::parse(raw).is_ok());
    }
}
