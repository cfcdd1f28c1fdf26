#![no_main]

use libfuzzer_sys::fuzz_target;
use tradepost_exchange::codec;

// Decoding untrusted token strings must never panic, and anything that
// decodes must survive a re-encode unchanged.
fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(token) = codec::decode(input) {
        let again = codec::decode(&codec::encode(&token)).expect("re-encoded token must decode");
        assert_eq!(again, token);
    }
});
