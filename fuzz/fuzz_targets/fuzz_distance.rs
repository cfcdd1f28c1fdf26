#![no_main]

use libfuzzer_sys::fuzz_target;
use tradepost_exchange::distance_meters;
use tradepost_types::GeoPoint;

fuzz_target!(|coords: [f64; 4]| {
    let (Ok(a), Ok(b)) = (
        GeoPoint::new(coords[0], coords[1]),
        GeoPoint::new(coords[2], coords[3]),
    ) else {
        return;
    };
    let d = distance_meters(&a, &b);
    assert!(d.is_finite() && d >= 0.0);
    // Half the Earth's circumference, plus rounding slack.
    assert!(d <= 20_015_100.0);
});
