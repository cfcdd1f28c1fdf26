//! Fundamental types for the Tradepost exchange protocol.
//!
//! This crate defines the primitives shared across every other crate in the
//! workspace: identity handles, asset indices, nonces, coordinates,
//! millisecond timestamps and the tunable exchange parameters.

pub mod asset;
pub mod error;
pub mod geo;
pub mod handle;
pub mod nonce;
pub mod params;
pub mod time;

pub use asset::AssetIndex;
pub use error::TypesError;
pub use geo::GeoPoint;
pub use handle::Handle;
pub use nonce::Nonce;
pub use params::ExchangeParams;
pub use time::{Clock, SystemClock, Timestamp};
