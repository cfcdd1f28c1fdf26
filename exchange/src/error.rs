use thiserror::Error;

use tradepost_store::StoreError;
use tradepost_types::{Handle, Timestamp, TypesError};

use crate::codec::DecodeError;

/// Coarse classification of protocol failures.
///
/// Transports map categories to their own status vocabulary; the protocol
/// never retries any of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input or missing/out-of-range coordinates.
    Validation,
    Expired,
    Signature,
    /// The nonce is absent: never issued, already redeemed or swept.
    Replay,
    /// The request contradicts current state (self-trade, stale offer).
    Conflict,
    Proximity,
    NotFound,
    /// Storage or transaction failure.
    Internal,
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("token payload could not be decoded: {0}")]
    InvalidPayload(#[from] DecodeError),

    #[error("token expired at {expiry}")]
    Expired { expiry: Timestamp },

    #[error("token signature does not match its payload")]
    InvalidSignature,

    #[error("an identity cannot trade with itself")]
    SelfTrade,

    #[error("token was never issued or has already been redeemed")]
    ReplayOrInvalid,

    #[error("initiator no longer holds the offered asset")]
    StaleOffer,

    #[error("a location is required")]
    LocationRequired,

    #[error("invalid location: lat={lat}, lon={lon}")]
    InvalidLocation { lat: f64, lon: f64 },

    #[error("participants are {distance_m:.1} m apart, limit is {threshold_m:.1} m")]
    OutOfRange { distance_m: f64, threshold_m: f64 },

    #[error("identity {0} holds no asset")]
    NoAsset(Handle),

    #[error("identity {0} not found")]
    IdentityNotFound(Handle),

    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ExchangeError {
    /// Stable machine-readable code, used on the wire and as a metric label.
    pub fn code(&self) -> &'static str {
        match self {
            ExchangeError::InvalidPayload(_) => "InvalidPayload",
            ExchangeError::Expired { .. } => "Expired",
            ExchangeError::InvalidSignature => "InvalidSignature",
            ExchangeError::SelfTrade => "SelfTrade",
            ExchangeError::ReplayOrInvalid => "ReplayOrInvalid",
            ExchangeError::StaleOffer => "StaleOffer",
            ExchangeError::LocationRequired => "LocationRequired",
            ExchangeError::InvalidLocation { .. } => "InvalidLocation",
            ExchangeError::OutOfRange { .. } => "OutOfRange",
            ExchangeError::NoAsset(_) => "NoAsset",
            ExchangeError::IdentityNotFound(_) => "IdentityNotFound",
            ExchangeError::InvalidHandle(_) => "InvalidHandle",
            ExchangeError::Store(_) => "Internal",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ExchangeError::InvalidPayload(_)
            | ExchangeError::LocationRequired
            | ExchangeError::InvalidLocation { .. }
            | ExchangeError::InvalidHandle(_) => ErrorCategory::Validation,
            ExchangeError::Expired { .. } => ErrorCategory::Expired,
            ExchangeError::InvalidSignature => ErrorCategory::Signature,
            ExchangeError::ReplayOrInvalid => ErrorCategory::Replay,
            ExchangeError::SelfTrade | ExchangeError::StaleOffer | ExchangeError::NoAsset(_) => {
                ErrorCategory::Conflict
            }
            ExchangeError::OutOfRange { .. } => ErrorCategory::Proximity,
            ExchangeError::IdentityNotFound(_) => ErrorCategory::NotFound,
            ExchangeError::Store(_) => ErrorCategory::Internal,
        }
    }

    /// Measured distance, for proximity failures.
    pub fn distance_m(&self) -> Option<f64> {
        match self {
            ExchangeError::OutOfRange { distance_m, .. } => Some(*distance_m),
            _ => None,
        }
    }
}

impl From<TypesError> for ExchangeError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::InvalidHandle(h) => ExchangeError::InvalidHandle(h),
            TypesError::InvalidLocation { lat, lon } => ExchangeError::InvalidLocation { lat, lon },
            TypesError::InvalidNonce(n) => ExchangeError::InvalidPayload(DecodeError::Json(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExchangeError::ReplayOrInvalid.code(), "ReplayOrInvalid");
        assert_eq!(
            ExchangeError::Store(StoreError::Backend("x".into())).code(),
            "Internal"
        );
        assert_eq!(
            ExchangeError::InvalidPayload(DecodeError::Empty).code(),
            "InvalidPayload"
        );
    }

    #[test]
    fn categories_follow_taxonomy() {
        assert_eq!(ExchangeError::SelfTrade.category(), ErrorCategory::Conflict);
        assert_eq!(ExchangeError::StaleOffer.category(), ErrorCategory::Conflict);
        assert_eq!(ExchangeError::LocationRequired.category(), ErrorCategory::Validation);
        assert_eq!(ExchangeError::InvalidSignature.category(), ErrorCategory::Signature);
        assert_eq!(
            ExchangeError::OutOfRange { distance_m: 101.0, threshold_m: 100.0 }.category(),
            ErrorCategory::Proximity
        );
    }

    #[test]
    fn out_of_range_carries_distance() {
        let err = ExchangeError::OutOfRange { distance_m: 150.5, threshold_m: 100.0 };
        assert_eq!(err.distance_m(), Some(150.5));
        assert_eq!(ExchangeError::SelfTrade.distance_m(), None);
    }

    #[test]
    fn invalid_location_maps_to_validation() {
        let err: ExchangeError = TypesError::InvalidLocation { lat: 91.0, lon: 0.0 }.into();
        assert_eq!(err.code(), "InvalidLocation");
    }
}
