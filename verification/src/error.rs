use thiserror::Error;

use tradepost_store::StoreError;
use tradepost_types::Handle;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("identity {0} not found")]
    IdentityNotFound(Handle),

    #[error("verifier reference must not be empty")]
    EmptyVerifier,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl VerificationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            VerificationError::IdentityNotFound(_) => "IdentityNotFound",
            VerificationError::EmptyVerifier => "InvalidVerifier",
            VerificationError::Store(_) => "Internal",
        }
    }

    /// Map a store lookup miss for `handle` to `IdentityNotFound`.
    pub(crate) fn lookup(handle: &Handle, e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => VerificationError::IdentityNotFound(handle.clone()),
            other => VerificationError::Store(other),
        }
    }
}
