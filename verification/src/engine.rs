//! The one-way verify transition.

use std::sync::Arc;

use tradepost_exchange::{publish_best_effort, ExchangeEvent, NotificationSink};
use tradepost_store::{ExchangeStore, Identity};
use tradepost_types::{Clock, Handle};

use crate::error::VerificationError;

#[derive(Clone, Debug, PartialEq)]
pub struct VerificationOutcome {
    pub identity: Identity,
    /// `false` when the identity was already verified and nothing changed.
    pub newly_verified: bool,
}

pub struct VerificationEngine {
    store: Arc<dyn ExchangeStore>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn NotificationSink>,
}

impl VerificationEngine {
    pub fn new(
        store: Arc<dyn ExchangeStore>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self { store, clock, sink }
    }

    /// Mark `handle` as verified by `verifier`.
    ///
    /// Idempotent: verifying a verified identity keeps the original
    /// timestamp and verifier. Never touches the trade ledger.
    pub fn verify(
        &self,
        handle: &Handle,
        verifier: &str,
    ) -> Result<VerificationOutcome, VerificationError> {
        let verifier = verifier.trim();
        if verifier.is_empty() {
            return Err(VerificationError::EmptyVerifier);
        }

        let mut txn = self.store.write_txn()?;
        let mut identity = txn
            .get_identity(handle)?
            .ok_or_else(|| VerificationError::IdentityNotFound(handle.clone()))?;

        if identity.verified {
            return Ok(VerificationOutcome {
                identity,
                newly_verified: false,
            });
        }

        let now = self.clock.now();
        identity.verified = true;
        identity.verified_at = Some(now);
        identity.verified_by = Some(verifier.to_string());
        txn.put_identity(&identity)?;
        txn.commit()?;

        tracing::info!(handle = %handle, verifier, "identity verified");
        publish_best_effort(
            self.sink.as_ref(),
            &ExchangeEvent::IdentityVerified {
                handle: handle.clone(),
                verified_by: verifier.to_string(),
                verified_at: now,
            },
        );

        Ok(VerificationOutcome {
            identity,
            newly_verified: true,
        })
    }
}
