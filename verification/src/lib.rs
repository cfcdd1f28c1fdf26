//! Verification and scoring.
//!
//! Verification is a one-way flag an authority sets on an identity. Scoring
//! reads it live: an identity's points are the number of distinct
//! counterparties in its ledger history that are verified *now*. Verifying
//! someone therefore changes the scores of everyone who ever traded with
//! them, without touching the ledger.
//!
//! Unverified identities always score 0 and never appear on the
//! leaderboard.

pub mod engine;
pub mod error;
pub mod scoring;

pub use engine::{VerificationEngine, VerificationOutcome};
pub use error::VerificationError;
pub use scoring::{Leaderboard, LeaderboardEntry, ScoringEngine};
