//! The Tradepost exchange protocol.
//!
//! An initiator asks the [`TokenIssuer`] for a signed, short-lived token
//! bound to their current asset and location. They hand it to a confirmer
//! standing nearby, who redeems it through the [`TradeExecutor`]. A valid
//! redemption swaps the two participants' assets and appends a ledger
//! entry, all inside one storage write transaction.
//!
//! Identities enter the game through the [`IdentityRegistry`], which hands
//! each newcomer a random asset that nobody currently owns.

pub mod catalog;
pub mod codec;
pub mod error;
pub mod events;
pub mod executor;
pub mod issuer;
pub mod proximity;
pub mod registry;
pub mod token;

pub use catalog::{AssetMetadata, CatalogResolver, StaticCatalog};
pub use codec::DecodeError;
pub use error::{ErrorCategory, ExchangeError};
pub use events::{publish_best_effort, ExchangeEvent, LogSink, NotificationSink, NotifyError};
pub use executor::{RedeemOutcome, TradeExecutor};
pub use issuer::{IssuedToken, TokenIssuer};
pub use proximity::{distance_meters, within_threshold};
pub use registry::{IdentityRegistry, Registration};
pub use token::{ExchangeToken, TokenPayload};
