//! # escrow-engine
//!
//! Custodial marketplace escrow and settlement engine for unique and
//! semi-fungible assets.
//!
//! Sellers list an asset which the engine takes into escrow, an
//! authorized approver finalizes a sale by moving the asset to a buyer
//! and splitting the payment between seller and fee collector, and
//! sellers may reclaim an unsold asset. Every listing transitions from
//! `Active` to exactly one of `Cancelled` or `Settled`, and every
//! failed operation leaves the ledger untouched.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: accounts, assets, listings, fees
//! - **custody** — Asset custodian, payment vault, role registry
//! - **engine** — The authoritative listing ledger and event log
//! - **sim** — Random scenario generation and script execution

pub mod core;
pub mod custody;
pub mod engine;
pub mod error;
pub mod sim;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::account::AccountId;
    pub use crate::core::asset::{AssetId, AssetKind, ContractId, TokenCode};
    pub use crate::core::fees::{compute_split, FeeConfig};
    pub use crate::core::listing::{Listing, ListingId, ListingState};
    pub use crate::custody::custodian::{AssetCustodian, InMemoryCustodian};
    pub use crate::custody::roles::{Role, RoleRegistry};
    pub use crate::engine::events::{EventLog, EventRecord, MarketEvent};
    pub use crate::engine::ledger::{ListingLedger, Settlement};
    pub use crate::error::MarketError;
}
