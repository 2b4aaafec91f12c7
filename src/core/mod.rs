//! Foundational types: accounts, asset identifiers, listings, fees.

pub mod account;
pub mod asset;
pub mod fees;
pub mod listing;
