//! The authoritative listing ledger and its event log.

pub mod events;
pub mod ledger;
