//! Custody seams the engine calls out to: asset custodian, payment
//! vault, role registry.

pub mod custodian;
pub mod roles;
pub mod vault;
