use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a specific unit or type within a collection.
///
/// For a unique collection each id names exactly one unit with exactly
/// one owner. For a fungible-by-id collection each id names a type of
/// which an account may hold any non-negative quantity.
pub type AssetId = u64;

/// Identifier of an asset collection (the contract holding the assets).
///
/// # Examples
///
/// ```
/// use escrow_engine::core::asset::ContractId;
///
/// let punks = ContractId::new("punks");
/// let tickets = ContractId::new("tickets");
/// assert_ne!(punks, tickets);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContractId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Identifier of a payment medium accepted by the engine.
///
/// The conventional code `NATIVE` denotes the platform's native
/// currency; any other code denotes a fungible payment token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenCode(String);

impl TokenCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The native-currency code.
    pub fn native() -> Self {
        Self::new("NATIVE")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Custody model of an asset collection.
///
/// The tag drives the behavior differences inside the engine: unique
/// listings are forced to quantity 1 and verified by ownership, while
/// fungible-by-id listings carry an arbitrary positive quantity and are
/// verified by balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Exactly one unit per id, owned by exactly one account.
    Unique,
    /// An account may hold any non-negative quantity of a given id.
    FungibleById,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Unique => write!(f, "unique"),
            AssetKind::FungibleById => write!(f, "fungible-by-id"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_equality() {
        assert_eq!(ContractId::new("punks"), ContractId::new("punks"));
        assert_ne!(ContractId::new("punks"), ContractId::new("tickets"));
    }

    #[test]
    fn test_native_token() {
        assert_eq!(TokenCode::native().as_str(), "NATIVE");
    }

    #[test]
    fn test_asset_kind_serde() {
        let json = serde_json::to_string(&AssetKind::FungibleById).unwrap();
        assert_eq!(json, "\"fungible_by_id\"");
        let kind: AssetKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, AssetKind::FungibleById);
    }
}
