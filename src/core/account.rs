use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an account participating in the marketplace.
///
/// An account can represent a seller, a buyer, an approver operating on
/// behalf of the platform, the fee collector, or the engine's own
/// custody account.
///
/// # Examples
///
/// ```
/// use escrow_engine::core::account::AccountId;
///
/// let alice = AccountId::new("alice");
/// let bob = AccountId::new("bob");
/// assert_ne!(alice, bob);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The reserved zero identifier, never a valid counterparty.
    pub fn zero() -> Self {
        Self(String::new())
    }

    /// Whether this is the zero identifier. Operations that take an
    /// account as a payout destination or role holder reject it.
    pub fn is_zero(&self) -> bool {
        self.0.is_empty() || self.0.chars().all(|c| c == '0')
    }

    /// Returns the string representation of this account ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
