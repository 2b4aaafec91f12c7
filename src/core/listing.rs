use crate::core::account::AccountId;
use crate::core::asset::{AssetId, ContractId, TokenCode};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense, monotonically assigned listing identifier. Never reused.
pub type ListingId = u64;

/// Lifecycle state of a listing.
///
/// `Active` transitions to exactly one of the two terminal states:
///
/// ```text
/// Active --cancel(seller)----> Cancelled
/// Active --settle(approver)--> Settled
/// ```
///
/// No transition exists out of `Cancelled` or `Settled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingState {
    Active,
    Cancelled,
    Settled,
}

impl fmt::Display for ListingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingState::Active => write!(f, "active"),
            ListingState::Cancelled => write!(f, "cancelled"),
            ListingState::Settled => write!(f, "settled"),
        }
    }
}

/// A seller's offer to exchange a specific quantity of an asset, held in
/// engine custody, for a fixed total price in a chosen payment medium.
///
/// Listings are created and owned exclusively by the ledger; while a
/// listing is `Active` the engine, not the seller, holds custody of
/// `quantity` units of the asset. The seller is immutable after
/// creation and the buyer is recorded exactly once, at settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    id: ListingId,
    contract: ContractId,
    asset_id: AssetId,
    /// Positive; always 1 for unique assets.
    quantity: u64,
    /// Price per unit, denominated in `payment_token`. Must be positive.
    unit_price: Decimal,
    seller: AccountId,
    buyer: Option<AccountId>,
    payment_token: TokenCode,
    state: ListingState,
    created_at: DateTime<Utc>,
}

impl Listing {
    pub(crate) fn new(
        id: ListingId,
        contract: ContractId,
        asset_id: AssetId,
        quantity: u64,
        unit_price: Decimal,
        seller: AccountId,
        payment_token: TokenCode,
    ) -> Self {
        debug_assert!(quantity > 0);
        debug_assert!(unit_price > Decimal::ZERO);
        Self {
            id,
            contract,
            asset_id,
            quantity,
            unit_price,
            seller,
            buyer: None,
            payment_token,
            state: ListingState::Active,
            created_at: Utc::now(),
        }
    }

    /// Flip an active listing to `Cancelled`.
    pub(crate) fn mark_cancelled(&mut self) {
        debug_assert_eq!(self.state, ListingState::Active);
        self.state = ListingState::Cancelled;
    }

    /// Flip an active listing to `Settled`, recording the buyer.
    pub(crate) fn mark_settled(&mut self, buyer: AccountId) {
        debug_assert_eq!(self.state, ListingState::Active);
        debug_assert!(self.buyer.is_none());
        self.buyer = Some(buyer);
        self.state = ListingState::Settled;
    }

    // --- Accessors ---

    pub fn id(&self) -> ListingId {
        self.id
    }

    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn seller(&self) -> &AccountId {
        &self.seller
    }

    pub fn buyer(&self) -> Option<&AccountId> {
        self.buyer.as_ref()
    }

    pub fn payment_token(&self) -> &TokenCode {
        &self.payment_token
    }

    pub fn state(&self) -> ListingState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ListingState::Active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Total amount the buyer owes: `unit_price * quantity`.
    pub fn total_due(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_listing() -> Listing {
        Listing::new(
            0,
            ContractId::new("tickets"),
            7,
            5,
            dec!(10),
            AccountId::new("alice"),
            TokenCode::native(),
        )
    }

    #[test]
    fn test_new_listing_is_active() {
        let listing = sample_listing();
        assert_eq!(listing.state(), ListingState::Active);
        assert!(listing.buyer().is_none());
        assert_eq!(listing.total_due(), dec!(50));
    }

    #[test]
    fn test_settle_records_buyer() {
        let mut listing = sample_listing();
        listing.mark_settled(AccountId::new("bob"));
        assert_eq!(listing.state(), ListingState::Settled);
        assert_eq!(listing.buyer().unwrap().as_str(), "bob");
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut listing = sample_listing();
        listing.mark_cancelled();
        assert_eq!(listing.state(), ListingState::Cancelled);
        assert!(!listing.is_active());
    }
}
