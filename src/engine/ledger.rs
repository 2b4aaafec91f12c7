use crate::core::account::AccountId;
use crate::core::asset::{AssetId, AssetKind, ContractId, TokenCode};
use crate::core::fees::{compute_split, FeeConfig};
use crate::core::listing::{Listing, ListingId};
use crate::custody::custodian::AssetCustodian;
use crate::custody::roles::{Role, RoleRegistry};
use crate::custody::vault::PaymentVault;
use crate::engine::events::{EventLog, MarketEvent};
use crate::error::MarketError;
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Outcome of a successful settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub listing_id: ListingId,
    pub seller: AccountId,
    pub buyer: AccountId,
    pub total_due: Decimal,
    pub fee: Decimal,
    pub proceeds: Decimal,
}

/// The authoritative marketplace ledger.
///
/// Owns the listing map, the id counter, the allow-lists, the fee
/// configuration, the payment vault, and the event log; consults the
/// role registry for authorization and the custodian for ownership and
/// custody transfers.
///
/// Every mutating operation takes `&mut self`, so the ledger is
/// single-writer by construction and no operation can re-enter while
/// one is executing. Concurrent callers wrap the ledger in a mutex;
/// two racing `settle`/`cancel` calls on one listing then serialize so
/// exactly one succeeds and the loser observes `NotActive`. A failed
/// call leaves the ledger exactly as it was.
#[derive(Debug)]
pub struct ListingLedger<C: AssetCustodian> {
    custodian: C,
    roles: RoleRegistry,
    vault: PaymentVault,
    fees: FeeConfig,
    listings: BTreeMap<ListingId, Listing>,
    /// Next id to assign. Incremented exactly once per successful `list`.
    next_listing_id: ListingId,
    /// Tradeable-asset allow-list, each entry tagged with its kind.
    tradeable: HashMap<ContractId, AssetKind>,
    /// Accepted payment media.
    payment_tokens: HashSet<TokenCode>,
    paused: bool,
    /// Account under which the engine holds custodied assets.
    engine_account: AccountId,
    events: EventLog,
}

impl<C: AssetCustodian> ListingLedger<C> {
    /// Create a ledger around a custodian, a bootstrapped role
    /// registry, and a fee configuration.
    pub fn new(custodian: C, roles: RoleRegistry, fees: FeeConfig) -> Self {
        Self {
            custodian,
            roles,
            vault: PaymentVault::new(),
            fees,
            listings: BTreeMap::new(),
            next_listing_id: 0,
            tradeable: HashMap::new(),
            payment_tokens: HashSet::new(),
            paused: false,
            engine_account: AccountId::new("escrow:engine"),
            events: EventLog::new(),
        }
    }

    // =====================================================================
    // Trade surface
    // =====================================================================

    /// List an asset for sale, moving it into engine custody.
    ///
    /// The contract and payment token must be allow-listed and the
    /// price positive. For a unique asset the quantity is forced to 1
    /// regardless of the caller-supplied value. Ownership is verified
    /// before custody moves; the listing record is written before the
    /// transfer is requested and rolled back if the transfer fails, so
    /// no id is consumed by a failed call.
    pub fn list(
        &mut self,
        seller: &AccountId,
        contract: &ContractId,
        asset_id: AssetId,
        quantity: u64,
        unit_price: Decimal,
        payment_token: &TokenCode,
    ) -> Result<ListingId, MarketError> {
        self.require_running()?;
        let kind = *self
            .tradeable
            .get(contract)
            .ok_or_else(|| MarketError::NotAllowlisted {
                identifier: contract.to_string(),
            })?;
        if !self.payment_tokens.contains(payment_token) {
            return Err(MarketError::NotAllowlisted {
                identifier: payment_token.to_string(),
            });
        }
        if unit_price <= Decimal::ZERO {
            return Err(MarketError::InvalidPrice);
        }
        // A unique asset is always exactly one unit; a zero-quantity
        // fungible order would have zero value.
        let quantity = match kind {
            AssetKind::Unique => 1,
            AssetKind::FungibleById => {
                if quantity == 0 {
                    return Err(MarketError::InvalidPrice);
                }
                quantity
            }
        };

        // Ownership verification precedes the custody transfer.
        let held = match kind {
            AssetKind::Unique => match self.custodian.owner_of(contract, asset_id) {
                Some(owner) if owner == *seller => 1,
                _ => 0,
            },
            AssetKind::FungibleById => self.custodian.balance_of(contract, asset_id, seller),
        };
        if held < quantity {
            return Err(MarketError::InsufficientBalance {
                account: seller.clone(),
                contract: contract.clone(),
                asset_id,
                required: quantity,
            });
        }

        // Record first, transfer second, and roll the record back if
        // the transfer is rejected so the unit is all-or-nothing.
        let id = self.next_listing_id;
        self.listings.insert(
            id,
            Listing::new(
                id,
                contract.clone(),
                asset_id,
                quantity,
                unit_price,
                seller.clone(),
                payment_token.clone(),
            ),
        );
        if let Err(err) = self.custodian.transfer(
            contract,
            asset_id,
            seller,
            &self.engine_account,
            quantity,
        ) {
            self.listings.remove(&id);
            warn!("list rejected for {contract}#{asset_id}: custody transfer failed");
            return Err(err);
        }
        self.next_listing_id += 1;

        info!(
            "listed #{id}: {quantity} x {contract}#{asset_id} by {seller} at {unit_price} {payment_token}"
        );
        self.events.append(MarketEvent::Listed {
            listing_id: id,
            seller: seller.clone(),
            contract: contract.clone(),
            asset_id,
            quantity,
            unit_price,
            payment_token: payment_token.clone(),
        });
        Ok(id)
    }

    /// Cancel an active listing, returning custody to the seller.
    ///
    /// Only the seller may cancel. The custody return is attempted
    /// before the state flips; if it fails the listing stays `Active`
    /// and the call fails.
    pub fn cancel(&mut self, caller: &AccountId, listing_id: ListingId) -> Result<(), MarketError> {
        self.require_running()?;
        let listing = self
            .listings
            .get(&listing_id)
            .ok_or(MarketError::UnknownListing { id: listing_id })?;
        if !listing.is_active() {
            return Err(MarketError::NotActive { id: listing_id });
        }
        if listing.seller() != caller {
            return Err(MarketError::NotSeller {
                caller: caller.clone(),
                id: listing_id,
            });
        }

        let contract = listing.contract().clone();
        let asset_id = listing.asset_id();
        let quantity = listing.quantity();
        let seller = listing.seller().clone();

        self.custodian
            .transfer(&contract, asset_id, &self.engine_account, &seller, quantity)?;

        self.listings
            .get_mut(&listing_id)
            .ok_or(MarketError::UnknownListing { id: listing_id })?
            .mark_cancelled();

        info!("cancelled #{listing_id}: {quantity} x {contract}#{asset_id} returned to {seller}");
        self.events.append(MarketEvent::ListingCancelled {
            listing_id,
            seller,
        });
        Ok(())
    }

    /// Settle an active listing: move custody to the buyer and disburse
    /// the payment, minus fee, to the seller and fee collector.
    ///
    /// Only an approver may settle. The payment must equal the total
    /// due exactly and is pulled from the buyer's vault balance; if the
    /// pull or the custody transfer fails, nothing moves.
    pub fn settle(
        &mut self,
        caller: &AccountId,
        listing_id: ListingId,
        buyer: &AccountId,
        payment_received: Decimal,
    ) -> Result<Settlement, MarketError> {
        self.require_running()?;
        if !self.roles.has_role(caller, Role::Approver) {
            return Err(MarketError::PermissionDenied {
                caller: caller.clone(),
            });
        }
        if buyer.is_zero() {
            return Err(MarketError::ZeroAddress { context: "buyer" });
        }
        let listing = self
            .listings
            .get(&listing_id)
            .ok_or(MarketError::UnknownListing { id: listing_id })?;
        if !listing.is_active() {
            return Err(MarketError::NotActive { id: listing_id });
        }

        let contract = listing.contract().clone();
        let asset_id = listing.asset_id();
        let quantity = listing.quantity();
        let seller = listing.seller().clone();
        let token = listing.payment_token().clone();

        let total_due = listing.total_due();
        let (fee, proceeds) = compute_split(total_due, self.fees.base_fee_bps());

        // Exact payment: no partial, no overpayment.
        if payment_received != total_due {
            return Err(MarketError::PaymentMismatch {
                expected: total_due,
                received: payment_received,
            });
        }
        // Atomic pull of the payment from the buyer's vault balance.
        if !self.vault.debit(&token, buyer, total_due) {
            return Err(MarketError::PaymentMismatch {
                expected: total_due,
                received: self.vault.balance(&token, buyer),
            });
        }

        // Custody to the buyer; undo the pull if the custodian rejects.
        if let Err(err) =
            self.custodian
                .transfer(&contract, asset_id, &self.engine_account, buyer, quantity)
        {
            self.vault.credit(&token, buyer, total_due);
            warn!("settle rejected for #{listing_id}: custody transfer failed");
            return Err(err);
        }

        let collector = self.fees.fee_collector().clone();
        self.vault.credit(&token, &seller, proceeds);
        self.vault.credit(&token, &collector, fee);

        self.listings
            .get_mut(&listing_id)
            .ok_or(MarketError::UnknownListing { id: listing_id })?
            .mark_settled(buyer.clone());

        info!(
            "settled #{listing_id}: {quantity} x {contract}#{asset_id} to {buyer}, \
             {proceeds} {token} to {seller}, {fee} {token} to {collector}"
        );
        self.events.append(MarketEvent::ListingSettled {
            listing_id,
            seller: seller.clone(),
            buyer: buyer.clone(),
            total_due,
            fee,
            proceeds,
        });
        Ok(Settlement {
            listing_id,
            seller,
            buyer: buyer.clone(),
            total_due,
            fee,
            proceeds,
        })
    }

    // =====================================================================
    // Admin surface
    // =====================================================================

    /// Allow a collection for trading under a custody model.
    pub fn add_tradeable_asset(
        &mut self,
        caller: &AccountId,
        contract: ContractId,
        kind: AssetKind,
    ) -> Result<(), MarketError> {
        self.roles.require_admin(caller)?;
        if self.tradeable.contains_key(&contract) {
            return Err(MarketError::AlreadyAllowlisted {
                identifier: contract.to_string(),
            });
        }
        self.tradeable.insert(contract.clone(), kind);
        info!("asset allow-listed: {contract} ({kind})");
        self.events.append(MarketEvent::AssetAllowed { contract, kind });
        Ok(())
    }

    /// Remove a collection from the allow-list. Already-active listings
    /// of the collection remain valid.
    pub fn remove_tradeable_asset(
        &mut self,
        caller: &AccountId,
        contract: &ContractId,
    ) -> Result<(), MarketError> {
        self.roles.require_admin(caller)?;
        if self.tradeable.remove(contract).is_none() {
            return Err(MarketError::NotAllowlisted {
                identifier: contract.to_string(),
            });
        }
        info!("asset removed from allow-list: {contract}");
        self.events.append(MarketEvent::AssetRemoved {
            contract: contract.clone(),
        });
        Ok(())
    }

    /// Accept a payment medium.
    pub fn add_payment_token(
        &mut self,
        caller: &AccountId,
        token: TokenCode,
    ) -> Result<(), MarketError> {
        self.roles.require_admin(caller)?;
        if !self.payment_tokens.insert(token.clone()) {
            return Err(MarketError::AlreadyAllowlisted {
                identifier: token.to_string(),
            });
        }
        info!("payment token allow-listed: {token}");
        self.events.append(MarketEvent::PaymentTokenAllowed { token });
        Ok(())
    }

    /// Stop accepting a payment medium for new listings.
    pub fn remove_payment_token(
        &mut self,
        caller: &AccountId,
        token: &TokenCode,
    ) -> Result<(), MarketError> {
        self.roles.require_admin(caller)?;
        if !self.payment_tokens.remove(token) {
            return Err(MarketError::NotAllowlisted {
                identifier: token.to_string(),
            });
        }
        info!("payment token removed from allow-list: {token}");
        self.events.append(MarketEvent::PaymentTokenRemoved {
            token: token.clone(),
        });
        Ok(())
    }

    pub fn grant_approver(
        &mut self,
        caller: &AccountId,
        account: AccountId,
    ) -> Result<(), MarketError> {
        self.roles.grant(caller, account.clone(), Role::Approver)?;
        info!("approver granted: {account}");
        self.events.append(MarketEvent::RoleGranted {
            account,
            role: Role::Approver,
        });
        Ok(())
    }

    pub fn revoke_approver(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<(), MarketError> {
        self.roles.revoke(caller, account, Role::Approver)?;
        info!("approver revoked: {account}");
        self.events.append(MarketEvent::RoleRevoked {
            account: account.clone(),
            role: Role::Approver,
        });
        Ok(())
    }

    pub fn set_base_fee_rate(&mut self, caller: &AccountId, bps: u32) -> Result<(), MarketError> {
        self.roles.require_admin(caller)?;
        let old_bps = self.fees.base_fee_bps();
        self.fees.set_base_fee_bps(bps)?;
        info!("base fee rate updated: {old_bps} -> {bps} bps");
        self.events.append(MarketEvent::FeeRateUpdated {
            old_bps,
            new_bps: bps,
        });
        Ok(())
    }

    pub fn set_fee_collector(
        &mut self,
        caller: &AccountId,
        collector: AccountId,
    ) -> Result<(), MarketError> {
        self.roles.require_admin(caller)?;
        self.fees.set_fee_collector(collector.clone())?;
        info!("fee collector updated: {collector}");
        self.events
            .append(MarketEvent::FeeCollectorUpdated { collector });
        Ok(())
    }

    /// Halt the trade surface. While paused, `list`/`cancel`/`settle`
    /// fail with `SystemPaused`; the admin surface stays available.
    pub fn pause(&mut self, caller: &AccountId) -> Result<(), MarketError> {
        self.roles.require_admin(caller)?;
        self.paused = true;
        warn!("engine paused");
        self.events.append(MarketEvent::EnginePaused);
        Ok(())
    }

    pub fn unpause(&mut self, caller: &AccountId) -> Result<(), MarketError> {
        self.roles.require_admin(caller)?;
        self.paused = false;
        info!("engine unpaused");
        self.events.append(MarketEvent::EngineUnpaused);
        Ok(())
    }

    /// Withdraw the engine's own balance of a token that is not an
    /// accepted payment medium (funds sent to the engine by mistake).
    /// Tokens on the payment allow-list cannot be swept.
    pub fn sweep(&mut self, caller: &AccountId, token: &TokenCode) -> Result<Decimal, MarketError> {
        self.roles.require_admin(caller)?;
        if self.payment_tokens.contains(token) {
            return Err(MarketError::AlreadyAllowlisted {
                identifier: token.to_string(),
            });
        }
        let amount = self.vault.drain(token, &self.engine_account);
        self.vault.credit(token, caller, amount);
        info!("swept {amount} {token} to {caller}");
        self.events.append(MarketEvent::TokensSwept {
            token: token.clone(),
            to: caller.clone(),
            amount,
        });
        Ok(amount)
    }

    // =====================================================================
    // Funding and inspection
    // =====================================================================

    /// Fund an account's vault balance of a token ahead of settlement.
    pub fn deposit(&mut self, token: &TokenCode, account: &AccountId, amount: Decimal) {
        self.vault.deposit(token, account, amount);
    }

    pub fn listing(&self, id: ListingId) -> Option<&Listing> {
        self.listings.get(&id)
    }

    pub fn listing_count(&self) -> usize {
        self.listings.len()
    }

    /// The id the next successful `list` call will assign.
    pub fn next_listing_id(&self) -> ListingId {
        self.next_listing_id
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_tradeable(&self, contract: &ContractId) -> bool {
        self.tradeable.contains_key(contract)
    }

    pub fn is_payment_token(&self, token: &TokenCode) -> bool {
        self.payment_tokens.contains(token)
    }

    pub fn fee_config(&self) -> &FeeConfig {
        &self.fees
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn vault(&self) -> &PaymentVault {
        &self.vault
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn custodian(&self) -> &C {
        &self.custodian
    }

    pub fn custodian_mut(&mut self) -> &mut C {
        &mut self.custodian
    }

    pub fn engine_account(&self) -> &AccountId {
        &self.engine_account
    }

    fn require_running(&self) -> Result<(), MarketError> {
        if self.paused {
            return Err(MarketError::SystemPaused);
        }
        Ok(())
    }
}
