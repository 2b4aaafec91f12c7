use crate::core::account::AccountId;
use crate::core::asset::{AssetId, AssetKind, ContractId};
use crate::error::MarketError;
use std::collections::HashMap;

/// Custody and ownership surface the engine calls out to.
///
/// A custodian tracks raw balances and ownership only; it has no notion
/// of "for sale". Every call is synchronous and atomic: a transfer is
/// either fully applied or has no effect and the caller observes the
/// failure.
pub trait AssetCustodian {
    /// The custody model of a collection, if the custodian knows it.
    fn kind_of(&self, contract: &ContractId) -> Option<AssetKind>;

    /// How many units of `asset_id` the account holds. For unique
    /// collections this is 1 for the owner and 0 for everyone else.
    fn balance_of(&self, contract: &ContractId, asset_id: AssetId, account: &AccountId) -> u64;

    /// The owner of a unique asset, if it exists. `None` for
    /// fungible-by-id collections.
    fn owner_of(&self, contract: &ContractId, asset_id: AssetId) -> Option<AccountId>;

    /// Move `quantity` units of `asset_id` from one account to another.
    ///
    /// Fails with `TransferRejected` when `from` lacks sufficient
    /// balance or ownership, or when the collection is unknown.
    fn transfer(
        &mut self,
        contract: &ContractId,
        asset_id: AssetId,
        from: &AccountId,
        to: &AccountId,
        quantity: u64,
    ) -> Result<(), MarketError>;
}

/// In-memory custodian covering both asset kinds behind one interface.
///
/// Unique collections map each asset id to a single owner; fungible
/// collections map `(asset id, account)` to a quantity. The kind is
/// fixed when the collection is registered and drives which map a
/// transfer touches.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCustodian {
    kinds: HashMap<ContractId, AssetKind>,
    /// (contract, asset id) -> owner, for unique collections.
    owners: HashMap<(ContractId, AssetId), AccountId>,
    /// (contract, asset id, account) -> quantity, for fungible collections.
    balances: HashMap<(ContractId, AssetId, AccountId), u64>,
}

impl InMemoryCustodian {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection under a custody model. Re-registering an
    /// existing collection fails.
    pub fn register_collection(
        &mut self,
        contract: ContractId,
        kind: AssetKind,
    ) -> Result<(), MarketError> {
        if self.kinds.contains_key(&contract) {
            return Err(MarketError::AlreadyAllowlisted {
                identifier: contract.to_string(),
            });
        }
        self.kinds.insert(contract, kind);
        Ok(())
    }

    /// Mint a unique asset to an owner. Fails if the id is taken or the
    /// collection is not registered as unique.
    pub fn mint_unique(
        &mut self,
        contract: &ContractId,
        asset_id: AssetId,
        owner: AccountId,
    ) -> Result<(), MarketError> {
        if self.kinds.get(contract) != Some(&AssetKind::Unique) {
            return Err(MarketError::NotAllowlisted {
                identifier: contract.to_string(),
            });
        }
        let key = (contract.clone(), asset_id);
        if self.owners.contains_key(&key) {
            return Err(MarketError::TransferRejected {
                contract: contract.clone(),
                asset_id,
                from: AccountId::zero(),
            });
        }
        self.owners.insert(key, owner);
        Ok(())
    }

    /// Mint units of a fungible asset type to an account.
    pub fn mint_fungible(
        &mut self,
        contract: &ContractId,
        asset_id: AssetId,
        owner: AccountId,
        quantity: u64,
    ) -> Result<(), MarketError> {
        if self.kinds.get(contract) != Some(&AssetKind::FungibleById) {
            return Err(MarketError::NotAllowlisted {
                identifier: contract.to_string(),
            });
        }
        *self
            .balances
            .entry((contract.clone(), asset_id, owner))
            .or_insert(0) += quantity;
        Ok(())
    }
}

impl AssetCustodian for InMemoryCustodian {
    fn kind_of(&self, contract: &ContractId) -> Option<AssetKind> {
        self.kinds.get(contract).copied()
    }

    fn balance_of(&self, contract: &ContractId, asset_id: AssetId, account: &AccountId) -> u64 {
        match self.kinds.get(contract) {
            Some(AssetKind::Unique) => {
                match self.owners.get(&(contract.clone(), asset_id)) {
                    Some(owner) if owner == account => 1,
                    _ => 0,
                }
            }
            Some(AssetKind::FungibleById) => self
                .balances
                .get(&(contract.clone(), asset_id, account.clone()))
                .copied()
                .unwrap_or(0),
            None => 0,
        }
    }

    fn owner_of(&self, contract: &ContractId, asset_id: AssetId) -> Option<AccountId> {
        if self.kinds.get(contract) != Some(&AssetKind::Unique) {
            return None;
        }
        self.owners.get(&(contract.clone(), asset_id)).cloned()
    }

    fn transfer(
        &mut self,
        contract: &ContractId,
        asset_id: AssetId,
        from: &AccountId,
        to: &AccountId,
        quantity: u64,
    ) -> Result<(), MarketError> {
        let rejected = || MarketError::TransferRejected {
            contract: contract.clone(),
            asset_id,
            from: from.clone(),
        };
        match self.kinds.get(contract) {
            Some(AssetKind::Unique) => {
                if quantity != 1 {
                    return Err(rejected());
                }
                let key = (contract.clone(), asset_id);
                match self.owners.get(&key) {
                    Some(owner) if owner == from => {}
                    _ => return Err(rejected()),
                }
                self.owners.insert(key, to.clone());
                Ok(())
            }
            Some(AssetKind::FungibleById) => {
                let from_key = (contract.clone(), asset_id, from.clone());
                let held = self.balances.get(&from_key).copied().unwrap_or(0);
                if held < quantity {
                    return Err(rejected());
                }
                // Debit fully before crediting so a failure has no effect.
                if held == quantity {
                    self.balances.remove(&from_key);
                } else {
                    self.balances.insert(from_key, held - quantity);
                }
                *self
                    .balances
                    .entry((contract.clone(), asset_id, to.clone()))
                    .or_insert(0) += quantity;
                Ok(())
            }
            None => Err(rejected()),
        }
    }
}
