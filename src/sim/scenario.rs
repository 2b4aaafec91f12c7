//! Random trade-scenario generation and script execution.
//!
//! Generates marketplace scripts (collections, mints, buyer funding,
//! and a trade sequence) for stress testing the engine, and executes
//! scripts against a fresh ledger. Used by the CLI and the benches.

use crate::core::account::AccountId;
use crate::core::asset::{AssetId, AssetKind, ContractId, TokenCode};
use crate::core::fees::FeeConfig;
use crate::core::listing::ListingId;
use crate::custody::custodian::{AssetCustodian, InMemoryCustodian};
use crate::custody::roles::RoleRegistry;
use crate::engine::ledger::ListingLedger;
use crate::error::MarketError;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Well-known accounts every script runs with.
pub const SCRIPT_ADMIN: &str = "root";
pub const SCRIPT_APPROVER: &str = "ops";
pub const SCRIPT_COLLECTOR: &str = "treasury";

/// A replayable marketplace setup plus trade sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeScript {
    pub fee_bps: u32,
    pub collections: Vec<CollectionSpec>,
    pub mints: Vec<MintSpec>,
    pub deposits: Vec<DepositSpec>,
    pub actions: Vec<TradeAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub contract: ContractId,
    pub kind: AssetKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintSpec {
    pub contract: ContractId,
    pub asset_id: AssetId,
    pub owner: AccountId,
    /// Ignored for unique collections.
    pub quantity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositSpec {
    pub token: TokenCode,
    pub account: AccountId,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TradeAction {
    List {
        seller: AccountId,
        contract: ContractId,
        asset_id: AssetId,
        quantity: u64,
        unit_price: Decimal,
        payment_token: TokenCode,
    },
    Cancel {
        caller: AccountId,
        listing_id: ListingId,
    },
    Settle {
        listing_id: ListingId,
        buyer: AccountId,
        payment: Decimal,
    },
}

/// Per-run statistics from executing a script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptStats {
    pub listed: usize,
    pub cancelled: usize,
    pub settled: usize,
    pub rejected: usize,
}

/// Execute a script against a fresh engine.
///
/// Setup (collections, mints, deposits) must succeed; trade actions
/// that fail are counted as rejected and execution continues, matching
/// how a real caller stream would behave.
pub fn run_script(
    script: &TradeScript,
) -> Result<(ListingLedger<InMemoryCustodian>, ScriptStats), MarketError> {
    let admin = AccountId::new(SCRIPT_ADMIN);
    let approver = AccountId::new(SCRIPT_APPROVER);

    let mut custodian = InMemoryCustodian::new();
    for spec in &script.collections {
        custodian.register_collection(spec.contract.clone(), spec.kind)?;
    }
    for spec in &script.mints {
        match custodian.kind_of(&spec.contract) {
            Some(AssetKind::Unique) => {
                custodian.mint_unique(&spec.contract, spec.asset_id, spec.owner.clone())?
            }
            Some(AssetKind::FungibleById) => custodian.mint_fungible(
                &spec.contract,
                spec.asset_id,
                spec.owner.clone(),
                spec.quantity,
            )?,
            None => {
                return Err(MarketError::NotAllowlisted {
                    identifier: spec.contract.to_string(),
                })
            }
        }
    }

    let roles = RoleRegistry::with_admin(admin.clone());
    let fees = FeeConfig::new(script.fee_bps, AccountId::new(SCRIPT_COLLECTOR))?;
    let mut ledger = ListingLedger::new(custodian, roles, fees);

    for spec in &script.collections {
        ledger.add_tradeable_asset(&admin, spec.contract.clone(), spec.kind)?;
    }
    let mut tokens: Vec<TokenCode> = script
        .deposits
        .iter()
        .map(|d| d.token.clone())
        .chain(script.actions.iter().filter_map(|a| match a {
            TradeAction::List { payment_token, .. } => Some(payment_token.clone()),
            _ => None,
        }))
        .collect();
    tokens.sort();
    tokens.dedup();
    for token in tokens {
        ledger.add_payment_token(&admin, token)?;
    }
    ledger.grant_approver(&admin, approver.clone())?;

    for spec in &script.deposits {
        ledger.deposit(&spec.token, &spec.account, spec.amount);
    }

    let mut stats = ScriptStats::default();
    for action in &script.actions {
        let outcome: Result<(), MarketError> = match action {
            TradeAction::List {
                seller,
                contract,
                asset_id,
                quantity,
                unit_price,
                payment_token,
            } => ledger
                .list(seller, contract, *asset_id, *quantity, *unit_price, payment_token)
                .map(|_| stats.listed += 1),
            TradeAction::Cancel { caller, listing_id } => ledger
                .cancel(caller, *listing_id)
                .map(|_| stats.cancelled += 1),
            TradeAction::Settle {
                listing_id,
                buyer,
                payment,
            } => ledger
                .settle(&approver, *listing_id, buyer, *payment)
                .map(|_| stats.settled += 1),
        };
        if outcome.is_err() {
            stats.rejected += 1;
        }
    }
    Ok((ledger, stats))
}

/// Configuration for generating a random trade script.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Number of sellers, each holding one unique asset and a fungible
    /// balance.
    pub seller_count: usize,
    /// Number of funded buyers.
    pub buyer_count: usize,
    /// Number of trade actions to generate.
    pub trade_count: usize,
    /// Base fee rate in basis points.
    pub fee_bps: u32,
    pub min_price: u64,
    pub max_price: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seller_count: 10,
            buyer_count: 10,
            trade_count: 30,
            fee_bps: 250,
            min_price: 10,
            max_price: 1_000,
        }
    }
}

/// Generate a random trade script.
///
/// Every generated `list` is backed by a real mint and every `settle`
/// by a sufficient buyer deposit, so a generated script exercises the
/// success paths; a minority of cancels and settles target already
/// terminal listings to exercise `NotActive` handling.
pub fn generate_random_script(config: &ScenarioConfig) -> TradeScript {
    let mut rng = rand::thread_rng();
    let unique = ContractId::new("gen-art");
    let fungible = ContractId::new("passes");
    let native = TokenCode::native();

    let sellers: Vec<AccountId> = (0..config.seller_count)
        .map(|i| AccountId::new(format!("seller-{:03}", i)))
        .collect();
    let buyers: Vec<AccountId> = (0..config.buyer_count)
        .map(|i| AccountId::new(format!("buyer-{:03}", i)))
        .collect();

    let collections = vec![
        CollectionSpec {
            contract: unique.clone(),
            kind: AssetKind::Unique,
        },
        CollectionSpec {
            contract: fungible.clone(),
            kind: AssetKind::FungibleById,
        },
    ];

    let mut mints = Vec::new();
    for (i, seller) in sellers.iter().enumerate() {
        mints.push(MintSpec {
            contract: unique.clone(),
            asset_id: i as AssetId,
            owner: seller.clone(),
            quantity: 1,
        });
        mints.push(MintSpec {
            contract: fungible.clone(),
            asset_id: (i % 4) as AssetId,
            owner: seller.clone(),
            quantity: 100,
        });
    }

    // Fund buyers generously enough for any settlement the script asks for.
    let war_chest = Decimal::from(config.max_price * 100 * config.trade_count as u64);
    let deposits = buyers
        .iter()
        .map(|buyer| DepositSpec {
            token: native.clone(),
            account: buyer.clone(),
            amount: war_chest,
        })
        .collect();

    let mut actions = Vec::new();
    // (listing id, seller, total due) for listings still open in the script.
    let mut open: Vec<(ListingId, AccountId, Decimal)> = Vec::new();
    let mut closed: Vec<ListingId> = Vec::new();
    let mut next_id: ListingId = 0;
    let mut unlisted_uniques: Vec<(AssetId, AccountId)> = sellers
        .iter()
        .enumerate()
        .map(|(i, s)| (i as AssetId, s.clone()))
        .collect();

    for _ in 0..config.trade_count {
        let price = Decimal::from(rng.gen_range(config.min_price..=config.max_price));
        let roll = rng.gen_range(0u32..100);
        if roll < 50 || open.is_empty() {
            // List: prefer a unique asset while any remain, else fungible.
            if let Some(idx) = (!unlisted_uniques.is_empty())
                .then(|| rng.gen_range(0..unlisted_uniques.len()))
            {
                let (asset_id, seller) = unlisted_uniques.swap_remove(idx);
                actions.push(TradeAction::List {
                    seller: seller.clone(),
                    contract: unique.clone(),
                    asset_id,
                    quantity: 1,
                    unit_price: price,
                    payment_token: native.clone(),
                });
                open.push((next_id, seller, price));
            } else {
                let seller_idx = rng.gen_range(0..sellers.len());
                let quantity = rng.gen_range(1u64..=5);
                actions.push(TradeAction::List {
                    seller: sellers[seller_idx].clone(),
                    contract: fungible.clone(),
                    asset_id: (seller_idx % 4) as AssetId,
                    quantity,
                    unit_price: price,
                    payment_token: native.clone(),
                });
                open.push((
                    next_id,
                    sellers[seller_idx].clone(),
                    price * Decimal::from(quantity),
                ));
            }
            next_id += 1;
        } else if roll < 65 {
            // Cancel an open listing, or occasionally a closed one.
            if roll < 60 || closed.is_empty() {
                let idx = rng.gen_range(0..open.len());
                let (id, seller, _) = open.swap_remove(idx);
                actions.push(TradeAction::Cancel {
                    caller: seller,
                    listing_id: id,
                });
                closed.push(id);
            } else {
                let id = closed[rng.gen_range(0..closed.len())];
                actions.push(TradeAction::Cancel {
                    caller: sellers[0].clone(),
                    listing_id: id,
                });
            }
        } else {
            let idx = rng.gen_range(0..open.len());
            let (id, _, total_due) = open.swap_remove(idx);
            actions.push(TradeAction::Settle {
                listing_id: id,
                buyer: buyers[rng.gen_range(0..buyers.len())].clone(),
                payment: total_due,
            });
            closed.push(id);
        }
    }

    TradeScript {
        fee_bps: config.fee_bps,
        collections,
        mints,
        deposits,
        actions,
    }
}
