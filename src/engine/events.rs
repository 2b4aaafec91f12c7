use crate::core::account::AccountId;
use crate::core::asset::{AssetId, AssetKind, ContractId, TokenCode};
use crate::core::listing::ListingId;
use crate::custody::roles::Role;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Durable notification emitted by every successful mutating operation.
///
/// Each variant carries the full set of fields relevant to its
/// transition so an indexer can rebuild marketplace history from the
/// event stream alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    Listed {
        listing_id: ListingId,
        seller: AccountId,
        contract: ContractId,
        asset_id: AssetId,
        quantity: u64,
        unit_price: Decimal,
        payment_token: TokenCode,
    },
    ListingCancelled {
        listing_id: ListingId,
        seller: AccountId,
    },
    ListingSettled {
        listing_id: ListingId,
        seller: AccountId,
        buyer: AccountId,
        total_due: Decimal,
        fee: Decimal,
        proceeds: Decimal,
    },
    AssetAllowed {
        contract: ContractId,
        kind: AssetKind,
    },
    AssetRemoved {
        contract: ContractId,
    },
    PaymentTokenAllowed {
        token: TokenCode,
    },
    PaymentTokenRemoved {
        token: TokenCode,
    },
    RoleGranted {
        account: AccountId,
        role: Role,
    },
    RoleRevoked {
        account: AccountId,
        role: Role,
    },
    FeeRateUpdated {
        old_bps: u32,
        new_bps: u32,
    },
    FeeCollectorUpdated {
        collector: AccountId,
    },
    EnginePaused,
    EngineUnpaused,
    TokensSwept {
        token: TokenCode,
        to: AccountId,
        amount: Decimal,
    },
}

/// An event with its position in the ledger's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Dense sequence number, strictly increasing from 0.
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub event: MarketEvent,
}

/// Append-only, ordered log of ledger transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, event: MarketEvent) {
        let seq = self.records.len() as u64;
        self.records.push(EventRecord {
            seq,
            at: Utc::now(),
            event,
        });
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_dense() {
        let mut log = EventLog::new();
        log.append(MarketEvent::EnginePaused);
        log.append(MarketEvent::EngineUnpaused);
        log.append(MarketEvent::PaymentTokenAllowed {
            token: TokenCode::native(),
        });

        let seqs: Vec<u64> = log.records().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
    }

    #[test]
    fn test_event_serializes_tagged() {
        let event = MarketEvent::ListingCancelled {
            listing_id: 3,
            seller: AccountId::new("alice"),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "listing_cancelled");
        assert_eq!(parsed["listing_id"], 3);
    }
}
