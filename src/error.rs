use crate::core::account::AccountId;
use crate::core::asset::{AssetId, ContractId};
use crate::core::listing::ListingId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the marketplace engine.
///
/// Every variant is a precondition failure detected before any state
/// mutation or external transfer lands; a failed call leaves the ledger
/// exactly as it was. Callers get a specific kind so client code can
/// distinguish "try a different listing" from "you lack permission"
/// from "the engine is paused".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketError {
    #[error("account {caller} lacks the required role")]
    PermissionDenied { caller: AccountId },

    #[error("{identifier} is not on the allow-list")]
    NotAllowlisted { identifier: String },

    #[error("{identifier} is already on the allow-list")]
    AlreadyAllowlisted { identifier: String },

    #[error("price must be positive")]
    InvalidPrice,

    #[error("fee rate {bps} exceeds the maximum of {max_bps} basis points")]
    InvalidFeeRate { bps: u32, max_bps: u32 },

    #[error("the zero account is not a valid {context}")]
    ZeroAddress { context: &'static str },

    #[error("no listing with id {id}")]
    UnknownListing { id: ListingId },

    #[error("listing {id} is not active")]
    NotActive { id: ListingId },

    #[error("account {caller} is not the seller of listing {id}")]
    NotSeller { caller: AccountId, id: ListingId },

    #[error("{account} holds fewer than {required} units of {contract}#{asset_id}")]
    InsufficientBalance {
        account: AccountId,
        contract: ContractId,
        asset_id: AssetId,
        required: u64,
    },

    #[error("custody transfer of {contract}#{asset_id} from {from} rejected")]
    TransferRejected {
        contract: ContractId,
        asset_id: AssetId,
        from: AccountId,
    },

    #[error("payment of {received} does not match the {expected} due")]
    PaymentMismatch { expected: Decimal, received: Decimal },

    #[error("the engine is paused")]
    SystemPaused,
}
