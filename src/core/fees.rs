use crate::core::account::AccountId;
use crate::error::MarketError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fee rates are expressed in parts per 10,000 (basis points).
pub const FEE_DENOMINATOR: u32 = 10_000;

/// Upper bound on the configurable base fee rate: 20%.
pub const MAX_FEE_BPS: u32 = 2_000;

/// Split a settlement total into the engine's fee and the seller's
/// proceeds.
///
/// The fee is `floor(total_due * fee_bps / 10_000)` and the proceeds are
/// the remainder, so `fee + proceeds == total_due` holds for every
/// `total_due >= 0` and `fee_bps <= 10_000`, and the proceeds are never
/// negative.
///
/// # Examples
///
/// ```
/// use escrow_engine::core::fees::compute_split;
/// use rust_decimal_macros::dec;
///
/// // 2.5% of 50 floors to 1
/// let (fee, proceeds) = compute_split(dec!(50), 250);
/// assert_eq!(fee, dec!(1));
/// assert_eq!(proceeds, dec!(49));
/// ```
pub fn compute_split(total_due: Decimal, fee_bps: u32) -> (Decimal, Decimal) {
    debug_assert!(total_due >= Decimal::ZERO);
    debug_assert!(fee_bps <= FEE_DENOMINATOR);
    let fee = (total_due * Decimal::from(fee_bps) / Decimal::from(FEE_DENOMINATOR)).floor();
    let proceeds = total_due - fee;
    (fee, proceeds)
}

/// Fee configuration: the base rate applied to every settlement and the
/// account receiving the fee portion. Mutable only through the ledger's
/// admin surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    base_fee_bps: u32,
    fee_collector: AccountId,
}

impl FeeConfig {
    /// Create a fee configuration.
    ///
    /// Fails with `InvalidFeeRate` above [`MAX_FEE_BPS`] and with
    /// `ZeroAddress` for a zero collector.
    pub fn new(base_fee_bps: u32, fee_collector: AccountId) -> Result<Self, MarketError> {
        if base_fee_bps > MAX_FEE_BPS {
            return Err(MarketError::InvalidFeeRate {
                bps: base_fee_bps,
                max_bps: MAX_FEE_BPS,
            });
        }
        if fee_collector.is_zero() {
            return Err(MarketError::ZeroAddress {
                context: "fee collector",
            });
        }
        Ok(Self {
            base_fee_bps,
            fee_collector,
        })
    }

    pub fn base_fee_bps(&self) -> u32 {
        self.base_fee_bps
    }

    pub fn fee_collector(&self) -> &AccountId {
        &self.fee_collector
    }

    pub(crate) fn set_base_fee_bps(&mut self, bps: u32) -> Result<(), MarketError> {
        if bps > MAX_FEE_BPS {
            return Err(MarketError::InvalidFeeRate {
                bps,
                max_bps: MAX_FEE_BPS,
            });
        }
        self.base_fee_bps = bps;
        Ok(())
    }

    pub(crate) fn set_fee_collector(&mut self, collector: AccountId) -> Result<(), MarketError> {
        if collector.is_zero() {
            return Err(MarketError::ZeroAddress {
                context: "fee collector",
            });
        }
        self.fee_collector = collector;
        Ok(())
    }
}
