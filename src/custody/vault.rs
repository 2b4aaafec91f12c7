use crate::core::account::AccountId;
use crate::core::asset::TokenCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-token account balances held with the engine.
///
/// Buyers fund their balance ahead of settlement; settlement pulls the
/// exact amount due and credits the seller and fee collector. The
/// engine's own account can accumulate stray token balances, which the
/// admin `sweep` operation drains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentVault {
    #[serde(with = "balances_serde")]
    balances: HashMap<(TokenCode, AccountId), Decimal>,
}

mod balances_serde {
    use super::*;
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeMap;

    pub fn serialize<S: serde::Serializer>(
        balances: &HashMap<(TokenCode, AccountId), Decimal>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(balances.len()))?;
        for ((token, account), amount) in balances {
            map.serialize_entry(&format!("{}:{}", token, account), amount)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<(TokenCode, AccountId), Decimal>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = HashMap<(TokenCode, AccountId), Decimal>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a map with \"token:account\" keys")
            }
            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Self::Value, M::Error> {
                let mut map = HashMap::new();
                while let Some((key, value)) = access.next_entry::<String, Decimal>()? {
                    let (token, account) = key
                        .split_once(':')
                        .ok_or_else(|| de::Error::custom(format!("invalid key: {key}")))?;
                    map.insert((TokenCode::new(token), AccountId::new(account)), value);
                }
                Ok(map)
            }
        }
        deserializer.deserialize_map(V)
    }
}

impl PaymentVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account's balance of a token.
    pub fn deposit(&mut self, token: &TokenCode, account: &AccountId, amount: Decimal) {
        debug_assert!(amount >= Decimal::ZERO);
        *self
            .balances
            .entry((token.clone(), account.clone()))
            .or_insert(Decimal::ZERO) += amount;
    }

    /// An account's balance of a token.
    pub fn balance(&self, token: &TokenCode, account: &AccountId) -> Decimal {
        self.balances
            .get(&(token.clone(), account.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Debit an account. Returns `false` (with no effect) if the
    /// balance is insufficient.
    pub(crate) fn debit(&mut self, token: &TokenCode, account: &AccountId, amount: Decimal) -> bool {
        let key = (token.clone(), account.clone());
        let held = self.balances.get(&key).copied().unwrap_or(Decimal::ZERO);
        if held < amount {
            return false;
        }
        if held == amount {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, held - amount);
        }
        true
    }

    pub(crate) fn credit(&mut self, token: &TokenCode, account: &AccountId, amount: Decimal) {
        self.deposit(token, account, amount);
    }

    /// Drain an account's entire balance of a token, returning the
    /// amount removed.
    pub(crate) fn drain(&mut self, token: &TokenCode, account: &AccountId) -> Decimal {
        self.balances
            .remove(&(token.clone(), account.clone()))
            .unwrap_or(Decimal::ZERO)
    }
}
