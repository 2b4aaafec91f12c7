use crate::core::account::AccountId;
use crate::error::MarketError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Roles recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// May mutate allow-lists, fees, roles, and the paused flag.
    Admin,
    /// May finalize settlements on behalf of the platform.
    Approver,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Approver => write!(f, "approver"),
        }
    }
}

/// Answers "does account X hold role R" and lets admins grant and
/// revoke roles. Authorization is an explicit `caller` parameter on
/// every mutation, never ambient state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleRegistry {
    roles: HashMap<AccountId, HashSet<Role>>,
}

impl RoleRegistry {
    /// Bootstrap a registry with a single admin account.
    pub fn with_admin(admin: AccountId) -> Self {
        let mut roles = HashMap::new();
        roles.insert(admin, HashSet::from([Role::Admin]));
        Self { roles }
    }

    pub fn has_role(&self, account: &AccountId, role: Role) -> bool {
        self.roles
            .get(account)
            .map(|set| set.contains(&role))
            .unwrap_or(false)
    }

    /// Grant `role` to `account`. The caller must hold Admin; the zero
    /// identifier is rejected.
    pub fn grant(
        &mut self,
        caller: &AccountId,
        account: AccountId,
        role: Role,
    ) -> Result<(), MarketError> {
        self.require_admin(caller)?;
        if account.is_zero() {
            return Err(MarketError::ZeroAddress {
                context: "role holder",
            });
        }
        self.roles.entry(account).or_default().insert(role);
        Ok(())
    }

    /// Revoke `role` from `account`. The caller must hold Admin.
    pub fn revoke(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        role: Role,
    ) -> Result<(), MarketError> {
        self.require_admin(caller)?;
        if account.is_zero() {
            return Err(MarketError::ZeroAddress {
                context: "role holder",
            });
        }
        if let Some(set) = self.roles.get_mut(account) {
            set.remove(&role);
            if set.is_empty() {
                self.roles.remove(account);
            }
        }
        Ok(())
    }

    pub(crate) fn require_admin(&self, caller: &AccountId) -> Result<(), MarketError> {
        if !self.has_role(caller, Role::Admin) {
            return Err(MarketError::PermissionDenied {
                caller: caller.clone(),
            });
        }
        Ok(())
    }
}
