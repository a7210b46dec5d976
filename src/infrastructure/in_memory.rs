use crate::domain::identity::{AccountId, Credits};
use crate::domain::ports::{AccessControl, TokenLedger};
use crate::error::{DutyError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory fungible-credit ledger.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access; `Clone` shares
/// the underlying maps. The pause flag is shared with whatever access gate
/// is wired next to it, so one switch suspends all movement.
#[derive(Clone)]
pub struct InMemoryLedger {
    balances: Arc<RwLock<HashMap<AccountId, Credits>>>,
    authority: AccountId,
    paused: Arc<AtomicBool>,
}

impl InMemoryLedger {
    pub fn new(authority: AccountId) -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            authority,
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared handle to the pause switch.
    pub fn pause_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.paused)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }

    /// Seeds an account balance. Driver and test helper; the registry core
    /// never mints.
    pub async fn credit(&self, account: &AccountId, amount: Credits) {
        let mut balances = self.balances.write().await;
        let entry = balances.entry(account.clone()).or_insert(Credits::ZERO);
        *entry = entry.checked_add(amount).unwrap_or(Credits(u64::MAX));
    }

    /// All balances, sorted by account for stable output.
    pub async fn balances(&self) -> Vec<(AccountId, Credits)> {
        let balances = self.balances.read().await;
        let mut all: Vec<_> = balances.iter().map(|(k, v)| (k.clone(), *v)).collect();
        all.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        all
    }
}

#[async_trait]
impl TokenLedger for InMemoryLedger {
    async fn balance_of(&self, account: &AccountId) -> Result<Credits> {
        let balances = self.balances.read().await;
        Ok(balances.get(account).copied().unwrap_or(Credits::ZERO))
    }

    async fn transfer(&self, from: &AccountId, to: &AccountId, amount: Credits) -> Result<()> {
        if self.paused.load(Ordering::SeqCst) {
            return Err(DutyError::Paused);
        }
        let mut balances = self.balances.write().await;
        let from_balance = balances.get(from).copied().unwrap_or(Credits::ZERO);
        let to_balance = balances.get(to).copied().unwrap_or(Credits::ZERO);

        // Both sides are computed before either is written.
        let debited = from_balance
            .checked_sub(amount)
            .ok_or(DutyError::InsufficientFunds {
                required: amount.value(),
                available: from_balance.value(),
            })?;
        let credited = to_balance
            .checked_add(amount)
            .ok_or_else(|| DutyError::InvalidState("ledger balance overflow".to_string()))?;

        balances.insert(from.clone(), debited);
        balances.insert(to.clone(), credited);
        Ok(())
    }

    fn authority(&self) -> AccountId {
        self.authority.clone()
    }
}

/// Single-owner access gate sharing the ledger's pause switch.
pub struct OwnerGate {
    owner: AccountId,
    paused: Arc<AtomicBool>,
}

impl OwnerGate {
    pub fn new(owner: AccountId, paused: Arc<AtomicBool>) -> Self {
        Self { owner, paused }
    }
}

#[async_trait]
impl AccessControl for OwnerGate {
    async fn authorize(&self, caller: &AccountId) -> Result<()> {
        if caller == &self.owner {
            Ok(())
        } else {
            Err(DutyError::Unauthorized(caller.to_string()))
        }
    }

    fn paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
