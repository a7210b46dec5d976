use crate::domain::identity::{AccountId, Credits};
use crate::error::Result;
use async_trait::async_trait;

/// Fungible-credit ledger collaborating with the settlement engine.
///
/// The engine only reads balances and moves funds; minting, burning and
/// allowance mechanics are the ledger's own business.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    async fn balance_of(&self, account: &AccountId) -> Result<Credits>;

    /// Moves `amount` from `from` to `to`. Fails with `InsufficientFunds`
    /// or, when movement is globally suspended, with `Paused`.
    async fn transfer(&self, from: &AccountId, to: &AccountId, amount: Credits) -> Result<()>;

    /// Identity that receives settled stamp-duty proceeds.
    fn authority(&self) -> AccountId;
}

/// Authorization gate for owner-only registry mutations.
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Fails with `Unauthorized` unless `caller` may mutate the catalog.
    async fn authorize(&self, caller: &AccountId) -> Result<()>;

    /// Whether token movement is currently suspended.
    fn paused(&self) -> bool;
}

pub type TokenLedgerBox = Box<dyn TokenLedger>;
pub type AccessControlBox = Box<dyn AccessControl>;
