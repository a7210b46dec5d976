use crate::domain::identity::{AccountId, Credits};
use crate::domain::payment::{PayCode, Payment};
use crate::domain::stamp::{Stamp, StampCode};
use crate::domain::ports::{AccessControlBox, TokenLedgerBox};
use crate::error::{DutyError, Result};
use crate::registry::payments::PaymentRegistry;
use crate::registry::stamps::StampRegistry;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
struct RegistryState {
    stamps: StampRegistry,
    payments: PaymentRegistry,
}

/// Point-in-time copy of both registries, in creation order. Used by the
/// durable archive and the report writer.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub stamps: Vec<Stamp>,
    pub payments: Vec<Payment>,
}

/// The stamp-duty engine: stamp catalog, payment ledger and the atomic
/// settlement between them.
///
/// Both registries live behind a single writer lock. `create_payment` holds
/// the write guard across the ledger transfer, so the balance check, the
/// debit and the registry commit cannot interleave with another settlement.
/// Reads take the read guard and see the last committed state.
pub struct DutyEngine {
    state: RwLock<RegistryState>,
    ledger: TokenLedgerBox,
    access: AccessControlBox,
}

impl DutyEngine {
    /// Creates an engine with empty registries.
    ///
    /// # Arguments
    ///
    /// * `ledger` - The fungible-credit ledger settlements are drawn from.
    /// * `access` - The gate authorizing catalog mutations.
    pub fn new(ledger: TokenLedgerBox, access: AccessControlBox) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            ledger,
            access,
        }
    }

    /// Rebuilds an engine from an archived snapshot. Stamps and payments
    /// are replayed in their original order, so all positions come out as
    /// they were recorded.
    pub fn restore(
        ledger: TokenLedgerBox,
        access: AccessControlBox,
        snapshot: Snapshot,
    ) -> Result<Self> {
        let mut state = RegistryState::default();
        for stamp in snapshot.stamps {
            state.stamps.create(
                stamp.code,
                stamp.name,
                stamp.price,
                stamp.regulation_ref,
                stamp.active,
            )?;
        }
        for payment in snapshot.payments {
            if !state.stamps.exists(&payment.stamp) {
                return Err(DutyError::NotFound(payment.stamp.to_string()));
            }
            if state.payments.exists(&payment.code) {
                return Err(DutyError::DuplicateKey(payment.code.to_string()));
            }
            state.stamps.link_payment(&payment.stamp, payment.code.clone());
            state.payments.commit(
                payment.code,
                payment.doc_hash,
                payment.payer,
                payment.stamp,
                payment.bloom,
            );
        }
        Ok(Self {
            state: RwLock::new(state),
            ledger,
            access,
        })
    }

    /// Registers a new stamp type. Owner-only.
    pub async fn create_stamp(
        &self,
        caller: &AccountId,
        code: StampCode,
        name: String,
        price: Credits,
        regulation_ref: String,
        active: bool,
    ) -> Result<()> {
        self.access.authorize(caller).await?;
        let mut state = self.state.write().await;
        state
            .stamps
            .create(code, name, price, regulation_ref, active)?;
        info!(stamp = %code, price = %price, active, "stamp registered");
        Ok(())
    }

    /// Marks a stamp as available for settlement. Owner-only.
    pub async fn activate_stamp(&self, caller: &AccountId, code: &StampCode) -> Result<()> {
        self.set_stamp_active(caller, code, true).await
    }

    /// Withdraws a stamp from settlement without deleting it. Owner-only.
    pub async fn deactivate_stamp(&self, caller: &AccountId, code: &StampCode) -> Result<()> {
        self.set_stamp_active(caller, code, false).await
    }

    async fn set_stamp_active(
        &self,
        caller: &AccountId,
        code: &StampCode,
        active: bool,
    ) -> Result<()> {
        self.access.authorize(caller).await?;
        let mut state = self.state.write().await;
        state.stamps.set_active(code, active)?;
        debug!(stamp = %code, active, "stamp lifecycle changed");
        Ok(())
    }

    /// Settles stamp duty: debits the payer by the stamp's price in favor
    /// of the authority and records the payment, as one indivisible unit.
    ///
    /// The checks run in a fixed order and the call short-circuits at the
    /// first violation with no observable effect. The ledger transfer is
    /// the single external side effect; the registry commit below it is
    /// plain in-memory bookkeeping on pre-validated state and cannot fail,
    /// which is what makes "both or neither" hold without a rollback path.
    pub async fn create_payment(
        &self,
        payer: &AccountId,
        pay_code: PayCode,
        doc_hash: String,
        stamp_code: StampCode,
        bloom: String,
    ) -> Result<()> {
        let mut state = self.state.write().await;

        if state.payments.exists(&pay_code) {
            return Err(DutyError::DuplicateKey(pay_code.to_string()));
        }
        if !state.stamps.exists(&stamp_code) {
            return Err(DutyError::NotFound(stamp_code.to_string()));
        }
        let price = {
            let stamp = state.stamps.get(&stamp_code)?;
            if !stamp.active {
                return Err(DutyError::InactiveReference(stamp_code.to_string()));
            }
            stamp.price
        };
        if pay_code.is_empty() {
            return Err(DutyError::EmptyField("pay code"));
        }
        if doc_hash.is_empty() {
            return Err(DutyError::EmptyField("document hash"));
        }
        let balance = self.ledger.balance_of(payer).await?;
        if balance < price {
            return Err(DutyError::InsufficientFunds {
                required: price.value(),
                available: balance.value(),
            });
        }

        let authority = self.ledger.authority();
        self.ledger.transfer(payer, &authority, price).await?;

        // Funds have moved; from here on nothing may fail.
        state.payments.commit(
            pay_code.clone(),
            doc_hash,
            payer.clone(),
            stamp_code,
            bloom,
        );
        state.stamps.link_payment(&stamp_code, pay_code.clone());
        info!(
            payment = %pay_code,
            stamp = %stamp_code,
            payer = %payer,
            amount = %price,
            "stamp duty settled"
        );
        Ok(())
    }

    pub async fn stamp_count(&self) -> usize {
        self.state.read().await.stamps.count()
    }

    pub async fn stamp_codes(&self) -> Vec<StampCode> {
        self.state.read().await.stamps.codes().to_vec()
    }

    pub async fn stamp_detail(&self, code: &StampCode) -> Result<Stamp> {
        self.state.read().await.stamps.get(code).cloned()
    }

    pub async fn stamp_detail_at(&self, pos: usize) -> Result<Stamp> {
        self.state.read().await.stamps.get_at(pos).cloned()
    }

    pub async fn stamp_pay_codes(&self, code: &StampCode) -> Result<Vec<PayCode>> {
        self.state.read().await.stamps.pay_codes(code)
    }

    pub async fn payments_of_stamp_count(&self, code: &StampCode) -> Result<usize> {
        self.state.read().await.stamps.payments_count(code)
    }

    pub async fn payment_of_stamp_at(&self, code: &StampCode, pos: usize) -> Result<PayCode> {
        self.state.read().await.stamps.payment_at(code, pos)
    }

    pub async fn is_stamp(&self, code: &StampCode) -> bool {
        self.state.read().await.stamps.exists(code)
    }

    pub async fn payment_count(&self) -> usize {
        self.state.read().await.payments.count()
    }

    pub async fn pay_codes(&self) -> Vec<PayCode> {
        self.state.read().await.payments.codes().to_vec()
    }

    pub async fn payment_detail(&self, code: &PayCode) -> Result<Payment> {
        self.state.read().await.payments.get(code).cloned()
    }

    pub async fn is_payment(&self, code: &PayCode) -> bool {
        self.state.read().await.payments.exists(code)
    }

    /// Copies both registries in creation order.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.state.read().await;
        let stamps = state
            .stamps
            .codes()
            .iter()
            .filter_map(|code| state.stamps.get(code).ok().cloned())
            .collect();
        let payments = state
            .payments
            .codes()
            .iter()
            .filter_map(|code| state.payments.get(code).ok().cloned())
            .collect();
        Snapshot { stamps, payments }
    }
}
