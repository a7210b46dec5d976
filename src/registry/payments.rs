use crate::domain::identity::AccountId;
use crate::domain::payment::{PayCode, Payment};
use crate::domain::stamp::StampCode;
use crate::error::{DutyError, Result};
use crate::registry::series::{KeyedSeries, Positioned};

impl Positioned for Payment {
    fn position(&self) -> usize {
        self.index
    }
}

/// Ledger of settled payments.
///
/// Records are immutable once committed; the registry only ever appends.
/// Referential integrity against the stamp catalog is established by the
/// settlement sequence before `commit` runs.
#[derive(Debug, Clone, Default)]
pub struct PaymentRegistry {
    series: KeyedSeries<PayCode, Payment>,
}

impl PaymentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, code: &PayCode) -> bool {
        self.series.contains(code)
    }

    pub fn count(&self) -> usize {
        self.series.len()
    }

    pub fn codes(&self) -> &[PayCode] {
        self.series.keys()
    }

    pub fn get(&self, code: &PayCode) -> Result<&Payment> {
        self.series
            .get(code)
            .ok_or_else(|| DutyError::NotFound(code.to_string()))
    }

    /// Appends the record for a settled payment. Must not fail: by the time
    /// the funds have moved there is no compensating action, so callers
    /// have already ruled out a duplicate code.
    pub fn commit(
        &mut self,
        code: PayCode,
        doc_hash: String,
        payer: AccountId,
        stamp: StampCode,
        bloom: String,
    ) {
        self.series.append_with(code.clone(), |index| Payment {
            code,
            doc_hash,
            index,
            payer,
            stamp,
            bloom,
        });
    }
}
