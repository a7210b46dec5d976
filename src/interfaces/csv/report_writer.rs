use crate::application::engine::Snapshot;
use crate::domain::identity::{AccountId, Credits};
use crate::domain::stamp::StampCode;
use crate::error::Result;
use std::collections::HashMap;
use std::io::Write;

/// Writes the final registry and ledger state as a sectioned CSV report:
/// stamps, payments, balances.
pub struct ReportWriter<W: Write> {
    inner: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_report(
        &mut self,
        snapshot: &Snapshot,
        balances: &[(AccountId, Credits)],
    ) -> Result<()> {
        let mut settled: HashMap<StampCode, usize> = HashMap::new();
        for payment in &snapshot.payments {
            *settled.entry(payment.stamp).or_insert(0) += 1;
        }

        {
            let mut w = csv::Writer::from_writer(&mut self.inner);
            w.write_record(["stamp", "name", "price", "active", "payments"])?;
            for stamp in &snapshot.stamps {
                w.write_record([
                    stamp.code.to_string(),
                    stamp.name.clone(),
                    stamp.price.to_string(),
                    stamp.active.to_string(),
                    settled.get(&stamp.code).copied().unwrap_or(0).to_string(),
                ])?;
            }
            w.flush()?;
        }
        self.inner.write_all(b"\n")?;

        {
            let mut w = csv::Writer::from_writer(&mut self.inner);
            w.write_record(["payment", "stamp", "payer", "doc_hash", "bloom"])?;
            for payment in &snapshot.payments {
                w.write_record([
                    payment.code.to_string(),
                    payment.stamp.to_string(),
                    payment.payer.to_string(),
                    payment.doc_hash.clone(),
                    payment.bloom.clone(),
                ])?;
            }
            w.flush()?;
        }
        self.inner.write_all(b"\n")?;

        {
            let mut w = csv::Writer::from_writer(&mut self.inner);
            w.write_record(["account", "balance"])?;
            for (account, balance) in balances {
                w.write_record([account.to_string(), balance.to_string()])?;
            }
            w.flush()?;
        }

        Ok(())
    }
}
