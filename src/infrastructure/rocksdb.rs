use crate::application::engine::Snapshot;
use crate::domain::payment::Payment;
use crate::domain::stamp::Stamp;
use crate::error::{DutyError, Result};
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Column Family for stamp records.
pub const CF_STAMPS: &str = "stamps";
/// Column Family for payment records.
pub const CF_PAYMENTS: &str = "payments";
/// Column Family for the registry order lists.
pub const CF_META: &str = "meta";

const META_STAMP_ORDER: &[u8] = b"stamp_order";
const META_PAY_ORDER: &[u8] = b"pay_order";

/// Durable archive of the registry state using RocksDB.
///
/// Records are stored per key in their own Column Families; the creation
/// order of each series lives under the meta CF so positions survive a
/// reload. Ledger balances are not archived, they belong to the external
/// collaborator.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksArchive {
    db: Arc<DB>,
}

impl RocksArchive {
    /// Opens or creates an archive at the specified path, ensuring the
    /// required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_stamps = ColumnFamilyDescriptor::new(CF_STAMPS, Options::default());
        let cf_payments = ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_stamps, cf_payments, cf_meta])?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Writes the full snapshot. Existing records are overwritten in place;
    /// since both series are append-only this only ever grows the archive.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let cf_stamps = self.cf(CF_STAMPS)?;
        for stamp in &snapshot.stamps {
            self.db
                .put_cf(cf_stamps, stamp.code.to_string(), encode(stamp)?)?;
        }

        let cf_payments = self.cf(CF_PAYMENTS)?;
        for payment in &snapshot.payments {
            self.db
                .put_cf(cf_payments, payment.code.as_str(), encode(payment)?)?;
        }

        let cf_meta = self.cf(CF_META)?;
        let stamp_order: Vec<String> =
            snapshot.stamps.iter().map(|s| s.code.to_string()).collect();
        let pay_order: Vec<String> = snapshot
            .payments
            .iter()
            .map(|p| p.code.to_string())
            .collect();
        self.db
            .put_cf(cf_meta, META_STAMP_ORDER, encode(&stamp_order)?)?;
        self.db.put_cf(cf_meta, META_PAY_ORDER, encode(&pay_order)?)?;

        Ok(())
    }

    /// Reads the archived snapshot back, records in their original order.
    /// An archive that was never written to loads as an empty snapshot.
    pub fn load(&self) -> Result<Snapshot> {
        let cf_meta = self.cf(CF_META)?;
        let stamp_order: Vec<String> = match self.db.get_cf(cf_meta, META_STAMP_ORDER)? {
            Some(bytes) => decode(&bytes)?,
            None => Vec::new(),
        };
        let pay_order: Vec<String> = match self.db.get_cf(cf_meta, META_PAY_ORDER)? {
            Some(bytes) => decode(&bytes)?,
            None => Vec::new(),
        };

        let cf_stamps = self.cf(CF_STAMPS)?;
        let mut stamps: Vec<Stamp> = Vec::with_capacity(stamp_order.len());
        for code in &stamp_order {
            let bytes = self
                .db
                .get_cf(cf_stamps, code)?
                .ok_or_else(|| DutyError::NotFound(code.clone()))?;
            stamps.push(decode(&bytes)?);
        }

        let cf_payments = self.cf(CF_PAYMENTS)?;
        let mut payments: Vec<Payment> = Vec::with_capacity(pay_order.len());
        for code in &pay_order {
            let bytes = self
                .db
                .get_cf(cf_payments, code)?
                .ok_or_else(|| DutyError::NotFound(code.clone()))?;
            payments.push(decode(&bytes)?);
        }

        Ok(Snapshot { stamps, payments })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            DutyError::Io(io::Error::other(format!("{name} column family not found")))
        })
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        DutyError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("serialization error: {e}"),
        ))
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        DutyError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("deserialization error: {e}"),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::{AccountId, Credits};
    use crate::domain::payment::PayCode;
    use crate::domain::stamp::StampCode;
    use tempfile::tempdir;

    fn sample_snapshot() -> Snapshot {
        let code = StampCode::parse("S1").unwrap();
        Snapshot {
            stamps: vec![Stamp {
                code,
                name: "Revenue Stamp 5000".to_string(),
                price: Credits::new(5000),
                regulation_ref: "PP-2021-57".to_string(),
                index: 0,
                active: true,
            }],
            payments: vec![Payment {
                code: PayCode::new("P1"),
                doc_hash: "hashA".to_string(),
                index: 0,
                payer: AccountId::new("alice"),
                stamp: code,
                bloom: "bloomA".to_string(),
            }],
        }
    }

    #[test]
    fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let archive = RocksArchive::open(dir.path()).expect("Failed to open archive");

        assert!(archive.db.cf_handle(CF_STAMPS).is_some());
        assert!(archive.db.cf_handle(CF_PAYMENTS).is_some());
        assert!(archive.db.cf_handle(CF_META).is_some());
    }

    #[test]
    fn test_empty_archive_loads_empty_snapshot() {
        let dir = tempdir().unwrap();
        let archive = RocksArchive::open(dir.path()).unwrap();

        let snapshot = archive.load().unwrap();
        assert!(snapshot.stamps.is_empty());
        assert!(snapshot.payments.is_empty());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let snapshot = sample_snapshot();

        {
            let archive = RocksArchive::open(dir.path()).unwrap();
            archive.save(&snapshot).unwrap();
        }

        // Reopen from disk.
        let archive = RocksArchive::open(dir.path()).unwrap();
        let loaded = archive.load().unwrap();
        assert_eq!(loaded.stamps, snapshot.stamps);
        assert_eq!(loaded.payments, snapshot.payments);
    }
}
