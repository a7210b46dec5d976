use crate::error::{DutyError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum OpKind {
    /// Seed a payer balance on the reference ledger.
    Fund,
    CreateStamp,
    Activate,
    Deactivate,
    Pay,
}

/// One driver operation. Which fields are meaningful depends on `op`;
/// everything else stays empty in the CSV row.
#[derive(Debug, Deserialize, Clone)]
pub struct OpRecord {
    pub op: OpKind,
    /// Payer for `pay`/`fund`, caller override for catalog mutations.
    pub account: Option<String>,
    /// Stamp code for catalog ops, payment code for `pay`.
    pub code: Option<String>,
    /// Referenced stamp for `pay`.
    pub stamp: Option<String>,
    /// Credits: stamp price or funding amount.
    pub amount: Option<u64>,
    pub name: Option<String>,
    pub reg_ref: Option<String>,
    pub active: Option<bool>,
    pub doc_hash: Option<String>,
    pub bloom: Option<String>,
}

/// Reads operations from a CSV source.
///
/// Wraps `csv::Reader` and provides an iterator over `Result<OpRecord>`,
/// trimming whitespace and tolerating short rows so the input can stay
/// hand-editable.
pub struct OpReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OpReader<R> {
    /// Creates a new `OpReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes operations.
    pub fn operations(self) -> impl Iterator<Item = Result<OpRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(DutyError::from))
    }
}
