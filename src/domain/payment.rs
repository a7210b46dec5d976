use crate::domain::identity::AccountId;
use crate::domain::stamp::StampCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key identifying a recorded payment.
///
/// Emptiness is deliberately not rejected here: the settlement sequence
/// checks for duplicates before it checks for empty fields, so an empty
/// code must be representable up to that point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayCode(String);

impl PayCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PayCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// One settled stamp-duty payment.
///
/// Immutable once recorded: there is no update, cancellation or
/// re-settlement. `stamp` referenced an existing, active stamp at the moment
/// of creation; the record survives even if that stamp is deactivated later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub code: PayCode,
    /// Digest of the taxed document.
    pub doc_hash: String,
    pub index: usize,
    pub payer: AccountId,
    pub stamp: StampCode,
    /// Approximate-match fingerprint of the document, kept for later fuzzy
    /// verification against a claimed copy.
    pub bloom: String,
}
