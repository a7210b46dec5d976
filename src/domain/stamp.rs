use crate::domain::identity::Credits;
use crate::error::{DutyError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Width of a stamp code in bytes.
pub const STAMP_CODE_LEN: usize = 16;

/// Fixed-size opaque key identifying a stamp type.
///
/// Shorter codes are right-padded with zero bytes, so `"SD5000"` and the
/// padded form compare equal. The contents are never interpreted beyond
/// equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StampCode([u8; STAMP_CODE_LEN]);

impl StampCode {
    pub fn parse(code: &str) -> Result<Self> {
        let bytes = code.as_bytes();
        if bytes.len() > STAMP_CODE_LEN {
            return Err(DutyError::MalformedKey(format!(
                "stamp code {code:?} exceeds {STAMP_CODE_LEN} bytes"
            )));
        }
        if bytes.contains(&0) {
            return Err(DutyError::MalformedKey(format!(
                "stamp code {code:?} contains a NUL byte"
            )));
        }
        let mut buf = [0u8; STAMP_CODE_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(buf))
    }

    pub fn as_bytes(&self) -> &[u8; STAMP_CODE_LEN] {
        &self.0
    }
}

impl fmt::Display for StampCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(STAMP_CODE_LEN);
        f.write_str(&String::from_utf8_lossy(&self.0[..end]))
    }
}

impl FromStr for StampCode {
    type Err = DutyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for StampCode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for StampCode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        StampCode::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A catalog entry for one taxable-document category.
///
/// Created once, never deleted; only `active` ever changes afterwards.
/// `index` is the stamp's position in the registry's sequential code list
/// and must always satisfy `codes[index] == code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    pub code: StampCode,
    pub name: String,
    pub price: Credits,
    pub regulation_ref: String,
    pub index: usize,
    pub active: bool,
}
