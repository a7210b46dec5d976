use crate::domain::identity::Credits;
use crate::domain::payment::PayCode;
use crate::domain::stamp::{Stamp, StampCode};
use crate::error::{DutyError, Result};
use crate::registry::series::{KeyedSeries, Positioned};
use std::collections::HashMap;

impl Positioned for Stamp {
    fn position(&self) -> usize {
        self.index
    }
}

/// Catalog of stamp types plus the per-stamp list of payments settled
/// against each of them.
///
/// Stamps are created once and never deleted; the payment adjacency is kept
/// as its own table rather than inside the stamp record, with positional
/// lookup per stamp.
#[derive(Debug, Clone, Default)]
pub struct StampRegistry {
    series: KeyedSeries<StampCode, Stamp>,
    pay_links: HashMap<StampCode, KeyedSeries<PayCode, usize>>,
}

impl StampRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new stamp type. The initial lifecycle state is chosen by
    /// `active`; everything else is immutable after this call.
    pub fn create(
        &mut self,
        code: StampCode,
        name: String,
        price: Credits,
        regulation_ref: String,
        active: bool,
    ) -> Result<()> {
        if self.series.contains(&code) {
            return Err(DutyError::DuplicateKey(code.to_string()));
        }
        self.series.append_with(code, |index| Stamp {
            code,
            name,
            price,
            regulation_ref,
            index,
            active,
        });
        Ok(())
    }

    /// Flips the lifecycle flag. Re-applying the current state is rejected
    /// rather than silently accepted.
    pub fn set_active(&mut self, code: &StampCode, active: bool) -> Result<()> {
        if !self.series.contains(code) {
            return Err(DutyError::NotFound(code.to_string()));
        }
        let stamp = self
            .series
            .get_mut(code)
            .ok_or_else(|| DutyError::NotFound(code.to_string()))?;
        if stamp.active == active {
            let state = if active { "active" } else { "inactive" };
            return Err(DutyError::InvalidState(format!(
                "stamp {code} is already {state}"
            )));
        }
        stamp.active = active;
        Ok(())
    }

    pub fn exists(&self, code: &StampCode) -> bool {
        self.series.contains(code)
    }

    pub fn count(&self) -> usize {
        self.series.len()
    }

    pub fn codes(&self) -> &[StampCode] {
        self.series.keys()
    }

    pub fn get(&self, code: &StampCode) -> Result<&Stamp> {
        self.series
            .get(code)
            .ok_or_else(|| DutyError::NotFound(code.to_string()))
    }

    pub fn get_at(&self, pos: usize) -> Result<&Stamp> {
        let code = self
            .series
            .key_at(pos)
            .ok_or_else(|| DutyError::NotFound(format!("stamp index {pos}")))?;
        self.get(code)
    }

    /// Payment codes settled against `code`, in settlement order.
    pub fn pay_codes(&self, code: &StampCode) -> Result<Vec<PayCode>> {
        if !self.exists(code) {
            return Err(DutyError::NotFound(code.to_string()));
        }
        Ok(self
            .pay_links
            .get(code)
            .map(|links| links.keys().to_vec())
            .unwrap_or_default())
    }

    pub fn payments_count(&self, code: &StampCode) -> Result<usize> {
        if !self.exists(code) {
            return Err(DutyError::NotFound(code.to_string()));
        }
        Ok(self.pay_links.get(code).map_or(0, KeyedSeries::len))
    }

    pub fn payment_at(&self, code: &StampCode, pos: usize) -> Result<PayCode> {
        if !self.exists(code) {
            return Err(DutyError::NotFound(code.to_string()));
        }
        self.pay_links
            .get(code)
            .and_then(|links| links.key_at(pos))
            .cloned()
            .ok_or_else(|| DutyError::NotFound(format!("payment index {pos} of stamp {code}")))
    }

    /// Appends a settled payment to the stamp's list. Callers have already
    /// established that the stamp exists and the payment code is fresh.
    pub fn link_payment(&mut self, code: &StampCode, pay_code: PayCode) {
        self.pay_links
            .entry(*code)
            .or_default()
            .append_with(pay_code, |pos| pos);
    }
}
