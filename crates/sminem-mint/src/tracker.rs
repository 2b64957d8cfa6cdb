//! Mint entitlement accrued from a transfer counter.
//!
//! The open segment earns `floor((count - opened_at) / multiplicity) *
//! units_per_threshold`; closed segments are frozen in the last
//! checkpoint's `accrued_before`. Two rules keep the result independent of
//! how calls interleave:
//!
//! - A parameter or source change closes the segment at the current count.
//!   Transfers past the last whole threshold are forfeited, so the new
//!   parameters only ever see transfers made after the change.
//! - A mint closes the segment at the last whole threshold. The partial
//!   threshold is carried into the next segment, so minting never costs
//!   progress.

use serde::Serialize;
use sminem_core::address::Address;
use sminem_core::error::MintError;
use sminem_core::traits::TransferCounter;
use tracing::{debug, info, warn};

use crate::checkpoint::{Checkpoint, CheckpointKind, CheckpointLog};

/// Per-deployment entitlement state.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct MintEntitlementTracker {
    source: Address,
    checkpoints: CheckpointLog,
    consumed_units: u64,
}

/// Read-only view of the tracker for status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntitlementSummary {
    pub source: Address,
    pub transfers_multiplicity: u64,
    pub units_per_threshold: u64,
    pub accrued_units: u64,
    pub consumed_units: u64,
    pub possible_mints: u64,
    pub checkpoints: usize,
}

impl MintEntitlementTracker {
    /// Start tracking `counter` from its current value.
    ///
    /// Transfers made before construction do not accrue.
    pub fn new(
        counter: &dyn TransferCounter,
        transfers_multiplicity: u64,
        units_per_threshold: u64,
    ) -> Result<Self, MintError> {
        let source = counter.source_address();
        if source.is_zero() {
            return Err(MintError::ZeroAddress);
        }
        if transfers_multiplicity == 0 || units_per_threshold == 0 {
            return Err(MintError::ZeroValue);
        }
        let start = counter.transfer_count();
        Ok(Self {
            source,
            checkpoints: CheckpointLog::new(Checkpoint {
                kind: CheckpointKind::Genesis,
                closed_at: start,
                opened_at: start,
                multiplicity: transfers_multiplicity,
                units_per_threshold,
                accrued_before: 0,
            }),
            consumed_units: 0,
        })
    }

    pub fn source(&self) -> Address {
        self.source
    }

    pub fn transfers_multiplicity(&self) -> u64 {
        self.checkpoints.last().multiplicity
    }

    pub fn units_per_threshold(&self) -> u64 {
        self.checkpoints.last().units_per_threshold
    }

    pub fn consumed_units(&self) -> u64 {
        self.consumed_units
    }

    pub fn checkpoints(&self) -> &CheckpointLog {
        &self.checkpoints
    }

    /// Units accrued since construction, consumed or not.
    pub fn accrued_units(&self, counter: &dyn TransferCounter) -> Result<u64, MintError> {
        let now = self.observe(counter)?;
        Ok(self.accrued_at(now))
    }

    /// Units still available to mint.
    pub fn possible_mints_amount(&self, counter: &dyn TransferCounter) -> Result<u64, MintError> {
        Ok(self.accrued_units(counter)?.saturating_sub(self.consumed_units))
    }

    /// Recompute accrual by replaying every checkpoint.
    ///
    /// Returns `(cached, replayed)`; the two agree unless the log has been
    /// tampered with.
    pub fn audit_accrued_units(&self, counter: &dyn TransferCounter) -> Result<(u64, u64), MintError> {
        let now = self.observe(counter)?;
        let cached = self.accrued_at(now);
        let replayed = self.checkpoints.replay(now).unwrap_or(u64::MAX);
        if cached != replayed {
            warn!(cached, replayed, "checkpoint replay disagrees with cached accrual");
        }
        Ok((cached, replayed))
    }

    pub fn summary(&self, counter: &dyn TransferCounter) -> Result<EntitlementSummary, MintError> {
        let accrued = self.accrued_units(counter)?;
        Ok(EntitlementSummary {
            source: self.source,
            transfers_multiplicity: self.transfers_multiplicity(),
            units_per_threshold: self.units_per_threshold(),
            accrued_units: accrued,
            consumed_units: self.consumed_units,
            possible_mints: accrued.saturating_sub(self.consumed_units),
            checkpoints: self.checkpoints.len(),
        })
    }

    /// Change the transfers-per-threshold divisor for future transfers.
    pub fn set_transfers_multiplicity(
        &mut self,
        value: u64,
        counter: &dyn TransferCounter,
    ) -> Result<(), MintError> {
        if value == 0 {
            return Err(MintError::ZeroValue);
        }
        if value == self.transfers_multiplicity() {
            return Err(MintError::NoOpChange);
        }
        let units = self.units_per_threshold();
        self.close_segment(CheckpointKind::Multiplicity, value, units, counter)?;
        info!(transfers_multiplicity = value, "multiplicity updated");
        Ok(())
    }

    /// Change the units granted per threshold for future transfers.
    pub fn set_units_per_threshold(
        &mut self,
        value: u64,
        counter: &dyn TransferCounter,
    ) -> Result<(), MintError> {
        if value == 0 {
            return Err(MintError::ZeroValue);
        }
        if value == self.units_per_threshold() {
            return Err(MintError::NoOpChange);
        }
        let multiplicity = self.transfers_multiplicity();
        self.close_segment(CheckpointKind::UnitsPerThreshold, multiplicity, value, counter)?;
        info!(units_per_threshold = value, "units per threshold updated");
        Ok(())
    }

    /// Switch to another ledger's counter.
    ///
    /// Accrual against `current` is frozen; `next` only counts from its
    /// present value onward.
    pub fn set_token_source(
        &mut self,
        current: &dyn TransferCounter,
        next: &dyn TransferCounter,
    ) -> Result<(), MintError> {
        let address = next.source_address();
        if address.is_zero() {
            return Err(MintError::ZeroAddress);
        }
        if address == self.source {
            return Err(MintError::NoOpChange);
        }
        let closed_at = self.observe(current)?;
        let last = *self.checkpoints.last();
        let accrued = self.accrued_at(closed_at);
        self.checkpoints.push(Checkpoint {
            kind: CheckpointKind::SourceChange,
            closed_at,
            opened_at: next.transfer_count(),
            multiplicity: last.multiplicity,
            units_per_threshold: last.units_per_threshold,
            accrued_before: accrued,
        });
        info!(from = %self.source, to = %address, "token source switched");
        self.source = address;
        Ok(())
    }

    /// Spend `units` of entitlement.
    pub fn consume(&mut self, units: u64, counter: &dyn TransferCounter) -> Result<(), MintError> {
        let now = self.observe(counter)?;
        let accrued = self.accrued_at(now);
        let available = accrued.saturating_sub(self.consumed_units);
        if units > available {
            return Err(MintError::ExceedsEntitlement {
                requested: units,
                available,
            });
        }
        let last = *self.checkpoints.last();
        let boundary = now - last.remainder(now);
        self.checkpoints.push(Checkpoint {
            kind: CheckpointKind::Consumption,
            closed_at: boundary,
            opened_at: boundary,
            multiplicity: last.multiplicity,
            units_per_threshold: last.units_per_threshold,
            accrued_before: accrued,
        });
        self.consumed_units += units;
        debug!(units, remaining = available - units, "entitlement consumed");
        Ok(())
    }

    fn close_segment(
        &mut self,
        kind: CheckpointKind,
        multiplicity: u64,
        units_per_threshold: u64,
        counter: &dyn TransferCounter,
    ) -> Result<(), MintError> {
        let now = self.observe(counter)?;
        let accrued = self.accrued_at(now);
        self.checkpoints.push(Checkpoint {
            kind,
            closed_at: now,
            opened_at: now,
            multiplicity,
            units_per_threshold,
            accrued_before: accrued,
        });
        Ok(())
    }

    fn accrued_at(&self, now: u64) -> u64 {
        let last = self.checkpoints.last();
        let earned = last.earned(now).unwrap_or(u64::MAX);
        last.accrued_before.saturating_add(earned)
    }

    /// Read the counter, clamped to the open segment's start.
    fn observe(&self, counter: &dyn TransferCounter) -> Result<u64, MintError> {
        let got = counter.source_address();
        if got != self.source {
            return Err(MintError::SourceMismatch {
                expected: self.source,
                got,
            });
        }
        let raw = counter.transfer_count();
        let start = self.checkpoints.last().opened_at;
        if raw < start {
            warn!(raw, start, "transfer counter went backwards; treating as no progress");
            return Ok(start);
        }
        Ok(raw)
    }
}
