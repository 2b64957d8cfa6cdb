//! Fee engine implementing the [`FeeCalculator`] trait.
//!
//! Computes the 1% transfer fee and applies the two legs of a transfer to
//! a [`Holding`]. Included legs move gons at the current rate and adjust the
//! included gons supply; excluded legs move fragments directly and adjust
//! the excluded fragments total. The fee itself is never credited: it simply
//! stays in the included pool's fragment count while its gons are gone, and
//! the next rate derivation spreads it over every included holder.

use sminem_core::constants::FEE_DIVISOR;
use sminem_core::error::LedgerError;
use sminem_core::traits::FeeCalculator;

use crate::ledger::Holding;

/// The production fee calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeeEngine;

impl FeeEngine {
    /// Create a new FeeEngine.
    pub fn new() -> Self {
        Self
    }

    /// Split `amount` into the fee and the net amount credited.
    pub fn split(&self, amount: u64) -> FeeSplit {
        let fee = self.fee(amount);
        FeeSplit {
            fee,
            net: amount - fee,
        }
    }

    /// Remove `amount` fragments from `holding`.
    ///
    /// The caller has already checked the displayed balance, so an included
    /// holding always covers `amount * rate` gons.
    pub fn debit(
        &self,
        holding: Holding,
        amount: u64,
        rate: u128,
        pool: &mut Pool,
    ) -> Result<Holding, LedgerError> {
        match holding {
            Holding::Included { gons } => {
                let delta = self.to_gons(amount, rate)?;
                let have = self.to_fragments(gons, rate)?;
                let gons = gons
                    .checked_sub(delta)
                    .ok_or(LedgerError::InsufficientBalance { have, need: amount })?;
                pool.gons_supply = pool
                    .gons_supply
                    .checked_sub(delta)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
                Ok(Holding::Included { gons })
            }
            Holding::Excluded { fragments } => {
                let remaining = fragments.checked_sub(amount).ok_or(
                    LedgerError::InsufficientBalance {
                        have: fragments,
                        need: amount,
                    },
                )?;
                pool.excluded_fragments = pool
                    .excluded_fragments
                    .checked_sub(amount)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
                Ok(Holding::Excluded {
                    fragments: remaining,
                })
            }
        }
    }

    /// Add `amount` fragments to `holding`.
    pub fn credit(
        &self,
        holding: Holding,
        amount: u64,
        rate: u128,
        pool: &mut Pool,
    ) -> Result<Holding, LedgerError> {
        match holding {
            Holding::Included { gons } => {
                let delta = self.to_gons(amount, rate)?;
                pool.gons_supply = pool
                    .gons_supply
                    .checked_add(delta)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
                Ok(Holding::Included {
                    gons: gons.checked_add(delta).ok_or(LedgerError::ArithmeticOverflow)?,
                })
            }
            Holding::Excluded { fragments } => {
                pool.excluded_fragments = pool
                    .excluded_fragments
                    .checked_add(amount)
                    .ok_or(LedgerError::ArithmeticOverflow)?;
                Ok(Holding::Excluded {
                    fragments: fragments
                        .checked_add(amount)
                        .ok_or(LedgerError::ArithmeticOverflow)?,
                })
            }
        }
    }
}

impl FeeCalculator for FeeEngine {
    fn fee(&self, amount: u64) -> u64 {
        amount / FEE_DIVISOR
    }

    fn rate(&self, gons_supply: u128, included_fragments: u64) -> Option<u128> {
        if included_fragments == 0 {
            return None;
        }
        let rate = gons_supply / included_fragments as u128;
        (rate > 0).then_some(rate)
    }
}

/// Result of splitting a transfer amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    /// Fragments withheld from the receiver.
    pub fee: u64,
    /// Fragments credited to the receiver.
    pub net: u64,
}

/// Pool totals the rate is derived from.
///
/// A working copy is threaded through both legs of a transfer and only
/// committed to the ledger once every leg has succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
    /// Sum of the gons balances of all included accounts.
    pub gons_supply: u128,
    /// Sum of the fragment balances of all excluded accounts.
    pub excluded_fragments: u64,
}
