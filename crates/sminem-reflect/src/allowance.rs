//! Spender allowances.

use std::collections::BTreeMap;

use sminem_core::address::Address;
use sminem_core::error::LedgerError;
use tracing::debug;

/// `(owner, spender) -> remaining` approvals.
#[derive(Debug, Clone, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct AllowanceBook {
    entries: BTreeMap<(Address, Address), u64>,
}

impl AllowanceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining amount `spender` may move out of `owner`.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.entries.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Overwrite the allowance.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: u64) -> Result<(), LedgerError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.set(owner, spender, amount);
        debug!(%owner, %spender, amount, "allowance approved");
        Ok(())
    }

    /// Raise the allowance by `added`, returning the new value.
    pub fn increase(&mut self, owner: Address, spender: Address, added: u64) -> Result<u64, LedgerError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let next = self
            .allowance(&owner, &spender)
            .checked_add(added)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        self.set(owner, spender, next);
        Ok(next)
    }

    /// Lower the allowance by `subtracted`, returning the new value.
    ///
    /// Fails with [`LedgerError::InsufficientAllowance`] rather than clamping.
    pub fn decrease(&mut self, owner: Address, spender: Address, subtracted: u64) -> Result<u64, LedgerError> {
        let next = self.remaining_after(&owner, &spender, subtracted)?;
        self.set(owner, spender, next);
        Ok(next)
    }

    /// Allowance left after spending `amount`, without mutating anything.
    pub fn remaining_after(&self, owner: &Address, spender: &Address, amount: u64) -> Result<u64, LedgerError> {
        let have = self.allowance(owner, spender);
        have.checked_sub(amount)
            .ok_or(LedgerError::InsufficientAllowance { have, need: amount })
    }

    pub(crate) fn set(&mut self, owner: Address, spender: Address, amount: u64) {
        if amount == 0 {
            self.entries.remove(&(owner, spender));
        } else {
            self.entries.insert((owner, spender), amount);
        }
    }
}
