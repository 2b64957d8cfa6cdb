//! The reflection ledger.
//!
//! Included accounts hold gons and display `gons / rate` fragments; excluded
//! accounts hold fragments directly and never see the rate. The rate is
//! always `gons_supply / (total_fragments - excluded_fragments)`, truncated,
//! and is re-derived once at the end of every transfer. Exclusion and
//! inclusion convert an account at the rate in force at that instant and
//! leave the rate untouched, which is what keeps inclusion from minting
//! value out of a stale snapshot.

use std::collections::BTreeMap;

use sminem_core::address::Address;
use sminem_core::constants::total_gons_for;
use sminem_core::error::LedgerError;
use sminem_core::traits::{FeeCalculator, TransferCounter};
use tracing::{debug, info, warn};

use crate::allowance::AllowanceBook;
use crate::fee::{FeeEngine, Pool};

const ENGINE: FeeEngine = FeeEngine;

/// Balance representation of a single account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub enum Holding {
    /// Participates in the rate; fragment balance is `gons / rate`.
    Included { gons: u128 },
    /// Immune to the rate; fragment balance is stored as-is.
    Excluded { fragments: u64 },
}

impl Default for Holding {
    fn default() -> Self {
        Holding::Included { gons: 0 }
    }
}

impl Holding {
    /// Whether this account is excluded from reflection.
    pub fn is_excluded(&self) -> bool {
        matches!(self, Holding::Excluded { .. })
    }
}

/// Fungible ledger with implicit fee redistribution.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct ReflectionLedger {
    /// Address of this ledger; doubles as the transfer-counter source.
    address: Address,
    /// Nominal supply in fragments. Never changed by transfers.
    total_fragments: u64,
    /// Gons minted at creation (largest multiple of the supply in a `u128`).
    total_gons: u128,
    /// Current gons-per-fragment rate for included accounts. Never zero.
    rate: u128,
    /// Sum of the gons balances of all included accounts.
    gons_supply: u128,
    /// Sum of the fragment balances of all excluded accounts.
    excluded_fragments: u64,
    /// Accounts that ever held a balance or were excluded.
    holdings: BTreeMap<Address, Holding>,
    allowances: AllowanceBook,
    /// Successful transfers so far.
    transfer_count: u64,
}

impl ReflectionLedger {
    /// Create a ledger with the whole supply held by `owner` (included).
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAddress`] if `address` or `owner` is null
    /// - [`LedgerError::ZeroAmount`] if `total_fragments` is zero
    pub fn new(address: Address, owner: Address, total_fragments: u64) -> Result<Self, LedgerError> {
        if address.is_zero() || owner.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let total_gons = total_gons_for(total_fragments).ok_or(LedgerError::ZeroAmount)?;
        let rate = total_gons / total_fragments as u128;

        let mut holdings = BTreeMap::new();
        holdings.insert(owner, Holding::Included { gons: total_gons });

        info!(%address, %owner, total_fragments, "reflection ledger created");

        Ok(Self {
            address,
            total_fragments,
            total_gons,
            rate,
            gons_supply: total_gons,
            excluded_fragments: 0,
            holdings,
            allowances: AllowanceBook::new(),
            transfer_count: 0,
        })
    }

    /// Address of this ledger.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Nominal supply in fragments.
    pub fn total_supply(&self) -> u64 {
        self.total_fragments
    }

    /// Gons minted at creation.
    pub fn total_gons(&self) -> u128 {
        self.total_gons
    }

    /// Current gons-per-fragment rate.
    pub fn rate(&self) -> u128 {
        self.rate
    }

    /// Sum of the gons balances of all included accounts.
    pub fn included_gons_total(&self) -> u128 {
        self.gons_supply
    }

    /// Sum of the fragment balances of all excluded accounts.
    pub fn excluded_fragments_total(&self) -> u64 {
        self.excluded_fragments
    }

    /// Fragments attributed to the included pool.
    pub fn included_fragments(&self) -> u64 {
        self.total_fragments - self.excluded_fragments
    }

    /// Representation of `account` (included with zero gons if never seen).
    pub fn holding(&self, account: &Address) -> Holding {
        self.holdings.get(account).copied().unwrap_or_default()
    }

    /// Whether `account` is excluded from reflection.
    pub fn is_excluded(&self, account: &Address) -> bool {
        self.holding(account).is_excluded()
    }

    /// All known accounts in address order.
    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &Holding)> {
        self.holdings.iter()
    }

    /// Displayed fragment balance of `account`.
    pub fn balance_of(&self, account: &Address) -> u64 {
        match self.holding(account) {
            Holding::Excluded { fragments } => fragments,
            Holding::Included { gons } => (gons / self.rate).min(u64::MAX as u128) as u64,
        }
    }

    /// Spender allowances granted by holders.
    pub fn allowances(&self) -> &AllowanceBook {
        &self.allowances
    }

    /// Remaining amount `spender` may move out of `owner`.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.allowances.allowance(owner, spender)
    }

    /// Set the allowance of `spender` over `owner`'s balance.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: u64) -> Result<(), LedgerError> {
        self.allowances.approve(owner, spender, amount)
    }

    /// Raise an allowance by `added`.
    pub fn increase_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        added: u64,
    ) -> Result<u64, LedgerError> {
        self.allowances.increase(owner, spender, added)
    }

    /// Lower an allowance by `subtracted`.
    pub fn decrease_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        subtracted: u64,
    ) -> Result<u64, LedgerError> {
        self.allowances.decrease(owner, spender, subtracted)
    }

    /// Move `amount` fragments from `sender` to `receiver`, withholding the fee.
    ///
    /// Returns the net amount credited to `receiver`. The fee is never paid
    /// out; re-deriving the rate afterwards spreads it over all included
    /// holders (the sender and receiver included).
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAddress`] if either party is null
    /// - [`LedgerError::ZeroAmount`] if `amount` is zero
    /// - [`LedgerError::InsufficientBalance`] if `sender` holds less than `amount`
    /// - [`LedgerError::ArithmeticOverflow`] if a pool total would overflow
    pub fn transfer(
        &mut self,
        sender: Address,
        receiver: Address,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        if sender.is_zero() || receiver.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let have = self.balance_of(&sender);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }

        let split = ENGINE.split(amount);
        let mut pool = Pool {
            gons_supply: self.gons_supply,
            excluded_fragments: self.excluded_fragments,
        };

        let sender_after = ENGINE.debit(self.holding(&sender), amount, self.rate, &mut pool)?;
        let receiver_before = if receiver == sender {
            sender_after
        } else {
            self.holding(&receiver)
        };
        let receiver_after = ENGINE.credit(receiver_before, split.net, self.rate, &mut pool)?;

        let included = self
            .total_fragments
            .checked_sub(pool.excluded_fragments)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let transfer_count = self
            .transfer_count
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let rate = match ENGINE.rate(pool.gons_supply, included) {
            Some(rate) => rate,
            None => {
                warn!(
                    gons_supply = %pool.gons_supply,
                    included,
                    "degenerate included pool, keeping previous rate"
                );
                self.rate
            }
        };

        self.holdings.insert(sender, sender_after);
        self.holdings.insert(receiver, receiver_after);
        self.gons_supply = pool.gons_supply;
        self.excluded_fragments = pool.excluded_fragments;
        self.rate = rate;
        self.transfer_count = transfer_count;

        debug!(
            %sender,
            %receiver,
            amount,
            fee = split.fee,
            net = split.net,
            rate = %rate,
            "transfer applied"
        );
        Ok(split.net)
    }

    /// Spend `spender`'s allowance over `owner` and transfer.
    ///
    /// The allowance is only consumed if the transfer succeeds.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientAllowance`] if the allowance is below `amount`
    /// - any error of [`transfer`](Self::transfer)
    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        receiver: Address,
        amount: u64,
    ) -> Result<u64, LedgerError> {
        let remaining = self.allowances.remaining_after(&owner, &spender, amount)?;
        let net = self.transfer(owner, receiver, amount)?;
        self.allowances.set(owner, spender, remaining);
        Ok(net)
    }

    /// Freeze `account`'s current balance and remove it from the rate.
    ///
    /// The displayed balance, every other balance and the rate are unchanged.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAddress`] if `account` is null
    /// - [`LedgerError::AlreadyExcluded`] if `account` is already excluded
    pub fn exclude_account(&mut self, account: Address) -> Result<(), LedgerError> {
        if account.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let gons = match self.holding(&account) {
            Holding::Excluded { .. } => return Err(LedgerError::AlreadyExcluded(account)),
            Holding::Included { gons } => gons,
        };

        let fragments = ENGINE.to_fragments(gons, self.rate)?;
        let gons_supply = self
            .gons_supply
            .checked_sub(gons)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let excluded_fragments = self
            .excluded_fragments
            .checked_add(fragments)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        self.holdings.insert(account, Holding::Excluded { fragments });
        self.gons_supply = gons_supply;
        self.excluded_fragments = excluded_fragments;

        info!(%account, fragments, "account excluded");
        Ok(())
    }

    /// Return `account` to the rate, converting at the current rate.
    ///
    /// The gons balance is rebuilt as `fragments * rate` from the rate in
    /// force right now, so the displayed balance comes out identical.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAddress`] if `account` is null
    /// - [`LedgerError::NotExcluded`] if `account` is not excluded
    pub fn include_account(&mut self, account: Address) -> Result<(), LedgerError> {
        if account.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let fragments = match self.holding(&account) {
            Holding::Included { .. } => return Err(LedgerError::NotExcluded(account)),
            Holding::Excluded { fragments } => fragments,
        };

        let gons = ENGINE.to_gons(fragments, self.rate)?;
        let gons_supply = self
            .gons_supply
            .checked_add(gons)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        let excluded_fragments = self
            .excluded_fragments
            .checked_sub(fragments)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        self.holdings.insert(account, Holding::Included { gons });
        self.gons_supply = gons_supply;
        self.excluded_fragments = excluded_fragments;

        info!(%account, fragments, "account included");
        Ok(())
    }
}

impl TransferCounter for ReflectionLedger {
    fn source_address(&self) -> Address {
        self.address
    }

    fn transfer_count(&self) -> u64 {
        self.transfer_count
    }
}
