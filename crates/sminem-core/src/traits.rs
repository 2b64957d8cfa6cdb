//! Trait interfaces for the Sminem ecosystem.
//!
//! These traits define the contracts between crates:
//! - [`TransferCounter`]: read-only source of qualifying transfers (sminem-reflect and sminem-mint implement)
//! - [`FeeCalculator`]: fee and exchange-rate math (sminem-reflect implements)
//! - [`AccessControl`]: administrator capability check (sminem-node implements)
//! - [`ReceiverCheck`]: NFT acceptance hook of a receiver (sminem-node implements)

use crate::address::Address;
use crate::error::LedgerError;

/// A monotonic counter of qualifying transfers owned by some ledger.
///
/// The entitlement tracker only ever reads it. The value is expected to be
/// non-decreasing; readers must tolerate a regression without panicking.
pub trait TransferCounter {
    /// Address of the ledger that owns this counter.
    fn source_address(&self) -> Address;

    /// Number of qualifying transfers observed so far.
    fn transfer_count(&self) -> u64;
}

/// Pure computation of transfer fees and the gons/fragments exchange rate.
///
/// All math is integer-only. Implemented by the fee engine (sminem-reflect).
pub trait FeeCalculator: Send + Sync {
    /// Fee deducted from a transfer of `amount` fragments.
    fn fee(&self, amount: u64) -> u64;

    /// Amount credited to the receiver of a transfer of `amount` fragments.
    ///
    /// Default implementation: `amount - fee(amount)`.
    fn net_amount(&self, amount: u64) -> u64 {
        amount - self.fee(amount)
    }

    /// Gons-per-fragment rate for the included pool.
    ///
    /// `gons_supply` is the sum of all included gons balances and
    /// `included_fragments` is `total_fragments - excluded_fragments_total`.
    /// Returns `None` when the pool is degenerate (no included fragments, or a
    /// rate that would truncate to zero); callers then keep the previous rate.
    fn rate(&self, gons_supply: u128, included_fragments: u64) -> Option<u128>;

    /// Convert fragments to gons at `rate`.
    fn to_gons(&self, fragments: u64, rate: u128) -> Result<u128, LedgerError> {
        (fragments as u128)
            .checked_mul(rate)
            .ok_or(LedgerError::ArithmeticOverflow)
    }

    /// Convert gons to fragments at `rate`, truncating.
    fn to_fragments(&self, gons: u128, rate: u128) -> Result<u64, LedgerError> {
        let fragments = gons.checked_div(rate).ok_or(LedgerError::ArithmeticOverflow)?;
        u64::try_from(fragments).map_err(|_| LedgerError::ArithmeticOverflow)
    }
}

/// Capability check for the administrative surface.
///
/// Injected at the call boundary; the ledgers themselves carry no notion of
/// ownership.
pub trait AccessControl: Send + Sync {
    /// Whether `caller` may invoke administrative operations.
    fn is_admin(&self, caller: &Address) -> bool;
}

/// Acceptance hook of an NFT receiver.
///
/// Plain accounts always accept; a contract accepts only if it implements
/// the receiver hook.
pub trait ReceiverCheck: Send + Sync {
    /// Whether `receiver` accepts newly minted tokens.
    fn accepts(&self, receiver: &Address) -> bool;
}
