//! Settable transfer counter.

use sminem_core::address::Address;
use sminem_core::traits::TransferCounter;

/// A [`TransferCounter`] whose value is set from outside.
///
/// Stands in for a ledger the process does not host, such as a source
/// registered with the node before switching the minter over to it.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct ManualTransferCounter {
    address: Address,
    count: u64,
}

impl ManualTransferCounter {
    pub fn new(address: Address) -> Self {
        Self { address, count: 0 }
    }

    /// Overwrite the count. Lower values are accepted; readers saturate.
    pub fn set_count(&mut self, count: u64) {
        self.count = count;
    }

    /// Record `n` more transfers.
    pub fn advance(&mut self, n: u64) {
        self.count = self.count.saturating_add(n);
    }
}

impl TransferCounter for ManualTransferCounter {
    fn source_address(&self) -> Address {
        self.address
    }

    fn transfer_count(&self) -> u64 {
        self.count
    }
}
