//! Shared fixtures for the integration tests.

use sminem_core::address::Address;
use sminem_node_lib::{Ecosystem, EcosystemConfig};
use sminem_reflect::ReflectionLedger;

/// Fragments per whole token at the default 9 decimals.
pub const UNIT: u64 = 1_000_000_000;

/// Total supply used by the scenarios, in fragments.
pub const SUPPLY: u64 = 100_000 * UNIT;

/// Deterministic test address.
pub fn addr(label: &str) -> Address {
    Address::from_label(label)
}

pub fn owner() -> Address {
    addr("owner")
}

/// Fresh ecosystem owned by [`owner`] with the given multiplicity.
pub fn ecosystem(multiplicity: u64) -> Ecosystem {
    Ecosystem::new(&EcosystemConfig {
        owner: owner(),
        multiplicity,
        ..EcosystemConfig::default()
    })
    .expect("default config is valid")
}

/// Fresh ledger with the whole supply on [`owner`].
pub fn ledger() -> ReflectionLedger {
    ReflectionLedger::new(addr("token"), owner(), SUPPLY).expect("valid ledger")
}

/// Balance after `fee` is spread over an included pool of `included`
/// fragments (the pool size after the transfer).
pub fn distribute(balance: u64, included: u64, fee: u64) -> u64 {
    (balance as u128 * included as u128 / (included - fee) as u128) as u64
}

/// Assert `actual` is within one fragment of `expected`.
#[track_caller]
pub fn assert_close(expected: u64, actual: u64) {
    assert!(
        expected.abs_diff(actual) <= 1,
        "expected {expected} ±1, got {actual}"
    );
}
