//! Full holder/admin walkthrough of the reflection ledger.
//!
//! Five accounts move tokens through every combination of included and
//! excluded senders and receivers. After each transfer, every balance is
//! checked against the closed-form redistribution; after each exclusion
//! toggle, every balance must be bit-for-bit unchanged.

use sminem_core::address::Address;
use sminem_core::error::{ErrorKind, LedgerError, SminemError};
use sminem_node_lib::Ecosystem;
use sminem_tests::helpers::{addr, assert_close, distribute, ecosystem, owner, SUPPLY, UNIT};

struct Walk {
    eco: Ecosystem,
    a1: Address,
    a2: Address,
    a3: Address,
    empty: Address,
}

impl Walk {
    fn new() -> Self {
        Self {
            eco: ecosystem(10),
            a1: addr("account1"),
            a2: addr("account2"),
            a3: addr("account3"),
            empty: addr("zero-balance"),
        }
    }

    fn everyone(&self) -> [Address; 5] {
        [owner(), self.a1, self.a2, self.a3, self.empty]
    }

    fn balances(&self) -> Vec<u64> {
        self.everyone().iter().map(|a| self.eco.balance_of(a)).collect()
    }

    fn included_fragments(&self) -> u64 {
        SUPPLY - self.eco.status().unwrap().excluded_fragments_total
    }

    /// Transfer and check every account against the closed form.
    fn transfer(&self, from: Address, to: Address, amount: u64) {
        self.transfer_with(from, to, amount, |eco| eco.transfer(from, to, amount));
    }

    fn transfer_with(
        &self,
        from: Address,
        to: Address,
        amount: u64,
        op: impl FnOnce(&Ecosystem) -> Result<u64, SminemError>,
    ) {
        let fee = amount / 100;
        let net = amount - fee;
        let before: Vec<(Address, u64, bool)> = self
            .everyone()
            .iter()
            .map(|a| (*a, self.eco.balance_of(a), self.eco.is_excluded(a)))
            .collect();

        assert_eq!(op(&self.eco).unwrap(), net);
        let included = self.included_fragments();

        for (account, old, excluded) in before {
            let moved = if account == from && account == to {
                old - fee
            } else if account == from {
                old - amount
            } else if account == to {
                old + net
            } else {
                old
            };
            let actual = self.eco.balance_of(&account);
            if excluded {
                assert_eq!(actual, moved, "excluded {account} must move exactly");
            } else {
                assert_close(distribute(moved, included, fee), actual);
            }
        }
    }

    fn exclude(&self, account: Address) {
        let before = self.balances();
        self.eco.exclude_account(owner(), account).unwrap();
        assert_eq!(self.balances(), before);
        assert!(self.eco.is_excluded(&account));
    }

    fn include(&self, account: Address) {
        let before = self.balances();
        self.eco.include_account(owner(), account).unwrap();
        assert_eq!(self.balances(), before);
        assert!(!self.eco.is_excluded(&account));
    }
}

#[test]
fn reflection_walkthrough() {
    let w = Walk::new();
    let (a1, a2, a3) = (w.a1, w.a2, w.a3);
    assert_eq!(w.eco.balance_of(&owner()), SUPPLY);

    // --- allowances ---
    w.eco.approve(owner(), a1, 1_000_000 * UNIT).unwrap();
    w.eco.approve(owner(), a2, 5_000 * UNIT).unwrap();
    assert_eq!(w.eco.allowance(&owner(), &a1), 1_000_000 * UNIT);
    assert_eq!(w.eco.allowance(&owner(), &a2), 5_000 * UNIT);

    let err = w
        .eco
        .transfer_from(a1, owner(), a1, 1_000_000 * UNIT)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert_eq!(w.eco.allowance(&owner(), &a1), 1_000_000 * UNIT);

    assert_eq!(
        w.eco.decrease_allowance(owner(), a1, 995_000 * UNIT).unwrap(),
        5_000 * UNIT
    );

    // --- spending allowances, included to included ---
    w.transfer_with(owner(), a1, 5_000 * UNIT, |eco| {
        eco.transfer_from(a1, owner(), a1, 5_000 * UNIT)
    });
    w.transfer_with(owner(), a2, 5_000 * UNIT, |eco| {
        eco.transfer_from(a2, owner(), a2, 5_000 * UNIT)
    });
    assert_eq!(w.eco.allowance(&owner(), &a1), 0);
    assert_eq!(w.eco.allowance(&owner(), &a2), 0);

    // bystanders of an included transfer land exactly on the closed form
    let a2_before = w.eco.balance_of(&a2);
    let owner_before = w.eco.balance_of(&owner());
    w.transfer(a1, a3, 2_000 * UNIT);
    let fee = 2_000 * UNIT / 100;
    assert_eq!(w.eco.balance_of(&a2), distribute(a2_before, SUPPLY, fee));
    assert_eq!(w.eco.balance_of(&owner()), distribute(owner_before, SUPPLY, fee));
    w.transfer(owner(), owner(), 10_000 * UNIT);

    // --- exclusion preconditions ---
    assert!(matches!(
        w.eco.exclude_account(a2, a1),
        Err(SminemError::Unauthorized(_))
    ));
    assert!(matches!(
        w.eco.exclude_account(owner(), Address::ZERO),
        Err(SminemError::Ledger(LedgerError::ZeroAddress))
    ));
    w.exclude(a1);
    assert!(matches!(
        w.eco.exclude_account(owner(), a1),
        Err(SminemError::Ledger(LedgerError::AlreadyExcluded(_)))
    ));

    assert!(matches!(
        w.eco.include_account(a2, a1),
        Err(SminemError::Unauthorized(_))
    ));
    assert!(matches!(
        w.eco.include_account(owner(), a3),
        Err(SminemError::Ledger(LedgerError::NotExcluded(_)))
    ));
    w.include(a1);
    assert!(matches!(
        w.eco.include_account(owner(), a1),
        Err(SminemError::Ledger(LedgerError::NotExcluded(_)))
    ));

    // --- excluded holder sits out included transfers ---
    w.exclude(a1);
    w.transfer(owner(), a3, 10_000 * UNIT);
    w.transfer(owner(), a2, 10_000 * UNIT);

    // inclusion after the rate moved must not mint anything
    w.include(a1);
    w.transfer(a3, a1, 2_000 * UNIT);

    // --- every representation pairing ---
    w.exclude(a1);
    w.transfer(owner(), a1, 1_000 * UNIT);
    w.exclude(a2);
    w.transfer(a1, a3, 2_000 * UNIT);
    w.transfer(a1, a2, 1_000 * UNIT);
    w.transfer(a1, a1, 1_000 * UNIT);
    w.include(a1);
    w.include(a2);

    // --- zero-balance toggles ---
    w.exclude(w.empty);
    w.transfer(owner(), a1, 2_000 * UNIT);
    assert_eq!(w.eco.balance_of(&w.empty), 0);
    w.include(w.empty);

    // --- excluded account drains itself, then rejoins ---
    w.exclude(a3);
    w.transfer(owner(), a2, 4_000 * UNIT);
    let drained = w.eco.balance_of(&a3);
    w.transfer(a3, owner(), drained);
    w.include(a3);
    assert_eq!(w.eco.balance_of(&a3), 0);

    // --- conservation ---
    let total: u64 = w.balances().iter().sum();
    assert!(total <= SUPPLY, "balances exceed supply: {total}");
    assert!(SUPPLY - total <= 5, "lost {} fragments", SUPPLY - total);
    assert_eq!(w.eco.status().unwrap().excluded_fragments_total, 0);
}

#[test]
fn walkthrough_transfers_accrue_mints() {
    let w = Walk::new();
    for i in 0..25u64 {
        w.transfer(owner(), w.a1, (i + 1) * UNIT);
    }
    assert_eq!(w.eco.transfer_count(), 25);
    assert_eq!(w.eco.possible_mints_amount().unwrap(), 2);
    assert_eq!(w.eco.mint(&[w.a1, w.a2]).unwrap(), vec![1, 2]);
    assert_eq!(w.eco.possible_mints_amount().unwrap(), 0);

    // the 5 leftover transfers carry over the mint
    for _ in 0..5 {
        w.transfer(w.a1, w.a3, UNIT);
    }
    assert_eq!(w.eco.possible_mints_amount().unwrap(), 1);
}

#[test]
fn rejected_operations_leave_no_trace() {
    let w = Walk::new();
    w.transfer(owner(), w.a1, 100 * UNIT);
    let before = w.eco.snapshot();

    assert!(w.eco.transfer(w.a1, w.a2, 101 * UNIT).is_err());
    assert!(w.eco.transfer(w.a1, Address::ZERO, UNIT).is_err());
    assert!(w.eco.transfer(w.a1, w.a2, 0).is_err());
    assert!(w.eco.transfer_from(w.a2, w.a1, w.a2, UNIT).is_err());
    assert!(w.eco.include_account(owner(), w.a1).is_err());
    assert!(w.eco.mint(&[w.a1]).is_err());

    assert_eq!(w.eco.snapshot(), before);
}
