//! Criterion benchmarks for entitlement lookups and batch previews.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sminem_core::address::Address;
use sminem_core::traits::ReceiverCheck;
use sminem_mint::{BatchMinter, ManualTransferCounter, MintEntitlementTracker};

struct AcceptAll;

impl ReceiverCheck for AcceptAll {
    fn accepts(&self, _receiver: &Address) -> bool {
        true
    }
}

/// Tracker with a long checkpoint history.
fn busy_tracker() -> (ManualTransferCounter, MintEntitlementTracker) {
    let mut counter = ManualTransferCounter::new(Address::from_label("token"));
    let mut tracker = MintEntitlementTracker::new(&counter, 3, 1).unwrap();
    for i in 0..256u64 {
        counter.advance(7);
        if i % 2 == 0 {
            tracker.set_units_per_threshold(1 + i % 4 + 1, &counter).ok();
        } else {
            tracker.consume(1, &counter).unwrap();
        }
    }
    (counter, tracker)
}

fn bench_possible_mints(c: &mut Criterion) {
    let (counter, tracker) = busy_tracker();
    c.bench_function("possible_mints_amount", |b| {
        b.iter(|| tracker.possible_mints_amount(black_box(&counter)))
    });
}

fn bench_audit(c: &mut Criterion) {
    let (counter, tracker) = busy_tracker();
    c.bench_function("audit_accrued_units", |b| {
        b.iter(|| tracker.audit_accrued_units(black_box(&counter)))
    });
}

fn bench_preview_mint(c: &mut Criterion) {
    let (counter, tracker) = busy_tracker();
    let minter = BatchMinter::new(tracker, 5, "ipfs://bench/").unwrap();
    let receivers: Vec<Address> = (0..5)
        .map(|i| Address::from_label(&format!("r{i}")))
        .collect();
    c.bench_function("preview_mint_5", |b| {
        b.iter(|| minter.preview_mint(black_box(&receivers), &counter, &AcceptAll))
    });
}

criterion_group!(benches, bench_possible_mints, bench_audit, bench_preview_mint);
criterion_main!(benches);
