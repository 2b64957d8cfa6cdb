//! Snapshot persistence across process restarts.

use sminem_core::address::Address;
use sminem_node_lib::storage::{load_snapshot, save_snapshot};
use sminem_node_lib::{Ecosystem, EcosystemConfig};

const UNIT: u64 = 1_000_000_000;

fn owner() -> Address {
    Address::from_label("owner")
}

fn ecosystem() -> Ecosystem {
    Ecosystem::new(&EcosystemConfig {
        owner: owner(),
        multiplicity: 1,
        ..EcosystemConfig::default()
    })
    .unwrap()
}

#[test]
fn state_survives_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("state.bin");

    let eco = ecosystem();
    let alice = Address::from_label("alice");
    let bob = Address::from_label("bob");
    eco.transfer(owner(), alice, 5_000 * UNIT).unwrap();
    eco.exclude_account(owner(), bob).unwrap();
    eco.transfer(alice, bob, 100 * UNIT).unwrap();
    eco.approve(alice, bob, 7 * UNIT).unwrap();
    eco.mint(&[alice]).unwrap();

    save_snapshot(&path, &eco.snapshot()).unwrap();
    let restored = Ecosystem::from_state(load_snapshot(&path).unwrap());

    assert_eq!(restored.snapshot(), eco.snapshot());
    assert_eq!(restored.balance_of(&alice), eco.balance_of(&alice));
    assert_eq!(restored.balance_of(&bob), 99 * UNIT);
    assert!(restored.is_excluded(&bob));
    assert_eq!(restored.allowance(&alice, &bob), 7 * UNIT);
    assert_eq!(restored.owner_of(1).unwrap(), alice);
    assert_eq!(restored.possible_mints_amount().unwrap(), 1);
}

#[test]
fn restored_ecosystem_keeps_accruing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.bin");

    let eco = ecosystem();
    eco.transfer(owner(), Address::from_label("a"), UNIT).unwrap();
    save_snapshot(&path, &eco.snapshot()).unwrap();

    let restored = Ecosystem::from_state(load_snapshot(&path).unwrap());
    restored
        .transfer(owner(), Address::from_label("b"), UNIT)
        .unwrap();
    assert_eq!(restored.possible_mints_amount().unwrap(), 2);
    assert_eq!(restored.mint(&[owner(), owner()]).unwrap(), vec![1, 2]);
}

#[test]
fn overwrite_replaces_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.bin");

    let eco = ecosystem();
    save_snapshot(&path, &eco.snapshot()).unwrap();
    eco.transfer(owner(), Address::from_label("a"), UNIT).unwrap();
    save_snapshot(&path, &eco.snapshot()).unwrap();

    let loaded = load_snapshot(&path).unwrap();
    assert_eq!(loaded, eco.snapshot());
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn missing_file_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_snapshot(&dir.path().join("absent.bin")).unwrap_err();
    assert_eq!(err.kind(), sminem_core::error::ErrorKind::Storage);
}
