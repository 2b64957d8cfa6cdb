//! # sminem-reflect: Redistribution-fee fungible ledger.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! Every transfer deducts a 1% fee that is never credited to anyone.
//! Instead, included holders keep their balance in gons and the fee shrinks
//! the gons-per-fragment rate, so every included balance rises in proportion:
//! - **Fee engine**: fee split, gons/fragments conversion, rate derivation.
//! - **Ledger**: one tagged [`Holding`] per account, either `Included { gons }`
//!   or `Excluded { fragments }`, plus the conserved pool totals.
//! - **Allowances**: spender approvals consumed by `transfer_from`.

pub mod allowance;
pub mod fee;
pub mod ledger;

pub use allowance::AllowanceBook;
pub use fee::{FeeEngine, FeeSplit, Pool};
pub use ledger::{Holding, ReflectionLedger};
