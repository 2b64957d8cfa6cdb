//! # sminem-mint: Transfer-gated NFT minting.
//!
//! Mint rights accrue from activity on the fungible ledger:
//! - **Checkpoints**: an append-only log of segment boundaries, written on
//!   every parameter change, source change and mint.
//! - **Entitlement tracker**: `floor(transfers_in_segment / multiplicity) *
//!   units_per_threshold` per segment, minus what has been consumed. Only
//!   transfers after the last checkpoint see the current parameters.
//! - **Batch minter**: bounded batches of sequential token ids.
//! - **Manual counter**: a settable [`TransferCounter`](sminem_core::traits::TransferCounter)
//!   for sources that are not a live ledger.

pub mod checkpoint;
pub mod counter;
pub mod minter;
pub mod tracker;

pub use checkpoint::{Checkpoint, CheckpointKind, CheckpointLog};
pub use counter::ManualTransferCounter;
pub use minter::BatchMinter;
pub use tracker::{EntitlementSummary, MintEntitlementTracker};
