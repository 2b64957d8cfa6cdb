//! # sminem-node: Ecosystem composition.
//!
//! Wires the fungible ledger and the NFT minter into one serialized state:
//! - [`ecosystem::Ecosystem`]: the public and administrative surface
//!   behind a single lock
//! - [`access`]: owner capability check and receiver reject list
//! - [`config::EcosystemConfig`]: layered configuration and construction
//!   validation
//! - [`storage`]: versioned snapshot files

pub mod access;
pub mod config;
pub mod ecosystem;
pub mod storage;

pub use access::{OwnerAccess, RejectList};
pub use config::EcosystemConfig;
pub use ecosystem::{Ecosystem, EcosystemState, Status, TokenMetadata};
pub use storage::{load_snapshot, save_snapshot};
