//! # sminem-core
//! Foundation types and traits for the Sminem token ecosystem.
//!
//! The fungible ledger (sminem-reflect) and the NFT minter (sminem-mint)
//! only meet through the seams defined here: [`Address`], the error
//! taxonomy, and the traits in [`traits`].

pub mod address;
pub mod constants;
pub mod error;
pub mod traits;

pub use address::Address;
pub use error::{ConfigError, ErrorKind, LedgerError, MintError, SminemError};
