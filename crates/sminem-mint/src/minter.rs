//! Batch minting of sequential NFT ids against accrued entitlement.

use std::collections::BTreeMap;

use sminem_core::address::Address;
use sminem_core::constants::FIRST_TOKEN_ID;
use sminem_core::error::MintError;
use sminem_core::traits::{ReceiverCheck, TransferCounter};
use tracing::info;

use crate::tracker::MintEntitlementTracker;

/// NFT collection whose mints are gated by a [`MintEntitlementTracker`].
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct BatchMinter {
    tracker: MintEntitlementTracker,
    max_batch_size: usize,
    base_uri: String,
    next_token_id: u64,
    owners: BTreeMap<u64, Address>,
    balances: BTreeMap<Address, u64>,
}

impl BatchMinter {
    pub fn new(
        tracker: MintEntitlementTracker,
        max_batch_size: usize,
        base_uri: impl Into<String>,
    ) -> Result<Self, MintError> {
        let base_uri = base_uri.into();
        if max_batch_size == 0 {
            return Err(MintError::ZeroValue);
        }
        if base_uri.is_empty() {
            return Err(MintError::EmptyBaseUri);
        }
        Ok(Self {
            tracker,
            max_batch_size,
            base_uri,
            next_token_id: FIRST_TOKEN_ID,
            owners: BTreeMap::new(),
            balances: BTreeMap::new(),
        })
    }

    pub fn tracker(&self) -> &MintEntitlementTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut MintEntitlementTracker {
        &mut self.tracker
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Id the next minted token will receive.
    pub fn next_token_id(&self) -> u64 {
        self.next_token_id
    }

    pub fn total_minted(&self) -> u64 {
        self.owners.len() as u64
    }

    pub fn owner_of(&self, token_id: u64) -> Result<Address, MintError> {
        self.owners
            .get(&token_id)
            .copied()
            .ok_or(MintError::UnknownToken(token_id))
    }

    /// Number of tokens held by `owner`.
    pub fn balance_of(&self, owner: &Address) -> u64 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn set_base_uri(&mut self, base_uri: impl Into<String>) -> Result<(), MintError> {
        let base_uri = base_uri.into();
        if base_uri.is_empty() {
            return Err(MintError::EmptyBaseUri);
        }
        if base_uri == self.base_uri {
            return Err(MintError::NoOpChange);
        }
        info!(%base_uri, "base URI updated");
        self.base_uri = base_uri;
        Ok(())
    }

    /// Metadata URI of a minted token: the base URI followed by the id.
    pub fn token_uri(&self, token_id: u64) -> Result<String, MintError> {
        self.owner_of(token_id)?;
        Ok(format!("{}{}", self.base_uri, token_id))
    }

    /// Ids `mint` would assign to `receivers`, without minting.
    ///
    /// Runs every check `mint` runs, in the same order: empty batch, batch
    /// size, entitlement, then each receiver.
    pub fn preview_mint(
        &self,
        receivers: &[Address],
        counter: &dyn TransferCounter,
        check: &dyn ReceiverCheck,
    ) -> Result<Vec<u64>, MintError> {
        if receivers.is_empty() {
            return Err(MintError::EmptyBatch);
        }
        if receivers.len() > self.max_batch_size {
            return Err(MintError::TooManyAtOnce {
                requested: receivers.len(),
                max: self.max_batch_size,
            });
        }
        let requested = receivers.len() as u64;
        let available = self.tracker.possible_mints_amount(counter)?;
        if requested > available {
            return Err(MintError::ExceedsEntitlement {
                requested,
                available,
            });
        }
        for receiver in receivers {
            if receiver.is_zero() {
                return Err(MintError::ZeroAddress);
            }
            if !check.accepts(receiver) {
                return Err(MintError::ReceiverRejected(*receiver));
            }
        }
        let end = self
            .next_token_id
            .checked_add(requested)
            .ok_or(MintError::TokenIdOverflow)?;
        Ok((self.next_token_id..end).collect())
    }

    /// Mint one token to each receiver, in order.
    ///
    /// Either every token is minted or nothing changes.
    pub fn mint(
        &mut self,
        receivers: &[Address],
        counter: &dyn TransferCounter,
        check: &dyn ReceiverCheck,
    ) -> Result<Vec<u64>, MintError> {
        let ids = self.preview_mint(receivers, counter, check)?;
        self.tracker.consume(ids.len() as u64, counter)?;
        for (id, receiver) in ids.iter().zip(receivers) {
            self.owners.insert(*id, *receiver);
            *self.balances.entry(*receiver).or_insert(0) += 1;
        }
        self.next_token_id += ids.len() as u64;
        info!(count = ids.len(), first = ids[0], "tokens minted");
        Ok(ids)
    }
}
