//! The composed token ecosystem.
//!
//! [`Ecosystem`] owns the fungible ledger, the NFT minter and any registered
//! external transfer counters behind one [`parking_lot::Mutex`]. Every call
//! takes the lock once, checks the caller's capability, validates, and only
//! then commits, so no caller ever sees a half-applied operation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use sminem_core::address::Address;
use sminem_core::error::{MintError, SminemError};
use sminem_core::traits::{AccessControl, ReceiverCheck, TransferCounter};
use sminem_mint::{BatchMinter, EntitlementSummary, ManualTransferCounter, MintEntitlementTracker};
use sminem_reflect::ReflectionLedger;
use tracing::{debug, info, warn};

use crate::access::{OwnerAccess, RejectList};
use crate::config::EcosystemConfig;

/// Display metadata of the fungible token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, bincode::Encode, bincode::Decode)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Everything persisted in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct EcosystemState {
    pub metadata: TokenMetadata,
    pub owner: Address,
    pub ledger: ReflectionLedger,
    pub minter: BatchMinter,
    /// Settable counters for sources other than `ledger`.
    pub counters: BTreeMap<Address, ManualTransferCounter>,
    pub rejecting_receivers: BTreeSet<Address>,
}

impl EcosystemState {
    /// Build a fresh state from a validated configuration.
    pub fn from_config(config: &EcosystemConfig) -> Result<Self, SminemError> {
        config.validate()?;
        let ledger = ReflectionLedger::new(config.token_address, config.owner, config.total_fragments()?)?;
        let tracker = MintEntitlementTracker::new(&ledger, config.multiplicity, config.units_per_threshold)?;
        let minter = BatchMinter::new(tracker, config.max_batch_size, config.base_uri.clone())?;
        Ok(Self {
            metadata: TokenMetadata {
                name: config.name.clone(),
                symbol: config.symbol.clone(),
                decimals: config.decimals,
            },
            owner: config.owner,
            ledger,
            minter,
            counters: BTreeMap::new(),
            rejecting_receivers: config.rejecting_receivers.iter().copied().collect(),
        })
    }
}

/// Point-in-time summary for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub metadata: TokenMetadata,
    pub owner: Address,
    pub token_address: Address,
    pub total_supply: u64,
    pub rate: u128,
    pub included_gons_total: u128,
    pub excluded_fragments_total: u64,
    pub accounts: usize,
    pub transfer_count: u64,
    pub entitlement: EntitlementSummary,
    pub next_token_id: u64,
    pub total_minted: u64,
    pub max_batch_size: usize,
    pub base_uri: String,
    pub registered_counters: Vec<Address>,
}

/// Thread-safe ecosystem handle.
pub struct Ecosystem {
    state: Mutex<EcosystemState>,
    access: Arc<dyn AccessControl>,
    receivers: Arc<dyn ReceiverCheck>,
}

impl std::fmt::Debug for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ecosystem").field("state", &*self.state.lock()).finish_non_exhaustive()
    }
}

/// Counter currently feeding `source`.
fn resolve_counter<'a>(
    ledger: &'a ReflectionLedger,
    counters: &'a BTreeMap<Address, ManualTransferCounter>,
    source: Address,
) -> Result<&'a dyn TransferCounter, SminemError> {
    if source == ledger.address() {
        return Ok(ledger);
    }
    counters
        .get(&source)
        .map(|c| c as &dyn TransferCounter)
        .ok_or(SminemError::UnknownCounter(source))
}

impl Ecosystem {
    /// Build from configuration with the owner check and the configured
    /// reject list.
    pub fn new(config: &EcosystemConfig) -> Result<Self, SminemError> {
        let state = EcosystemState::from_config(config)?;
        info!(
            name = %state.metadata.name,
            symbol = %state.metadata.symbol,
            supply = state.ledger.total_supply(),
            owner = %state.owner,
            "ecosystem created"
        );
        Ok(Self::from_state(state))
    }

    /// Rebuild from a persisted state, deriving collaborators from it.
    pub fn from_state(state: EcosystemState) -> Self {
        let access = Arc::new(OwnerAccess::new(state.owner));
        let receivers = Arc::new(RejectList::new(state.rejecting_receivers.iter().copied()));
        Self::with_collaborators(state, access, receivers)
    }

    /// Rebuild with caller-supplied collaborators.
    pub fn with_collaborators(
        state: EcosystemState,
        access: Arc<dyn AccessControl>,
        receivers: Arc<dyn ReceiverCheck>,
    ) -> Self {
        Self {
            state: Mutex::new(state),
            access,
            receivers,
        }
    }

    /// Clone of the full state, for persistence.
    pub fn snapshot(&self) -> EcosystemState {
        self.state.lock().clone()
    }

    fn authorize(&self, caller: &Address) -> Result<(), SminemError> {
        if self.access.is_admin(caller) {
            Ok(())
        } else {
            warn!(%caller, "rejected administrative call");
            Err(SminemError::Unauthorized(*caller))
        }
    }

    // --- fungible ledger: reads ---

    pub fn metadata(&self) -> TokenMetadata {
        self.state.lock().metadata.clone()
    }

    pub fn total_supply(&self) -> u64 {
        self.state.lock().ledger.total_supply()
    }

    pub fn balance_of(&self, account: &Address) -> u64 {
        self.state.lock().ledger.balance_of(account)
    }

    pub fn is_excluded(&self, account: &Address) -> bool {
        self.state.lock().ledger.is_excluded(account)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.state.lock().ledger.allowance(owner, spender)
    }

    pub fn transfer_count(&self) -> u64 {
        self.state.lock().ledger.transfer_count()
    }

    // --- fungible ledger: public writes ---

    /// Transfer from `caller`, returning the net amount received.
    pub fn transfer(&self, caller: Address, receiver: Address, amount: u64) -> Result<u64, SminemError> {
        Ok(self.state.lock().ledger.transfer(caller, receiver, amount)?)
    }

    /// Transfer out of `owner` using `caller`'s allowance.
    pub fn transfer_from(
        &self,
        caller: Address,
        owner: Address,
        receiver: Address,
        amount: u64,
    ) -> Result<u64, SminemError> {
        Ok(self.state.lock().ledger.transfer_from(caller, owner, receiver, amount)?)
    }

    pub fn approve(&self, caller: Address, spender: Address, amount: u64) -> Result<(), SminemError> {
        Ok(self.state.lock().ledger.approve(caller, spender, amount)?)
    }

    pub fn increase_allowance(&self, caller: Address, spender: Address, added: u64) -> Result<u64, SminemError> {
        Ok(self.state.lock().ledger.increase_allowance(caller, spender, added)?)
    }

    pub fn decrease_allowance(
        &self,
        caller: Address,
        spender: Address,
        subtracted: u64,
    ) -> Result<u64, SminemError> {
        Ok(self.state.lock().ledger.decrease_allowance(caller, spender, subtracted)?)
    }

    // --- fungible ledger: administration ---

    pub fn exclude_account(&self, caller: Address, account: Address) -> Result<(), SminemError> {
        self.authorize(&caller)?;
        Ok(self.state.lock().ledger.exclude_account(account)?)
    }

    pub fn include_account(&self, caller: Address, account: Address) -> Result<(), SminemError> {
        self.authorize(&caller)?;
        Ok(self.state.lock().ledger.include_account(account)?)
    }

    // --- minting: reads ---

    /// Units currently available to mint.
    pub fn possible_mints_amount(&self) -> Result<u64, SminemError> {
        let state = self.state.lock();
        let counter = resolve_counter(&state.ledger, &state.counters, state.minter.tracker().source())?;
        Ok(state.minter.tracker().possible_mints_amount(counter)?)
    }

    /// `(cached, replayed)` accrual; equal unless the checkpoint log is corrupt.
    pub fn audit_accrued_units(&self) -> Result<(u64, u64), SminemError> {
        let state = self.state.lock();
        let counter = resolve_counter(&state.ledger, &state.counters, state.minter.tracker().source())?;
        Ok(state.minter.tracker().audit_accrued_units(counter)?)
    }

    pub fn preview_mint(&self, receivers: &[Address]) -> Result<Vec<u64>, SminemError> {
        let state = self.state.lock();
        let counter = resolve_counter(&state.ledger, &state.counters, state.minter.tracker().source())?;
        Ok(state.minter.preview_mint(receivers, counter, &*self.receivers)?)
    }

    pub fn owner_of(&self, token_id: u64) -> Result<Address, SminemError> {
        Ok(self.state.lock().minter.owner_of(token_id)?)
    }

    pub fn token_uri(&self, token_id: u64) -> Result<String, SminemError> {
        Ok(self.state.lock().minter.token_uri(token_id)?)
    }

    /// Number of NFTs held by `owner`.
    pub fn nft_balance_of(&self, owner: &Address) -> u64 {
        self.state.lock().minter.balance_of(owner)
    }

    // --- minting: public writes ---

    /// Mint one token per receiver against the accrued entitlement.
    pub fn mint(&self, receivers: &[Address]) -> Result<Vec<u64>, SminemError> {
        let mut guard = self.state.lock();
        let EcosystemState {
            ledger,
            counters,
            minter,
            ..
        } = &mut *guard;
        let counter = resolve_counter(ledger, counters, minter.tracker().source())?;
        Ok(minter.mint(receivers, counter, &*self.receivers)?)
    }

    // --- minting: administration ---

    pub fn set_transfers_multiplicity(&self, caller: Address, value: u64) -> Result<(), SminemError> {
        self.authorize(&caller)?;
        let mut guard = self.state.lock();
        let EcosystemState {
            ledger,
            counters,
            minter,
            ..
        } = &mut *guard;
        let counter = resolve_counter(ledger, counters, minter.tracker().source())?;
        Ok(minter.tracker_mut().set_transfers_multiplicity(value, counter)?)
    }

    pub fn set_units_per_threshold(&self, caller: Address, value: u64) -> Result<(), SminemError> {
        self.authorize(&caller)?;
        let mut guard = self.state.lock();
        let EcosystemState {
            ledger,
            counters,
            minter,
            ..
        } = &mut *guard;
        let counter = resolve_counter(ledger, counters, minter.tracker().source())?;
        Ok(minter.tracker_mut().set_units_per_threshold(value, counter)?)
    }

    /// Point the tracker at another counter source.
    ///
    /// `source` must be the ledger's own address or a registered counter.
    pub fn set_token_source(&self, caller: Address, source: Address) -> Result<(), SminemError> {
        self.authorize(&caller)?;
        if source.is_zero() {
            return Err(MintError::ZeroAddress.into());
        }
        let mut guard = self.state.lock();
        let EcosystemState {
            ledger,
            counters,
            minter,
            ..
        } = &mut *guard;
        let current = resolve_counter(ledger, counters, minter.tracker().source())?;
        let next = resolve_counter(ledger, counters, source)?;
        Ok(minter.tracker_mut().set_token_source(current, next)?)
    }

    pub fn set_base_uri(&self, caller: Address, base_uri: &str) -> Result<(), SminemError> {
        self.authorize(&caller)?;
        Ok(self.state.lock().minter.set_base_uri(base_uri)?)
    }

    /// Register a settable counter for an external source.
    pub fn register_counter(&self, caller: Address, source: Address) -> Result<(), SminemError> {
        self.authorize(&caller)?;
        if source.is_zero() {
            return Err(MintError::ZeroAddress.into());
        }
        let mut state = self.state.lock();
        if source == state.ledger.address() || state.counters.contains_key(&source) {
            return Err(MintError::NoOpChange.into());
        }
        state.counters.insert(source, ManualTransferCounter::new(source));
        info!(%source, "transfer counter registered");
        Ok(())
    }

    /// Overwrite a registered counter's value.
    pub fn set_counter(&self, caller: Address, source: Address, count: u64) -> Result<(), SminemError> {
        self.authorize(&caller)?;
        let mut state = self.state.lock();
        let counter = state
            .counters
            .get_mut(&source)
            .ok_or(SminemError::UnknownCounter(source))?;
        counter.set_count(count);
        debug!(%source, count, "transfer counter set");
        Ok(())
    }

    pub fn status(&self) -> Result<Status, SminemError> {
        let state = self.state.lock();
        let counter = resolve_counter(&state.ledger, &state.counters, state.minter.tracker().source())?;
        Ok(Status {
            metadata: state.metadata.clone(),
            owner: state.owner,
            token_address: state.ledger.address(),
            total_supply: state.ledger.total_supply(),
            rate: state.ledger.rate(),
            included_gons_total: state.ledger.included_gons_total(),
            excluded_fragments_total: state.ledger.excluded_fragments_total(),
            accounts: state.ledger.accounts().count(),
            transfer_count: state.ledger.transfer_count(),
            entitlement: state.minter.tracker().summary(counter)?,
            next_token_id: state.minter.next_token_id(),
            total_minted: state.minter.total_minted(),
            max_batch_size: state.minter.max_batch_size(),
            base_uri: state.minter.base_uri().to_string(),
            registered_counters: state.counters.keys().copied().collect(),
        })
    }
}
