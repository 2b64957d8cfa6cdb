//! Error types for the Sminem ecosystem.
use thiserror::Error;

use crate::address::Address;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid length: {0} hex digits")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("zero address")] ZeroAddress,
    #[error("zero amount")] ZeroAmount,
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: u64, need: u64 },
    #[error("insufficient allowance: have {have}, need {need}")] InsufficientAllowance { have: u64, need: u64 },
    #[error("account already excluded: {0}")] AlreadyExcluded(Address),
    #[error("account not excluded: {0}")] NotExcluded(Address),
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MintError {
    #[error("parameter must be non-zero")] ZeroValue,
    #[error("new value equals the current value")] NoOpChange,
    #[error("too many receivers at once: {requested} > {max}")] TooManyAtOnce { requested: usize, max: usize },
    #[error("exceeds entitlement: requested {requested}, available {available}")] ExceedsEntitlement { requested: u64, available: u64 },
    #[error("receiver rejected the token: {0}")] ReceiverRejected(Address),
    #[error("zero address")] ZeroAddress,
    #[error("empty receiver batch")] EmptyBatch,
    #[error("empty base URI")] EmptyBaseUri,
    #[error("counter source mismatch: expected {expected}, got {got}")] SourceMismatch { expected: Address, got: Address },
    #[error("token id space exhausted")] TokenIdOverflow,
    #[error("unknown token: {0}")] UnknownToken(u64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("empty token name")] EmptyName,
    #[error("empty token symbol")] EmptySymbol,
    #[error("decimals must be in 1..={max}, got {got}")] InvalidDecimals { got: u8, max: u8 },
    #[error("zero initial supply")] ZeroSupply,
    #[error("initial supply overflows the fragment range")] SupplyOverflow,
    #[error("zero owner address")] ZeroOwner,
    #[error("zero token source address")] ZeroTokenSource,
    #[error("zero transfers multiplicity")] ZeroMultiplicity,
    #[error("zero units per threshold")] ZeroUnitsPerThreshold,
    #[error("zero max batch size")] ZeroBatchSize,
    #[error("empty base URI")] EmptyBaseUri,
    #[error("load: {0}")] Load(String),
}

#[derive(Error, Debug)]
pub enum SminemError {
    #[error("unauthorized caller: {0}")] Unauthorized(Address),
    #[error("unknown transfer counter: {0}")] UnknownCounter(Address),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Mint(#[from] MintError),
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Address(#[from] AddressError),
    #[error("storage: {0}")] Storage(String),
}

/// Coarse error taxonomy shared by every error in the ecosystem.
///
/// Callers that only need to branch on the failure class (retry policy,
/// HTTP status, exit code) match on this instead of the concrete enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    Unauthorized,
    InsufficientBalance,
    InsufficientAllowance,
    AlreadyExcluded,
    NotExcluded,
    BatchTooLarge,
    EntitlementExceeded,
    ReceiverRejected,
    Arithmetic,
    Storage,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroAddress | Self::ZeroAmount => ErrorKind::InvalidArgument,
            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            Self::InsufficientAllowance { .. } => ErrorKind::InsufficientAllowance,
            Self::AlreadyExcluded(_) => ErrorKind::AlreadyExcluded,
            Self::NotExcluded(_) => ErrorKind::NotExcluded,
            Self::ArithmeticOverflow => ErrorKind::Arithmetic,
        }
    }
}

impl MintError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TooManyAtOnce { .. } => ErrorKind::BatchTooLarge,
            Self::ExceedsEntitlement { .. } => ErrorKind::EntitlementExceeded,
            Self::ReceiverRejected(_) => ErrorKind::ReceiverRejected,
            Self::TokenIdOverflow => ErrorKind::Arithmetic,
            Self::ZeroValue
            | Self::NoOpChange
            | Self::ZeroAddress
            | Self::EmptyBatch
            | Self::EmptyBaseUri
            | Self::SourceMismatch { .. }
            | Self::UnknownToken(_) => ErrorKind::InvalidArgument,
        }
    }
}

impl SminemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::UnknownCounter(_) | Self::Config(_) | Self::Address(_) => {
                ErrorKind::InvalidArgument
            }
            Self::Ledger(e) => e.kind(),
            Self::Mint(e) => e.kind(),
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_kinds() {
        assert_eq!(LedgerError::ZeroAmount.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            LedgerError::InsufficientBalance { have: 1, need: 2 }.kind(),
            ErrorKind::InsufficientBalance
        );
        assert_eq!(
            LedgerError::AlreadyExcluded(Address::ZERO).kind(),
            ErrorKind::AlreadyExcluded
        );
    }

    #[test]
    fn mint_kinds() {
        assert_eq!(
            MintError::TooManyAtOnce { requested: 6, max: 5 }.kind(),
            ErrorKind::BatchTooLarge
        );
        assert_eq!(
            MintError::ExceedsEntitlement { requested: 2, available: 1 }.kind(),
            ErrorKind::EntitlementExceeded
        );
        assert_eq!(MintError::NoOpChange.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn umbrella_delegates() {
        let e: SminemError = LedgerError::NotExcluded(Address::ZERO).into();
        assert_eq!(e.kind(), ErrorKind::NotExcluded);
        let e: SminemError = MintError::ReceiverRejected(Address::ZERO).into();
        assert_eq!(e.kind(), ErrorKind::ReceiverRejected);
        assert_eq!(
            SminemError::Unauthorized(Address::ZERO).kind(),
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn messages_carry_context() {
        let e = LedgerError::InsufficientBalance { have: 5, need: 9 };
        assert_eq!(e.to_string(), "insufficient balance: have 5, need 9");
        let e = MintError::TooManyAtOnce { requested: 7, max: 5 };
        assert_eq!(e.to_string(), "too many receivers at once: 7 > 5");
    }
}
