//! Protocol constants. Fungible amounts are in fragments (the smallest unit;
//! 1 token = 10^decimals fragments).

/// Transfer fee divisor: `fee = amount / FEE_DIVISOR` (1%).
pub const FEE_DIVISOR: u64 = 100;

/// Default number of fractional digits of the fungible token.
pub const DEFAULT_DECIMALS: u8 = 9;

/// Upper bound on `decimals` accepted at construction.
pub const MAX_DECIMALS: u8 = 18;

/// Default cap on receivers per `mint` call.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 5;

/// Identifier assigned to the first minted NFT.
pub const FIRST_TOKEN_ID: u64 = 1;

/// Total gons for a given fragment supply.
///
/// The largest multiple of `total_fragments` that fits in a `u128`, so the
/// initial gons-per-fragment rate is an exact integer with maximum headroom.
/// Returns `None` for a zero supply.
///
/// # Examples
///
/// ```
/// use sminem_core::constants::total_gons_for;
/// let gons = total_gons_for(1_000).unwrap();
/// assert_eq!(gons % 1_000, 0);
/// assert!(u128::MAX - gons < 1_000);
/// assert_eq!(total_gons_for(0), None);
/// ```
pub fn total_gons_for(total_fragments: u64) -> Option<u128> {
    if total_fragments == 0 {
        return None;
    }
    let f = total_fragments as u128;
    Some(u128::MAX - (u128::MAX % f))
}

/// `10^decimals` as a fragment multiplier, or `None` if it overflows `u64`.
pub fn fragments_per_token(decimals: u8) -> Option<u64> {
    10u64.checked_pow(decimals as u32)
}
