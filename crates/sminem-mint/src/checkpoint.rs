//! Append-only checkpoint log for mint entitlement.
//!
//! Each checkpoint opens a segment of the transfer counter. Transfers inside
//! a segment accrue units at the parameters recorded on the checkpoint that
//! opened it; a later checkpoint closes the segment and freezes what it
//! earned into `accrued_before`. Entries are never rewritten.

/// Why a checkpoint was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub enum CheckpointKind {
    /// First segment, opened at construction.
    Genesis,
    /// `transfers_multiplicity` changed.
    Multiplicity,
    /// `units_per_threshold` changed.
    UnitsPerThreshold,
    /// Units were consumed by a mint.
    Consumption,
    /// The transfer counter was switched to another ledger.
    SourceChange,
}

/// One segment boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Checkpoint {
    pub kind: CheckpointKind,
    /// Counter value, in the previous segment's source, where the previous
    /// segment stopped earning. Equal to `opened_at` unless the source changed.
    pub closed_at: u64,
    /// Counter value where this segment starts earning.
    pub opened_at: u64,
    /// Transfers needed per threshold in this segment.
    pub multiplicity: u64,
    /// Units granted per threshold in this segment.
    pub units_per_threshold: u64,
    /// Units accrued by all earlier segments.
    pub accrued_before: u64,
}

impl Checkpoint {
    /// Units this segment has earned with the counter at `now`.
    ///
    /// A counter below `opened_at` earns nothing.
    pub fn earned(&self, now: u64) -> Option<u64> {
        let thresholds = now.saturating_sub(self.opened_at) / self.multiplicity;
        thresholds.checked_mul(self.units_per_threshold)
    }

    /// Transfers past the last whole threshold with the counter at `now`.
    pub fn remainder(&self, now: u64) -> u64 {
        now.saturating_sub(self.opened_at) % self.multiplicity
    }
}

/// Non-empty, append-only sequence of [`Checkpoint`]s.
///
/// The genesis entry is held apart from the rest, so no value of this type,
/// decoded ones included, can be empty.
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct CheckpointLog {
    genesis: Checkpoint,
    later: Vec<Checkpoint>,
}

impl CheckpointLog {
    /// Start a log with its genesis checkpoint.
    pub fn new(genesis: Checkpoint) -> Self {
        Self {
            genesis,
            later: Vec::new(),
        }
    }

    /// Append a checkpoint.
    pub fn push(&mut self, checkpoint: Checkpoint) {
        self.later.push(checkpoint);
    }

    /// The checkpoint opening the current segment.
    pub fn last(&self) -> &Checkpoint {
        self.later.last().unwrap_or(&self.genesis)
    }

    /// Number of checkpoints, genesis included. Never zero.
    pub fn len(&self) -> usize {
        self.later.len() + 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        std::iter::once(&self.genesis).chain(self.later.iter())
    }

    /// Re-derive the units accrued by every segment from scratch.
    ///
    /// Closed segments are recomputed from their boundaries rather than read
    /// from `accrued_before`; only the open segment uses `now`.
    pub fn replay(&self, now: u64) -> Option<u64> {
        let mut total: u64 = 0;
        for (open, next) in self.iter().zip(self.later.iter()) {
            total = total.checked_add(open.earned(next.closed_at)?)?;
        }
        total.checked_add(self.last().earned(now)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(kind: CheckpointKind, at: u64, m: u64, u: u64, before: u64) -> Checkpoint {
        Checkpoint {
            kind,
            closed_at: at,
            opened_at: at,
            multiplicity: m,
            units_per_threshold: u,
            accrued_before: before,
        }
    }

    #[test]
    fn earned_floors_whole_thresholds() {
        let c = cp(CheckpointKind::Genesis, 10, 3, 2, 0);
        assert_eq!(c.earned(10), Some(0));
        assert_eq!(c.earned(12), Some(0));
        assert_eq!(c.earned(13), Some(2));
        assert_eq!(c.earned(17), Some(4));
        assert_eq!(c.remainder(17), 1);
    }

    #[test]
    fn earned_tolerates_counter_below_start() {
        let c = cp(CheckpointKind::Genesis, 10, 1, 1, 0);
        assert_eq!(c.earned(3), Some(0));
        assert_eq!(c.remainder(3), 0);
    }

    #[test]
    fn earned_overflow_is_none() {
        let c = cp(CheckpointKind::Genesis, 0, 1, u64::MAX, 0);
        assert_eq!(c.earned(2), None);
    }

    #[test]
    fn replay_sums_closed_segments() {
        let mut log = CheckpointLog::new(cp(CheckpointKind::Genesis, 0, 2, 1, 0));
        // 5 transfers at m=2 -> 2 units, remainder forfeited
        log.push(cp(CheckpointKind::Multiplicity, 5, 1, 1, 2));
        // 3 more at m=1 -> 3 units
        log.push(cp(CheckpointKind::UnitsPerThreshold, 8, 1, 10, 5));
        assert_eq!(log.len(), 3);
        assert_eq!(log.replay(8), Some(5));
        assert_eq!(log.replay(10), Some(25));
    }

    #[test]
    fn replay_uses_closing_counter_across_sources() {
        let mut log = CheckpointLog::new(cp(CheckpointKind::Genesis, 0, 1, 1, 0));
        log.push(Checkpoint {
            kind: CheckpointKind::SourceChange,
            closed_at: 4,
            opened_at: 100,
            multiplicity: 1,
            units_per_threshold: 1,
            accrued_before: 4,
        });
        assert_eq!(log.replay(100), Some(4));
        assert_eq!(log.replay(103), Some(7));
    }

    #[test]
    fn log_is_never_empty() {
        let log = CheckpointLog::new(cp(CheckpointKind::Genesis, 3, 2, 1, 0));
        assert_eq!(log.len(), 1);
        assert_eq!(log.iter().count(), 1);
        assert_eq!(log.last().kind, CheckpointKind::Genesis);
    }

    #[test]
    fn decoding_requires_a_genesis_entry() {
        // A bare zero-length sequence is not a valid log.
        let decoded =
            bincode::decode_from_slice::<CheckpointLog, _>(&[0u8], bincode::config::standard());
        assert!(decoded.is_err());

        let mut log = CheckpointLog::new(cp(CheckpointKind::Genesis, 0, 2, 1, 0));
        log.push(cp(CheckpointKind::Consumption, 4, 2, 1, 2));
        let bytes = bincode::encode_to_vec(&log, bincode::config::standard()).unwrap();
        let (back, _): (CheckpointLog, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(back, log);
        assert_eq!(back.last().kind, CheckpointKind::Consumption);
    }
}
