use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    pub struct SimulationId;
}

/// Stable identifier of a charge (and of the field bound to it).
///
/// Ids are handed out by a per-simulation monotonic counter and persisted with
/// the project, so a reloaded simulation never reissues an id it has used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChargeId(pub u64);

impl ChargeId {
    /// Exclusive upper bound for persisted ids and id counters. Keeps every id
    /// exactly representable as a JSON number.
    pub const LIMIT: u64 = 1 << 53;
}

impl fmt::Display for ChargeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
