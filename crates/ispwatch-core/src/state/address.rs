// # Address State
//
// Holds the (old, current, new) triple for the lifetime of the process.
//
// `new` is a staging slot written by the primary resolver before any
// decision is made. `current` only moves through `transition()` or
// `replace_via_backup()`, so a failed cycle never corrupts the last
// known-good address.

use serde::Serialize;

use crate::address::Address;

/// The address triple tracked by the check engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressState {
    old: Address,
    current: Address,
    new: Address,
}

impl AddressState {
    /// Create an empty state (all three addresses empty)
    pub fn new() -> Self {
        Self::default()
    }

    /// Previous value of `current` at the last transition
    pub fn old(&self) -> &Address {
        &self.old
    }

    /// Last known-good address
    pub fn current(&self) -> &Address {
        &self.current
    }

    /// Most recently staged address
    pub fn staged(&self) -> &Address {
        &self.new
    }

    /// Whether `candidate` differs (case-insensitively) from `current`
    pub fn compare(&self, candidate: &Address) -> bool {
        !self.current.matches(candidate)
    }

    /// Write the staging slot
    pub fn stage(&mut self, candidate: Address) {
        self.new = candidate;
    }

    /// Move `current` to `old` and make `candidate` current
    ///
    /// Callers must only invoke this after [`compare`](Self::compare)
    /// reported a change.
    pub fn transition(&mut self, candidate: Address) {
        debug_assert!(self.compare(&candidate), "transition without a change");
        self.old = std::mem::replace(&mut self.current, candidate);
    }

    /// Backup consensus path: clear `current`, then set it to `candidate`
    ///
    /// `old` receives the value `current` held before it was cleared. The
    /// staging slot is left untouched.
    pub fn replace_via_backup(&mut self, candidate: Address) {
        self.old = std::mem::take(&mut self.current);
        self.current = candidate;
    }
}
