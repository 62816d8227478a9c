//! Aggregate root trait and optimistic concurrency expectations.

/// Aggregate root marker + minimal interface.
///
/// An aggregate is the unit that is loaded, mutated and saved as a whole. The
/// version lets the persistence layer detect lost updates when two writers
/// raced on the same aggregate.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    ///
    /// A freshly constructed aggregate is at version 0; every persisted
    /// mutation bumps it by one.
    fn version(&self) -> u64;
}

/// Optimistic concurrency expectation for an aggregate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// The aggregate must not exist yet.
    New,
    /// Require the stored aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// Checks the expectation against the currently stored version
    /// (`None` when nothing is stored yet).
    pub fn matches(self, actual: Option<u64>) -> bool {
        match (self, actual) {
            (ExpectedVersion::New, None) => true,
            (ExpectedVersion::New, Some(_)) => false,
            (ExpectedVersion::Exact(v), Some(a)) => v == a,
            (ExpectedVersion::Exact(_), None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_only_matches_missing_records() {
        assert!(ExpectedVersion::New.matches(None));
        assert!(!ExpectedVersion::New.matches(Some(0)));
    }

    #[test]
    fn exact_requires_same_version() {
        assert!(ExpectedVersion::Exact(3).matches(Some(3)));
        assert!(!ExpectedVersion::Exact(3).matches(Some(4)));
        assert!(!ExpectedVersion::Exact(0).matches(None));
    }
}
