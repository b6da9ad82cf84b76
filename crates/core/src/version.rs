//! Optimistic concurrency primitives.

/// Optimistic concurrency expectation for a versioned record.
///
/// Every accepted write bumps a record's version by one; writers state the
/// version they read so a concurrent writer in between is detected.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the record to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}
