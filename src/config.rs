//! Configuration objects passed to the pipeline stages.

use crate::encodings::{DuplicatePolicy, EncodingKind};
use std::time::Duration;

/// The default maximal number of repairs an enumeration may return.
pub const DEFAULT_MAX_REPAIRS: usize = 1 << 10;

/// The settings of an encode/solve/extract session.
///
/// There is no global state in this crate: each stage receives the configuration it needs.
///
/// # Example
///
/// ```
/// # use cavsat::config::Config;
/// # use cavsat::encodings::EncodingKind;
/// # use std::time::Duration;
/// let config = Config::default()
///     .with_encoding(EncodingKind::Filter)
///     .with_time_limit(Some(Duration::from_secs(10)));
/// assert_eq!(EncodingKind::Filter, config.encoding());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    encoding: EncodingKind,
    duplicate_policy: DuplicatePolicy,
    max_repairs: usize,
    time_limit: Option<Duration>,
    conflict_limit: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encoding: EncodingKind::default(),
            duplicate_policy: DuplicatePolicy::default(),
            max_repairs: DEFAULT_MAX_REPAIRS,
            time_limit: None,
            conflict_limit: None,
        }
    }
}

impl Config {
    /// Sets the encoding used to translate the constraints.
    pub fn with_encoding(mut self, encoding: EncodingKind) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the policy applied to records sharing the same values.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Sets the maximal number of repairs an enumeration may return.
    pub fn with_max_repairs(mut self, max_repairs: usize) -> Self {
        self.max_repairs = max_repairs;
        self
    }

    /// Sets the wall-clock budget of a solving session.
    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Sets the maximal number of conflicts of each SAT call.
    pub fn with_conflict_limit(mut self, conflict_limit: Option<u32>) -> Self {
        self.conflict_limit = conflict_limit;
        self
    }

    /// Returns the encoding kind.
    pub fn encoding(&self) -> EncodingKind {
        self.encoding
    }

    /// Returns the policy applied to duplicate records.
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Returns the maximal number of enumerated repairs.
    pub fn max_repairs(&self) -> usize {
        self.max_repairs
    }

    /// Returns the time budget of a solving session, if any.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Returns the conflict budget of each SAT call, if any.
    pub fn conflict_limit(&self) -> Option<u32> {
        self.conflict_limit
    }
}
