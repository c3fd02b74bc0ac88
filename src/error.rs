//! Errors raised by the library.

use thiserror::Error;

/// The structural errors raised while encoding a relation or extracting answers.
///
/// These errors denote a misuse of the pipeline (malformed records, a constraint referencing
/// something out of the current encoding, ...) and abort the current session.
/// Expected outcomes such as unsatisfiability or a truncated enumeration are not errors;
/// they are reported through the result types of the solvers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CavsatError {
    /// Malformed records: arity mismatch, duplicate identity rejected by policy, bad field reference, ...
    #[error("schema error: {0}")]
    Schema(String),
    /// A constraint or a repair references a record which is not in the current encoding.
    #[error("unknown record: {0}")]
    UnknownRecord(String),
    /// A constraint that cannot be encoded (empty key, null bound, ...).
    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),
}

impl CavsatError {
    pub(crate) fn schema<S: Into<String>>(msg: S) -> Self {
        CavsatError::Schema(msg.into())
    }

    pub(crate) fn unknown_record<S: Into<String>>(msg: S) -> Self {
        CavsatError::UnknownRecord(msg.into())
    }

    pub(crate) fn invalid_constraint<S: Into<String>>(msg: S) -> Self {
        CavsatError::InvalidConstraint(msg.into())
    }
}
