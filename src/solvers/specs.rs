use super::{RepairFamily, RepairOutcome};
use crate::{error::CavsatError, sat::Variable};

/// The answer of a solver to a question about a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptanceStatus {
    /// The property holds.
    Accepted,
    /// The property does not hold.
    Rejected,
    /// The relation admits no repair, so the question is meaningless.
    NoRepair,
    /// The solver budget was exhausted before a conclusion was reached.
    Timeout,
}

/// A trait for solvers able to compute a repair.
pub trait SingleRepairComputer {
    /// Computes a single repair.
    ///
    /// In case the constraints admit no repair, [RepairOutcome::Unsatisfiable] is returned.
    fn compute_one_repair(&mut self) -> RepairOutcome;
}

/// A trait for solvers able to enumerate the repairs.
pub trait RepairEnumerator {
    /// Enumerates the repairs, up to the given bound.
    ///
    /// The status of the returned family tells whether the enumeration is complete,
    /// or if it was stopped by the bound or by the solver budget.
    fn enumerate_repairs(&mut self, bound: usize) -> RepairFamily;
}

/// A trait for solvers able to check whether a record is kept by at least one repair.
pub trait PossibleAnswerComputer {
    /// Checks whether the record associated with the variable is kept by at least one repair.
    ///
    /// An error is returned if the variable is not a record variable.
    fn is_possible_answer(&mut self, var: Variable) -> Result<AcceptanceStatus, CavsatError>;
}

/// A trait for solvers able to check whether a record is kept by all the repairs.
pub trait CertainAnswerComputer {
    /// Checks whether the record associated with the variable is kept by all the repairs.
    ///
    /// An error is returned if the variable is not a record variable.
    fn is_certain_answer(&mut self, var: Variable) -> Result<AcceptanceStatus, CavsatError>;
}
