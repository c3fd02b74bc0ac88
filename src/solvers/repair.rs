use crate::sat::{Assignment, Literal, Variable};

/// A repair: the subset of the records kept by a model of the encoding.
///
/// The repair is stored as a vector of flags, one per record variable, in variable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Repair {
    kept: Vec<bool>,
}

impl Repair {
    /// Builds a repair from the flags of the record variables.
    pub fn new(kept: Vec<bool>) -> Self {
        Self { kept }
    }

    /// Builds a repair by projecting an assignment on the first `n_records` variables.
    ///
    /// Unassigned variables are considered as excluded.
    pub fn from_assignment(n_records: usize, assignment: &Assignment) -> Self {
        Self {
            kept: (1..=n_records)
                .map(|i| assignment.value_of(i).unwrap_or(false))
                .collect(),
        }
    }

    /// Returns `true` iff the record associated with the variable is kept.
    pub fn is_kept(&self, var: Variable) -> bool {
        self.kept
            .get(usize::from(var) - 1)
            .copied()
            .unwrap_or(false)
    }

    /// Returns the variables of the kept records, in increasing order.
    pub fn kept_variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.kept
            .iter()
            .enumerate()
            .filter(|(_, k)| **k)
            .map(|(i, _)| Variable::from(i + 1))
    }

    /// Returns the number of kept records.
    pub fn n_kept(&self) -> usize {
        self.kept.iter().filter(|k| **k).count()
    }

    /// Returns the number of record variables this repair is defined on.
    pub fn n_records(&self) -> usize {
        self.kept.len()
    }

    /// Returns the clause forbidding this repair (and only this one, projected on the record variables).
    pub fn blocking_clause(&self) -> Vec<Literal> {
        self.kept
            .iter()
            .enumerate()
            .map(|(i, k)| Variable::from(i + 1).literal(!k))
            .collect()
    }
}

/// The outcome of a request for a single repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairOutcome {
    /// A repair was found.
    Repair(Repair),
    /// No repair exists: the constraints are contradictory.
    Unsatisfiable,
    /// The solver budget was exhausted before a conclusion was reached.
    Timeout,
}

/// The reason an enumeration of repairs stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationStatus {
    /// All the repairs were enumerated.
    Complete,
    /// The enumeration stopped at the bound while more repairs exist.
    BoundExceeded {
        /// the maximal number of repairs
        bound: usize,
    },
    /// The solver budget was exhausted; the repairs found so far are returned.
    Timeout,
}

/// A family of repairs returned by an enumeration, along with the reason the enumeration stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairFamily {
    repairs: Vec<Repair>,
    status: EnumerationStatus,
}

impl RepairFamily {
    /// Builds a new family.
    pub fn new(repairs: Vec<Repair>, status: EnumerationStatus) -> Self {
        Self { repairs, status }
    }

    /// Returns the repairs, in the order they were found.
    pub fn repairs(&self) -> &[Repair] {
        &self.repairs
    }

    /// Returns the reason the enumeration stopped.
    pub fn status(&self) -> EnumerationStatus {
        self.status
    }

    /// Returns `true` iff the enumeration was not truncated.
    pub fn is_complete(&self) -> bool {
        self.status == EnumerationStatus::Complete
    }

    /// Returns `true` iff the enumeration completed without finding any repair.
    pub fn is_unsatisfiable(&self) -> bool {
        self.is_complete() && self.repairs.is_empty()
    }

    /// Returns the number of repairs.
    pub fn len(&self) -> usize {
        self.repairs.len()
    }

    /// Returns `true` iff no repair was found.
    pub fn is_empty(&self) -> bool {
        self.repairs.is_empty()
    }
}
