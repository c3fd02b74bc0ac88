use super::{Cnf, VariableMap};
use crate::{
    data::{ConstraintSet, Record},
    error::CavsatError,
    sat::{Assignment, Literal},
    solvers::Repair,
};

/// A trait for objects translating integrity constraints into CNF formulas.
///
/// The record variables of the formulas are the ones of the [`VariableMap`];
/// encoders may introduce auxiliary variables after them.
pub trait ConstraintsEncoder {
    /// Encodes the constraints over the records of the map.
    ///
    /// Clauses are produced in a deterministic order: constraint order, then variable order.
    fn encode_constraints(
        &self,
        map: &VariableMap,
        constraints: &ConstraintSet,
    ) -> Result<Cnf, CavsatError>;

    /// Translates a model of the formula into the repair it denotes.
    fn assignment_to_repair(&self, map: &VariableMap, assignment: &Assignment) -> Repair {
        Repair::from_assignment(map.len(), assignment)
    }

    /// Returns the positive literal of the (first) variable associated with a record.
    fn record_to_lit(&self, map: &VariableMap, record: &Record) -> Option<Literal> {
        map.variable_of(record).map(|v| v.positive())
    }
}

pub(crate) fn validate_constraints(
    map: &VariableMap,
    constraints: &ConstraintSet,
) -> Result<(), CavsatError> {
    match map.arity() {
        Some(arity) => constraints.validate(arity),
        None => Ok(()),
    }
}
