use super::{
    specs::validate_constraints, Cnf, ConflictHypergraph, ConstraintsEncoder, VariableMap,
};
use crate::{
    data::{ConstraintSet, IntegrityConstraint},
    error::CavsatError,
};

/// An encoder deciding the fate of each record independently.
///
/// A record is admissible when it satisfies every `check` predicate and takes part in no conflict of a group constraint.
/// Each record gets exactly one unit clause: `{v}` if it is admissible, `{-v}` otherwise.
/// A record matching a `require` predicate while being inadmissible gets both `{-v}` and `{v}`.
///
/// The resulting formula has at most one model: the encoding behaves like a filter.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterConstraintsEncoder;

impl ConstraintsEncoder for FilterConstraintsEncoder {
    fn encode_constraints(
        &self,
        map: &VariableMap,
        constraints: &ConstraintSet,
    ) -> Result<Cnf, CavsatError> {
        validate_constraints(map, constraints)?;
        let mut admissible = vec![true; map.len()];
        let mut required = vec![false; map.len()];
        for c in constraints.iter() {
            match c {
                IntegrityConstraint::Check(p) => {
                    for (var, record) in map.iter() {
                        admissible[usize::from(var) - 1] &= p.eval(record);
                    }
                }
                IntegrityConstraint::Require(p) => {
                    for (var, record) in map.iter() {
                        required[usize::from(var) - 1] |= p.eval(record);
                    }
                }
                _ => {
                    let involvement = ConflictHypergraph::from_constraint(map, c)?.involvement();
                    for (flag, involved) in admissible.iter_mut().zip(involvement) {
                        *flag &= !involved;
                    }
                }
            }
        }
        let mut cnf = Cnf::new(map.len());
        for (var, _) in map.iter() {
            let index = usize::from(var) - 1;
            cnf.add_clause(vec![var.literal(admissible[index])]);
            if required[index] && !admissible[index] {
                cnf.add_clause(vec![var.positive()]);
            }
        }
        Ok(cnf)
    }
}
