use super::{Predicate, Record};
use crate::error::CavsatError;
use std::fmt::Display;

/// An integrity constraint the consistent part of a relation must satisfy.
///
/// Local constraints ([`Check`](Self::Check) and [`Require`](Self::Require)) are decided record by record,
/// while group constraints range over sets of conflicting records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityConstraint {
    /// Records that do not satisfy the predicate cannot be kept.
    Check(Predicate),
    /// Records that satisfy the predicate must be kept.
    Require(Predicate),
    /// No two distinct records share the values of these fields.
    Key(Vec<usize>),
    /// Records agreeing on the determinant fields must agree on the dependent fields.
    FunctionalDependency {
        /// the left-hand side of the dependency
        determinant: Vec<usize>,
        /// the right-hand side of the dependency
        dependent: Vec<usize>,
    },
    /// At most `count` records share the values of these fields.
    AtMost {
        /// the maximal number of records in a group
        count: usize,
        /// the fields defining the groups
        fields: Vec<usize>,
    },
    /// These records cannot be kept together.
    Conflict(Vec<Record>),
}

impl IntegrityConstraint {
    /// Returns `true` iff the constraint is decided record by record.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            IntegrityConstraint::Check(_) | IntegrityConstraint::Require(_)
        )
    }

    /// Checks the constraint is well-formed for records of the given arity.
    pub fn validate(&self, arity: usize) -> Result<(), CavsatError> {
        let check_fields = |fields: &[usize]| {
            if fields.is_empty() {
                return Err(CavsatError::invalid_constraint(format!(
                    "{}: empty list of fields",
                    self
                )));
            }
            match fields.iter().find(|f| **f >= arity) {
                Some(f) => Err(CavsatError::schema(format!(
                    "{}: field #{} does not exist in records with {} fields",
                    self, f, arity
                ))),
                None => Ok(()),
            }
        };
        match self {
            IntegrityConstraint::Check(p) | IntegrityConstraint::Require(p) => p.check_arity(arity),
            IntegrityConstraint::Key(fields) => check_fields(fields),
            IntegrityConstraint::FunctionalDependency {
                determinant,
                dependent,
            } => {
                check_fields(determinant)?;
                check_fields(dependent)
            }
            IntegrityConstraint::AtMost { count, fields } => {
                if *count == 0 {
                    return Err(CavsatError::invalid_constraint(format!(
                        "{}: the bound must be positive",
                        self
                    )));
                }
                check_fields(fields)
            }
            IntegrityConstraint::Conflict(records) => {
                if records.is_empty() {
                    return Err(CavsatError::invalid_constraint(
                        "a conflict must involve at least one record",
                    ));
                }
                match records.iter().find(|r| r.arity() != arity) {
                    Some(r) => Err(CavsatError::schema(format!(
                        "conflicting record {} has {} fields, expected {}",
                        r,
                        r.arity(),
                        arity
                    ))),
                    None => Ok(()),
                }
            }
        }
    }
}

fn fields_to_string(fields: &[usize]) -> String {
    fields
        .iter()
        .map(|f| format!("#{}", f))
        .collect::<Vec<String>>()
        .join(", ")
}

impl Display for IntegrityConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityConstraint::Check(p) => write!(f, "check {}", p),
            IntegrityConstraint::Require(p) => write!(f, "require {}", p),
            IntegrityConstraint::Key(fields) => write!(f, "key({})", fields_to_string(fields)),
            IntegrityConstraint::FunctionalDependency {
                determinant,
                dependent,
            } => write!(
                f,
                "fd({} -> {})",
                fields_to_string(determinant),
                fields_to_string(dependent)
            ),
            IntegrityConstraint::AtMost { count, fields } => {
                write!(f, "atmost({}, {})", count, fields_to_string(fields))
            }
            IntegrityConstraint::Conflict(records) => write!(
                f,
                "conflict {}",
                records
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<String>>()
                    .join(" ")
            ),
        }
    }
}

/// An ordered set of integrity constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    constraints: Vec<IntegrityConstraint>,
}

impl ConstraintSet {
    /// Builds a set from a list of constraints.
    pub fn new(constraints: Vec<IntegrityConstraint>) -> Self {
        Self { constraints }
    }

    /// Appends a constraint.
    pub fn push(&mut self, constraint: IntegrityConstraint) {
        self.constraints.push(constraint);
    }

    /// Iterates over the constraints, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &IntegrityConstraint> + '_ {
        self.constraints.iter()
    }

    /// Returns the number of constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Returns `true` iff the set holds no constraint.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Validates every constraint against the arity of the records.
    pub fn validate(&self, arity: usize) -> Result<(), CavsatError> {
        self.constraints.iter().try_for_each(|c| c.validate(arity))
    }
}

impl FromIterator<IntegrityConstraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = IntegrityConstraint>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
