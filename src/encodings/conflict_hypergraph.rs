use super::VariableMap;
use crate::{
    data::{ConstraintSet, IntegrityConstraint, Value},
    error::CavsatError,
    sat::Variable,
};
use permutator::CartesianProduct;
use std::collections::{HashMap, HashSet};

/// The conflicts induced by group constraints over the records of a [`VariableMap`].
///
/// Each hyperedge is a set of record variables that cannot be kept together.
/// Hyperedges are stored with sorted variables, without duplicates,
/// in the order their constraints were given (then in record order).
///
/// Groups limited by an `atmost` constraint are not expanded into hyperedges:
/// they are kept as [`CardinalityConflict`]s, which stand for all their subsets of size `bound + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictHypergraph {
    n_records: usize,
    edges: Vec<Vec<Variable>>,
    known_edges: HashSet<Vec<Variable>>,
    cardinality_conflicts: Vec<CardinalityConflict>,
}

/// A group of records of which at most `bound` records can be kept together.
///
/// The group is larger than its bound, and the bound is positive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardinalityConflict {
    members: Vec<Variable>,
    bound: usize,
}

impl CardinalityConflict {
    /// Returns the variables of the group, in increasing order.
    pub fn members(&self) -> &[Variable] {
        &self.members
    }

    /// Returns the maximal number of members that can be kept together.
    pub fn bound(&self) -> usize {
        self.bound
    }
}

impl ConflictHypergraph {
    /// Builds an hypergraph without conflicts.
    pub fn new(n_records: usize) -> Self {
        Self {
            n_records,
            ..Default::default()
        }
    }

    /// Computes the conflicts induced by a single constraint.
    ///
    /// Local constraints produce no conflict.
    pub fn from_constraint(
        map: &VariableMap,
        constraint: &IntegrityConstraint,
    ) -> Result<Self, CavsatError> {
        let mut hypergraph = Self::new(map.len());
        match constraint {
            IntegrityConstraint::Check(_) | IntegrityConstraint::Require(_) => {}
            IntegrityConstraint::Key(fields) => {
                for group in group_by(map, fields) {
                    for (i, v) in group.iter().enumerate() {
                        group[i + 1..]
                            .iter()
                            .for_each(|w| hypergraph.add_edge(vec![*v, *w]));
                    }
                }
            }
            IntegrityConstraint::FunctionalDependency {
                determinant,
                dependent,
            } => {
                for group in group_by(map, determinant) {
                    let dependents = group
                        .iter()
                        .map(|v| project(map, *v, dependent))
                        .collect::<Vec<Vec<&Value>>>();
                    for i in 0..group.len() {
                        for j in i + 1..group.len() {
                            if dependents[i] != dependents[j] {
                                hypergraph.add_edge(vec![group[i], group[j]]);
                            }
                        }
                    }
                }
            }
            IntegrityConstraint::AtMost { count, fields } => {
                for group in group_by(map, fields) {
                    if group.len() <= *count {
                        continue;
                    }
                    if *count == 0 {
                        group.into_iter().for_each(|v| hypergraph.add_edge(vec![v]));
                    } else {
                        hypergraph.add_cardinality_conflict(group, *count);
                    }
                }
            }
            IntegrityConstraint::Conflict(records) => {
                let copies = records
                    .iter()
                    .map(|r| {
                        let vars = map.variables_of(r);
                        if vars.is_empty() {
                            Err(CavsatError::unknown_record(format!(
                                "{} is referenced by a conflict but is not in the relation",
                                r
                            )))
                        } else {
                            Ok(vars)
                        }
                    })
                    .collect::<Result<Vec<&[Variable]>, CavsatError>>()?;
                if copies.len() == 1 {
                    copies[0]
                        .iter()
                        .for_each(|v| hypergraph.add_edge(vec![*v]));
                } else {
                    copies
                        .cart_prod()
                        .for_each(|e| hypergraph.add_edge(e.into_iter().copied().collect()));
                }
            }
        }
        Ok(hypergraph)
    }

    /// Computes the conflicts induced by a set of constraints.
    pub fn from_constraints(
        map: &VariableMap,
        constraints: &ConstraintSet,
    ) -> Result<Self, CavsatError> {
        let mut hypergraph = Self::new(map.len());
        for c in constraints.iter() {
            hypergraph.merge(Self::from_constraint(map, c)?);
        }
        Ok(hypergraph)
    }

    fn add_edge(&mut self, mut edge: Vec<Variable>) {
        edge.sort_unstable();
        edge.dedup();
        if self.known_edges.insert(edge.clone()) {
            self.edges.push(edge);
        }
    }

    fn add_cardinality_conflict(&mut self, members: Vec<Variable>, bound: usize) {
        let conflict = CardinalityConflict { members, bound };
        if !self.cardinality_conflicts.contains(&conflict) {
            self.cardinality_conflicts.push(conflict);
        }
    }

    /// Adds the conflicts of another hypergraph to this one.
    pub fn merge(&mut self, other: ConflictHypergraph) {
        self.n_records = usize::max(self.n_records, other.n_records);
        other.edges.into_iter().for_each(|e| self.add_edge(e));
        other
            .cardinality_conflicts
            .into_iter()
            .for_each(|c| self.add_cardinality_conflict(c.members, c.bound));
    }

    /// Returns the hyperedges.
    pub fn edges(&self) -> &[Vec<Variable>] {
        &self.edges
    }

    /// Returns the groups limited by a cardinality.
    pub fn cardinality_conflicts(&self) -> &[CardinalityConflict] {
        &self.cardinality_conflicts
    }

    /// Returns the number of conflicts, counting each cardinality conflict once.
    pub fn len(&self) -> usize {
        self.edges.len() + self.cardinality_conflicts.len()
    }

    /// Returns `true` iff there is no conflict.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty() && self.cardinality_conflicts.is_empty()
    }

    /// Returns, for each record variable (at index `var - 1`), whether it is involved in a conflict.
    pub fn involvement(&self) -> Vec<bool> {
        let mut involved = vec![false; self.n_records];
        self.edges
            .iter()
            .flatten()
            .chain(self.cardinality_conflicts.iter().flat_map(|c| c.members.iter()))
            .for_each(|v| involved[usize::from(*v) - 1] = true);
        involved
    }
}

fn project<'a>(map: &'a VariableMap, var: Variable, fields: &[usize]) -> Vec<&'a Value> {
    map.record_of(var)
        .map(|r| r.project(fields))
        .unwrap_or_default()
}

/// Groups the record variables by their values on the given fields.
///
/// Groups appear in the order of their first record; variables are sorted inside groups.
/// Groups of a single record are included.
fn group_by(map: &VariableMap, fields: &[usize]) -> Vec<Vec<Variable>> {
    let mut key_to_group: HashMap<Vec<&Value>, usize> = HashMap::new();
    let mut groups: Vec<Vec<Variable>> = vec![];
    for (var, record) in map.iter() {
        let key = record.project(fields);
        match key_to_group.get(&key) {
            Some(i) => groups[*i].push(var),
            None => {
                key_to_group.insert(key, groups.len());
                groups.push(vec![var]);
            }
        }
    }
    groups
}
