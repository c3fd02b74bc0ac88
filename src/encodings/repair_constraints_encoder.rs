use super::{
    specs::validate_constraints, Cnf, ConflictHypergraph, ConstraintsEncoder, VariableMap,
};
use crate::{
    data::{ConstraintSet, IntegrityConstraint},
    error::CavsatError,
    sat::{Literal, Variable},
};

/// An encoder which models are exactly the repairs of the relation.
///
/// A repair is a maximal subset of the records such that:
/// * no kept record fails a `check` constraint,
/// * every record matching a `require` constraint is kept,
/// * no conflict induced by a group constraint is fully kept.
///
/// Records failing a `check` constraint get a negative unit clause and make their conflicts irrelevant.
/// Each remaining conflict `E` gets the clause `{-u : u in E}`.
/// Maximality states that each remaining record is kept or has a witness conflict, which other members are all kept:
/// binary conflicts use the literal of the other record as witness,
/// larger ones use an auxiliary variable implying each other member.
///
/// Groups limited by an `atmost` constraint are encoded with a sequential counter over their remaining members.
/// The counter registers are defined by equivalences, so the last one holds iff the group is full;
/// it is the witness of every member of the group.
#[derive(Debug, Default, Clone, Copy)]
pub struct RepairConstraintsEncoder;

impl ConstraintsEncoder for RepairConstraintsEncoder {
    fn encode_constraints(
        &self,
        map: &VariableMap,
        constraints: &ConstraintSet,
    ) -> Result<Cnf, CavsatError> {
        validate_constraints(map, constraints)?;
        let mut cnf = Cnf::new(map.len());
        let mut excluded = vec![false; map.len()];
        let mut hypergraph = ConflictHypergraph::new(map.len());
        for c in constraints.iter() {
            match c {
                IntegrityConstraint::Check(p) => {
                    for (var, record) in map.iter() {
                        if !p.eval(record) {
                            cnf.add_clause(vec![var.negative()]);
                            excluded[usize::from(var) - 1] = true;
                        }
                    }
                }
                IntegrityConstraint::Require(p) => {
                    for (var, record) in map.iter() {
                        if p.eval(record) {
                            cnf.add_clause(vec![var.positive()]);
                        }
                    }
                }
                _ => hypergraph.merge(ConflictHypergraph::from_constraint(map, c)?),
            }
        }
        let is_excluded = |v: &Variable| excluded[usize::from(*v) - 1];
        let live_edges = hypergraph
            .edges()
            .iter()
            .filter(|e| !e.iter().any(is_excluded))
            .collect::<Vec<&Vec<Variable>>>();
        let mut witnesses: Vec<Vec<Literal>> = vec![vec![]; map.len()];
        for edge in live_edges.iter() {
            cnf.add_clause(edge.iter().map(|v| v.negative()).collect());
        }
        for edge in live_edges.iter() {
            match edge.len() {
                1 => {}
                2 => {
                    witnesses[usize::from(edge[0]) - 1].push(edge[1].positive());
                    witnesses[usize::from(edge[1]) - 1].push(edge[0].positive());
                }
                _ => {
                    for v in edge.iter() {
                        let aux = cnf.new_var();
                        edge.iter()
                            .filter(|u| *u != v)
                            .for_each(|u| cnf.add_clause(vec![aux.negative(), u.positive()]));
                        witnesses[usize::from(*v) - 1].push(aux.positive());
                    }
                }
            }
        }
        for conflict in hypergraph.cardinality_conflicts() {
            let live_members = conflict
                .members()
                .iter()
                .filter(|v| !is_excluded(*v))
                .copied()
                .collect::<Vec<Variable>>();
            if let Some(full) = encode_cardinality(&mut cnf, &live_members, conflict.bound()) {
                live_members
                    .iter()
                    .for_each(|v| witnesses[usize::from(*v) - 1].push(full.positive()));
            }
        }
        let in_singleton = singleton_members(&live_edges, map.len());
        for (var, _) in map.iter() {
            let index = usize::from(var) - 1;
            if excluded[index] || in_singleton[index] {
                continue;
            }
            let mut cl = Vec::with_capacity(1 + witnesses[index].len());
            cl.push(var.positive());
            cl.append(&mut witnesses[index]);
            cnf.add_clause(cl);
        }
        Ok(cnf)
    }
}

/// Encodes that at most `bound` of the members are true, with a sequential counter.
///
/// Register `r(i, j)` is true iff at least `j` of the first `i` members are true.
/// Returns the register stating that `bound` members are true, or `None` if there are not more members than the bound.
fn encode_cardinality(cnf: &mut Cnf, members: &[Variable], bound: usize) -> Option<Variable> {
    if bound == 0 || members.len() <= bound {
        return None;
    }
    let mut previous: Vec<Option<Variable>> = vec![None; bound + 1];
    for (i, x) in members.iter().enumerate() {
        if let Some(p) = previous[bound] {
            cnf.add_clause(vec![p.negative(), x.negative()]);
        }
        let mut current: Vec<Option<Variable>> = vec![None; bound + 1];
        for j in 1..=usize::min(i + 1, bound) {
            let r = cnf.new_var();
            if let Some(p) = previous[j] {
                cnf.add_clause(vec![p.negative(), r.positive()]);
            }
            if j == 1 {
                cnf.add_clause(vec![x.negative(), r.positive()]);
            } else if let Some(q) = previous[j - 1] {
                cnf.add_clause(vec![q.negative(), x.negative(), r.positive()]);
            }
            if j > 1 {
                let mut cl = vec![r.negative()];
                cl.extend(previous[j].map(|p| p.positive()));
                cl.extend(previous[j - 1].map(|q| q.positive()));
                cnf.add_clause(cl);
            }
            let mut cl = vec![r.negative()];
            cl.extend(previous[j].map(|p| p.positive()));
            cl.push(x.positive());
            cnf.add_clause(cl);
            current[j] = Some(r);
        }
        previous = current;
    }
    previous[bound]
}

fn singleton_members(edges: &[&Vec<Variable>], n_records: usize) -> Vec<bool> {
    let mut members = vec![false; n_records];
    edges
        .iter()
        .filter(|e| e.len() == 1)
        .for_each(|e| members[usize::from(e[0]) - 1] = true);
    members
}
