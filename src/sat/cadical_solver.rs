use super::{
    sat_solver::{SolvingListener, SolvingResult},
    Assignment, Literal, SatSolver,
};
use cadical::{Solver as CadicalCSolver, Timeout};
use log::warn;
use std::time::Duration;

/// A wrapper around the Cadical SAT solver.
///
/// Time limits are handled by the termination callbacks of Cadical,
/// conflict limits by its `conflicts` search limit.
#[derive(Default)]
pub struct CadicalSolver {
    solver: CadicalCSolver,
    n_reserved: usize,
    n_clauses: usize,
    time_limit: Option<Duration>,
    conflict_limit: Option<u32>,
    listeners: Vec<Box<dyn SolvingListener>>,
}

impl CadicalSolver {
    fn set_budgets(&mut self) {
        self.solver.set_callbacks(
            self.time_limit
                .map(|d| Timeout::new(d.as_secs_f32())),
        );
        if let Some(n) = self.conflict_limit {
            let limit = i32::try_from(n).unwrap_or(i32::MAX);
            if let Err(e) = self.solver.set_limit("conflicts", limit) {
                warn!("cannot set the conflict limit of Cadical: {:?}", e);
            }
        }
    }
}

impl SatSolver for CadicalSolver {
    fn add_clause(&mut self, cl: Vec<Literal>) {
        self.solver
            .add_clause(cl.into_iter().map(|l| isize::from(l) as i32));
        self.n_clauses += 1;
    }

    fn solve(&mut self) -> SolvingResult {
        self.solve_under_assumptions(&[])
    }

    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> SolvingResult {
        self.listeners
            .iter()
            .for_each(|l| l.solving_start(self.n_vars(), self.n_clauses));
        self.set_budgets();
        let result = match self
            .solver
            .solve_with(assumptions.iter().map(|l| isize::from(*l) as i32))
        {
            Some(true) => {
                let max_variable = self.solver.max_variable();
                let assignment = Assignment::new(
                    (1..=self.n_vars() as i32)
                        .map(|i| {
                            if i <= max_variable {
                                self.solver.value(i)
                            } else {
                                None
                            }
                        })
                        .collect(),
                );
                SolvingResult::Satisfiable(assignment)
            }
            Some(false) => SolvingResult::Unsatisfiable,
            None => SolvingResult::Unknown,
        };
        self.listeners.iter().for_each(|l| l.solving_end(&result));
        result
    }

    fn n_vars(&self) -> usize {
        usize::max(self.n_reserved, self.solver.max_variable() as usize)
    }

    fn add_listener(&mut self, listener: Box<dyn SolvingListener>) {
        self.listeners.push(listener);
    }

    fn reserve(&mut self, new_max_id: usize) {
        self.n_reserved = usize::max(self.n_reserved, new_max_id);
    }

    fn set_time_limit(&mut self, limit: Option<Duration>) {
        self.time_limit = limit;
    }

    fn set_conflict_limit(&mut self, limit: Option<u32>) {
        self.conflict_limit = limit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause;

    #[test]
    fn test_sat() {
        let mut s = CadicalSolver::default();
        s.add_clause(clause![-1, 2]);
        let assignment = s.solve().unwrap_model().unwrap();
        assert!(assignment.value_of(1) == Some(false) || assignment.value_of(2) == Some(true))
    }

    #[test]
    fn test_unsat() {
        let mut s = CadicalSolver::default();
        s.add_clause(clause![-1, 2]);
        s.add_clause(clause![-1, -2]);
        s.add_clause(clause![1]);
        assert!(s.solve().unwrap_model().is_none());
    }

    #[test]
    fn test_iterative() {
        let mut s = CadicalSolver::default();
        s.add_clause(clause![-1, 2]);
        assert!(s.solve().unwrap_model().is_some());
        s.add_clause(clause![1, 3]);
        s.add_clause(clause![-2, 3]);
        let assignment = s.solve().unwrap_model().unwrap();
        assert_eq!(Some(true), assignment.value_of(3));
        s.add_clause(clause![-3]);
        assert!(s.solve().unwrap_model().is_none());
    }

    #[test]
    fn test_solve_under_assumptions() {
        let mut s = CadicalSolver::default();
        s.add_clause(clause![1]);
        assert!(s
            .solve_under_assumptions(&[Literal::from(-1)])
            .unwrap_model()
            .is_none());
        assert!(s.solve().unwrap_model().is_some());
    }

    #[test]
    fn test_reserve() {
        let mut s = CadicalSolver::default();
        s.reserve(4);
        s.add_clause(clause![1, 2]);
        assert_eq!(4, s.n_vars());
        let assignment = s.solve().unwrap_model().unwrap();
        assert_eq!(4, assignment.len());
        assert_eq!(None, assignment.value_of(4));
    }

    #[test]
    fn test_generous_budgets() {
        let mut s = CadicalSolver::default();
        s.set_time_limit(Some(Duration::from_secs(60)));
        s.set_conflict_limit(Some(1000));
        s.add_clause(clause![1, 2]);
        s.add_clause(clause![-1]);
        let assignment = s.solve().unwrap_model().unwrap();
        assert_eq!(Some(true), assignment.value_of(2));
    }
}
