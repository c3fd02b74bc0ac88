use crate::sat::{Literal, SatSolver, Variable};
use anyhow::{Context, Result};
use std::io::Write;

/// A formula in conjunctive normal form.
///
/// The variables `1..=n` are the record variables of the [`VariableMap`](super::VariableMap) the formula was built from;
/// auxiliary variables introduced by an encoder follow them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cnf {
    n_vars: usize,
    clauses: Vec<Vec<Literal>>,
}

impl Cnf {
    /// Builds an empty formula over the given number of variables.
    pub fn new(n_vars: usize) -> Self {
        Self {
            n_vars,
            clauses: vec![],
        }
    }

    /// Adds a clause.
    ///
    /// The number of variables is extended if the clause references unknown variables.
    pub fn add_clause(&mut self, clause: Vec<Literal>) {
        if let Some(max) = clause.iter().map(|l| usize::from(l.var())).max() {
            self.n_vars = usize::max(self.n_vars, max);
        }
        self.clauses.push(clause);
    }

    /// Allocates a fresh variable.
    pub fn new_var(&mut self) -> Variable {
        self.n_vars += 1;
        Variable::from(self.n_vars)
    }

    /// Returns the number of variables, auxiliary ones included.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Returns the number of clauses.
    pub fn n_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Returns the clauses, in the order they were added.
    pub fn clauses(&self) -> &[Vec<Literal>] {
        &self.clauses
    }

    /// Returns the clauses as lists of signed integers.
    pub fn to_signed_ints(&self) -> Vec<Vec<isize>> {
        self.clauses
            .iter()
            .map(|cl| cl.iter().map(|l| isize::from(*l)).collect())
            .collect()
    }

    /// Adds the variables and the clauses of this formula to a SAT solver.
    pub fn load_into(&self, solver: &mut dyn SatSolver) {
        solver.reserve(self.n_vars);
        self.clauses
            .iter()
            .for_each(|cl| solver.add_clause(cl.clone()));
    }

    /// Writes the formula using the DIMACS format.
    pub fn write_dimacs(&self, writer: &mut dyn Write) -> Result<()> {
        let context = "while writing a DIMACS formula";
        writeln!(writer, "p cnf {} {}", self.n_vars, self.clauses.len()).context(context)?;
        for cl in self.clauses.iter() {
            for l in cl.iter() {
                write!(writer, "{} ", l).context(context)?;
            }
            writeln!(writer, "0").context(context)?;
        }
        writer.flush().context(context)
    }
}
