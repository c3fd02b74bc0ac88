use super::cadical_solver::CadicalSolver;
use std::{
    fmt::Display,
    num::{NonZeroIsize, NonZeroUsize},
    time::Duration,
};

/// A variable in a SAT solver.
///
/// A variable is represented by a non-null positive integer.
/// It can be obtained through the [From] trait from an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(NonZeroUsize);

impl Variable {
    /// Returns the positive literal of this variable.
    pub fn positive(self) -> Literal {
        Literal::from(self.0.get() as isize)
    }

    /// Returns the negative literal of this variable.
    pub fn negative(self) -> Literal {
        self.positive().negate()
    }

    /// Returns the literal of this variable with the given polarity.
    pub fn literal(self, polarity: bool) -> Literal {
        if polarity {
            self.positive()
        } else {
            self.negative()
        }
    }
}

macro_rules! impl_var_from {
    ($t: ty) => {
        impl From<$t> for Variable {
            fn from(v: $t) -> Self {
                match NonZeroUsize::new(v as usize) {
                    Some(n) => Self(n),
                    None => panic!("cannot build a variable from zero"),
                }
            }
        }
    };
}
impl_var_from!(usize);
impl_var_from!(u64);
impl_var_from!(u32);

macro_rules! impl_var_from_signed {
    ($t: ty) => {
        impl From<$t> for Variable {
            fn from(v: $t) -> Self {
                if v < 0 {
                    panic!("cannot build a variable from a negative integer")
                }
                Variable::from(v as usize)
            }
        }
    };
}
impl_var_from_signed!(isize);
impl_var_from_signed!(i64);
impl_var_from_signed!(i32);

impl From<Variable> for usize {
    fn from(v: Variable) -> Self {
        v.0.into()
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A literal in a SAT solver.
///
/// A literal is represented by a non-null integer; its sign gives its polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal(NonZeroIsize);

impl Literal {
    /// Returns the opposite literal.
    pub fn negate(self) -> Self {
        Self::from(-self.0.get())
    }

    /// Returns the variable of this literal.
    pub fn var(&self) -> Variable {
        Variable(self.0.unsigned_abs())
    }

    /// Returns `true` iff the literal is positive.
    pub fn is_positive(&self) -> bool {
        self.0.get() > 0
    }
}

macro_rules! impl_lit_from {
    ($t: ty) => {
        impl From<$t> for Literal {
            fn from(l: $t) -> Self {
                match NonZeroIsize::new(l as isize) {
                    Some(n) => Self(n),
                    None => panic!("cannot build a literal from zero"),
                }
            }
        }
    };
}
impl_lit_from!(isize);
impl_lit_from!(i64);
impl_lit_from!(i32);

impl From<Literal> for isize {
    fn from(l: Literal) -> Self {
        l.0.into()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds a clause from a list of integers.
#[macro_export]
macro_rules! clause {
    () => (
        vec![] as Vec<$crate::sat::Literal>
    );
    ($($x:expr),+ $(,)?) => (
        [$($x),+].into_iter().map($crate::sat::Literal::from).collect::<Vec<$crate::sat::Literal>>()
    );
}

/// An assignment of a set of variables.
///
/// Inside the set of variables involved in the assignment, some may be unassigned.
/// This is the reason why accessors to assigned value returns an [Option<bool>].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment(Vec<Option<bool>>);

impl Assignment {
    pub(crate) fn new(assignment: Vec<Option<bool>>) -> Self {
        Self(assignment)
    }

    /// Returns the value potentially assigned to the variable.
    ///
    /// In case the variable is not assigned, or is out of the scope of the assignment, [Option::None] is returned.
    pub fn value_of<T>(&self, v: T) -> Option<bool>
    where
        T: Into<Variable>,
    {
        self.0.get(usize::from(v.into()) - 1).copied().flatten()
    }

    /// Returns the number of variables covered by this assignment.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` iff the assignment covers no variable.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the variables (as integers starting at 1) and their values.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<bool>)> + '_ {
        self.0.iter().enumerate().map(|(i, v)| (i + 1, *v))
    }
}

/// The result of a SAT solver call.
#[derive(Debug, PartialEq, Eq)]
pub enum SolvingResult {
    /// The problem admits a model.
    Satisfiable(Assignment),
    /// The problem admits no model.
    Unsatisfiable,
    /// The solver stopped before reaching a conclusion (timeout, conflict limit, broken backend).
    Unknown,
}

impl SolvingResult {
    /// Returns the underlying model if it exists, or [Option::None].
    ///
    /// # Panics
    ///
    /// If the solving result is set [SolvingResult::Unknown], this function panics.
    pub fn unwrap_model(self) -> Option<Assignment> {
        match self {
            SolvingResult::Satisfiable(assignment) => Some(assignment),
            SolvingResult::Unsatisfiable => None,
            SolvingResult::Unknown => {
                panic!(r#"cannot unwrap solving result when the solver returned "Unknown""#)
            }
        }
    }

    /// Returns a short textual form of the result: `SAT`, `UNSAT` or `UNKNOWN`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SolvingResult::Satisfiable(_) => "SAT",
            SolvingResult::Unsatisfiable => "UNSAT",
            SolvingResult::Unknown => "UNKNOWN",
        }
    }
}

/// A trait for objects observing the calls made to a SAT solver.
pub trait SolvingListener {
    /// Called just before a solver call.
    fn solving_start(&self, n_vars: usize, n_clauses: usize);

    /// Called just after a solver call.
    fn solving_end(&self, result: &SolvingResult);
}

/// A trait for SAT solvers.
pub trait SatSolver {
    /// Adds a clause to this solver.
    fn add_clause(&mut self, cl: Vec<Literal>);

    /// Solves the problem formed by the clauses added so far.
    fn solve(&mut self) -> SolvingResult;

    /// Solves the problem formed by the clauses added so far and the provided assumptions.
    fn solve_under_assumptions(&mut self, assumptions: &[Literal]) -> SolvingResult;

    /// Returns the number of variables known by this solver.
    fn n_vars(&self) -> usize;

    /// Adds a listener triggered on each solver call.
    fn add_listener(&mut self, listener: Box<dyn SolvingListener>);

    /// Makes the solver aware of all the variables up to the provided one.
    fn reserve(&mut self, new_max_id: usize);

    /// Sets the wall-clock budget of the next solver calls.
    ///
    /// Solvers reaching the budget return [SolvingResult::Unknown].
    /// Solvers unable to handle budgets ignore this call.
    fn set_time_limit(&mut self, _limit: Option<Duration>) {}

    /// Sets the maximal number of conflicts of the next solver calls.
    ///
    /// Solvers reaching the budget return [SolvingResult::Unknown].
    /// Solvers unable to handle budgets ignore this call.
    fn set_conflict_limit(&mut self, _limit: Option<u32>) {}
}

/// The default SAT solver (Cadical).
pub fn default_solver() -> Box<dyn SatSolver> {
    Box::<CadicalSolver>::default()
}

/// The type of the functions building listeners for new solvers.
pub type SolvingListenerFactory = Box<dyn Fn() -> Box<dyn SolvingListener>>;

/// A trait for objects building SAT solvers on demand.
pub trait SatSolverFactory {
    /// Builds a new, empty SAT solver.
    fn new_solver(&self) -> Box<dyn SatSolver>;

    /// Registers a function building a listener to attach to each new solver.
    fn add_solver_listener(&mut self, listener_factory: SolvingListenerFactory);
}

/// A factory for the default SAT solver.
#[derive(Default)]
pub struct DefaultSatSolverFactory {
    listener_factories: Vec<SolvingListenerFactory>,
}

impl SatSolverFactory for DefaultSatSolverFactory {
    fn new_solver(&self) -> Box<dyn SatSolver> {
        let mut solver = default_solver();
        self.listener_factories
            .iter()
            .for_each(|f| solver.add_listener((f)()));
        solver
    }

    fn add_solver_listener(&mut self, listener_factory: SolvingListenerFactory) {
        self.listener_factories.push(listener_factory);
    }
}
