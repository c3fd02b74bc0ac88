use super::{
    specs::{
        AcceptanceStatus, CertainAnswerComputer, PossibleAnswerComputer, RepairEnumerator,
        SingleRepairComputer,
    },
    EnumerationStatus, Repair, RepairFamily, RepairOutcome,
};
use crate::{
    config::Config,
    encodings::Encoding,
    error::CavsatError,
    sat::{DefaultSatSolverFactory, Literal, SatSolver, SatSolverFactory, SolvingResult, Variable},
};
use log::{debug, warn};
use std::time::{Duration, Instant};

/// A SAT-based solver computing the repairs of an [`Encoding`].
///
/// Each computation loads the formula into a new SAT solver built by the solver factory.
/// Assumption-based checks share a single solver, built on the first check.
///
/// A time limit applies to the whole life of the solver: it is counted from the call to [`with_config`](Self::with_config).
/// A conflict limit applies to each SAT solver call.
///
/// # Example
///
/// ```
/// # use cavsat::config::Config;
/// # use cavsat::data::{ConstraintSet, IntegrityConstraint};
/// # use cavsat::encodings::Encoding;
/// # use cavsat::record;
/// # use cavsat::solvers::{RepairEnumerator, RepairSolver, EnumerationStatus};
/// let records = vec![record![1, "Math101", "Prof. Brown"], record![1, "Math101", "Prof. Green"]];
/// let constraints = ConstraintSet::new(vec![IntegrityConstraint::Key(vec![0, 1])]);
/// let config = Config::default();
/// let encoding = Encoding::encode(&records, &constraints, &config).unwrap();
/// let mut solver = RepairSolver::new(&encoding).with_config(&config);
/// let family = solver.enumerate_repairs(config.max_repairs());
/// assert_eq!(2, family.len());
/// assert_eq!(EnumerationStatus::Complete, family.status());
/// ```
pub struct RepairSolver<'a> {
    encoding: &'a Encoding,
    solver_factory: Box<dyn SatSolverFactory>,
    deadline: Option<Instant>,
    conflict_limit: Option<u32>,
    assumption_solver: Option<Box<dyn SatSolver>>,
    has_repair: Option<bool>,
}

impl<'a> RepairSolver<'a> {
    /// Builds a new solver for the given encoding.
    ///
    /// The underlying SAT solvers are built by a [`DefaultSatSolverFactory`].
    pub fn new(encoding: &'a Encoding) -> Self {
        Self::new_with_sat_solver_factory(encoding, Box::<DefaultSatSolverFactory>::default())
    }

    /// Builds a new solver for the given encoding.
    ///
    /// The SAT solvers to use are given through the solver factory.
    pub fn new_with_sat_solver_factory(
        encoding: &'a Encoding,
        solver_factory: Box<dyn SatSolverFactory>,
    ) -> Self {
        Self {
            encoding,
            solver_factory,
            deadline: None,
            conflict_limit: None,
            assumption_solver: None,
            has_repair: None,
        }
    }

    /// Applies the solver budgets of a configuration.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.set_time_limit(config.time_limit());
        self.conflict_limit = config.conflict_limit();
        self
    }

    /// Sets the time budget, counted from now.
    pub fn set_time_limit(&mut self, time_limit: Option<Duration>) {
        self.deadline = time_limit.map(|d| Instant::now() + d);
    }

    /// Sets the conflict budget of each SAT solver call.
    pub fn set_conflict_limit(&mut self, conflict_limit: Option<u32>) {
        self.conflict_limit = conflict_limit;
    }

    /// Returns the encoding this solver works on.
    pub fn encoding(&self) -> &'a Encoding {
        self.encoding
    }

    fn new_loaded_solver(&self) -> Box<dyn SatSolver> {
        let mut solver = self.solver_factory.new_solver();
        self.encoding.cnf().load_into(solver.as_mut());
        solver
    }

    fn assignment_to_repair(&self, result: SolvingResult) -> Option<Option<Repair>> {
        match result {
            SolvingResult::Satisfiable(assignment) => Some(Some(
                self.encoding
                    .constraints_encoder()
                    .assignment_to_repair(self.encoding.variable_map(), &assignment),
            )),
            SolvingResult::Unsatisfiable => Some(None),
            SolvingResult::Unknown => None,
        }
    }

    fn check_record_var(&self, var: Variable) -> Result<(), CavsatError> {
        if self.encoding.variable_map().record_of(var).is_some() {
            Ok(())
        } else {
            Err(CavsatError::unknown_record(format!(
                "variable {} is not associated with a record",
                var
            )))
        }
    }

    fn check_under_assumption(&mut self, assumption: Literal) -> Option<bool> {
        if self.assumption_solver.is_none() {
            self.assumption_solver = Some(self.new_loaded_solver());
        }
        let deadline = self.deadline;
        let conflict_limit = self.conflict_limit;
        let solver = self.assumption_solver.as_mut()?.as_mut();
        if self.has_repair.is_none() {
            self.has_repair = match solve_within_budget(solver, &[], deadline, conflict_limit) {
                SolvingResult::Satisfiable(_) => Some(true),
                SolvingResult::Unsatisfiable => Some(false),
                SolvingResult::Unknown => return None,
            };
        }
        match solve_within_budget(solver, &[assumption], deadline, conflict_limit) {
            SolvingResult::Satisfiable(_) => Some(true),
            SolvingResult::Unsatisfiable => Some(false),
            SolvingResult::Unknown => None,
        }
    }

    fn acceptance_status<F>(
        &mut self,
        var: Variable,
        assumption: Literal,
        f: F,
    ) -> Result<AcceptanceStatus, CavsatError>
    where
        F: Fn(bool) -> bool,
    {
        self.check_record_var(var)?;
        let sat = self.check_under_assumption(assumption);
        Ok(match (self.has_repair, sat) {
            (Some(false), _) => AcceptanceStatus::NoRepair,
            (_, None) => AcceptanceStatus::Timeout,
            (_, Some(b)) if f(b) => AcceptanceStatus::Accepted,
            (_, Some(_)) => AcceptanceStatus::Rejected,
        })
    }
}

fn solve_within_budget(
    solver: &mut dyn SatSolver,
    assumptions: &[Literal],
    deadline: Option<Instant>,
    conflict_limit: Option<u32>,
) -> SolvingResult {
    let time_limit = match deadline {
        Some(d) => {
            let now = Instant::now();
            if now >= d {
                return SolvingResult::Unknown;
            }
            Some(d - now)
        }
        None => None,
    };
    solver.set_time_limit(time_limit);
    solver.set_conflict_limit(conflict_limit);
    solver.solve_under_assumptions(assumptions)
}

impl SingleRepairComputer for RepairSolver<'_> {
    fn compute_one_repair(&mut self) -> RepairOutcome {
        let mut solver = self.new_loaded_solver();
        let result = solve_within_budget(solver.as_mut(), &[], self.deadline, self.conflict_limit);
        match self.assignment_to_repair(result) {
            Some(Some(r)) => RepairOutcome::Repair(r),
            Some(None) => RepairOutcome::Unsatisfiable,
            None => RepairOutcome::Timeout,
        }
    }
}

impl RepairEnumerator for RepairSolver<'_> {
    fn enumerate_repairs(&mut self, bound: usize) -> RepairFamily {
        let mut solver = self.new_loaded_solver();
        let mut repairs = Vec::new();
        loop {
            let result =
                solve_within_budget(solver.as_mut(), &[], self.deadline, self.conflict_limit);
            match self.assignment_to_repair(result) {
                None => {
                    warn!(
                        "repair enumeration interrupted by the solver budget after {} repair(s)",
                        repairs.len()
                    );
                    return RepairFamily::new(repairs, EnumerationStatus::Timeout);
                }
                Some(None) => {
                    debug!("repair enumeration complete with {} repair(s)", repairs.len());
                    return RepairFamily::new(repairs, EnumerationStatus::Complete);
                }
                Some(Some(r)) => {
                    if repairs.len() == bound {
                        warn!(
                            "repair enumeration truncated: there are more than {} repair(s)",
                            bound
                        );
                        return RepairFamily::new(
                            repairs,
                            EnumerationStatus::BoundExceeded { bound },
                        );
                    }
                    solver.add_clause(r.blocking_clause());
                    repairs.push(r);
                }
            }
        }
    }
}

impl PossibleAnswerComputer for RepairSolver<'_> {
    fn is_possible_answer(&mut self, var: Variable) -> Result<AcceptanceStatus, CavsatError> {
        self.acceptance_status(var, var.positive(), |sat| sat)
    }
}

impl CertainAnswerComputer for RepairSolver<'_> {
    fn is_certain_answer(&mut self, var: Variable) -> Result<AcceptanceStatus, CavsatError> {
        self.acceptance_status(var, var.negative(), |sat| !sat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{ConstraintSet, IntegrityConstraint, Predicate, Record},
        encodings::EncodingKind,
        record,
        sat::{SolvingListener, SolvingListenerFactory},
    };
    use paste::paste;
    use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

    fn enrollments() -> Vec<Record> {
        vec![
            record![1, "Alice", "Prof. Brown", "Math101"],
            record![1, "Alice", "Prof. Green", "Math101"],
            record![2, "Bob", "Prof. White", "Phys201"],
        ]
    }

    fn key() -> IntegrityConstraint {
        IntegrityConstraint::Key(vec![0, 3])
    }

    fn encode(records: &[Record], constraints: Vec<IntegrityConstraint>, kind: EncodingKind) -> Encoding {
        Encoding::encode(
            records,
            &ConstraintSet::new(constraints),
            &Config::default().with_encoding(kind),
        )
        .unwrap()
    }

    fn kept(repairs: &[Repair]) -> BTreeSet<Vec<usize>> {
        repairs
            .iter()
            .map(|r| r.kept_variables().map(usize::from).collect())
            .collect()
    }

    macro_rules! test_for_encoding {
        ($kind: ident) => {
            paste! {
                #[test]
                fn [<test_check_only_ $kind:lower>]() {
                    let records = vec![record![1, "Sales", 5000], record![2, "Eng", 7000], record![3, "Sales", 6000]];
                    let encoding = encode(&records, vec![IntegrityConstraint::Check(Predicate::or(vec![
                        Predicate::compare(1, crate::data::Comparison::Ne, "Sales"),
                        Predicate::compare(2, crate::data::Comparison::Gt, 5000),
                    ]))], EncodingKind::$kind);
                    let mut solver = RepairSolver::new(&encoding);
                    let family = solver.enumerate_repairs(10);
                    assert_eq!(EnumerationStatus::Complete, family.status());
                    assert_eq!(BTreeSet::from([vec![2, 3]]), kept(family.repairs()));
                    assert_eq!(RepairOutcome::Repair(Repair::new(vec![false, true, true])), solver.compute_one_repair());
                }

                #[test]
                fn [<test_unsat_ $kind:lower>]() {
                    let encoding = encode(&enrollments(), vec![
                        IntegrityConstraint::Require(Predicate::eq(0, 1)),
                        IntegrityConstraint::Check(Predicate::not(Predicate::eq(0, 1))),
                    ], EncodingKind::$kind);
                    let mut solver = RepairSolver::new(&encoding);
                    assert_eq!(RepairOutcome::Unsatisfiable, solver.compute_one_repair());
                    let family = solver.enumerate_repairs(10);
                    assert!(family.is_unsatisfiable());
                    assert_eq!(AcceptanceStatus::NoRepair, solver.is_possible_answer(Variable::from(3)).unwrap());
                    assert_eq!(AcceptanceStatus::NoRepair, solver.is_certain_answer(Variable::from(3)).unwrap());
                }

                #[test]
                fn [<test_no_records_ $kind:lower>]() {
                    let encoding = encode(&[], vec![key()], EncodingKind::$kind);
                    let mut solver = RepairSolver::new(&encoding);
                    let family = solver.enumerate_repairs(10);
                    assert_eq!(1, family.len());
                    assert_eq!(0, family.repairs()[0].n_records());
                    assert!(family.is_complete());
                }

                #[test]
                fn [<test_unknown_variable_ $kind:lower>]() {
                    let encoding = encode(&enrollments(), vec![], EncodingKind::$kind);
                    let mut solver = RepairSolver::new(&encoding);
                    assert!(matches!(solver.is_possible_answer(Variable::from(4)), Err(CavsatError::UnknownRecord(_))));
                }
            }
        };
    }

    test_for_encoding!(Filter);
    test_for_encoding!(Repair);

    #[test]
    fn test_key_repairs() {
        let encoding = encode(&enrollments(), vec![key()], EncodingKind::Repair);
        let mut solver = RepairSolver::new(&encoding);
        let family = solver.enumerate_repairs(10);
        assert_eq!(EnumerationStatus::Complete, family.status());
        assert_eq!(
            BTreeSet::from([vec![1, 3], vec![2, 3]]),
            kept(family.repairs())
        );
    }

    #[test]
    fn test_key_filter() {
        let encoding = encode(&enrollments(), vec![key()], EncodingKind::Filter);
        let mut solver = RepairSolver::new(&encoding);
        let family = solver.enumerate_repairs(10);
        assert_eq!(BTreeSet::from([vec![3]]), kept(family.repairs()));
    }

    #[test]
    fn test_at_most_repairs() {
        let records = vec![record![1, "a"], record![1, "b"], record![1, "c"], record![2, "d"]];
        let encoding = encode(
            &records,
            vec![IntegrityConstraint::AtMost {
                count: 2,
                fields: vec![0],
            }],
            EncodingKind::Repair,
        );
        let mut solver = RepairSolver::new(&encoding);
        let family = solver.enumerate_repairs(10);
        assert_eq!(
            BTreeSet::from([vec![1, 2, 4], vec![1, 3, 4], vec![2, 3, 4]]),
            kept(family.repairs())
        );
    }

    #[test]
    fn test_required_record() {
        let encoding = encode(
            &enrollments(),
            vec![key(), IntegrityConstraint::Require(Predicate::eq(2, "Prof. Green"))],
            EncodingKind::Repair,
        );
        let mut solver = RepairSolver::new(&encoding);
        let family = solver.enumerate_repairs(10);
        assert_eq!(BTreeSet::from([vec![2, 3]]), kept(family.repairs()));
    }

    #[test]
    fn test_bound_exceeded() {
        let records = (0..4)
            .flat_map(|i| vec![record![i, "x"], record![i, "y"]])
            .collect::<Vec<Record>>();
        let encoding = encode(&records, vec![IntegrityConstraint::Key(vec![0])], EncodingKind::Repair);
        let mut solver = RepairSolver::new(&encoding);
        let family = solver.enumerate_repairs(5);
        assert_eq!(5, family.len());
        assert_eq!(EnumerationStatus::BoundExceeded { bound: 5 }, family.status());
        let family = solver.enumerate_repairs(16);
        assert_eq!(16, family.len());
        assert_eq!(EnumerationStatus::Complete, family.status());
        assert_eq!(16, kept(family.repairs()).len());
    }

    #[test]
    fn test_zero_bound() {
        let encoding = encode(&enrollments(), vec![key()], EncodingKind::Repair);
        let mut solver = RepairSolver::new(&encoding);
        let family = solver.enumerate_repairs(0);
        assert!(family.is_empty());
        assert_eq!(EnumerationStatus::BoundExceeded { bound: 0 }, family.status());
        assert!(!family.is_unsatisfiable());
    }

    #[test]
    fn test_acceptance() {
        let encoding = encode(&enrollments(), vec![key()], EncodingKind::Repair);
        let mut solver = RepairSolver::new(&encoding);
        for v in [1, 2] {
            assert_eq!(
                AcceptanceStatus::Accepted,
                solver.is_possible_answer(Variable::from(v)).unwrap()
            );
            assert_eq!(
                AcceptanceStatus::Rejected,
                solver.is_certain_answer(Variable::from(v)).unwrap()
            );
        }
        assert_eq!(
            AcceptanceStatus::Accepted,
            solver.is_certain_answer(Variable::from(3)).unwrap()
        );
    }

    #[test]
    fn test_expired_time_limit() {
        let encoding = encode(&enrollments(), vec![key()], EncodingKind::Repair);
        let mut solver = RepairSolver::new(&encoding);
        solver.set_time_limit(Some(Duration::ZERO));
        assert_eq!(RepairOutcome::Timeout, solver.compute_one_repair());
        let family = solver.enumerate_repairs(10);
        assert!(family.is_empty());
        assert_eq!(EnumerationStatus::Timeout, family.status());
        assert!(!family.is_unsatisfiable());
        assert_eq!(
            AcceptanceStatus::Timeout,
            solver.is_certain_answer(Variable::from(1)).unwrap()
        );
    }

    struct CountingListener(Rc<RefCell<usize>>);

    impl SolvingListener for CountingListener {
        fn solving_start(&self, _n_vars: usize, _n_clauses: usize) {
            *self.0.borrow_mut() += 1;
        }

        fn solving_end(&self, _result: &SolvingResult) {}
    }

    #[test]
    fn test_factory_is_used() {
        let counter = Rc::new(RefCell::new(0));
        let c = Rc::clone(&counter);
        let mut factory = DefaultSatSolverFactory::default();
        let listener_factory: SolvingListenerFactory = Box::new(move || {
            Box::new(CountingListener(Rc::clone(&c))) as Box<dyn SolvingListener>
        });
        factory.add_solver_listener(listener_factory);
        let encoding = encode(&enrollments(), vec![key()], EncodingKind::Repair);
        let mut solver = RepairSolver::new_with_sat_solver_factory(&encoding, Box::new(factory));
        solver.enumerate_repairs(10);
        assert_eq!(3, *counter.borrow());
    }
}
