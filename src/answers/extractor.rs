use super::AnswerSet;
use crate::{
    data::Predicate,
    encodings::Encoding,
    error::CavsatError,
    solvers::{
        AcceptanceStatus, CertainAnswerComputer, EnumerationStatus, PossibleAnswerComputer, Repair,
        RepairFamily, RepairOutcome,
    },
};

/// The certain and possible answers to a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistentAnswers<'a> {
    certain: AnswerSet<'a>,
    possible: AnswerSet<'a>,
    n_repairs: Option<usize>,
    status: EnumerationStatus,
}

impl<'a> ConsistentAnswers<'a> {
    /// The answers kept by every repair.
    ///
    /// If the enumeration was truncated, this set may contain answers that some unseen repair drops.
    pub fn certain(&self) -> &AnswerSet<'a> {
        &self.certain
    }

    /// The answers kept by at least one repair.
    ///
    /// If the enumeration was truncated, this set may miss answers only kept by unseen repairs.
    pub fn possible(&self) -> &AnswerSet<'a> {
        &self.possible
    }

    /// The number of repairs the answers were computed from, if they were enumerated.
    pub fn n_repairs(&self) -> Option<usize> {
        self.n_repairs
    }

    /// The status of the enumeration the answers were computed from.
    pub fn status(&self) -> EnumerationStatus {
        self.status
    }

    /// Returns `true` iff the answers are exact.
    pub fn is_exact(&self) -> bool {
        self.status == EnumerationStatus::Complete
    }
}

/// The answers to a query, depending on the requested semantics.
///
/// The absence of repairs is reported as [`QueryAnswers::NoRepair`],
/// and must not be mistaken for an empty set of answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryAnswers<'a> {
    /// The answers in a single repair.
    SingleRepair(AnswerSet<'a>),
    /// The certain and possible answers.
    Consistent(ConsistentAnswers<'a>),
    /// The constraints admit no repair.
    NoRepair,
    /// The solver budget was exhausted before any answer could be given.
    Timeout,
}

/// Computes the answers to queries from the repairs of an encoding.
///
/// An extractor only reads the encoding; many of them may work concurrently on the same one.
///
/// # Example
///
/// ```
/// # use cavsat::answers::{AnswerExtractor, QueryAnswers};
/// # use cavsat::config::Config;
/// # use cavsat::data::{ConstraintSet, IntegrityConstraint, Predicate};
/// # use cavsat::encodings::Encoding;
/// # use cavsat::record;
/// # use cavsat::solvers::{RepairEnumerator, RepairSolver};
/// let records = vec![
///     record![1, "Math101", "Prof. Brown"],
///     record![1, "Math101", "Prof. Green"],
///     record![2, "Math101", "Prof. Brown"],
/// ];
/// let constraints = ConstraintSet::new(vec![IntegrityConstraint::Key(vec![0, 1])]);
/// let encoding = Encoding::encode(&records, &constraints, &Config::default()).unwrap();
/// let family = RepairSolver::new(&encoding).enumerate_repairs(16);
/// let query = Predicate::eq(1, "Math101");
/// match AnswerExtractor::new(&encoding).consistent_answers(&family, &query).unwrap() {
///     QueryAnswers::Consistent(answers) => {
///         assert_eq!(1, answers.certain().len());
///         assert_eq!(3, answers.possible().len());
///     }
///     _ => unreachable!(),
/// }
/// ```
pub struct AnswerExtractor<'a> {
    encoding: &'a Encoding,
}

impl<'a> AnswerExtractor<'a> {
    /// Builds an extractor for the given encoding.
    pub fn new(encoding: &'a Encoding) -> Self {
        Self { encoding }
    }

    fn check_query(&self, query: &Predicate) -> Result<(), CavsatError> {
        match self.encoding.variable_map().arity() {
            Some(arity) => query.check_arity(arity),
            None => Ok(()),
        }
    }

    fn check_repair(&self, repair: &Repair) -> Result<(), CavsatError> {
        let n_records = self.encoding.variable_map().len();
        if repair.n_records() == n_records {
            Ok(())
        } else {
            Err(CavsatError::unknown_record(format!(
                "repair is defined on {} records, but the encoding has {}",
                repair.n_records(),
                n_records
            )))
        }
    }

    fn answers_in(&self, repair: &Repair, query: &Predicate) -> AnswerSet<'a> {
        AnswerSet::from_sorted(
            self.encoding
                .variable_map()
                .iter()
                .filter(|(v, r)| repair.is_kept(*v) && query.eval(r))
                .collect(),
        )
    }

    /// Returns the kept records of a repair matching the query, in variable order.
    pub fn extract(&self, repair: &Repair, query: &Predicate) -> Result<AnswerSet<'a>, CavsatError> {
        self.check_query(query)?;
        self.check_repair(repair)?;
        Ok(self.answers_in(repair, query))
    }

    /// Returns the answers to the query in a single repair.
    pub fn single_repair_answers(
        &self,
        outcome: &RepairOutcome,
        query: &Predicate,
    ) -> Result<QueryAnswers<'a>, CavsatError> {
        self.check_query(query)?;
        match outcome {
            RepairOutcome::Repair(r) => Ok(QueryAnswers::SingleRepair(self.extract(r, query)?)),
            RepairOutcome::Unsatisfiable => Ok(QueryAnswers::NoRepair),
            RepairOutcome::Timeout => Ok(QueryAnswers::Timeout),
        }
    }

    /// Returns the answers to the query in each repair of the family, in the order of the family.
    pub fn per_repair_answers(
        &self,
        family: &RepairFamily,
        query: &Predicate,
    ) -> Result<Vec<AnswerSet<'a>>, CavsatError> {
        self.check_query(query)?;
        family
            .repairs()
            .iter()
            .map(|r| {
                self.check_repair(r)?;
                Ok(self.answers_in(r, query))
            })
            .collect()
    }

    /// Returns the certain (intersection) and possible (union) answers over a family of repairs.
    ///
    /// A complete family without repairs gives [`QueryAnswers::NoRepair`];
    /// an empty family interrupted by the solver budget gives [`QueryAnswers::Timeout`].
    pub fn consistent_answers(
        &self,
        family: &RepairFamily,
        query: &Predicate,
    ) -> Result<QueryAnswers<'a>, CavsatError> {
        if family.is_unsatisfiable() {
            self.check_query(query)?;
            return Ok(QueryAnswers::NoRepair);
        }
        let per_repair = self.per_repair_answers(family, query)?;
        if per_repair.is_empty() && family.status() == EnumerationStatus::Timeout {
            return Ok(QueryAnswers::Timeout);
        }
        let mut iter = per_repair.iter();
        let (certain, possible) = match iter.next() {
            Some(first) => iter.fold((first.clone(), first.clone()), |(c, p), s| {
                (c.intersection(s), p.union(s))
            }),
            None => (AnswerSet::default(), AnswerSet::default()),
        };
        Ok(QueryAnswers::Consistent(ConsistentAnswers {
            certain,
            possible,
            n_repairs: Some(per_repair.len()),
            status: family.status(),
        }))
    }

    /// Returns the certain and possible answers using per-record checks of the solver.
    ///
    /// Only the records matching the query are checked.
    /// The result does not depend on the number of repairs.
    pub fn consistent_answers_with_solver<S>(
        &self,
        solver: &mut S,
        query: &Predicate,
    ) -> Result<QueryAnswers<'a>, CavsatError>
    where
        S: PossibleAnswerComputer + CertainAnswerComputer,
    {
        self.check_query(query)?;
        let mut certain = Vec::new();
        let mut possible = Vec::new();
        for (var, record) in self.encoding.variable_map().iter() {
            if !query.eval(record) {
                continue;
            }
            match solver.is_possible_answer(var)? {
                AcceptanceStatus::Accepted => possible.push((var, record)),
                AcceptanceStatus::Rejected => continue,
                AcceptanceStatus::NoRepair => return Ok(QueryAnswers::NoRepair),
                AcceptanceStatus::Timeout => return Ok(QueryAnswers::Timeout),
            }
            match solver.is_certain_answer(var)? {
                AcceptanceStatus::Accepted => certain.push((var, record)),
                AcceptanceStatus::Rejected => {}
                AcceptanceStatus::NoRepair => return Ok(QueryAnswers::NoRepair),
                AcceptanceStatus::Timeout => return Ok(QueryAnswers::Timeout),
            }
        }
        Ok(QueryAnswers::Consistent(ConsistentAnswers {
            certain: AnswerSet::from_sorted(certain),
            possible: AnswerSet::from_sorted(possible),
            n_repairs: None,
            status: EnumerationStatus::Complete,
        }))
    }
}
