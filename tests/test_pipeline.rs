use cavsat::{
    answers::{AnswerExtractor, AnswerSet, QueryAnswers},
    config::Config,
    data::{Comparison, ConstraintSet, IntegrityConstraint, Predicate, Record},
    encodings::{Encoding, EncodingKind},
    record,
    solvers::{RepairEnumerator, RepairFamily, RepairOutcome, RepairSolver, SingleRepairComputer},
};
use paste::paste;
use std::collections::BTreeSet;

fn employees() -> Vec<Record> {
    vec![
        record![1, "Sales", 5000],
        record![2, "Eng", 7000],
        record![3, "Sales", 6000],
    ]
}

fn enrollments() -> Vec<Record> {
    vec![
        record![1, "Math101", "Prof. Brown"],
        record![1, "Math101", "Prof. Green"],
        record![2, "Math101", "Prof. Brown"],
    ]
}

fn sales_constraints() -> ConstraintSet {
    ConstraintSet::new(vec![IntegrityConstraint::Check(Predicate::or(vec![
        Predicate::compare(1, Comparison::Ne, "Sales"),
        Predicate::compare(2, Comparison::Gt, 5000),
    ]))])
}

fn config(kind: EncodingKind) -> Config {
    Config::default().with_encoding(kind)
}

fn kept_indices(family: &RepairFamily) -> BTreeSet<Vec<usize>> {
    family
        .repairs()
        .iter()
        .map(|r| r.kept_variables().map(usize::from).collect())
        .collect()
}

fn answer_records(set: &AnswerSet) -> Vec<Record> {
    set.records().cloned().collect()
}

fn answer_indices(set: &AnswerSet) -> Vec<usize> {
    set.variables().map(usize::from).collect()
}

macro_rules! test_for_encoding {
    ($kind:ident) => {
        paste! {
            #[test]
            fn [<test_sales_example_ $kind:lower>]() {
                let records = employees();
                let encoding =
                    Encoding::encode(&records, &sales_constraints(), &config(EncodingKind::$kind)).unwrap();
                let family = RepairSolver::new(&encoding).enumerate_repairs(8);
                assert_eq!(1, family.len());
                let query = Predicate::eq(1, "Sales");
                match AnswerExtractor::new(&encoding).consistent_answers(&family, &query).unwrap() {
                    QueryAnswers::Consistent(answers) => {
                        assert!(answers.is_exact());
                        assert_eq!(
                            vec![&record![3, "Sales", 6000]],
                            answers.certain().records().collect::<Vec<_>>()
                        );
                        assert_eq!(answers.certain(), answers.possible());
                    }
                    _ => panic!(),
                }
            }

            #[test]
            fn [<test_unsatisfiable_ $kind:lower>]() {
                let records = employees();
                let constraints = ConstraintSet::new(vec![
                    IntegrityConstraint::Require(Predicate::eq(1, "Sales")),
                    IntegrityConstraint::Check(Predicate::compare(2, Comparison::Gt, 5500)),
                ]);
                let encoding = Encoding::encode(&records, &constraints, &config(EncodingKind::$kind)).unwrap();
                let mut solver = RepairSolver::new(&encoding);
                assert_eq!(RepairOutcome::Unsatisfiable, solver.compute_one_repair());
                let family = solver.enumerate_repairs(8);
                assert!(family.is_unsatisfiable());
                let extractor = AnswerExtractor::new(&encoding);
                let query = Predicate::And(vec![]);
                assert_eq!(QueryAnswers::NoRepair, extractor.consistent_answers(&family, &query).unwrap());
                assert_eq!(
                    QueryAnswers::NoRepair,
                    extractor.consistent_answers_with_solver(&mut solver, &query).unwrap()
                );
            }

            #[test]
            fn [<test_idempotence_ $kind:lower>]() {
                let records = enrollments();
                let constraints = ConstraintSet::new(vec![IntegrityConstraint::Key(vec![0, 1])]);
                let config = config(EncodingKind::$kind);
                let query = Predicate::eq(2, "Prof. Brown");
                let run = || {
                    let encoding = Encoding::encode(&records, &constraints, &config).unwrap();
                    let family = RepairSolver::new(&encoding).enumerate_repairs(8);
                    let answers = match AnswerExtractor::new(&encoding).consistent_answers(&family, &query).unwrap() {
                        QueryAnswers::Consistent(a) => a,
                        _ => panic!(),
                    };
                    (
                        encoding.cnf().clone(),
                        kept_indices(&family),
                        answer_records(answers.certain()),
                        answer_records(answers.possible()),
                    )
                };
                assert_eq!(run(), run());
            }

            #[test]
            fn [<test_monotonicity_ $kind:lower>]() {
                let records = mixed_records();
                let encoding = Encoding::encode(&records, &mixed_constraints(), &config(EncodingKind::$kind)).unwrap();
                let family = RepairSolver::new(&encoding).enumerate_repairs(64);
                let query = Predicate::compare(2, Comparison::Ge, 20);
                let extractor = AnswerExtractor::new(&encoding);
                let answers = match extractor.consistent_answers(&family, &query).unwrap() {
                    QueryAnswers::Consistent(a) => a,
                    _ => panic!(),
                };
                for set in extractor.per_repair_answers(&family, &query).unwrap() {
                    assert!(answers.certain().is_subset(&set));
                    assert!(set.is_subset(answers.possible()));
                }
            }
        }
    };
}

test_for_encoding!(Filter);
test_for_encoding!(Repair);

#[test]
fn test_group_example() {
    let records = enrollments();
    let constraints = ConstraintSet::new(vec![IntegrityConstraint::Key(vec![0, 1])]);
    let encoding = Encoding::encode(&records, &constraints, &Config::default()).unwrap();
    let family = RepairSolver::new(&encoding).enumerate_repairs(8);
    assert!(family.is_complete());
    assert_eq!(
        [vec![1, 3], vec![2, 3]].into_iter().collect::<BTreeSet<_>>(),
        kept_indices(&family)
    );
    let query = Predicate::eq(1, "Math101");
    match AnswerExtractor::new(&encoding).consistent_answers(&family, &query).unwrap() {
        QueryAnswers::Consistent(answers) => {
            assert_eq!(vec![3], answer_indices(answers.certain()));
            assert_eq!(vec![1, 2, 3], answer_indices(answers.possible()));
            assert_eq!(Some(2), answers.n_repairs());
        }
        _ => panic!(),
    }
}

fn mixed_records() -> Vec<Record> {
    vec![
        record![0, "a", 10],
        record![0, "b", 20],
        record![0, "c", 30],
        record![1, "a", 40],
        record![1, "b", 50],
        record![2, "a", 60],
        record![2, "a", 5],
    ]
}

fn mixed_constraints() -> ConstraintSet {
    ConstraintSet::new(vec![
        IntegrityConstraint::Check(Predicate::compare(2, Comparison::Gt, 8)),
        IntegrityConstraint::Key(vec![0]),
        IntegrityConstraint::AtMost {
            count: 2,
            fields: vec![1],
        },
    ])
}

fn naive_is_consistent(records: &[Record], kept: &[usize]) -> bool {
    let kept_records = kept.iter().map(|i| &records[*i - 1]).collect::<Vec<_>>();
    if kept_records.iter().any(|r| r.value(2).and_then(|v| v.as_int()).unwrap_or(0) <= 8) {
        return false;
    }
    for (i, r) in kept_records.iter().enumerate() {
        for s in kept_records.iter().skip(i + 1) {
            if r.value(0) == s.value(0) {
                return false;
            }
        }
        let same_group = kept_records
            .iter()
            .filter(|s| s.value(1) == r.value(1))
            .count();
        if same_group > 2 {
            return false;
        }
    }
    true
}

fn naive_repairs(records: &[Record]) -> BTreeSet<Vec<usize>> {
    let n = records.len();
    let consistent = (0u32..(1 << n))
        .filter_map(|mask| {
            let kept = (1..=n)
                .filter(|i| mask & (1 << (i - 1)) != 0)
                .collect::<Vec<usize>>();
            if naive_is_consistent(records, &kept) {
                Some((mask, kept))
            } else {
                None
            }
        })
        .collect::<Vec<_>>();
    consistent
        .iter()
        .filter(|(mask, _)| {
            !consistent
                .iter()
                .any(|(other, _)| other != mask && other & mask == *mask)
        })
        .map(|(_, kept)| kept.clone())
        .collect()
}

#[test]
fn test_repairs_match_brute_force() {
    let records = mixed_records();
    let encoding = Encoding::encode(&records, &mixed_constraints(), &Config::default()).unwrap();
    let family = RepairSolver::new(&encoding).enumerate_repairs(64);
    assert!(family.is_complete());
    let expected = naive_repairs(&records);
    assert_eq!(6, expected.len());
    assert_eq!(expected, kept_indices(&family));
}

#[test]
fn test_filter_matches_naive_filter() {
    let records = mixed_records();
    let config = config(EncodingKind::Filter);
    let encoding = Encoding::encode(&records, &mixed_constraints(), &config).unwrap();
    let family = RepairSolver::new(&encoding).enumerate_repairs(64);
    assert_eq!(1, family.len());
    // a record survives iff it passes the check and belongs to no conflict of the group constraints
    let expected = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.value(2).and_then(|v| v.as_int()).unwrap_or(0) > 8)
        .filter(|(i, r)| {
            let same_key = records
                .iter()
                .enumerate()
                .any(|(j, s)| j != *i && s.value(0) == r.value(0));
            let same_group = records.iter().filter(|s| s.value(1) == r.value(1)).count();
            !same_key && same_group <= 2
        })
        .map(|(i, _)| i + 1)
        .collect::<Vec<usize>>();
    assert_eq!(
        [expected].into_iter().collect::<BTreeSet<_>>(),
        kept_indices(&family)
    );
}

#[test]
fn test_assumptions_agree_with_enumeration() {
    let records = mixed_records();
    let encoding = Encoding::encode(&records, &mixed_constraints(), &Config::default()).unwrap();
    let mut solver = RepairSolver::new(&encoding);
    let family = solver.enumerate_repairs(64);
    let query = Predicate::compare(2, Comparison::Ge, 20);
    let extractor = AnswerExtractor::new(&encoding);
    let enumerated = match extractor.consistent_answers(&family, &query).unwrap() {
        QueryAnswers::Consistent(a) => a,
        _ => panic!(),
    };
    let checked = match extractor.consistent_answers_with_solver(&mut solver, &query).unwrap() {
        QueryAnswers::Consistent(a) => a,
        _ => panic!(),
    };
    assert_eq!(enumerated.certain(), checked.certain());
    assert_eq!(enumerated.possible(), checked.possible());
}

#[test]
fn test_concurrent_extraction() {
    let records = enrollments();
    let constraints = ConstraintSet::new(vec![IntegrityConstraint::Key(vec![0, 1])]);
    let encoding = Encoding::encode(&records, &constraints, &Config::default()).unwrap();
    let family = RepairSolver::new(&encoding).enumerate_repairs(8);
    let queries = vec![
        Predicate::eq(2, "Prof. Brown"),
        Predicate::eq(2, "Prof. Green"),
        Predicate::eq(0, 2),
    ];
    let sizes = std::thread::scope(|s| {
        let handles = queries
            .iter()
            .map(|q| {
                let encoding = &encoding;
                let family = &family;
                s.spawn(move || {
                    match AnswerExtractor::new(encoding).consistent_answers(family, q).unwrap() {
                        QueryAnswers::Consistent(a) => (a.certain().len(), a.possible().len()),
                        _ => panic!(),
                    }
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>()
    });
    assert_eq!(vec![(1, 2), (0, 1), (1, 1)], sizes);
}
