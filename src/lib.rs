//! CAvSAT computes consistent answers to queries over relations violating integrity constraints.
//!
//! The relation and its constraints are encoded into a CNF formula which models are the repairs of the relation
//! (see [`encodings`]); a SAT solver computes or enumerates these repairs (see [`solvers`]),
//! and the answers to a query are extracted under single-repair, certain or possible semantics (see [`answers`]).
//!
//! # Example
//!
//! ```
//! # use cavsat::answers::{AnswerExtractor, QueryAnswers};
//! # use cavsat::config::Config;
//! # use cavsat::encodings::Encoding;
//! # use cavsat::io::{read_predicate, ConstraintsReader, DelimitedReader, RelationReader};
//! # use cavsat::solvers::{RepairEnumerator, RepairSolver};
//! let data = "StudentID,Course,Instructor\n1,Math101,Prof. Brown\n1,Math101,Prof. Green\n2,Math101,Prof. Brown\n";
//! let relation = DelimitedReader::default().read(&mut data.as_bytes()).unwrap();
//! let constraints = ConstraintsReader::default()
//!     .read(&mut "key(StudentID, Course)".as_bytes(), relation.schema())
//!     .unwrap();
//! let config = Config::default();
//! let encoding = Encoding::encode_relation(&relation, &constraints, &config).unwrap();
//! let family = RepairSolver::new(&encoding).with_config(&config).enumerate_repairs(config.max_repairs());
//! let query = read_predicate(r#"Instructor == "Prof. Brown""#, relation.schema()).unwrap();
//! match AnswerExtractor::new(&encoding).consistent_answers(&family, &query).unwrap() {
//!     QueryAnswers::Consistent(answers) => {
//!         assert_eq!(1, answers.certain().len());
//!         assert_eq!(2, answers.possible().len());
//!     }
//!     _ => unreachable!(),
//! }
//! ```

#![warn(missing_docs)]

pub mod answers;

pub mod config;

pub mod data;

pub mod encodings;

pub mod error;

pub mod io;

pub mod sat;

pub mod solvers;
