//! Objects used to read relations, constraints and queries, and to write answers.

mod constraints_reader;
pub use constraints_reader::ConstraintsReader;

mod csv_writer;
pub use csv_writer::CsvWriter;

mod delimited_reader;
pub use delimited_reader::DelimitedReader;

mod predicate_parser;
pub use predicate_parser::read_predicate;

mod specs;
pub use specs::AnswerWriter;
pub use specs::RelationReader;
pub use specs::WarningHandler;

mod warning_result;
