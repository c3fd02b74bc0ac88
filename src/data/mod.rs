//! The data model: values, schemas, records, relations, predicates and integrity constraints.

mod constraint;
pub use constraint::ConstraintSet;
pub use constraint::IntegrityConstraint;

mod predicate;
pub use predicate::Comparison;
pub use predicate::Predicate;

mod record;
pub use record::Record;

mod relation;
pub use relation::Relation;

mod schema;
pub use schema::Schema;

mod value;
pub use value::Value;
