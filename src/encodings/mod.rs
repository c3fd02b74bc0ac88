//! Encodings of integrity constraints into CNF formulas.

mod cnf;
pub use cnf::Cnf;

mod conflict_hypergraph;
pub use conflict_hypergraph::CardinalityConflict;
pub use conflict_hypergraph::ConflictHypergraph;

mod encoding;
pub use encoding::Encoding;
pub use encoding::EncodingKind;

mod filter_constraints_encoder;
pub use filter_constraints_encoder::FilterConstraintsEncoder;

mod repair_constraints_encoder;
pub use repair_constraints_encoder::RepairConstraintsEncoder;

mod specs;
pub use specs::ConstraintsEncoder;

mod variable_map;
pub use variable_map::DuplicatePolicy;
pub use variable_map::VariableMap;
