use super::{
    Cnf, ConstraintsEncoder, FilterConstraintsEncoder, RepairConstraintsEncoder, VariableMap,
};
use crate::{
    config::Config,
    data::{ConstraintSet, Record, Relation},
    error::CavsatError,
};
use strum_macros::{AsRefStr, EnumString, EnumVariantNames};

/// The available encodings of integrity constraints.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString, EnumVariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum EncodingKind {
    /// Unit clauses deciding each record on its own (see [`FilterConstraintsEncoder`]).
    Filter,
    /// Conflict hypergraph and maximality clauses (see [`RepairConstraintsEncoder`]).
    #[default]
    Repair,
}

impl EncodingKind {
    /// Returns the encoder associated with this kind.
    pub fn constraints_encoder(&self) -> Box<dyn ConstraintsEncoder> {
        match self {
            EncodingKind::Filter => Box::new(FilterConstraintsEncoder),
            EncodingKind::Repair => Box::new(RepairConstraintsEncoder),
        }
    }
}

/// The result of an encoding session: a fresh variable map and the formula built on it.
///
/// An encoding is immutable; it can be shared between threads to answer several queries.
///
/// # Example
///
/// ```
/// # use cavsat::config::Config;
/// # use cavsat::data::{ConstraintSet, IntegrityConstraint};
/// # use cavsat::encodings::Encoding;
/// # use cavsat::record;
/// let records = vec![record![1, "Math101", "Prof. Brown"], record![1, "Math101", "Prof. Green"]];
/// let constraints = ConstraintSet::new(vec![IntegrityConstraint::Key(vec![0, 1])]);
/// let encoding = Encoding::encode(&records, &constraints, &Config::default()).unwrap();
/// assert_eq!(2, encoding.variable_map().len());
/// assert_eq!(3, encoding.cnf().n_clauses());
/// ```
#[derive(Debug, Clone)]
pub struct Encoding {
    kind: EncodingKind,
    variable_map: VariableMap,
    cnf: Cnf,
}

impl Encoding {
    /// Encodes the constraints over a sequence of records.
    ///
    /// A new variable map is built for each call, following the duplicate policy of the configuration.
    pub fn encode(
        records: &[Record],
        constraints: &ConstraintSet,
        config: &Config,
    ) -> Result<Self, CavsatError> {
        let variable_map = VariableMap::assign_with_policy(records, config.duplicate_policy())?;
        let kind = config.encoding();
        let cnf = kind
            .constraints_encoder()
            .encode_constraints(&variable_map, constraints)?;
        Ok(Self {
            kind,
            variable_map,
            cnf,
        })
    }

    /// Encodes the constraints over the records of a relation.
    ///
    /// Constraints are checked against the schema of the relation, even if it has no records.
    pub fn encode_relation(
        relation: &Relation,
        constraints: &ConstraintSet,
        config: &Config,
    ) -> Result<Self, CavsatError> {
        constraints.validate(relation.schema().arity())?;
        Self::encode(relation.records(), constraints, config)
    }

    /// Returns the kind of encoding used.
    pub fn kind(&self) -> EncodingKind {
        self.kind
    }

    /// Returns the map between records and variables.
    pub fn variable_map(&self) -> &VariableMap {
        &self.variable_map
    }

    /// Returns the formula.
    pub fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// Returns the encoder used to build this encoding.
    pub fn constraints_encoder(&self) -> Box<dyn ConstraintsEncoder> {
        self.kind.constraints_encoder()
    }
}
