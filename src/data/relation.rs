use super::{Record, Schema};
use crate::error::CavsatError;

/// A relation: a schema and an ordered sequence of records.
///
/// Every record has the arity of the schema.
/// Records are kept in their insertion order, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    schema: Schema,
    records: Vec<Record>,
}

impl Relation {
    /// Builds a relation, checking the arity of each record.
    pub fn new(schema: Schema, records: Vec<Record>) -> Result<Self, CavsatError> {
        if let Some((i, r)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.arity() != schema.arity())
        {
            return Err(CavsatError::schema(format!(
                "record {} at index {} has {} fields, expected {}",
                r,
                i,
                r.arity(),
                schema.arity()
            )));
        }
        Ok(Self { schema, records })
    }

    /// Builds a relation with the anonymous schema matching the arity of the records.
    pub fn anonymous(records: Vec<Record>) -> Result<Self, CavsatError> {
        let arity = match records.first() {
            Some(r) if r.arity() > 0 => r.arity(),
            _ => {
                return Err(CavsatError::schema(
                    "cannot infer the schema of an empty relation",
                ))
            }
        };
        Self::new(Schema::anonymous(arity), records)
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the records, in input order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the number of records, duplicates included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` iff the relation has no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
