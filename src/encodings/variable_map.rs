use crate::{data::Record, error::CavsatError, sat::Variable};
use std::collections::HashMap;
use strum_macros::{AsRefStr, EnumString, EnumVariantNames};

/// The policy applied when several input records hold the same values.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString, EnumVariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Records with the same values share a single variable.
    #[default]
    Collapse,
    /// Each input record gets its own variable, even if its values appear elsewhere.
    Distinct,
    /// Duplicates raise a schema error.
    Reject,
}

/// A bijection between records and SAT variables, scoped to one encoding session.
///
/// Variables are assigned in the order records are given, starting from `1`.
/// The map is an arena: records are stored once (or once per copy under [`DuplicatePolicy::Distinct`])
/// and their variables are their positions in the arena.
///
/// # Example
///
/// ```
/// # use cavsat::encodings::VariableMap;
/// # use cavsat::record;
/// # use cavsat::sat::Variable;
/// let records = vec![record![1, "Sales", 5000], record![2, "Eng", 7000]];
/// let map = VariableMap::assign(&records).unwrap();
/// assert_eq!(Some(Variable::from(2)), map.variable_of(&record![2, "Eng", 7000]));
/// assert_eq!(Some(&records[0]), map.record_of(Variable::from(1)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct VariableMap {
    records: Vec<Record>,
    record_to_vars: HashMap<Record, Vec<Variable>>,
}

impl VariableMap {
    /// Assigns variables to records, collapsing duplicates.
    pub fn assign(records: &[Record]) -> Result<Self, CavsatError> {
        Self::assign_with_policy(records, DuplicatePolicy::default())
    }

    /// Assigns variables to records given a duplicate policy.
    ///
    /// All the records must share the same arity.
    pub fn assign_with_policy(
        records: &[Record],
        policy: DuplicatePolicy,
    ) -> Result<Self, CavsatError> {
        let mut map = VariableMap {
            records: Vec::with_capacity(records.len()),
            record_to_vars: HashMap::with_capacity(records.len()),
        };
        let arity = records.first().map(|r| r.arity());
        for (i, r) in records.iter().enumerate() {
            if Some(r.arity()) != arity {
                return Err(CavsatError::schema(format!(
                    "record {} at index {} has {} fields, expected {}",
                    r,
                    i,
                    r.arity(),
                    arity.unwrap_or_default()
                )));
            }
            if map.record_to_vars.contains_key(r) {
                match policy {
                    DuplicatePolicy::Collapse => continue,
                    DuplicatePolicy::Distinct => {}
                    DuplicatePolicy::Reject => {
                        return Err(CavsatError::schema(format!(
                            "record {} at index {} is a duplicate",
                            r, i
                        )))
                    }
                }
            }
            map.records.push(r.clone());
            let var = Variable::from(map.records.len());
            map.record_to_vars.entry(r.clone()).or_default().push(var);
        }
        Ok(map)
    }

    /// Returns the record associated with a variable, if any.
    pub fn record_of(&self, var: Variable) -> Option<&Record> {
        self.records.get(usize::from(var) - 1)
    }

    /// Returns the (first) variable associated with a record, if any.
    pub fn variable_of(&self, record: &Record) -> Option<Variable> {
        self.record_to_vars
            .get(record)
            .and_then(|vars| vars.first().copied())
    }

    /// Returns all the variables associated with a record.
    ///
    /// There are several of them only under the [`DuplicatePolicy::Distinct`] policy.
    pub fn variables_of(&self, record: &Record) -> &[Variable] {
        self.record_to_vars
            .get(record)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Iterates over the variables and their records, in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &Record)> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(i, r)| (Variable::from(i + 1), r))
    }

    /// Returns the records, in variable order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the number of record variables.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` iff the map has no variable.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the arity of the records, if there is at least one record.
    pub fn arity(&self) -> Option<usize> {
        self.records.first().map(|r| r.arity())
    }
}
