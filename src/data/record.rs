use super::Value;
use std::fmt::Display;

/// An immutable tuple of values.
///
/// The identity of a record is structural: two records holding the same values are equal and share the same hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Record(Vec<Value>);

impl Record {
    /// Builds a new record from its values.
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Returns the values of this record, in order.
    pub fn values(&self) -> &[Value] {
        &self.0
    }

    /// Returns the value of the field with the given index, if it exists.
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Returns the number of fields of the record.
    pub fn arity(&self) -> usize {
        self.0.len()
    }

    /// Returns the values of the fields which indices are given, in the order of the indices.
    ///
    /// # Panics
    ///
    /// If an index is out of bounds.
    pub fn project(&self, indices: &[usize]) -> Vec<&Value> {
        indices.iter().map(|i| &self.0[*i]).collect()
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({})",
            self.0
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<String>>()
                .join(", ")
        )
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// Builds a record from a list of values.
///
/// ```
/// # use cavsat::record;
/// # use cavsat::data::Value;
/// let r = record![1, "Sales", 5000];
/// assert_eq!(Some(&Value::Text("Sales".to_string())), r.value(1));
/// ```
#[macro_export]
macro_rules! record {
    () => (
        $crate::data::Record::new(vec![])
    );
    ($($x:expr),+ $(,)?) => (
        $crate::data::Record::new(vec![$($crate::data::Value::from($x)),+])
    );
}
