use crate::error::CavsatError;
use std::collections::HashMap;

/// The ordered list of the field names shared by the records of a relation.
///
/// Fields can be referenced by their name, or by their position using the `#i` syntax.
///
/// # Example
///
/// ```
/// # use cavsat::data::Schema;
/// let schema = Schema::new(&["id", "department", "salary"]).unwrap();
/// assert_eq!(3, schema.arity());
/// assert_eq!(Some(2), schema.field_index("salary"));
/// assert_eq!(Some(1), schema.field_index("#1"));
/// assert_eq!(None, schema.field_index("#3"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<String>,
    field_to_index: HashMap<String, usize>,
}

impl Schema {
    /// Builds a schema given its field names.
    ///
    /// An error is returned if the list is empty or if a name appears twice.
    pub fn new<T>(fields: &[T]) -> Result<Self, CavsatError>
    where
        T: AsRef<str>,
    {
        if fields.is_empty() {
            return Err(CavsatError::schema("a schema must have at least one field"));
        }
        let mut field_to_index = HashMap::with_capacity(fields.len());
        for (i, f) in fields.iter().enumerate() {
            let name = f.as_ref().to_string();
            if field_to_index.insert(name.clone(), i).is_some() {
                return Err(CavsatError::schema(format!(
                    r#"field "{}" is defined twice"#,
                    name
                )));
            }
        }
        Ok(Self {
            fields: fields.iter().map(|f| f.as_ref().to_string()).collect(),
            field_to_index,
        })
    }

    /// Builds a schema which fields are named after their positions (`#0`, `#1`, ...).
    ///
    /// # Panics
    ///
    /// If the arity is zero.
    pub fn anonymous(arity: usize) -> Self {
        if arity == 0 {
            panic!("a schema must have at least one field")
        }
        let fields = (0..arity).map(|i| format!("#{}", i)).collect::<Vec<_>>();
        let field_to_index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.clone(), i))
            .collect();
        Self {
            fields,
            field_to_index,
        }
    }

    /// Returns the number of fields.
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Returns the field names, in order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns the index of a field given by its name or by the `#i` positional syntax.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        if let Some(i) = self.field_to_index.get(name) {
            return Some(*i);
        }
        name.strip_prefix('#')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|i| *i < self.arity())
    }

    /// Same as [`field_index`](Self::field_index), but returns an error for unknown fields.
    pub fn try_field_index(&self, name: &str) -> Result<usize, CavsatError> {
        self.field_index(name)
            .ok_or_else(|| CavsatError::schema(format!(r#"no such field "{}""#, name)))
    }
}
