use std::{cmp::Ordering, fmt::Display};

/// A scalar field of a record.
///
/// Values read from text are integers if they are written the canonical way (`7`, `-3`), strings otherwise (`007`, `+7`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    /// An integer value.
    Int(i64),
    /// A textual value.
    Text(String),
}

impl Value {
    /// Builds a value from its textual representation.
    ///
    /// ```
    /// # use cavsat::data::Value;
    /// assert_eq!(Value::Int(5000), Value::parse("5000"));
    /// assert_eq!(Value::Text("Sales".to_string()), Value::parse("Sales"));
    /// assert_eq!(Value::Text("007".to_string()), Value::parse("007"));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(i) if i.to_string() == s => Value::Int(i),
            _ => Value::Text(s.to_string()),
        }
    }

    /// Returns the integer this value denotes, if any.
    ///
    /// Textual values holding an integer (possibly surrounded by spaces) are considered integers.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    /// Compares two values.
    ///
    /// The comparison is numeric when both values denote integers, and lexicographic on their textual forms otherwise.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self.as_int(), other.as_int()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }

    /// Returns `true` iff both values are equal under [`compare`](Self::compare).
    pub fn matches(&self, other: &Value) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
