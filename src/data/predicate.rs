use super::{Record, Value};
use crate::error::CavsatError;
use std::{cmp::Ordering, fmt::Display};

/// A comparison operator between a field and a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl Comparison {
    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Eq => ordering == Ordering::Equal,
            Comparison::Ne => ordering != Ordering::Equal,
            Comparison::Lt => ordering == Ordering::Less,
            Comparison::Le => ordering != Ordering::Greater,
            Comparison::Gt => ordering == Ordering::Greater,
            Comparison::Ge => ordering != Ordering::Less,
        }
    }

    /// Returns the symbol of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        }
    }
}

/// A boolean function over a single record, expressed as data.
///
/// Predicates are pure and total: a reference to a field the record does not have evaluates to `false`
/// (use [`check_arity`](Self::check_arity) to detect such references before evaluation).
///
/// # Example
///
/// ```
/// # use cavsat::data::{Comparison, Predicate};
/// # use cavsat::record;
/// let sales_over_5000 = Predicate::or(vec![
///     Predicate::compare(1, Comparison::Ne, "Sales"),
///     Predicate::compare(2, Comparison::Gt, 5000),
/// ]);
/// assert!(!sales_over_5000.eval(&record![1, "Sales", 5000]));
/// assert!(sales_over_5000.eval(&record![2, "Eng", 7000]));
/// assert!(sales_over_5000.eval(&record![3, "Sales", 6000]));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Always true.
    True,
    /// Always false.
    False,
    /// Compares a field with a constant.
    Compare {
        /// the field index
        field: usize,
        /// the operator
        op: Comparison,
        /// the constant
        value: Value,
    },
    /// Checks that the textual form of a field contains a pattern.
    Contains {
        /// the field index
        field: usize,
        /// the pattern
        pattern: String,
    },
    /// Checks that the textual form of a field starts with a pattern.
    StartsWith {
        /// the field index
        field: usize,
        /// the pattern
        pattern: String,
    },
    /// Checks that the textual form of a field ends with a pattern.
    EndsWith {
        /// the field index
        field: usize,
        /// the pattern
        pattern: String,
    },
    /// Checks that a field is equal to one of the values.
    In {
        /// the field index
        field: usize,
        /// the accepted values
        values: Vec<Value>,
    },
    /// Negation.
    Not(Box<Predicate>),
    /// Conjunction; true if empty.
    And(Vec<Predicate>),
    /// Disjunction; false if empty.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Builds a comparison between a field and a constant.
    pub fn compare<V>(field: usize, op: Comparison, value: V) -> Self
    where
        V: Into<Value>,
    {
        Predicate::Compare {
            field,
            op,
            value: value.into(),
        }
    }

    /// Builds an equality test between a field and a constant.
    pub fn eq<V>(field: usize, value: V) -> Self
    where
        V: Into<Value>,
    {
        Self::compare(field, Comparison::Eq, value)
    }

    /// Builds a substring test.
    pub fn contains<S>(field: usize, pattern: S) -> Self
    where
        S: Into<String>,
    {
        Predicate::Contains {
            field,
            pattern: pattern.into(),
        }
    }

    /// Builds the negation of a predicate.
    #[allow(clippy::should_implement_trait)]
    pub fn not(p: Predicate) -> Self {
        Predicate::Not(Box::new(p))
    }

    /// Builds a conjunction.
    pub fn and(preds: Vec<Predicate>) -> Self {
        Predicate::And(preds)
    }

    /// Builds a disjunction.
    pub fn or(preds: Vec<Predicate>) -> Self {
        Predicate::Or(preds)
    }

    /// Evaluates the predicate against a record.
    pub fn eval(&self, record: &Record) -> bool {
        let text_of = |field: &usize| record.value(*field).map(|v| v.to_string());
        match self {
            Predicate::True => true,
            Predicate::False => false,
            Predicate::Compare { field, op, value } => record
                .value(*field)
                .map(|v| op.holds(v.compare(value)))
                .unwrap_or(false),
            Predicate::Contains { field, pattern } => text_of(field)
                .map(|s| s.contains(pattern.as_str()))
                .unwrap_or(false),
            Predicate::StartsWith { field, pattern } => text_of(field)
                .map(|s| s.starts_with(pattern.as_str()))
                .unwrap_or(false),
            Predicate::EndsWith { field, pattern } => text_of(field)
                .map(|s| s.ends_with(pattern.as_str()))
                .unwrap_or(false),
            Predicate::In { field, values } => record
                .value(*field)
                .map(|v| values.iter().any(|w| v.matches(w)))
                .unwrap_or(false),
            Predicate::Not(p) => !p.eval(record),
            Predicate::And(preds) => preds.iter().all(|p| p.eval(record)),
            Predicate::Or(preds) => preds.iter().any(|p| p.eval(record)),
        }
    }

    /// Checks that every field this predicate references exists for records of the given arity.
    pub fn check_arity(&self, arity: usize) -> Result<(), CavsatError> {
        let check = |field: &usize| {
            if *field < arity {
                Ok(())
            } else {
                Err(CavsatError::schema(format!(
                    "predicate references field #{} but records have {} fields",
                    field, arity
                )))
            }
        };
        match self {
            Predicate::True | Predicate::False => Ok(()),
            Predicate::Compare { field, .. }
            | Predicate::Contains { field, .. }
            | Predicate::StartsWith { field, .. }
            | Predicate::EndsWith { field, .. }
            | Predicate::In { field, .. } => check(field),
            Predicate::Not(p) => p.check_arity(arity),
            Predicate::And(preds) | Predicate::Or(preds) => {
                preds.iter().try_for_each(|p| p.check_arity(arity))
            }
        }
    }
}

fn fmt_list(f: &mut std::fmt::Formatter<'_>, preds: &[Predicate], sep: &str) -> std::fmt::Result {
    write!(f, "(")?;
    for (i, p) in preds.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", p)?;
    }
    write!(f, ")")
}

impl Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::True => write!(f, "true"),
            Predicate::False => write!(f, "false"),
            Predicate::Compare { field, op, value } => {
                write!(f, "#{} {} {}", field, op.symbol(), quoted(&value.to_string()))
            }
            Predicate::Contains { field, pattern } => {
                write!(f, "#{} contains {}", field, quoted(pattern))
            }
            Predicate::StartsWith { field, pattern } => {
                write!(f, "#{} startswith {}", field, quoted(pattern))
            }
            Predicate::EndsWith { field, pattern } => {
                write!(f, "#{} endswith {}", field, quoted(pattern))
            }
            Predicate::In { field, values } => write!(
                f,
                "#{} in [{}]",
                field,
                values
                    .iter()
                    .map(|v| quoted(&v.to_string()))
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            Predicate::Not(p) => write!(f, "not {}", p),
            Predicate::And(preds) if preds.is_empty() => write!(f, "true"),
            Predicate::Or(preds) if preds.is_empty() => write!(f, "false"),
            Predicate::And(preds) => fmt_list(f, preds, "and"),
            Predicate::Or(preds) => fmt_list(f, preds, "or"),
        }
    }
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
