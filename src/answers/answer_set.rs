use crate::{data::Record, sat::Variable};
use std::fmt::Display;

/// A set of records answering a query, sorted in variable order.
///
/// The records are borrowed from the variable map of the encoding they were extracted from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet<'a> {
    entries: Vec<(Variable, &'a Record)>,
}

impl<'a> AnswerSet<'a> {
    pub(crate) fn from_sorted(entries: Vec<(Variable, &'a Record)>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        Self { entries }
    }

    /// Returns the answers kept by both sets.
    pub fn intersection(&self, other: &AnswerSet<'a>) -> AnswerSet<'a> {
        Self::from_sorted(
            self.entries
                .iter()
                .filter(|(v, _)| other.contains(*v))
                .copied()
                .collect(),
        )
    }

    /// Returns the answers kept by at least one of the sets.
    pub fn union(&self, other: &AnswerSet<'a>) -> AnswerSet<'a> {
        let mut entries = Vec::with_capacity(self.len().max(other.len()));
        let (mut i, mut j) = (0, 0);
        while i < self.entries.len() && j < other.entries.len() {
            let (a, b) = (self.entries[i], other.entries[j]);
            match a.0.cmp(&b.0) {
                std::cmp::Ordering::Less => {
                    entries.push(a);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    entries.push(b);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    entries.push(a);
                    i += 1;
                    j += 1;
                }
            }
        }
        entries.extend_from_slice(&self.entries[i..]);
        entries.extend_from_slice(&other.entries[j..]);
        Self::from_sorted(entries)
    }

    /// Returns `true` iff every answer of this set is in the other one.
    pub fn is_subset(&self, other: &AnswerSet<'a>) -> bool {
        self.entries.iter().all(|(v, _)| other.contains(*v))
    }

    /// Returns `true` iff the record associated with the variable is an answer.
    pub fn contains(&self, var: Variable) -> bool {
        self.entries.binary_search_by(|(v, _)| v.cmp(&var)).is_ok()
    }

    /// Returns the number of answers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` iff there is no answer.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the answers and their variables, in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &'a Record)> + '_ {
        self.entries.iter().copied()
    }

    /// Iterates over the answer records, in variable order.
    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.entries.iter().map(|(_, r)| *r)
    }

    /// Iterates over the variables of the answers, in increasing order.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.entries.iter().map(|(v, _)| *v)
    }
}

impl Display for AnswerSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self
            .records()
            .map(|r| r.to_string())
            .collect::<Vec<String>>();
        write!(f, "{{{}}}", records.join(", "))
    }
}
