//! Extraction of query answers from repairs.

mod answer_set;
pub use answer_set::AnswerSet;

mod extractor;
pub use extractor::AnswerExtractor;
pub use extractor::ConsistentAnswers;
pub use extractor::QueryAnswers;

use strum_macros::{AsRefStr, EnumString, EnumVariantNames};

/// The semantics under which a query is answered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString, EnumVariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum AnswerMode {
    /// The answers in one repair.
    Single,
    /// The answers kept by every repair.
    #[default]
    Certain,
    /// The answers kept by at least one repair.
    Possible,
    /// The answers in each repair.
    Repairs,
}
