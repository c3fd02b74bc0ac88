use crate::{
    answers::AnswerSet,
    data::{Relation, Schema},
};
use anyhow::{Context, Result};
use std::io::{Read, Write};

/// The type of callback functions to call when warnings are raised while reading an input.
///
/// The first parameter is the (1-based) line number, the second one is the warning message.
pub type WarningHandler = Box<dyn Fn(usize, String)>;

/// A trait implemented by objects able to read relations.
pub trait RelationReader {
    /// Reads a [`Relation`].
    ///
    /// In case warnings are raised, the callback functions registered by [add_warning_handler](Self::add_warning_handler) are triggered.
    ///
    /// # Example
    ///
    /// ```
    /// # use cavsat::data::Relation;
    /// # use cavsat::io::{DelimitedReader, RelationReader};
    /// fn read_relation_from_str(s: &str) -> Relation {
    ///     let reader = DelimitedReader::default();
    ///     reader.read(&mut s.as_bytes()).expect("invalid relation")
    /// }
    /// # read_relation_from_str("id,department\n1,Sales\n");
    /// ```
    fn read(&self, reader: &mut dyn Read) -> Result<Relation>;

    /// Adds a callback function to call when warnings are raised while reading a relation.
    fn add_warning_handler(&mut self, h: WarningHandler);
}

/// A trait implemented by objects that write the answers to queries.
pub trait AnswerWriter {
    /// Writes the text associated with the fact the constraints admit no repair.
    fn write_no_repair(&self, writer: &mut dyn Write) -> Result<()>;

    /// Writes the text associated with the fact the solver could not conclude in time.
    fn write_timeout(&self, writer: &mut dyn Write) -> Result<()>;

    /// Writes a set of answers.
    fn write_answers(
        &self,
        writer: &mut dyn Write,
        schema: &Schema,
        answers: &AnswerSet,
    ) -> Result<()>;

    /// Writes one set of answers per repair.
    fn write_per_repair_answers(
        &self,
        writer: &mut dyn Write,
        schema: &Schema,
        answers: &[AnswerSet],
    ) -> Result<()>;
}

pub(crate) fn write_no_repair(writer: &mut dyn Write) -> Result<()> {
    let context = "while writing there is no repair";
    writeln!(writer, "NO REPAIR").context(context)?;
    writer.flush().context(context)
}

pub(crate) fn write_timeout(writer: &mut dyn Write) -> Result<()> {
    let context = "while writing the solver gave up";
    writeln!(writer, "UNKNOWN").context(context)?;
    writer.flush().context(context)
}
