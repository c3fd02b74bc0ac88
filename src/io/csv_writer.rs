use super::AnswerWriter;
use crate::{
    answers::AnswerSet,
    data::{Record, Schema},
};
use anyhow::{Context, Result};
use std::io::Write;

/// A writer for answers as delimited text.
///
/// Answers are written this way:
///   * a set of answers: a header line with the field names, then one line per record;
///   * answers per repair: the same, with an additional `repair` column giving the (1-based) index of the repair;
///   * absence of repair: `NO REPAIR`;
///   * interrupted search: `UNKNOWN`.
///
/// Fields containing the delimiter, a double quote or surrounding spaces are quoted.
pub struct CsvWriter {
    delimiter: char,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new(',')
    }
}

impl CsvWriter {
    /// Builds a writer using the given delimiter.
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    fn escape(&self, field: &str) -> String {
        if field.contains(self.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.trim().len() != field.len()
        {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn join<I, S>(&self, fields: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        fields
            .into_iter()
            .map(|f| self.escape(f.as_ref()))
            .collect::<Vec<String>>()
            .join(&self.delimiter.to_string())
    }

    fn record_line(&self, record: &Record) -> String {
        self.join(record.values().iter().map(|v| v.to_string()))
    }
}

impl AnswerWriter for CsvWriter {
    fn write_no_repair(&self, writer: &mut dyn Write) -> Result<()> {
        super::specs::write_no_repair(writer)
    }

    fn write_timeout(&self, writer: &mut dyn Write) -> Result<()> {
        super::specs::write_timeout(writer)
    }

    fn write_answers(
        &self,
        writer: &mut dyn Write,
        schema: &Schema,
        answers: &AnswerSet,
    ) -> Result<()> {
        let context = "while writing a set of answers";
        writeln!(writer, "{}", self.join(schema.fields())).context(context)?;
        answers
            .records()
            .try_for_each(|r| writeln!(writer, "{}", self.record_line(r)).context(context))?;
        writer.flush().context(context)
    }

    fn write_per_repair_answers(
        &self,
        writer: &mut dyn Write,
        schema: &Schema,
        answers: &[AnswerSet],
    ) -> Result<()> {
        let context = "while writing the answers of each repair";
        let header = std::iter::once("repair").chain(schema.fields().iter().map(|f| f.as_str()));
        writeln!(writer, "{}", self.join(header)).context(context)?;
        for (i, set) in answers.iter().enumerate() {
            for r in set.records() {
                writeln!(
                    writer,
                    "{}{}{}",
                    i + 1,
                    self.delimiter,
                    self.record_line(r)
                )
                .context(context)?;
            }
        }
        writer.flush().context(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        answers::AnswerExtractor,
        config::Config,
        data::{ConstraintSet, IntegrityConstraint, Predicate},
        encodings::Encoding,
        record,
        solvers::{RepairEnumerator, RepairSolver},
    };
    use std::io::BufWriter;

    fn written<F>(f: F) -> String
    where
        F: FnOnce(&mut dyn Write),
    {
        let mut buffer = BufWriter::new(Vec::new());
        f(&mut buffer);
        String::from_utf8(buffer.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_escape() {
        let writer = CsvWriter::default();
        assert_eq!("Sales", writer.escape("Sales"));
        assert_eq!(r#""Eng, R&D""#, writer.escape("Eng, R&D"));
        assert_eq!(r#""say ""hi""""#, writer.escape(r#"say "hi""#));
        assert_eq!(r#"" x""#, writer.escape(" x"));
        assert_eq!("Eng, R&D", CsvWriter::new(';').escape("Eng, R&D"));
    }

    #[test]
    fn test_write_no_repair() {
        let out = written(|w| CsvWriter::default().write_no_repair(w).unwrap());
        assert_eq!("NO REPAIR\n", out);
    }

    #[test]
    fn test_write_timeout() {
        let out = written(|w| CsvWriter::default().write_timeout(w).unwrap());
        assert_eq!("UNKNOWN\n", out);
    }

    #[test]
    fn test_write_answers() {
        let schema = Schema::new(&["id", "course", "instructor"]).unwrap();
        let records = vec![
            record![1, "Math101", "Prof. Brown"],
            record![1, "Math101", "Prof. Green"],
            record![2, "Math101", "Prof. Brown, Jr."],
        ];
        let constraints = ConstraintSet::new(vec![IntegrityConstraint::Key(vec![0, 1])]);
        let encoding = Encoding::encode(&records, &constraints, &Config::default()).unwrap();
        let family = RepairSolver::new(&encoding).enumerate_repairs(10);
        let extractor = AnswerExtractor::new(&encoding);
        let per_repair = extractor
            .per_repair_answers(&family, &Predicate::eq(0, 2))
            .unwrap();
        let out = written(|w| {
            CsvWriter::default()
                .write_answers(w, &schema, &per_repair[0])
                .unwrap()
        });
        assert_eq!(
            "id,course,instructor\n2,Math101,\"Prof. Brown, Jr.\"\n",
            out
        );
        let out = written(|w| {
            CsvWriter::default()
                .write_per_repair_answers(w, &schema, &per_repair)
                .unwrap()
        });
        assert_eq!(
            "repair,id,course,instructor\n1,2,Math101,\"Prof. Brown, Jr.\"\n2,2,Math101,\"Prof. Brown, Jr.\"\n",
            out
        );
    }

    #[test]
    fn test_write_empty_answers() {
        let schema = Schema::new(&["id"]).unwrap();
        let out = written(|w| {
            CsvWriter::new(';')
                .write_answers(w, &schema, &AnswerSet::default())
                .unwrap()
        });
        assert_eq!("id\n", out);
    }
}
