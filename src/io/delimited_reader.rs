use super::{warning_result::WarningResult, RelationReader, WarningHandler};
use crate::data::{Record, Relation, Schema, Value};
use anyhow::{anyhow, Context, Result};
use std::io::{BufRead, BufReader, Read};

const DEFAULT_RECORDS_CAP: usize = 1 << 10;

fn finish_field(field: String, quoted: bool) -> WarningResult<String> {
    if quoted {
        return WarningResult::ok(field);
    }
    let trimmed = field.trim();
    if trimmed.len() == field.len() {
        WarningResult::ok(field)
    } else {
        WarningResult::warned(
            trimmed.to_string(),
            "unquoted fields beginning or ending by spaces are trimmed",
        )
    }
}

fn split_line(line: &str, delimiter: char) -> Result<WarningResult<Vec<String>>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c != '"' {
                current.push(c);
            } else if chars.peek() == Some(&'"') {
                chars.next();
                current.push('"');
            } else {
                in_quotes = false;
            }
        } else if c == delimiter {
            fields.push(finish_field(std::mem::take(&mut current), quoted));
            quoted = false;
        } else if quoted {
            if !c.is_whitespace() {
                return Err(anyhow!("unexpected character {:?} after a quoted field", c));
            }
        } else if c == '"' && current.trim().is_empty() {
            current.clear();
            in_quotes = true;
            quoted = true;
        } else {
            current.push(c);
        }
    }
    if in_quotes {
        return Err(anyhow!("unterminated quoted field"));
    }
    fields.push(finish_field(current, quoted));
    Ok(fields.into_iter().collect())
}

/// A reader for relations written as delimited text (CSV and its variants).
///
/// Each non-empty line holds a record, which fields are split by the delimiter (a comma by default).
/// The first line is the header, giving the field names, unless the reader is built without header;
/// in this case, the fields are named after their positions (`#0`, `#1`, ...).
///
/// Fields may be surrounded by double quotes, in which case they may contain the delimiter;
/// double quotes inside quoted fields are escaped by doubling them.
/// Fields that can be parsed as integers are read as [`Value::Int`].
///
/// # Example
///
/// ```
/// # use cavsat::io::{DelimitedReader, RelationReader};
/// let content = "id,department,salary\n1,Sales,5000\n2,\"Eng, R&D\",7000\n";
/// let relation = DelimitedReader::default().read(&mut content.as_bytes()).unwrap();
/// assert_eq!(3, relation.schema().arity());
/// assert_eq!(2, relation.len());
/// ```
pub struct DelimitedReader {
    delimiter: char,
    has_header: bool,
    warning_handlers: Vec<WarningHandler>,
}

impl Default for DelimitedReader {
    fn default() -> Self {
        Self::new(',', true)
    }
}

impl DelimitedReader {
    /// Builds a new reader given the delimiter and whether the first line is a header.
    pub fn new(delimiter: char, has_header: bool) -> Self {
        Self {
            delimiter,
            has_header,
            warning_handlers: vec![],
        }
    }
}

impl RelationReader for DelimitedReader {
    fn read(&self, reader: &mut dyn Read) -> Result<Relation> {
        let mut schema: Option<Schema> = None;
        let mut records = Vec::with_capacity(DEFAULT_RECORDS_CAP);
        let br = BufReader::new(reader);
        for (i, line) in br.lines().enumerate() {
            let context = || format!("while reading line with index {}", i);
            let warning_consumer = |w: &str| {
                self.warning_handlers
                    .iter()
                    .for_each(|h| (h)(1 + i, w.to_string()))
            };
            let line = line.with_context(context)?;
            let l = line.strip_suffix('\r').unwrap_or(&line);
            if l.trim().is_empty() {
                continue;
            }
            let fields = split_line(l, self.delimiter)
                .with_context(context)?
                .consume_warnings(warning_consumer);
            if schema.is_none() {
                if self.has_header {
                    schema = Some(Schema::new(&fields).with_context(context)?);
                    continue;
                }
                schema = Some(Schema::anonymous(fields.len()));
            }
            let arity = schema.as_ref().map_or(fields.len(), |s| s.arity());
            if fields.len() != arity {
                return Err(anyhow!(
                    "expected {} fields, found {}",
                    arity,
                    fields.len()
                ))
                .with_context(context);
            }
            records.push(Record::new(
                fields.iter().map(|f| Value::parse(f)).collect(),
            ));
        }
        match schema {
            Some(s) => Ok(Relation::new(s, records)?),
            None => Err(anyhow!("the input contains no header and no record")),
        }
    }

    fn add_warning_handler(&mut self, h: WarningHandler) {
        self.warning_handlers.push(h);
    }
}
