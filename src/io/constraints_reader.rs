use super::{
    predicate_parser::{read_field_list, read_predicate, read_value_lists},
    warning_result::WarningResult,
    WarningHandler,
};
use crate::data::{ConstraintSet, IntegrityConstraint, Record, Schema};
use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::io::{BufRead, BufReader, Read};

lazy_static! {
    static ref CHECK_LINE_PATTERN: Regex = Regex::new(r"^\s*check\s+(.+)$").unwrap();
    static ref REQUIRE_LINE_PATTERN: Regex = Regex::new(r"^\s*require\s+(.+)$").unwrap();
    static ref KEY_LINE_PATTERN: Regex = Regex::new(r"^\s*key\s*\((.*)\)\s*$").unwrap();
    static ref FD_LINE_PATTERN: Regex = Regex::new(r"^\s*fd\s*\((.*)->(.*)\)\s*$").unwrap();
    static ref AT_MOST_LINE_PATTERN: Regex =
        Regex::new(r"^\s*atmost\s*\(\s*(\d+)\s*,(.*)\)\s*$").unwrap();
    static ref CONFLICT_LINE_PATTERN: Regex = Regex::new(r"^\s*conflict\s+(.+)$").unwrap();
}

fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut previous_dash = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '-' if !in_quotes && previous_dash => return &line[..i - 1],
            _ => {}
        }
        previous_dash = c == '-' && !in_quotes;
    }
    line
}

fn group<'a>(c: &regex::Captures<'a>, i: usize) -> &'a str {
    c.get(i).map_or("", |m| m.as_str())
}

fn checked_fields(fields: Vec<usize>, schema: &Schema) -> WarningResult<Vec<usize>> {
    let mut seen = vec![false; schema.arity()];
    let mut unique = Vec::with_capacity(fields.len());
    let mut result = WarningResult::ok(());
    for f in fields {
        if seen[f] {
            result.absorb(WarningResult::warned(
                (),
                format!(r#"field "{}" is listed twice"#, schema.fields()[f]),
            ));
        } else {
            seen[f] = true;
            unique.push(f);
        }
    }
    let mut checked = WarningResult::ok(unique);
    checked.absorb(result);
    checked
}

fn read_constraint(line: &str, schema: &Schema) -> Result<WarningResult<IntegrityConstraint>> {
    if let Some(c) = CHECK_LINE_PATTERN.captures(line) {
        let p = read_predicate(group(&c, 1), schema)?;
        return Ok(WarningResult::ok(IntegrityConstraint::Check(p)));
    }
    if let Some(c) = REQUIRE_LINE_PATTERN.captures(line) {
        let p = read_predicate(group(&c, 1), schema)?;
        return Ok(WarningResult::ok(IntegrityConstraint::Require(p)));
    }
    if let Some(c) = KEY_LINE_PATTERN.captures(line) {
        let fields = checked_fields(read_field_list(group(&c, 1), schema)?, schema);
        let mut result = WarningResult::ok(());
        let fields = result.absorb(fields);
        if fields.len() == schema.arity() {
            result.absorb(WarningResult::warned(
                (),
                "a key made of all the fields only forbids duplicate records",
            ));
        }
        let mut key = WarningResult::ok(IntegrityConstraint::Key(fields));
        key.absorb(result);
        return Ok(key);
    }
    if let Some(c) = FD_LINE_PATTERN.captures(line) {
        let mut result = WarningResult::ok(());
        let determinant =
            result.absorb(checked_fields(read_field_list(group(&c, 1), schema)?, schema));
        let dependent =
            result.absorb(checked_fields(read_field_list(group(&c, 2), schema)?, schema));
        let mut fd = WarningResult::ok(IntegrityConstraint::FunctionalDependency {
            determinant,
            dependent,
        });
        fd.absorb(result);
        return Ok(fd);
    }
    if let Some(c) = AT_MOST_LINE_PATTERN.captures(line) {
        let count = group(&c, 1)
            .parse::<usize>()
            .with_context(|| format!("invalid bound {}", group(&c, 1)))?;
        let mut result = WarningResult::ok(());
        let fields = result.absorb(checked_fields(read_field_list(group(&c, 2), schema)?, schema));
        let mut at_most = WarningResult::ok(IntegrityConstraint::AtMost { count, fields });
        at_most.absorb(result);
        return Ok(at_most);
    }
    if let Some(c) = CONFLICT_LINE_PATTERN.captures(line) {
        let records = read_value_lists(group(&c, 1))?
            .into_iter()
            .map(Record::new)
            .collect();
        return Ok(WarningResult::ok(IntegrityConstraint::Conflict(records)));
    }
    Err(anyhow!("syntax error in line \"{}\"", line.trim()))
}

/// A reader for integrity constraints.
///
/// Constraints are given one per line, and refer to the fields of a schema
/// (by name, by position or by backquoted name, as in [`read_predicate`](super::read_predicate)).
/// Text following `--` (outside strings) is a comment.
///
/// ```text
/// -- the salary of the Sales department is over 5000
/// check department != "Sales" or salary > 5000
/// -- records of the board are never dropped
/// require department == "Board"
/// key(id)
/// fd(department -> manager)
/// atmost(2, department, office)
/// conflict [1, "Sales", 5000] [2, "Eng", 7000]
/// ```
///
/// # Example
///
/// ```
/// # use cavsat::data::Schema;
/// # use cavsat::io::ConstraintsReader;
/// let schema = Schema::new(&["id", "department", "salary"]).unwrap();
/// let content = "key(id) -- one record per employee\ncheck salary > 0\n";
/// let constraints = ConstraintsReader::default().read(&mut content.as_bytes(), &schema).unwrap();
/// assert_eq!(2, constraints.len());
/// ```
#[derive(Default)]
pub struct ConstraintsReader {
    warning_handlers: Vec<WarningHandler>,
}

impl ConstraintsReader {
    /// Reads the constraints given the schema of the records they apply to.
    ///
    /// In case warnings are raised, the callback functions registered by [add_warning_handler](Self::add_warning_handler) are triggered.
    pub fn read(&self, reader: &mut dyn Read, schema: &Schema) -> Result<ConstraintSet> {
        let mut constraints = ConstraintSet::default();
        let br = BufReader::new(reader);
        for (i, line) in br.lines().enumerate() {
            let context = || format!("while reading line with index {}", i);
            let warning_consumer = |w: &str| {
                self.warning_handlers
                    .iter()
                    .for_each(|h| (h)(1 + i, w.to_string()))
            };
            let line = line.with_context(context)?;
            let l = strip_comment(&line);
            if l.trim().is_empty() {
                continue;
            }
            let constraint = read_constraint(l, schema)
                .with_context(context)?
                .consume_warnings(warning_consumer);
            constraint.validate(schema.arity()).with_context(context)?;
            constraints.push(constraint);
        }
        Ok(constraints)
    }

    /// Adds a callback function to call when warnings are raised while reading constraints.
    pub fn add_warning_handler(&mut self, h: WarningHandler) {
        self.warning_handlers.push(h);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::{Comparison, Predicate},
        record,
    };
    use std::{cell::RefCell, rc::Rc};

    fn schema() -> Schema {
        Schema::new(&["id", "department", "salary", "manager"]).unwrap()
    }

    fn read(s: &str) -> Result<ConstraintSet> {
        ConstraintsReader::default().read(&mut s.as_bytes(), &schema())
    }

    fn read_one(s: &str) -> IntegrityConstraint {
        let constraints = read(s).unwrap();
        assert_eq!(1, constraints.len());
        let constraint = constraints.iter().next().unwrap().clone();
        constraint
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!("key(id) ", strip_comment("key(id) -- comment"));
        assert_eq!("", strip_comment("-- comment"));
        assert_eq!(
            r#"check department == "a--b""#,
            strip_comment(r#"check department == "a--b""#)
        );
        assert_eq!("check salary > -5", strip_comment("check salary > -5"));
    }

    #[test]
    fn test_read_check() {
        assert_eq!(
            IntegrityConstraint::Check(Predicate::or(vec![
                Predicate::compare(1, Comparison::Ne, "Sales"),
                Predicate::compare(2, Comparison::Gt, 5000),
            ])),
            read_one(r#"check department != "Sales" or salary > 5000"#)
        );
    }

    #[test]
    fn test_read_require() {
        assert_eq!(
            IntegrityConstraint::Require(Predicate::eq(1, "Board")),
            read_one(r#"  require department == "Board"  "#)
        );
    }

    #[test]
    fn test_read_group_constraints() {
        assert_eq!(IntegrityConstraint::Key(vec![0, 1]), read_one("key(id, #1)"));
        assert_eq!(
            IntegrityConstraint::FunctionalDependency {
                determinant: vec![1],
                dependent: vec![3, 2]
            },
            read_one("fd(department -> manager, salary)")
        );
        assert_eq!(
            IntegrityConstraint::AtMost {
                count: 2,
                fields: vec![1]
            },
            read_one("atmost( 2 , department)")
        );
    }

    #[test]
    fn test_read_conflict() {
        assert_eq!(
            IntegrityConstraint::Conflict(vec![
                record![1, "Sales", 5000, "Ann"],
                record![2, "Eng", 7000, "Bob"]
            ]),
            read_one(r#"conflict [1, "Sales", 5000, "Ann"] [2, "Eng", "7000", "Bob"]"#)
        );
    }

    #[test]
    fn test_read_with_comments() {
        let content = "-- header\n\nkey(id) -- the key\n   \ncheck true\n";
        assert_eq!(2, read(content).unwrap().len());
    }

    #[test]
    fn test_read_errors() {
        for wrong in [
            "keys(id)",
            "key()",
            "key(name)",
            "fd(id)",
            "atmost(0, id)",
            "atmost(x, id)",
            "check salary >",
            "check #4 == 1",
            "conflict [1, 2]",
            "conflict",
        ] {
            assert!(read(wrong).is_err(), "{}", wrong);
        }
    }

    #[test]
    fn test_error_context() {
        let err = read("key(id)\nkey(name)\n").unwrap_err();
        assert_eq!("while reading line with index 1", err.to_string());
    }

    #[test]
    fn test_warnings() {
        let warnings = Rc::new(RefCell::new(vec![]));
        let warnings_clone = Rc::clone(&warnings);
        let mut reader = ConstraintsReader::default();
        reader.add_warning_handler(Box::new(move |i, w| {
            warnings_clone.borrow_mut().push((i, w))
        }));
        let constraints = reader
            .read(
                &mut "key(id, id)\nkey(id, department, salary, manager)\n".as_bytes(),
                &schema(),
            )
            .unwrap();
        assert_eq!(
            Some(&IntegrityConstraint::Key(vec![0])),
            constraints.iter().next()
        );
        assert_eq!(
            vec![
                (1, r#"field "id" is listed twice"#.to_string()),
                (
                    2,
                    "a key made of all the fields only forbids duplicate records".to_string()
                ),
            ],
            warnings.borrow().clone()
        );
    }
}
