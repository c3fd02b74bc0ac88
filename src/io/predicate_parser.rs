use crate::data::{Comparison, Predicate, Schema, Value};
use anyhow::{anyhow, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_PATTERN: Regex = Regex::new(concat!(
        r#"^\s*(?:"#,
        r#"(?P<text>"(?:[^"]|"")*")"#,
        r#"|(?P<int>-?\d+)\b"#,
        r#"|(?P<cmp>==|!=|<=|>=|<|>)"#,
        r#"|(?P<punct>[()\[\],])"#,
        r#"|(?P<field>`[^`]+`)"#,
        r#"|(?P<word>#\d+|[_\p{L}][_\p{L}\d]*)"#,
        r#")"#,
    ))
    .unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text(String),
    Int(i64),
    Cmp(Comparison),
    Punct(char),
    Field(String),
    Word(String),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Text(s) => format!("\"{}\"", s),
            Token::Int(i) => i.to_string(),
            Token::Cmp(op) => op.symbol().to_string(),
            Token::Punct(c) => c.to_string(),
            Token::Field(s) => format!("`{}`", s),
            Token::Word(w) => w.to_string(),
        }
    }
}

fn comparison_of(symbol: &str) -> Option<Comparison> {
    [
        Comparison::Eq,
        Comparison::Ne,
        Comparison::Lt,
        Comparison::Le,
        Comparison::Gt,
        Comparison::Ge,
    ]
    .into_iter()
    .find(|op| op.symbol() == symbol)
}

fn tokenize(s: &str) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut rest = s;
    while !rest.trim().is_empty() {
        let captures = TOKEN_PATTERN
            .captures(rest)
            .ok_or_else(|| anyhow!("unexpected character sequence \"{}\"", rest.trim()))?;
        let token = if let Some(m) = captures.name("text") {
            let quoted = m.as_str();
            Token::Text(quoted[1..quoted.len() - 1].replace("\"\"", "\""))
        } else if let Some(m) = captures.name("int") {
            Token::Int(
                m.as_str()
                    .parse()
                    .with_context(|| format!("while reading integer {}", m.as_str()))?,
            )
        } else if let Some(m) = captures.name("cmp") {
            Token::Cmp(
                comparison_of(m.as_str())
                    .ok_or_else(|| anyhow!("unknown comparison {}", m.as_str()))?,
            )
        } else if let Some(m) = captures.name("punct") {
            Token::Punct(m.as_str().chars().next().unwrap_or_default())
        } else if let Some(m) = captures.name("field") {
            let quoted = m.as_str();
            Token::Field(quoted[1..quoted.len() - 1].to_string())
        } else if let Some(m) = captures.name("word") {
            Token::Word(m.as_str().to_string())
        } else {
            return Err(anyhow!("unexpected character sequence \"{}\"", rest.trim()));
        };
        tokens.push(token);
        rest = &rest[captures.get(0).map_or(rest.len(), |m| m.end())..];
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    schema: Option<&'a Schema>,
}

impl<'a> Parser<'a> {
    fn new(s: &str, schema: Option<&'a Schema>) -> Result<Self> {
        Ok(Self {
            tokens: tokenize(s)?,
            position: 0,
            schema,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next_token(&mut self, expected: &str) -> Result<Token> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| anyhow!("expected {}, found end of input", expected))?;
        self.position += 1;
        Ok(token)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Some(Token::Word(w)) if w == keyword) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek() == Some(&Token::Punct(c)) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<()> {
        let token = self.next_token(&format!("\"{}\"", c))?;
        if token == Token::Punct(c) {
            Ok(())
        } else {
            Err(anyhow!("expected \"{}\", found {}", c, token.describe()))
        }
    }

    fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(anyhow!("unexpected token {}", t.describe())),
        }
    }

    fn field(&mut self) -> Result<usize> {
        let name = match self.next_token("a field")? {
            Token::Word(w) => w,
            Token::Field(f) => f,
            t => return Err(anyhow!("expected a field, found {}", t.describe())),
        };
        match self.schema {
            Some(schema) => Ok(schema.try_field_index(&name)?),
            None => Err(anyhow!("no schema to resolve field {}", name)),
        }
    }

    fn field_list(&mut self) -> Result<Vec<usize>> {
        let mut fields = vec![self.field()?];
        while self.eat_punct(',') {
            fields.push(self.field()?);
        }
        Ok(fields)
    }

    fn value(&mut self) -> Result<Value> {
        match self.next_token("a value")? {
            Token::Text(s) => Ok(Value::parse(&s)),
            Token::Int(i) => Ok(Value::Int(i)),
            t => Err(anyhow!("expected a value, found {}", t.describe())),
        }
    }

    fn text(&mut self) -> Result<String> {
        match self.next_token("a string")? {
            Token::Text(s) => Ok(s),
            Token::Int(i) => Ok(i.to_string()),
            t => Err(anyhow!("expected a string, found {}", t.describe())),
        }
    }

    fn value_list(&mut self) -> Result<Vec<Value>> {
        self.expect_punct('[')?;
        let mut values = vec![];
        if self.eat_punct(']') {
            return Ok(values);
        }
        loop {
            values.push(self.value()?);
            if self.eat_punct(']') {
                return Ok(values);
            }
            self.expect_punct(',')?;
        }
    }

    fn disjunction(&mut self) -> Result<Predicate> {
        let mut preds = vec![self.conjunction()?];
        while self.eat_keyword("or") {
            preds.push(self.conjunction()?);
        }
        Ok(if preds.len() == 1 {
            preds.swap_remove(0)
        } else {
            Predicate::or(preds)
        })
    }

    fn conjunction(&mut self) -> Result<Predicate> {
        let mut preds = vec![self.negation()?];
        while self.eat_keyword("and") {
            preds.push(self.negation()?);
        }
        Ok(if preds.len() == 1 {
            preds.swap_remove(0)
        } else {
            Predicate::and(preds)
        })
    }

    fn negation(&mut self) -> Result<Predicate> {
        if self.eat_keyword("not") {
            Ok(Predicate::not(self.negation()?))
        } else {
            self.atom()
        }
    }

    fn atom(&mut self) -> Result<Predicate> {
        if self.eat_punct('(') {
            let p = self.disjunction()?;
            self.expect_punct(')')?;
            return Ok(p);
        }
        if self.eat_keyword("true") {
            return Ok(Predicate::True);
        }
        if self.eat_keyword("false") {
            return Ok(Predicate::False);
        }
        let field = self.field()?;
        match self.next_token("an operator")? {
            Token::Cmp(op) => Ok(Predicate::compare(field, op, self.value()?)),
            Token::Word(w) if w == "contains" => Ok(Predicate::contains(field, self.text()?)),
            Token::Word(w) if w == "startswith" => Ok(Predicate::StartsWith {
                field,
                pattern: self.text()?,
            }),
            Token::Word(w) if w == "endswith" => Ok(Predicate::EndsWith {
                field,
                pattern: self.text()?,
            }),
            Token::Word(w) if w == "in" => Ok(Predicate::In {
                field,
                values: self.value_list()?,
            }),
            t => Err(anyhow!("expected an operator, found {}", t.describe())),
        }
    }
}

/// Reads a predicate over the records of a schema.
///
/// Fields are referenced by their name, by their position (`#0`, `#1`, ...),
/// or by their name surrounded by backquotes if it is not a plain identifier.
/// Strings are surrounded by double quotes (and a double quote inside a string is doubled).
///
/// Comparisons use the operators `==`, `!=`, `<`, `<=`, `>` and `>=`;
/// other tests are `contains`, `startswith`, `endswith` and `in [v1, v2, ...]`.
/// Tests are combined by `or`, `and`, `not` (from the lowest to the highest precedence) and parentheses.
///
/// # Example
///
/// ```
/// # use cavsat::data::Schema;
/// # use cavsat::io::read_predicate;
/// # use cavsat::record;
/// let schema = Schema::new(&["id", "department", "salary"]).unwrap();
/// let p = read_predicate(r#"department == "Sales" and salary > 5000"#, &schema).unwrap();
/// assert!(p.eval(&record![3, "Sales", 6000]));
/// assert!(!p.eval(&record![1, "Sales", 5000]));
/// ```
pub fn read_predicate(s: &str, schema: &Schema) -> Result<Predicate> {
    let context = || format!("while reading predicate \"{}\"", s.trim());
    let mut parser = Parser::new(s, Some(schema)).with_context(context)?;
    let p = parser.disjunction().with_context(context)?;
    parser.expect_end().with_context(context)?;
    Ok(p)
}

pub(crate) fn read_field_list(s: &str, schema: &Schema) -> Result<Vec<usize>> {
    let mut parser = Parser::new(s, Some(schema))?;
    let fields = parser.field_list()?;
    parser.expect_end()?;
    Ok(fields)
}

pub(crate) fn read_value_lists(s: &str) -> Result<Vec<Vec<Value>>> {
    let mut parser = Parser::new(s, None)?;
    let mut lists = vec![];
    while parser.peek().is_some() {
        lists.push(parser.value_list()?);
    }
    Ok(lists)
}
