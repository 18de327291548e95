//! Domain filters.
//!
//! A domain is a prefix-notation list of conditions selecting the records of
//! a model that feed a calendar source:
//!
//! ```text
//! [('stage', '!=', 'done'), '|', ('priority', '>', 1), ('user_ids', 'in', [2, 7])]
//! ```
//!
//! `'&'` and `'|'` take the next two expressions, `'!'` the next one, and
//! consecutive top-level expressions are AND-ed. An empty text selects every
//! record. Domains are parsed and checked against the model's field catalog
//! once, before a sync pass reads anything.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{GlobalCalError, GlobalCalResult};
use crate::schema::ModelSchema;
use crate::temporal::{parse_date_text, parse_datetime_text};
use crate::value::{FieldValue, Record};

/// Pseudo-field available on every model.
pub const ID_FIELD: &str = "id";

static NULL: FieldValue = FieldValue::Null;

/// Deepest bracket nesting or operator chain accepted.
const MAX_DEPTH: usize = 256;

/// A literal on the right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Like,
    NotLike,
    ILike,
    NotILike,
}

impl Operator {
    pub fn parse(s: &str) -> Option<Self> {
        let op = match s {
            "=" | "==" => Operator::Eq,
            "!=" | "<>" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            "like" => Operator::Like,
            "not like" => Operator::NotLike,
            "ilike" => Operator::ILike,
            "not ilike" => Operator::NotILike,
            _ => return None,
        };
        Some(op)
    }
}

/// `(field, operator, value)`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: Operator,
    pub value: Literal,
}

/// A parsed domain expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Domain {
    /// Matches every record
    #[default]
    All,
    Leaf(Condition),
    And(Vec<Domain>),
    Or(Box<Domain>, Box<Domain>),
    Not(Box<Domain>),
}

impl Domain {
    /// Parse domain text. Blank text yields [`Domain::All`].
    pub fn parse(text: &str) -> GlobalCalResult<Self> {
        if text.trim().is_empty() {
            return Ok(Domain::All);
        }

        let node = Parser::new(text).parse_document().map_err(invalid)?;
        let Node::List(items) = node else {
            return Err(invalid("a domain must be a list".to_string()));
        };

        let terms = items
            .into_iter()
            .map(Term::from_node)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let mut pos = 0;
        let mut parts = Vec::new();
        while pos < terms.len() {
            parts.push(build(&terms, &mut pos, 0).map_err(invalid)?);
        }

        Ok(match parts.len() {
            0 => Domain::All,
            1 => parts.remove(0),
            _ => Domain::And(parts),
        })
    }

    /// Parse and check every referenced field against `schema`.
    pub fn compile(text: &str, schema: &ModelSchema) -> GlobalCalResult<Self> {
        let domain = Self::parse(text)?;
        domain.validate(schema)?;
        Ok(domain)
    }

    pub fn validate(&self, schema: &ModelSchema) -> GlobalCalResult<()> {
        match self {
            Domain::All => Ok(()),
            Domain::Leaf(condition) => validate_condition(condition, schema),
            Domain::And(parts) => parts.iter().try_for_each(|p| p.validate(schema)),
            Domain::Or(a, b) => {
                a.validate(schema)?;
                b.validate(schema)
            }
            Domain::Not(inner) => inner.validate(schema),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Domain::All => true,
            Domain::Leaf(condition) => condition.matches(record),
            Domain::And(parts) => parts.iter().all(|p| p.matches(record)),
            Domain::Or(a, b) => a.matches(record) || b.matches(record),
            Domain::Not(inner) => !inner.matches(record),
        }
    }
}

fn invalid(reason: String) -> GlobalCalError {
    GlobalCalError::Configuration(format!("Invalid domain: {}", reason))
}

fn validate_condition(condition: &Condition, schema: &ModelSchema) -> GlobalCalResult<()> {
    if condition.field != ID_FIELD && !schema.has_field(&condition.field) {
        return Err(invalid(format!(
            "unknown field '{}' on model '{}'",
            condition.field, schema.model
        )));
    }

    let is_list = matches!(condition.value, Literal::List(_));
    match condition.op {
        Operator::In | Operator::NotIn if !is_list => Err(invalid(format!(
            "operator 'in' on '{}' needs a list",
            condition.field
        ))),
        Operator::In | Operator::NotIn => Ok(()),
        _ if is_list => Err(invalid(format!(
            "a list value on '{}' needs operator 'in' or 'not in'",
            condition.field
        ))),
        _ => Ok(()),
    }
}

// EVALUATION:

impl Condition {
    pub fn matches(&self, record: &Record) -> bool {
        let id_value;
        let value = if self.field == ID_FIELD {
            id_value = FieldValue::Integer(record.id);
            &id_value
        } else {
            record.get(&self.field).unwrap_or(&NULL)
        };

        match self.op {
            Operator::Eq => equals(value, &self.value),
            Operator::Ne => !equals(value, &self.value),
            Operator::In => in_list(value, &self.value),
            Operator::NotIn => !in_list(value, &self.value),
            Operator::Lt => compare(value, &self.value) == Some(Ordering::Less),
            Operator::Le => matches!(
                compare(value, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Operator::Gt => compare(value, &self.value) == Some(Ordering::Greater),
            Operator::Ge => matches!(
                compare(value, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Like => like(value, &self.value, false),
            Operator::NotLike => !like(value, &self.value, false),
            Operator::ILike => like(value, &self.value, true),
            Operator::NotILike => !like(value, &self.value, true),
        }
    }
}

fn in_list(value: &FieldValue, literal: &Literal) -> bool {
    match literal {
        Literal::List(items) => items.iter().any(|item| equals(value, item)),
        _ => false,
    }
}

fn equals(value: &FieldValue, literal: &Literal) -> bool {
    match literal {
        Literal::Null | Literal::Bool(false) => !value.is_set(),
        Literal::Bool(true) => value.is_set(),
        Literal::Int(i) => match value {
            FieldValue::Integer(v) => v == i,
            FieldValue::Float(v) => *v == *i as f64,
            FieldValue::Ref(r) => r.id == *i,
            FieldValue::Refs(refs) => refs.iter().any(|r| r.id == *i),
            _ => false,
        },
        Literal::Float(f) => match value {
            FieldValue::Integer(v) => *v as f64 == *f,
            FieldValue::Float(v) => v == f,
            _ => false,
        },
        Literal::Str(s) => match value {
            FieldValue::Text(t) => t == s,
            FieldValue::Ref(r) => r.name == *s,
            FieldValue::Refs(refs) => refs.iter().any(|r| r.name == *s),
            FieldValue::Date(_) | FieldValue::Datetime(_) => {
                compare(value, literal) == Some(Ordering::Equal)
            }
            _ => false,
        },
        Literal::List(_) => false,
    }
}

fn compare(value: &FieldValue, literal: &Literal) -> Option<Ordering> {
    match (value, literal) {
        (FieldValue::Integer(v), Literal::Int(i)) => Some(v.cmp(i)),
        (FieldValue::Integer(v), Literal::Float(f)) => (*v as f64).partial_cmp(f),
        (FieldValue::Float(v), Literal::Int(i)) => v.partial_cmp(&(*i as f64)),
        (FieldValue::Float(v), Literal::Float(f)) => v.partial_cmp(f),
        (FieldValue::Ref(r), Literal::Int(i)) => Some(r.id.cmp(i)),
        (FieldValue::Text(t), Literal::Str(s)) => Some(t.as_str().cmp(s.as_str())),
        (FieldValue::Date(d), Literal::Str(s)) => parse_date_text(s)
            .or_else(|| parse_datetime_text(s).map(|dt| dt.date()))
            .map(|other| d.cmp(&other)),
        (FieldValue::Datetime(dt), Literal::Str(s)) => parse_datetime_text(s)
            .or_else(|| parse_date_text(s).and_then(|d| d.and_hms_opt(0, 0, 0)))
            .map(|other| dt.cmp(&other)),
        _ => None,
    }
}

/// Substring match (`like` wraps its pattern in `%...%`).
fn like(value: &FieldValue, literal: &Literal, case_insensitive: bool) -> bool {
    let Literal::Str(pattern) = literal else {
        return false;
    };

    let contains = |haystack: &str| {
        if case_insensitive {
            haystack.to_lowercase().contains(&pattern.to_lowercase())
        } else {
            haystack.contains(pattern.as_str())
        }
    };

    match value {
        FieldValue::Text(t) => contains(t),
        FieldValue::Ref(r) => contains(&r.name),
        FieldValue::Refs(refs) => refs.iter().any(|r| contains(&r.name)),
        FieldValue::Integer(v) => contains(&v.to_string()),
        FieldValue::Float(v) => contains(&v.to_string()),
        FieldValue::Date(d) => contains(&d.format("%Y-%m-%d").to_string()),
        FieldValue::Datetime(dt) => contains(&dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        FieldValue::Null | FieldValue::Bool(_) => false,
    }
}

// PARSING:

#[derive(Debug)]
enum Node {
    Scalar(Literal),
    List(Vec<Node>),
}

impl Node {
    fn into_literal(self) -> Literal {
        match self {
            Node::Scalar(lit) => lit,
            Node::List(items) => Literal::List(items.into_iter().map(Node::into_literal).collect()),
        }
    }
}

enum Term {
    And,
    Or,
    Not,
    Leaf(Condition),
}

impl Term {
    fn from_node(node: Node) -> Result<Self, String> {
        match node {
            Node::Scalar(Literal::Str(op)) => match op.as_str() {
                "&" => Ok(Term::And),
                "|" => Ok(Term::Or),
                "!" => Ok(Term::Not),
                other => Err(format!("unknown domain operator '{}'", other)),
            },
            Node::List(items) if items.len() == 3 => {
                let mut items = items.into_iter();
                let (Some(field), Some(op), Some(value)) = (items.next(), items.next(), items.next())
                else {
                    return Err("malformed condition".to_string());
                };
                let Node::Scalar(Literal::Str(field)) = field else {
                    return Err("condition field must be a string".to_string());
                };
                let Node::Scalar(Literal::Str(op)) = op else {
                    return Err(format!("operator of '{}' must be a string", field));
                };
                let op = Operator::parse(op.trim())
                    .ok_or_else(|| format!("unknown operator '{}' on '{}'", op, field))?;
                Ok(Term::Leaf(Condition {
                    field,
                    op,
                    value: value.into_literal(),
                }))
            }
            Node::List(items) => Err(format!(
                "a condition needs 3 elements, got {}",
                items.len()
            )),
            Node::Scalar(other) => Err(format!("unexpected term {:?}", other)),
        }
    }
}

fn build(terms: &[Term], pos: &mut usize, depth: usize) -> Result<Domain, String> {
    if depth > MAX_DEPTH {
        return Err("domain nested too deeply".to_string());
    }

    let term = terms
        .get(*pos)
        .ok_or_else(|| "operator is missing an operand".to_string())?;
    *pos += 1;

    match term {
        Term::And => {
            let a = build(terms, pos, depth + 1)?;
            let b = build(terms, pos, depth + 1)?;
            Ok(Domain::And(vec![a, b]))
        }
        Term::Or => {
            let a = build(terms, pos, depth + 1)?;
            let b = build(terms, pos, depth + 1)?;
            Ok(Domain::Or(Box::new(a), Box::new(b)))
        }
        Term::Not => Ok(Domain::Not(Box::new(build(terms, pos, depth + 1)?))),
        Term::Leaf(condition) => Ok(Domain::Leaf(condition.clone())),
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            chars: text.chars().peekable(),
        }
    }

    fn parse_document(&mut self) -> Result<Node, String> {
        let node = self.parse_node(0)?;
        self.skip_whitespace();
        match self.chars.next() {
            None => Ok(node),
            Some(c) => Err(format!("unexpected '{}' after the domain", c)),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn parse_node(&mut self, depth: usize) -> Result<Node, String> {
        if depth > MAX_DEPTH {
            return Err("domain nested too deeply".to_string());
        }

        self.skip_whitespace();
        match self.chars.peek().copied() {
            Some('[') => self.parse_list('[', ']', depth),
            Some('(') => self.parse_list('(', ')', depth),
            Some(q @ ('\'' | '"')) => {
                self.chars.next();
                self.parse_string(q).map(|s| Node::Scalar(Literal::Str(s)))
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number().map(Node::Scalar),
            Some(c) if c.is_alphabetic() => self.parse_keyword().map(Node::Scalar),
            Some(c) => Err(format!("unexpected '{}'", c)),
            None => Err("unexpected end of domain".to_string()),
        }
    }

    fn parse_list(&mut self, open: char, close: char, depth: usize) -> Result<Node, String> {
        self.chars.next(); // open
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.chars.peek() == Some(&close) {
                self.chars.next();
                return Ok(Node::List(items));
            }

            items.push(self.parse_node(depth + 1)?);

            self.skip_whitespace();
            match self.chars.next() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(Node::List(items)),
                Some(c) => return Err(format!("expected ',' or '{}', found '{}'", close, c)),
                None => return Err(format!("unclosed '{}'", open)),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String, String> {
        let mut out = String::new();
        while let Some(c) = self.chars.next() {
            match c {
                '\\' => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => break,
                },
                c if c == quote => return Ok(out),
                c => out.push(c),
            }
        }
        Err("unterminated string".to_string())
    }

    fn parse_number(&mut self) -> Result<Literal, String> {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        if let Ok(i) = text.parse::<i64>() {
            return Ok(Literal::Int(i));
        }
        text.parse::<f64>()
            .map(Literal::Float)
            .map_err(|_| format!("invalid number '{}'", text))
    }

    fn parse_keyword(&mut self) -> Result<Literal, String> {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        match word.as_str() {
            "True" | "true" => Ok(Literal::Bool(true)),
            "False" | "false" => Ok(Literal::Bool(false)),
            "None" | "null" => Ok(Literal::Null),
            other => Err(format!("unknown name '{}'", other)),
        }
    }
}
