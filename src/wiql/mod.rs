//! WIQL query construction.
//!
//! Queries are built as a small AST and rendered on demand. Values are never
//! spliced into a template string: every literal is a typed [`Literal`] that
//! is escaped when the query is rendered, so an assignee name such as
//! `O'Brien' OR 1=1 --` stays a single string literal.

mod parser;

use std::fmt;

use thiserror::Error;

pub use parser::parse;

/// Reference names of the work item fields used by the sweep.
pub mod fields {
    /// The work item identifier.
    pub const ID: &str = "System.Id";
    /// The user the work item is assigned to.
    pub const ASSIGNED_TO: &str = "System.AssignedTo";
    /// The workflow state of the work item.
    pub const STATE: &str = "System.State";
}

/// The state value the sweep moves work items into.
pub const CLOSED_STATE: &str = "Closed";

/// Errors produced while parsing or building WIQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WiqlError {
    /// A token appeared where something else was expected.
    #[error("unexpected '{found}' at offset {offset}, expected {expected}")]
    UnexpectedToken {
        offset: usize,
        found: String,
        expected: &'static str,
    },

    /// The input ended early.
    #[error("unexpected end of query, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    /// A string literal was not closed.
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedLiteral { offset: usize },

    /// A bracketed field reference was not closed.
    #[error("unterminated field reference starting at offset {offset}")]
    UnterminatedField { offset: usize },

    /// A character that is not part of the supported grammar.
    #[error("invalid character '{ch}' at offset {offset}")]
    InvalidCharacter { offset: usize, ch: char },

    /// An integer literal outside the 64-bit range.
    #[error("integer literal at offset {offset} is out of range")]
    InvalidNumber { offset: usize },

    /// Only `workitems` can be queried.
    #[error("unsupported source '{source_name}', only 'workitems' is supported")]
    UnsupportedSource { source_name: String },

    /// A field reference name that cannot be rendered.
    #[error("invalid field name '{0}'")]
    InvalidField(String),
}

/// A bracketed field reference, e.g. `[System.State]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field(String);

impl Field {
    /// Create a field reference.
    ///
    /// # Errors
    ///
    /// Returns [`WiqlError::InvalidField`] if the name is empty or contains
    /// a bracket.
    pub fn new(name: impl Into<String>) -> Result<Self, WiqlError> {
        let name = name.into();
        if name.trim().is_empty() || name.contains(['[', ']']) {
            return Err(WiqlError::InvalidField(name));
        }
        Ok(Self(name))
    }

    /// Field reference for one of the built-in [`fields`] constants.
    fn known(name: &'static str) -> Self {
        Self(name.to_string())
    }

    /// The reference name without brackets.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

/// A literal value on the right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// A string, rendered single-quoted with embedded quotes doubled.
    Str(String),
    /// An integer.
    Int(i64),
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Int(n) => write!(f, "{}", n),
        }
    }
}

/// A comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Equals,
    /// `<>`
    NotEquals,
    /// `CONTAINS`
    Contains,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Equals => "=",
            Operator::NotEquals => "<>",
            Operator::Contains => "CONTAINS",
        };
        f.write_str(s)
    }
}

/// A single `[Field] <op> <literal>` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: Field,
    pub op: Operator,
    pub value: Literal,
}

impl Condition {
    /// Create a condition.
    pub fn new(field: Field, op: Operator, value: impl Into<Literal>) -> Self {
        Self {
            field,
            op,
            value: value.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.op, self.value)
    }
}

/// A `SELECT ... FROM workitems [WHERE ... AND ...]` query.
///
/// Rendering goes through [`fmt::Display`]; [`parse`] accepts everything
/// this type renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WiqlQuery {
    fields: Vec<Field>,
    conditions: Vec<Condition>,
}

impl WiqlQuery {
    /// Start a query selecting the given fields.
    pub fn select(fields: Vec<Field>) -> Self {
        Self {
            fields,
            conditions: Vec::new(),
        }
    }

    /// Add a condition, joined to the previous ones with `AND`.
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Work items whose assignee contains `assignee` and that are not closed.
    ///
    /// The name is carried as a literal value and may contain anything.
    pub fn assigned_and_open(assignee: &str) -> Self {
        Self::select(vec![Field::known(fields::ID)])
            .and(Condition::new(
                Field::known(fields::ASSIGNED_TO),
                Operator::Contains,
                assignee,
            ))
            .and(Condition::new(
                Field::known(fields::STATE),
                Operator::NotEquals,
                CLOSED_STATE,
            ))
    }

    /// Selected fields.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Conditions, in `AND` order.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

impl fmt::Display for WiqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", field)?;
        }
        f.write_str(" FROM workitems")?;
        for (i, condition) in self.conditions.iter().enumerate() {
            let joiner = if i == 0 { " WHERE " } else { " AND " };
            write!(f, "{}{}", joiner, condition)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_and_open_renders_expected_filter() {
        let query = WiqlQuery::assigned_and_open("stanly");
        assert_eq!(
            query.to_string(),
            "SELECT [System.Id] FROM workitems WHERE [System.AssignedTo] CONTAINS 'stanly' \
             AND [System.State] <> 'Closed'"
        );
    }

    #[test]
    fn test_quotes_in_name_are_doubled() {
        let query = WiqlQuery::assigned_and_open("O'Brien' OR [System.Id] = 1 --");
        let rendered = query.to_string();
        assert!(rendered.contains("CONTAINS 'O''Brien'' OR [System.Id] = 1 --'"));
    }

    #[test]
    fn test_field_rejects_brackets() {
        assert!(Field::new("System]Id").is_err());
        assert!(Field::new("").is_err());
        assert_eq!(Field::new("System.Title").unwrap().name(), "System.Title");
    }

    #[test]
    fn test_query_without_conditions() {
        let query = WiqlQuery::select(vec![Field::new("System.Id").unwrap()]);
        assert_eq!(query.to_string(), "SELECT [System.Id] FROM workitems");
    }

    #[test]
    fn test_integer_literal() {
        let condition = Condition::new(Field::new("System.Id").unwrap(), Operator::Equals, 42i64);
        assert_eq!(condition.to_string(), "[System.Id] = 42");
    }
}
