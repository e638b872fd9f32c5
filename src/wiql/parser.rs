//! Parser for the WIQL subset rendered by [`WiqlQuery`].
//!
//! Grammar:
//!
//! ```text
//! query     := SELECT field ("," field)* FROM workitems [WHERE cond (AND cond)*]
//! cond      := field op literal
//! op        := "=" | "<>" | CONTAINS
//! literal   := 'string' | integer
//! ```
//!
//! Keywords are case-insensitive.

use super::{Condition, Field, Literal, Operator, WiqlError, WiqlQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Field(String),
    Str(String),
    Int(i64),
    Equals,
    NotEquals,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Word(w) => w.clone(),
            Token::Field(f) => format!("[{}]", f),
            Token::Str(s) => format!("'{}'", s),
            Token::Int(n) => n.to_string(),
            Token::Equals => "=".to_string(),
            Token::NotEquals => "<>".to_string(),
            Token::Comma => ",".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, WiqlError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            ',' => {
                chars.next();
                tokens.push((offset, Token::Comma));
            }
            '=' => {
                chars.next();
                tokens.push((offset, Token::Equals));
            }
            '<' => {
                chars.next();
                match chars.next() {
                    Some((_, '>')) => tokens.push((offset, Token::NotEquals)),
                    _ => return Err(WiqlError::InvalidCharacter { offset, ch }),
                }
            }
            '[' => {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some((_, ']')) => break,
                        Some((_, c)) => name.push(c),
                        None => return Err(WiqlError::UnterminatedField { offset }),
                    }
                }
                tokens.push((offset, Token::Field(name)));
            }
            '\'' => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\'')) => {
                            // '' is an escaped quote
                            if matches!(chars.peek(), Some((_, '\''))) {
                                chars.next();
                                value.push('\'');
                            } else {
                                break;
                            }
                        }
                        Some((_, c)) => value.push(c),
                        None => return Err(WiqlError::UnterminatedLiteral { offset }),
                    }
                }
                tokens.push((offset, Token::Str(value)));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut digits = String::new();
                digits.push(c);
                chars.next();
                while let Some(&(_, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    digits.push(d);
                    chars.next();
                }
                if digits == "-" {
                    return Err(WiqlError::InvalidCharacter { offset, ch: c });
                }
                let n = digits
                    .parse::<i64>()
                    .map_err(|_| WiqlError::InvalidNumber { offset })?;
                tokens.push((offset, Token::Int(n)));
            }
            c if c.is_alphabetic() => {
                let mut word = String::new();
                while let Some(&(_, w)) = chars.peek() {
                    if !(w.is_alphanumeric() || w == '_') {
                        break;
                    }
                    word.push(w);
                    chars.next();
                }
                tokens.push((offset, Token::Word(word)));
            }
            _ => return Err(WiqlError::InvalidCharacter { offset, ch }),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser {
    fn next(&mut self, expected: &'static str) -> Result<(usize, Token), WiqlError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(WiqlError::UnexpectedEnd { expected })?;
        self.pos += 1;
        Ok(token)
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(
            self.tokens.get(self.pos),
            Some((_, Token::Word(w))) if w.eq_ignore_ascii_case(keyword)
        )
    }

    fn expect_keyword(&mut self, keyword: &'static str) -> Result<(), WiqlError> {
        let (offset, token) = self.next(keyword)?;
        match token {
            Token::Word(w) if w.eq_ignore_ascii_case(keyword) => Ok(()),
            other => Err(WiqlError::UnexpectedToken {
                offset,
                found: other.describe(),
                expected: keyword,
            }),
        }
    }

    fn field(&mut self) -> Result<Field, WiqlError> {
        let (offset, token) = self.next("a field reference")?;
        match token {
            Token::Field(name) => Field::new(name),
            other => Err(WiqlError::UnexpectedToken {
                offset,
                found: other.describe(),
                expected: "a field reference",
            }),
        }
    }

    fn operator(&mut self) -> Result<Operator, WiqlError> {
        let (offset, token) = self.next("an operator")?;
        match token {
            Token::Equals => Ok(Operator::Equals),
            Token::NotEquals => Ok(Operator::NotEquals),
            Token::Word(w) if w.eq_ignore_ascii_case("CONTAINS") => Ok(Operator::Contains),
            other => Err(WiqlError::UnexpectedToken {
                offset,
                found: other.describe(),
                expected: "an operator",
            }),
        }
    }

    fn literal(&mut self) -> Result<Literal, WiqlError> {
        let (offset, token) = self.next("a literal")?;
        match token {
            Token::Str(s) => Ok(Literal::Str(s)),
            Token::Int(n) => Ok(Literal::Int(n)),
            other => Err(WiqlError::UnexpectedToken {
                offset,
                found: other.describe(),
                expected: "a literal",
            }),
        }
    }

    fn condition(&mut self) -> Result<Condition, WiqlError> {
        let field = self.field()?;
        let op = self.operator()?;
        let value = self.literal()?;
        Ok(Condition { field, op, value })
    }

    fn query(&mut self) -> Result<WiqlQuery, WiqlError> {
        self.expect_keyword("SELECT")?;

        let mut fields = vec![self.field()?];
        while matches!(self.tokens.get(self.pos), Some((_, Token::Comma))) {
            self.pos += 1;
            fields.push(self.field()?);
        }

        self.expect_keyword("FROM")?;
        let (offset, token) = self.next("workitems")?;
        match token {
            Token::Word(w) if w.eq_ignore_ascii_case("workitems") => {}
            Token::Word(w) => return Err(WiqlError::UnsupportedSource { source_name: w }),
            other => {
                return Err(WiqlError::UnexpectedToken {
                    offset,
                    found: other.describe(),
                    expected: "workitems",
                })
            }
        }

        let mut query = WiqlQuery::select(fields);
        if self.peek_keyword("WHERE") {
            self.pos += 1;
            query = query.and(self.condition()?);
            while self.peek_keyword("AND") {
                self.pos += 1;
                query = query.and(self.condition()?);
            }
        }

        if let Some((offset, token)) = self.tokens.get(self.pos) {
            return Err(WiqlError::UnexpectedToken {
                offset: *offset,
                found: token.describe(),
                expected: "end of query",
            });
        }

        Ok(query)
    }
}

/// Parse a WIQL query string.
///
/// # Errors
///
/// Returns a [`WiqlError`] pointing at the first token that does not fit the
/// supported grammar.
pub fn parse(input: &str) -> Result<WiqlQuery, WiqlError> {
    let tokens = tokenize(input)?;
    Parser { tokens, pos: 0 }.query()
}
