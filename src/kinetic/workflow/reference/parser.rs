//! Recursive-descent parser for input assignments
//!
//! Grammar:
//! ```text
//! reference  := "${" head "}"
//! head       := "inputs" "." ident path | ident ".output" path
//! path       := ( "." key | "." digits | "[" digits "]" )*
//! ```

use super::ast::{InputAssignment, PathSegment};
use crate::adk::error::WorkflowError;
use serde_json::Value;

const INPUTS_PREFIX: &str = "inputs";
const OUTPUT_SECTION: &str = "output";

/// Parse a raw string into an assignment.
///
/// Strings that start with `${` must be well-formed references; anything else
/// is a literal.
pub fn parse(input: &str) -> Result<InputAssignment, WorkflowError> {
    let trimmed = input.trim();
    if !trimmed.starts_with("${") {
        return Ok(InputAssignment::Literal(Value::String(input.to_string())));
    }
    Parser::new(trimmed).parse_reference()
}

/// Parse a deserialized YAML/JSON value into an assignment
pub fn parse_value(value: &Value) -> Result<InputAssignment, WorkflowError> {
    match value {
        Value::String(s) => parse(s),
        other => Ok(InputAssignment::Literal(other.clone())),
    }
}

struct Parser<'a> {
    expression: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(expression: &'a str) -> Self {
        Self {
            expression,
            chars: expression.chars().collect(),
            pos: 0,
        }
    }

    fn parse_reference(mut self) -> Result<InputAssignment, WorkflowError> {
        self.expect('$')?;
        self.expect('{')?;

        let head = self.parse_identifier()?;
        let assignment = if head == INPUTS_PREFIX {
            self.expect('.')?;
            let name = self.parse_identifier()?;
            let path = self.parse_path()?;
            InputAssignment::FlowInput { name, path }
        } else {
            if self.peek() != Some('.') {
                return Err(self.error(format!("expected '.{}' after '{}'", OUTPUT_SECTION, head)));
            }
            self.advance();
            let section = self.parse_identifier()?;
            if section != OUTPUT_SECTION {
                return Err(self.error(format!(
                    "unsupported section '{}', only '{}' can be referenced",
                    section, OUTPUT_SECTION
                )));
            }
            let path = self.parse_path()?;
            InputAssignment::NodeOutput { node: head, path }
        };

        self.expect('}')?;
        if self.pos < self.chars.len() {
            return Err(self.error(format!(
                "unexpected trailing characters at position {}",
                self.pos
            )));
        }

        Ok(assignment)
    }

    fn parse_path(&mut self) -> Result<Vec<PathSegment>, WorkflowError> {
        let mut path = Vec::new();
        loop {
            match self.peek() {
                Some('.') => {
                    self.advance();
                    if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                        path.push(PathSegment::Index(self.parse_number()?));
                    } else {
                        path.push(PathSegment::Key(self.parse_key()?));
                    }
                }
                Some('[') => {
                    self.advance();
                    path.push(PathSegment::Index(self.parse_number()?));
                    self.expect(']')?;
                }
                _ => break,
            }
        }
        Ok(path)
    }

    fn parse_identifier(&mut self) -> Result<String, WorkflowError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.advance(),
            _ => return Err(self.error(format!("expected identifier at position {}", start))),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            self.advance();
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_key(&mut self) -> Result<String, WorkflowError> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !matches!(c, '.' | '[' | ']' | '{' | '}' | '$') && !c.is_whitespace())
        {
            self.advance();
        }
        if self.pos == start {
            return Err(self.error(format!("empty path segment at position {}", start)));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_number(&mut self) -> Result<usize, WorkflowError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<usize>()
            .map_err(|_| self.error(format!("expected array index at position {}", start)))
    }

    fn expect(&mut self, expected: char) -> Result<(), WorkflowError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(self.error(format!(
                "expected '{}' at position {}, found '{}'",
                expected, self.pos, c
            ))),
            None => Err(self.error(format!("expected '{}' at end of expression", expected))),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn error(&self, reason: String) -> WorkflowError {
        WorkflowError::InvalidReference {
            expression: self.expression.to_string(),
            reason,
        }
    }
}
