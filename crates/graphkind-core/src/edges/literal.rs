//! Strict parser for code-literal edge lists.
//!
//! Accepts nested lists (`[...]`) and tuples (`(...)`) of integers and quoted
//! strings, with optional trailing commas. A bare top-level comma sequence
//! such as `(0, 1), (1, 2)` is read as an implicit tuple. A parenthesized
//! value without a comma, `(5)`, is the value itself.

use super::{Edge, EdgeFormatError, EdgeList, NodeId};

/// A parsed literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Str(String),
    Seq(Vec<Literal>),
}

impl Literal {
    fn into_node_id(self) -> Option<NodeId> {
        match self {
            Self::Int(value) => Some(NodeId::from(value)),
            Self::Str(value) => Some(NodeId::from(value)),
            Self::Seq(_) => None,
        }
    }
}

/// Parse `text` as a single literal.
///
/// # Errors
///
/// Returns [`EdgeFormatError::Literal`] describing the first syntax error.
pub fn parse(text: &str) -> Result<Literal, EdgeFormatError> {
    let mut parser = Parser::new(text);
    let literal = parser.top()?;
    parser.skip_ws();
    if let Some(c) = parser.peek() {
        return Err(parser.error(&format!("unexpected trailing {c:?}")));
    }
    Ok(literal)
}

/// Parse `text` as a literal sequence of `(source, target)` pairs.
///
/// # Errors
///
/// Fails on syntax errors and when the literal is not a sequence of
/// two-element sequences of scalars.
pub fn parse_edges(text: &str) -> Result<EdgeList, EdgeFormatError> {
    into_edges(parse(text)?)
}

/// Interpret an already-parsed literal as a sequence of pairs.
///
/// # Errors
///
/// Fails when the literal is not a sequence of two-element sequences of
/// scalars.
pub fn into_edges(literal: Literal) -> Result<EdgeList, EdgeFormatError> {
    let Literal::Seq(items) = literal else {
        return Err(EdgeFormatError::Literal(
            "expected a sequence of pairs".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let Literal::Seq(pair) = item else {
                return Err(EdgeFormatError::NotASequence { index });
            };
            let len = pair.len();
            let pair: Result<[Literal; 2], Vec<Literal>> = pair.try_into();
            let Ok([source, target]) = pair else {
                return Err(EdgeFormatError::NotAPair { index, len });
            };
            let source = source
                .into_node_id()
                .ok_or(EdgeFormatError::InvalidEndpoint { index })?;
            let target = target
                .into_node_id()
                .ok_or(EdgeFormatError::InvalidEndpoint { index })?;
            Ok(Edge { source, target })
        })
        .collect()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn error(&self, what: &str) -> EdgeFormatError {
        EdgeFormatError::Literal(format!("{what} at offset {}", self.pos))
    }

    fn top(&mut self) -> Result<Literal, EdgeFormatError> {
        self.skip_ws();
        if self.peek().is_none() {
            return Err(self.error("empty input"));
        }
        let first = self.value()?;
        self.skip_ws();
        if self.peek() != Some(',') {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.peek() == Some(',') {
            self.pos += 1;
            self.skip_ws();
            if self.peek().is_none() {
                break;
            }
            items.push(self.value()?);
            self.skip_ws();
        }
        Ok(Literal::Seq(items))
    }

    fn value(&mut self) -> Result<Literal, EdgeFormatError> {
        self.skip_ws();
        match self.peek() {
            Some('[') => self.sequence(']'),
            Some('(') => self.sequence(')'),
            Some(quote @ ('\'' | '"')) => self.string(quote),
            Some(c) if c == '-' || c == '+' || c.is_ascii_digit() => self.integer(),
            Some(c) => Err(self.error(&format!("unexpected {c:?}"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn sequence(&mut self, close: char) -> Result<Literal, EdgeFormatError> {
        self.pos += 1;
        let mut items = Vec::new();
        let mut saw_comma = false;

        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.pos += 1;
                break;
            }
            items.push(self.value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => saw_comma = true,
                Some(c) if c == close => break,
                Some(c) => return Err(self.error(&format!("expected ',' or {close:?}, found {c:?}"))),
                None => return Err(self.error(&format!("missing closing {close:?}"))),
            }
        }

        // `(x)` is a grouped value, not a one-element tuple.
        if close == ')' && items.len() == 1 && !saw_comma {
            return Ok(items.remove(0));
        }
        Ok(Literal::Seq(items))
    }

    fn string(&mut self, quote: char) -> Result<Literal, EdgeFormatError> {
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(Literal::Str(out)),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }
    }

    fn integer(&mut self) -> Result<Literal, EdgeFormatError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|_| self.error(&format!("invalid integer {digits:?}")))
    }
}
