//! The time spec grammar -- text into a tree of function calls and joiners.
//!
//! ```text
//! expr  := term (('&' | '|') term)*
//! term  := call | '(' expr ')'
//! call  := name '(' (arg (',' arg)*)? ')'
//! arg   := name ':' value
//! value := call | bare-token
//! ```
//!
//! `&` and `|` share one precedence level and associate to the left, so
//! `a | b & c` is `(a | b) & c`. Whitespace is insignificant everywhere,
//! including inside bare tokens. A bare token runs up to the next `,` or `)`,
//! which lets ISO-8601 literals such as `10:30:00` through unquoted.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Result, TimepieceError};
use crate::sections::Section;

/// A byte range of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// How two sub-trees are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Joiner {
    And,
    Or,
}

impl fmt::Display for Joiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Joiner::And => f.write_str("&"),
            Joiner::Or => f.write_str("|"),
        }
    }
}

/// Arguments of one call, keyed by argument name.
pub type Args = BTreeMap<String, ArgValue>;

/// The value of a single argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ArgValue {
    Str(String),
    Int(i64),
    Bool(bool),
    /// A `;` separated token such as `mon;tues`.
    List(Vec<String>),
    /// A nested section call such as `amount(num: 1, size: minute)`.
    Call { name: String, args: Args },
    /// An already normalised section, used when building specs in code.
    Spec(Box<Section>),
}

impl ArgValue {
    /// Classify a bare token the way the grammar reads it.
    pub fn from_token(token: &str) -> Self {
        if token.contains(';') {
            return ArgValue::List(token.split(';').map(|s| s.trim().to_string()).collect());
        }
        match token {
            "true" => return ArgValue::Bool(true),
            "false" => return ArgValue::Bool(false),
            _ => {}
        }
        match token.parse::<i64>() {
            Ok(num) => ArgValue::Int(num),
            Err(_) => ArgValue::Str(token.to_string()),
        }
    }

    /// A section call with no arguments.
    pub fn call(name: impl Into<String>) -> Self {
        ArgValue::Call {
            name: name.into(),
            args: Args::new(),
        }
    }
}

impl From<Section> for ArgValue {
    fn from(section: Section) -> Self {
        ArgValue::Spec(Box::new(section))
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Str(s) => f.write_str(s),
            ArgValue::Int(n) => write!(f, "{n}"),
            ArgValue::Bool(b) => write!(f, "{b}"),
            ArgValue::List(items) => f.write_str(&items.join(";")),
            ArgValue::Call { name, args } => write_call(f, name, args),
            ArgValue::Spec(section) => write!(f, "{section}"),
        }
    }
}

/// A parsed time spec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ParseNode {
    Call {
        name: String,
        args: Args,
        span: Span,
    },
    Join {
        joiner: Joiner,
        left: Box<ParseNode>,
        right: Box<ParseNode>,
    },
}

impl ParseNode {
    pub fn span(&self) -> Span {
        match self {
            ParseNode::Call { span, .. } => *span,
            ParseNode::Join { left, right, .. } => {
                Span::new(left.span().start, right.span().end)
            }
        }
    }
}

impl fmt::Display for ParseNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseNode::Call { name, args, .. } => write_call(f, name, args),
            ParseNode::Join {
                joiner,
                left,
                right,
            } => write!(f, "({left} {joiner} {right})"),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, args: &Args) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, (key, value)) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{key}: {value}")?;
    }
    f.write_str(")")
}

/// Parse time spec text into a tree.
///
/// # Errors
/// Returns `TimepieceError::Syntax` with the byte offset of the first problem.
pub fn parse(text: &str) -> Result<ParseNode> {
    let mut parser = Parser::new(text);
    let node = parser.parse_expr()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(parser.error("'&', '|' or end of input"));
    }
    Ok(node)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Parser { src, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, expected: &str) -> TimepieceError {
        let found = match self.src[self.pos..].chars().next() {
            Some(c) => format!("'{c}'"),
            None => "end of input".to_string(),
        };
        TimepieceError::Syntax {
            position: self.pos,
            expected: expected.to_string(),
            found,
        }
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        self.skip_whitespace();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("'{}'", byte as char)))
        }
    }

    fn parse_expr(&mut self) -> Result<ParseNode> {
        let mut node = self.parse_term()?;
        loop {
            self.skip_whitespace();
            let joiner = match self.peek() {
                Some(b'&') => Joiner::And,
                Some(b'|') => Joiner::Or,
                _ => return Ok(node),
            };
            self.pos += 1;
            let right = self.parse_term()?;
            node = ParseNode::Join {
                joiner,
                left: Box::new(node),
                right: Box::new(right),
            };
        }
    }

    fn parse_term(&mut self) -> Result<ParseNode> {
        self.skip_whitespace();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            let inner = self.parse_expr()?;
            self.expect(b')')?;
            return Ok(inner);
        }
        let start = self.pos;
        let (name, args) = self.parse_call()?;
        Ok(ParseNode::Call {
            name,
            args,
            span: Span::new(start, self.pos),
        })
    }

    fn parse_name(&mut self) -> Result<String> {
        self.skip_whitespace();
        let start = self.pos;
        match self.peek() {
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => self.pos += 1,
            _ => return Err(self.error("a name")),
        }
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_call(&mut self) -> Result<(String, Args)> {
        let name = self.parse_name()?;
        self.expect(b'(')?;

        let mut args = Args::new();
        self.skip_whitespace();
        if self.peek() == Some(b')') {
            self.pos += 1;
            return Ok((name, args));
        }

        loop {
            let arg_start = self.pos;
            let key = self.parse_name()?;
            self.expect(b':')?;
            let value = self.parse_value()?;
            if args.insert(key.clone(), value).is_some() {
                return Err(TimepieceError::Syntax {
                    position: arg_start,
                    expected: "each argument name once".to_string(),
                    found: format!("a second '{key}'"),
                });
            }

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok((name, args));
                }
                _ => return Err(self.error("',' or ')'")),
            }
        }
    }

    fn parse_value(&mut self) -> Result<ArgValue> {
        self.skip_whitespace();
        if self.looks_like_call() {
            let (name, args) = self.parse_call()?;
            return Ok(ArgValue::Call { name, args });
        }

        let start = self.pos;
        while let Some(b) = self.peek() {
            match b {
                b',' | b')' => break,
                b'(' | b'&' | b'|' => return Err(self.error("',' or ')'")),
                _ => self.pos += 1,
            }
        }
        let token: String = self.src[start..self.pos]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if token.is_empty() {
            self.pos = start;
            return Err(self.error("a value"));
        }
        Ok(ArgValue::from_token(&token))
    }

    /// A name followed by `(` starts a nested call rather than a bare token.
    fn looks_like_call(&self) -> bool {
        let bytes = self.src.as_bytes();
        let mut i = self.pos;
        match bytes.get(i) {
            Some(b) if b.is_ascii_alphabetic() || *b == b'_' => i += 1,
            _ => return false,
        }
        while bytes
            .get(i)
            .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
        {
            i += 1;
        }
        while bytes.get(i).is_some_and(|b| b.is_ascii_whitespace()) {
            i += 1;
        }
        bytes.get(i) == Some(&b'(')
    }
}
