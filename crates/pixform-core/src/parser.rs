//! Recursive-descent parser working directly over character spans.
//!
//! There is no tokenizer. Each span is split in this order:
//!
//! 1. additive operators (`+`, and `-` unless it follows another operator)
//!    outside parentheses, chained left to right; a leading `-` negates by
//!    subtracting from an implicit `0`
//! 2. otherwise multiplicative operators (`* / ^ %`, one shared level),
//!    chained left to right
//! 3. otherwise the first `(`: at the start of the span it opens a group,
//!    elsewhere it is a call of the function named before it
//! 4. otherwise the span is a leaf: a named value when it starts with a
//!    letter, a decimal literal otherwise
//!
//! A `(` left open runs to the end of its span. A `)` without a matching
//! `(` is rejected. A sign right after the `e` of a decimal literal belongs
//! to its exponent (`1e-5`).
//!
//! Nesting is bounded by [`MAX_DEPTH`]: signs, groups, calls and chained
//! operators each add a level, and the bound holds for the finished tree.

use crate::error::ParseError;
use crate::node::Node;
use crate::symbols::SymbolTable;

/// Deepest nesting a formula may reach.
pub const MAX_DEPTH: usize = 256;

/// Strip whitespace and control characters.
pub fn clean(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect()
}

fn is_operator(byte: u8) -> bool {
    matches!(byte, b'+' | b'-' | b'*' | b'/' | b'^' | b'%')
}

fn is_multiplicative(byte: u8) -> bool {
    matches!(byte, b'*' | b'/' | b'^' | b'%')
}

/// Bytes of a span that sit at parenthesis depth 0, with their index.
/// Parentheses themselves are never yielded.
struct TopLevel<'s> {
    bytes: &'s [u8],
    pos: usize,
    depth: i32,
}

impl Iterator for TopLevel<'_> {
    type Item = (usize, u8);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let index = self.pos;
            let byte = *self.bytes.get(index)?;
            self.pos += 1;
            match byte {
                b'(' => self.depth += 1,
                b')' => self.depth -= 1,
                _ if self.depth == 0 => return Some((index, byte)),
                _ => {}
            }
        }
    }
}

fn top_level(span: &str) -> TopLevel<'_> {
    TopLevel {
        bytes: span.as_bytes(),
        pos: 0,
        depth: 0,
    }
}

/// Whether the sign at `i` is the exponent sign of a decimal literal such
/// as `2.5e-3`. The mantissa must not continue an identifier.
fn is_exponent_sign(bytes: &[u8], i: usize) -> bool {
    if i < 2 || !matches!(bytes[i - 1], b'e' | b'E') {
        return false;
    }
    let mantissa = &bytes[..i - 1];
    let start = mantissa
        .iter()
        .rposition(|b| !(b.is_ascii_digit() || *b == b'.'))
        .map_or(0, |p| p + 1);
    mantissa[start..].iter().any(u8::is_ascii_digit)
        && (start == 0 || !bytes[start - 1].is_ascii_alphanumeric())
}

/// Positions of additive operators. A `-` directly after another operator
/// is a sign belonging to the operand on its right.
fn additive_positions(span: &str) -> Vec<usize> {
    let bytes = span.as_bytes();
    top_level(span)
        .filter(|&(i, b)| match b {
            b'+' => !is_exponent_sign(bytes, i),
            b'-' => (i == 0 || !is_operator(bytes[i - 1])) && !is_exponent_sign(bytes, i),
            _ => false,
        })
        .map(|(i, _)| i)
        .collect()
}

fn multiplicative_positions(span: &str) -> Vec<usize> {
    top_level(span)
        .filter(|&(_, b)| is_multiplicative(b))
        .map(|(i, _)| i)
        .collect()
}

/// Index of the `)` closing the `(` at `open`, or `None` when it runs to
/// the end of the span.
fn matching_close(span: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in span.bytes().enumerate().skip(open + 1) {
        match b {
            b'(' => depth += 1,
            b')' if depth == 0 => return Some(i),
            b')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Split a call's interior on commas outside nested parentheses.
fn split_arguments(inner: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut start = 0;
    for (i, b) in top_level(inner) {
        if b == b',' {
            args.push(&inner[start..i]);
            start = i + 1;
        }
    }
    args.push(&inner[start..]);
    args
}

/// Reject a `)` that closes nothing.
fn check_balance(text: &str) -> Result<(), ParseError> {
    let mut depth = 0usize;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(ParseError::UnmatchedParenthesis(i))?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Builds formula trees against a symbol table.
#[derive(Debug, Clone, Copy)]
pub struct Parser<'t> {
    table: &'t SymbolTable,
}

impl<'t> Parser<'t> {
    pub fn new(table: &'t SymbolTable) -> Self {
        Self { table }
    }

    /// Parse an already cleaned expression.
    ///
    /// Any failure aborts the whole parse; subtrees built before the
    /// failure are dropped with the error.
    pub fn parse(&self, cleaned: &str) -> Result<Node, ParseError> {
        check_balance(cleaned)?;
        self.parse_span(cleaned, 0)
    }

    /// Parse `span` into a node sitting `depth` levels below the root.
    fn parse_span(&self, span: &str, depth: usize) -> Result<Node, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::TooDeep { limit: MAX_DEPTH });
        }
        let Some(&first) = span.as_bytes().first() else {
            return Err(ParseError::Empty);
        };

        let additive = additive_positions(span);
        if !additive.is_empty() {
            if additive[0] == 0 && first == b'+' {
                return Err(ParseError::MissingLeftOperand('+'));
            }
            return self.parse_chain(span, &additive, depth);
        }

        let multiplicative = multiplicative_positions(span);
        if let Some(&pos) = multiplicative.first() {
            if pos == 0 {
                return Err(ParseError::MissingLeftOperand(first as char));
            }
            return self.parse_chain(span, &multiplicative, depth);
        }

        match span.find('(') {
            Some(0) => self.parse_group(span, depth),
            Some(open) => self.parse_call(span, open, depth),
            None => self.parse_leaf(span),
        }
    }

    /// Fold `a op b op c ...` left to right: `((a op b) op c) ...`.
    ///
    /// An operator at index 0 can only be a leading `-`; its left operand
    /// is an implicit zero. With `n` operators the leftmost operand ends up
    /// `n` levels below the chain's root.
    fn parse_chain(
        &self,
        span: &str,
        positions: &[usize],
        depth: usize,
    ) -> Result<Node, ParseError> {
        let bytes = span.as_bytes();
        let n = positions.len();
        if depth + n > MAX_DEPTH {
            return Err(ParseError::TooDeep { limit: MAX_DEPTH });
        }
        let mut acc = match positions[0] {
            0 => Node::Literal(0.0),
            first => self.parse_span(&span[..first], depth + n)?,
        };

        for (k, &pos) in positions.iter().enumerate() {
            let symbol = bytes[pos] as char;
            let op = self
                .table
                .operator(symbol)
                .ok_or(ParseError::UnknownOperator(symbol))?;
            let end = positions.get(k + 1).copied().unwrap_or(span.len());
            let operand = &span[pos + 1..end];
            if operand.is_empty() {
                return Err(ParseError::MissingRightOperand(symbol));
            }
            let right = self.parse_span(operand, depth + n - k)?;
            acc = Node::operator(op, acc, right);
        }

        Ok(acc)
    }

    /// Interior of the parentheses opened at `open`, rejecting text after
    /// the closing one.
    fn enclosed<'s>(&self, span: &'s str, open: usize) -> Result<&'s str, ParseError> {
        match matching_close(span, open) {
            Some(close) if close + 1 < span.len() => {
                Err(ParseError::Trailing(span[close + 1..].to_string()))
            }
            Some(close) => Ok(&span[open + 1..close]),
            None => Ok(&span[open + 1..]),
        }
    }

    fn parse_group(&self, span: &str, depth: usize) -> Result<Node, ParseError> {
        let inner = self.enclosed(span, 0)?;
        self.parse_span(inner, depth + 1)
    }

    fn parse_call(&self, span: &str, open: usize, depth: usize) -> Result<Node, ParseError> {
        let name = &span[..open];
        let func = self
            .table
            .function(name)
            .ok_or_else(|| ParseError::UnknownFunction(name.to_string()))?;

        let inner = self.enclosed(span, open)?;
        let args = if inner.is_empty() {
            Vec::new()
        } else {
            split_arguments(inner)
                .into_iter()
                .enumerate()
                .map(|(index, arg)| {
                    self.parse_span(arg, depth + 1).map_err(|source| ParseError::Argument {
                        function: func.name(),
                        index,
                        source: Box::new(source),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        if !func.arity.accepts(args.len()) {
            return Err(ParseError::Arity {
                function: func.name(),
                arity: func.arity,
                found: args.len(),
            });
        }

        Ok(Node::function(func, args))
    }

    fn parse_leaf(&self, span: &str) -> Result<Node, ParseError> {
        if span.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return self
                .table
                .value(span)
                .map(Node::Variable)
                .ok_or_else(|| ParseError::UnknownConstant(span.to_string()));
        }

        span.parse::<f64>()
            .map(Node::Literal)
            .map_err(|_| ParseError::InvalidNumber(span.to_string()))
    }
}
