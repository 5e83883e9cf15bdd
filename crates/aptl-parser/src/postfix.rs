//! Infix to postfix conversion (shunting-yard).
//!
//! A `(` directly after an operand ends up as a call: the transform emits a
//! [`TokenKind::Param`] marker where the argument list starts and a synthetic
//! `()` operator when it closes. Brackets become a synthetic `[]` operator the
//! same way.

use aptl_lexer::{RawToken, RawTokenKind, Span};

use crate::error::{ParseError, ParseErrorKind, Result};
use crate::token::{unquote, Operator, Token, TokenKind, HIGHEST_PRECEDENCE};

/// Operator stack entry. Everything except `Operator` is a barrier that
/// precedence comparisons never cross.
#[derive(Debug, Clone, Copy)]
enum Entry {
    Operator(Operator, Span),
    Group(Span),
    Call(Span),
    Bracket(Span),
}

#[derive(Debug, Default)]
struct Transformer {
    output: Vec<Token>,
    stack: Vec<Entry>,
    pos: usize,
    after_operand: bool,
}

/// Convert raw tokens of one expression into postfix order.
pub fn to_postfix(tokens: &[RawToken]) -> Result<Vec<Token>> {
    let mut transformer = Transformer::default();
    for token in tokens {
        transformer.push(token)?;
    }
    transformer.finish()
}

impl Transformer {
    fn push(&mut self, raw: &RawToken) -> Result<()> {
        let span = Span::at(self.pos, raw.len());
        self.pos += raw.len();

        match raw.kind {
            RawTokenKind::Space => {}
            RawTokenKind::Number => {
                let value: f64 = raw.text.parse().map_err(|_| {
                    ParseError::new(ParseErrorKind::InvalidToken, span, raw.text.as_str())
                })?;
                self.operand(Token::new(TokenKind::Number(value), raw.text.as_str(), span));
            }
            RawTokenKind::String => {
                let value = unquote(&raw.text);
                self.operand(Token::new(TokenKind::String(value), raw.text.as_str(), span));
            }
            RawTokenKind::Identifier => {
                let name = raw.text.clone();
                self.operand(Token::new(TokenKind::Identifier(name), raw.text.as_str(), span));
            }
            RawTokenKind::Operator => {
                let op = Operator::from_symbol(&raw.text).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidToken, span, raw.text.as_str())
                })?;
                self.flush(op.precedence());
                self.stack.push(Entry::Operator(op, span));
                self.after_operand = false;
            }
            RawTokenKind::Paren if raw.text == "(" => {
                if self.after_operand {
                    self.flush(HIGHEST_PRECEDENCE);
                    self.output.push(Token::new(TokenKind::Param, "(", span));
                    self.stack.push(Entry::Call(span));
                } else {
                    self.stack.push(Entry::Group(span));
                }
                self.after_operand = false;
            }
            RawTokenKind::Paren => {
                self.close_paren(span)?;
                self.after_operand = true;
            }
            RawTokenKind::Indexor if raw.text == "[" => {
                self.flush(HIGHEST_PRECEDENCE);
                self.stack.push(Entry::Bracket(span));
                self.after_operand = false;
            }
            RawTokenKind::Indexor => {
                self.close_bracket(span)?;
                self.after_operand = true;
            }
            RawTokenKind::Delimiter => {
                self.delimiter(span, &raw.text)?;
                self.after_operand = false;
            }
        }
        Ok(())
    }

    fn operand(&mut self, token: Token) {
        self.output.push(token);
        self.after_operand = true;
    }

    /// Pop operators binding at least as tightly as `min` into the output.
    fn flush(&mut self, min: u8) {
        while let Some(Entry::Operator(op, span)) = self.stack.last().copied() {
            if op.precedence() < min {
                break;
            }
            self.stack.pop();
            self.output.push(Token::operator(op, span));
        }
    }

    fn close_paren(&mut self, close: Span) -> Result<()> {
        loop {
            match self.stack.pop() {
                Some(Entry::Operator(op, span)) => self.output.push(Token::operator(op, span)),
                Some(Entry::Group(_)) => return Ok(()),
                Some(Entry::Call(open)) => {
                    self.output
                        .push(Token::operator(Operator::Call, open.join(close)));
                    return Ok(());
                }
                Some(Entry::Bracket(_)) | None => {
                    return Err(ParseError::new(ParseErrorKind::MissingOpenParen, close, ")"));
                }
            }
        }
    }

    fn close_bracket(&mut self, close: Span) -> Result<()> {
        loop {
            match self.stack.pop() {
                Some(Entry::Operator(op, span)) => self.output.push(Token::operator(op, span)),
                Some(Entry::Bracket(open)) => {
                    self.output
                        .push(Token::operator(Operator::Index, open.join(close)));
                    return Ok(());
                }
                Some(Entry::Group(_)) | Some(Entry::Call(_)) | None => {
                    return Err(ParseError::new(
                        ParseErrorKind::MissingOpenIndexor,
                        close,
                        "]",
                    ));
                }
            }
        }
    }

    /// A comma separates call arguments and is rejected anywhere else.
    fn delimiter(&mut self, span: Span, text: &str) -> Result<()> {
        let region = self
            .stack
            .iter()
            .rev()
            .find(|entry| !matches!(entry, Entry::Operator(..)));
        match region {
            Some(Entry::Call(_)) => {
                self.flush(0);
                Ok(())
            }
            _ => Err(ParseError::new(
                ParseErrorKind::MultipleExpression,
                span,
                text,
            )),
        }
    }

    fn finish(mut self) -> Result<Vec<Token>> {
        while let Some(entry) = self.stack.pop() {
            match entry {
                Entry::Operator(op, span) => self.output.push(Token::operator(op, span)),
                Entry::Group(open) | Entry::Call(open) => {
                    return Err(ParseError::new(ParseErrorKind::MissingCloseParen, open, "("));
                }
                Entry::Bracket(open) => {
                    return Err(ParseError::new(
                        ParseErrorKind::MissingCloseIndexor,
                        open,
                        "[",
                    ));
                }
            }
        }
        Ok(self.output)
    }
}
