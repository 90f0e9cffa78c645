use super::error::{FormulaError, FormulaResult};
use super::token::{Span, Token, TokenKind};

/// Character-cursor lexer for attractor expressions.
///
/// Accepted alphabet: `+ - * / ^ ( )`, numeric literals (integer, decimal,
/// scientific) with an optional trailing `i`/`j` marking an imaginary
/// constant, and identifiers. `**` lexes as a single power token.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> FormulaResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            tokens.push(self.next_token()?);
        }
        tokens.push(Token::new(TokenKind::Eof, Span::new(self.pos, self.pos)));
        Ok(tokens)
    }

    fn next_token(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        let ch = self.advance();

        match ch {
            '+' => Ok(Token::new(TokenKind::Plus, Span::new(start, self.pos))),
            '-' => Ok(Token::new(TokenKind::Minus, Span::new(start, self.pos))),
            '*' => {
                if self.peek() == Some('*') {
                    self.advance();
                    Ok(Token::new(TokenKind::Caret, Span::new(start, self.pos)))
                } else {
                    Ok(Token::new(TokenKind::Star, Span::new(start, self.pos)))
                }
            }
            '/' => Ok(Token::new(TokenKind::Slash, Span::new(start, self.pos))),
            '^' => Ok(Token::new(TokenKind::Caret, Span::new(start, self.pos))),
            '(' => Ok(Token::new(TokenKind::LParen, Span::new(start, self.pos))),
            ')' => Ok(Token::new(TokenKind::RParen, Span::new(start, self.pos))),
            c if c.is_ascii_digit() || c == '.' => self.read_number(start),
            c if is_ident_start(c) => Ok(self.read_identifier(start)),
            _ => Err(FormulaError::lex(format!("unexpected character: '{ch}'"))
                .with_span(Span::new(start, self.pos))),
        }
    }

    fn read_number(&mut self, start: usize) -> FormulaResult<Token> {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        // Scientific notation; only consumed when an exponent digit follows,
        // so `2e` stays an error rather than eating the identifier.
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(1), Some('+') | Some('-')) {
                lookahead = 2;
            }
            if matches!(self.peek_at(lookahead), Some(c) if c.is_ascii_digit()) {
                self.advance();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        let text: String = self.source[start..self.pos].iter().collect();
        let value: f64 = text.parse().map_err(|_| {
            FormulaError::lex(format!("invalid number: {text}"))
                .with_span(Span::new(start, self.pos))
        })?;

        // Trailing i/j marks an imaginary literal, Python style (0.156j).
        // Only swallowed when the suffix is not the start of a longer
        // identifier, so `2info` still fails as an unknown symbol later.
        if matches!(self.peek(), Some('i') | Some('j'))
            && !matches!(self.peek_at(1), Some(c) if is_ident_continue(c))
        {
            self.advance();
            return Ok(Token::new(
                TokenKind::Imaginary(value),
                Span::new(start, self.pos),
            ));
        }

        Ok(Token::new(TokenKind::Number(value), Span::new(start, self.pos)))
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.advance();
        }
        let text: String = self.source[start..self.pos].iter().collect();
        // Bare i/j is the imaginary unit.
        let kind = match text.as_str() {
            "i" | "j" => TokenKind::Imaginary(1.0),
            _ => TokenKind::Ident(text),
        };
        Token::new(kind, Span::new(start, self.pos))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn advance(&mut self) -> char {
        let ch = self.source[self.pos];
        self.pos += 1;
        ch
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source.get(self.pos + offset).copied()
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
