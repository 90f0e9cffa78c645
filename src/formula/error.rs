use std::fmt;

use super::token::Span;

/// Error raised while compiling an attractor expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaError {
    pub kind: FormulaErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaErrorKind {
    /// Malformed input at the character level.
    Lex,
    /// Malformed input at the grammar level.
    Parse,
    /// Identifier other than `z`, `const`, `a`, `b`, `c`.
    UnknownSymbol,
}

impl FormulaError {
    pub fn new(kind: FormulaErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn lex(message: impl Into<String>) -> Self {
        Self::new(FormulaErrorKind::Lex, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(FormulaErrorKind::Parse, message)
    }

    pub fn unknown_symbol(name: &str) -> Self {
        Self::new(
            FormulaErrorKind::UnknownSymbol,
            format!("unknown symbol '{name}' (allowed: z, const, a, b, c)"),
        )
    }
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            FormulaErrorKind::Lex | FormulaErrorKind::Parse => "parse failure",
            FormulaErrorKind::UnknownSymbol => "unknown symbol",
        };
        write!(f, "formula {label}: {}", self.message)?;
        if let Some(span) = self.span {
            write!(f, " (at {}..{})", span.start, span.end)?;
        }
        Ok(())
    }
}

impl std::error::Error for FormulaError {}

pub type FormulaResult<T> = Result<T, FormulaError>;
