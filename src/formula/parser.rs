use num_complex::Complex64;

use super::error::{FormulaError, FormulaResult};
use super::lexer::Lexer;
use super::token::{Token, TokenKind, Variable};

/// Attractor expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(Complex64),
    Var(Variable),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Binding-power expression parser over the lexer's token stream.
///
/// Grammar: `+ -` < `* /` < unary `-` < `^` (right-associative), atoms are
/// numeric literals, the five variables, and parenthesized expressions.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn parse_expression(source: &str) -> FormulaResult<Expr> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_expr(0)?;
        match parser.peek_kind() {
            TokenKind::Eof => Ok(expr),
            other => Err(FormulaError::parse(format!(
                "unexpected trailing input: {other:?}"
            ))
            .with_span(parser.peek().span)),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> FormulaResult<Expr> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Caret => BinOp::Pow,
                _ => break,
            };
            let (left_bp, right_bp) = binding_power(op);
            if left_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(right_bp)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> FormulaResult<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(v) => Ok(Expr::Num(Complex64::new(v, 0.0))),
            TokenKind::Imaginary(v) => Ok(Expr::Num(Complex64::new(0.0, v))),
            TokenKind::Ident(name) => match Variable::from_name(&name) {
                Some(var) => Ok(Expr::Var(var)),
                None => Err(FormulaError::unknown_symbol(&name).with_span(token.span)),
            },
            TokenKind::Minus => {
                // Unary minus binds tighter than * but looser than ^,
                // so -z^2 means -(z^2).
                let operand = self.parse_expr(5)?;
                Ok(Expr::Neg(Box::new(operand)))
            }
            TokenKind::LParen => {
                let inner = self.parse_expr(0)?;
                match self.peek_kind() {
                    TokenKind::RParen => {
                        self.advance();
                        Ok(inner)
                    }
                    _ => Err(FormulaError::parse("expected ')'").with_span(self.peek().span)),
                }
            }
            TokenKind::Eof => Err(FormulaError::parse("unexpected end of expression")
                .with_span(token.span)),
            other => Err(FormulaError::parse(format!("unexpected token: {other:?}"))
                .with_span(token.span)),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind.clone()
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }
}

/// (left, right) binding powers; Pow's left > right makes it
/// right-associative.
fn binding_power(op: BinOp) -> (u8, u8) {
    match op {
        BinOp::Add | BinOp::Sub => (1, 2),
        BinOp::Mul | BinOp::Div => (3, 4),
        BinOp::Pow => (7, 6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Expr {
        Parser::parse_expression(input).unwrap()
    }

    fn num(re: f64) -> Expr {
        Expr::Num(Complex64::new(re, 0.0))
    }

    #[test]
    fn test_precedence_mul_over_add() {
        // z + 2 * a  ==  z + (2 * a)
        let expr = parse("z + 2 * a");
        match expr {
            Expr::Binary { op: BinOp::Add, lhs, rhs } => {
                assert_eq!(*lhs, Expr::Var(Variable::Z));
                assert!(matches!(*rhs, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn test_power_is_right_associative() {
        // z^2^3  ==  z^(2^3)
        let expr = parse("z^2^3");
        match expr {
            Expr::Binary { op: BinOp::Pow, lhs, rhs } => {
                assert_eq!(*lhs, Expr::Var(Variable::Z));
                assert!(matches!(*rhs, Expr::Binary { op: BinOp::Pow, .. }));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn test_unary_minus_binds_below_power() {
        // -z^2  ==  -(z^2)
        let expr = parse("-z^2");
        assert!(matches!(expr, Expr::Neg(inner)
            if matches!(*inner, Expr::Binary { op: BinOp::Pow, .. })));
    }

    #[test]
    fn test_julia_default_formula() {
        let expr = parse("z**2 + const");
        match expr {
            Expr::Binary { op: BinOp::Add, lhs, rhs } => {
                assert!(matches!(*lhs, Expr::Binary { op: BinOp::Pow, .. }));
                assert_eq!(*rhs, Expr::Var(Variable::Const));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn test_parenthesized_complex_literal() {
        let expr = parse("(-0.8 + 0.156j)");
        match expr {
            Expr::Binary { op: BinOp::Add, lhs, rhs } => {
                assert_eq!(*lhs, Expr::Neg(Box::new(num(0.8))));
                assert_eq!(*rhs, Expr::Num(Complex64::new(0.0, 0.156)));
            }
            other => panic!("unexpected tree: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_symbol_is_rejected() {
        let err = Parser::parse_expression("z + w").unwrap_err();
        assert_eq!(err.kind, crate::formula::FormulaErrorKind::UnknownSymbol);
        assert!(err.message.contains('w'));
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        assert!(Parser::parse_expression("z +").is_err());
        assert!(Parser::parse_expression("(z + const").is_err());
        assert!(Parser::parse_expression("z 2").is_err());
        assert!(Parser::parse_expression("").is_err());
    }

    #[test]
    fn test_same_text_parses_to_identical_tree() {
        assert_eq!(parse("z**2 + const*a"), parse("z**2 + const*a"));
    }
}
