use std::fmt;

use num_complex::Complex64;

use super::error::FormulaResult;
use super::parser::{BinOp, Expr, Parser};
use super::token::Variable;

/// A compiled attractor formula, evaluable on scalars or elementwise on a
/// grid. Compiling the same text twice always yields a formula with
/// identical behavior: the evaluator is a pure tree walk with no state.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    root: Expr,
}

impl Formula {
    /// Compiles an expression over the variables `z, const, a, b, c`.
    pub fn compile(source: &str) -> FormulaResult<Self> {
        let root = Parser::parse_expression(source)?;
        Ok(Self {
            source: source.to_owned(),
            root,
        })
    }

    /// Evaluates the formula for one point. Total wherever called: division
    /// by zero and overflow propagate as inf/nan, which the escape-time
    /// evaluator treats as escaped.
    pub fn eval(
        &self,
        z: Complex64,
        constant: Complex64,
        a: Complex64,
        b: Complex64,
        c: Complex64,
    ) -> Complex64 {
        eval_node(&self.root, z, constant, a, b, c)
    }

    /// Applies the formula elementwise to the points of `zs` flagged active,
    /// leaving inactive points untouched. This is the batched strategy's
    /// inner step (the masked recompute of the array formulation).
    pub fn eval_masked(
        &self,
        zs: &mut [Complex64],
        active: &[bool],
        constant: Complex64,
        a: Complex64,
        b: Complex64,
        c: Complex64,
    ) {
        debug_assert_eq!(zs.len(), active.len());
        for (z, &keep) in zs.iter_mut().zip(active.iter()) {
            if keep {
                *z = eval_node(&self.root, *z, constant, a, b, c);
            }
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval_node(
    node: &Expr,
    z: Complex64,
    constant: Complex64,
    a: Complex64,
    b: Complex64,
    c: Complex64,
) -> Complex64 {
    match node {
        Expr::Num(v) => *v,
        Expr::Var(Variable::Z) => z,
        Expr::Var(Variable::Const) => constant,
        Expr::Var(Variable::A) => a,
        Expr::Var(Variable::B) => b,
        Expr::Var(Variable::C) => c,
        Expr::Neg(inner) => -eval_node(inner, z, constant, a, b, c),
        Expr::Binary { op, lhs, rhs } => {
            let l = eval_node(lhs, z, constant, a, b, c);
            let r = eval_node(rhs, z, constant, a, b, c);
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => pow(l, r),
            }
        }
    }
}

/// Small integer exponents go through repeated multiplication (`powi`),
/// keeping z^2 exact; anything else falls back to the principal complex
/// power.
fn pow(base: Complex64, exp: Complex64) -> Complex64 {
    if exp.im == 0.0 && exp.re.fract() == 0.0 && exp.re.abs() <= 32.0 {
        base.powi(exp.re as i32)
    } else {
        base.powc(exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZERO: Complex64 = Complex64::new(0.0, 0.0);

    fn eval(source: &str, z: Complex64, constant: Complex64) -> Complex64 {
        Formula::compile(source)
            .unwrap()
            .eval(z, constant, ZERO, ZERO, ZERO)
    }

    #[test]
    fn test_julia_step() {
        // |0^2 + (-0.8 + 0.156i)| ~= 0.815
        let c = Complex64::new(-0.8, 0.156);
        let out = eval("z**2 + const", ZERO, c);
        assert_eq!(out, c);
        assert!((out.norm() - 0.815).abs() < 1e-2);
    }

    #[test]
    fn test_integer_power_is_exact() {
        let z = Complex64::new(0.0, 1.0);
        // i^2 == -1 exactly with powi
        let out = eval("z^2", z, ZERO);
        assert_eq!(out, Complex64::new(-1.0, 0.0));
    }

    #[test]
    fn test_division_by_zero_propagates_nonfinite() {
        let out = eval("1 / (z - z)", Complex64::new(0.5, 0.5), ZERO);
        assert!(!out.re.is_finite() || !out.im.is_finite());
    }

    #[test]
    fn test_all_five_variables() {
        let f = Formula::compile("z + const + a + b + c").unwrap();
        let out = f.eval(
            Complex64::new(1.0, 0.0),
            Complex64::new(0.0, 1.0),
            Complex64::new(2.0, 0.0),
            Complex64::new(0.0, 2.0),
            Complex64::new(3.0, 3.0),
        );
        assert_eq!(out, Complex64::new(6.0, 6.0));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let f1 = Formula::compile("a*z**2 - const/b").unwrap();
        let f2 = Formula::compile("a*z**2 - const/b").unwrap();
        assert_eq!(f1, f2);
        let z = Complex64::new(0.3, -0.7);
        let c = Complex64::new(-0.1, 0.2);
        let a = Complex64::new(1.5, 0.0);
        let b = Complex64::new(0.0, 2.0);
        assert_eq!(f1.eval(z, c, a, b, ZERO), f2.eval(z, c, a, b, ZERO));
    }

    #[test]
    fn test_eval_masked_skips_inactive_points() {
        let f = Formula::compile("z * z").unwrap();
        let mut zs = vec![Complex64::new(2.0, 0.0), Complex64::new(3.0, 0.0)];
        let active = vec![true, false];
        f.eval_masked(&mut zs, &active, ZERO, ZERO, ZERO, ZERO);
        assert_eq!(zs[0], Complex64::new(4.0, 0.0));
        assert_eq!(zs[1], Complex64::new(3.0, 0.0));
    }

    #[test]
    fn test_display_round_trips_source() {
        let f = Formula::compile("z**2 + const").unwrap();
        assert_eq!(f.to_string(), "z**2 + const");
    }
}
