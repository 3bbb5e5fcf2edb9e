//! The closed literal value domain the folder evaluates over.
//!
//! Nothing here looks at identifiers, calls or members: a [`LitValue`] can only be
//! read off an expression that is already a literal, so evaluation never runs
//! any part of the analyzed program.

use swc_core::{
    common::DUMMY_SP,
    ecma::ast::*,
};

/// A JavaScript primitive restricted to number, string, boolean and null.
#[derive(Debug, Clone, PartialEq)]
pub enum LitValue {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl LitValue {
    /// Read a literal operand. Parentheses are looked through and `-<number>`
    /// counts as a number, since that's how negative literals parse.
    pub fn from_expr(expr: &Expr) -> Option<Self> {
        match expr {
            Expr::Lit(Lit::Num(n)) => Some(LitValue::Number(n.value)),
            Expr::Lit(Lit::Str(s)) => Some(LitValue::Str(s.value.to_string())),
            Expr::Lit(Lit::Bool(b)) => Some(LitValue::Bool(b.value)),
            Expr::Lit(Lit::Null(_)) => Some(LitValue::Null),
            Expr::Paren(p) => Self::from_expr(&p.expr),
            Expr::Unary(UnaryExpr {
                op: UnaryOp::Minus,
                arg,
                ..
            }) => match &**arg {
                Expr::Lit(Lit::Num(n)) => Some(LitValue::Number(-n.value)),
                _ => None,
            },
            _ => None,
        }
    }

    /// ECMAScript ToNumber, except strings which the folder never coerces.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            LitValue::Number(n) => Some(*n),
            LitValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            LitValue::Null => Some(0.0),
            LitValue::Str(_) => None,
        }
    }

    /// ECMAScript ToBoolean.
    pub fn is_truthy(&self) -> bool {
        match self {
            LitValue::Number(n) => !(n.is_nan() || *n == 0.0),
            LitValue::Str(s) => !s.is_empty(),
            LitValue::Bool(b) => *b,
            LitValue::Null => false,
        }
    }

    /// ECMAScript ToString.
    pub fn to_js_string(&self) -> String {
        match self {
            LitValue::Number(n) => number_to_js_string(*n),
            LitValue::Str(s) => s.clone(),
            LitValue::Bool(b) => b.to_string(),
            LitValue::Null => "null".to_string(),
        }
    }

    /// Build the literal expression for this value.
    ///
    /// Negative numbers come out as `-<positive literal>` so the tree stays
    /// something the parser itself could have produced.
    pub fn into_expr(self) -> Expr {
        match self {
            LitValue::Number(n) if n.is_sign_negative() && !n.is_nan() => {
                Expr::Unary(UnaryExpr {
                    span: DUMMY_SP,
                    op: UnaryOp::Minus,
                    arg: Box::new(num_lit(-n)),
                })
            }
            LitValue::Number(n) => num_lit(n),
            LitValue::Str(s) => Expr::Lit(Lit::Str(Str {
                span: DUMMY_SP,
                value: s.into(),
                raw: None,
            })),
            LitValue::Bool(value) => Expr::Lit(Lit::Bool(Bool {
                span: DUMMY_SP,
                value,
            })),
            LitValue::Null => Expr::Lit(Lit::Null(Null { span: DUMMY_SP })),
        }
    }
}

fn num_lit(value: f64) -> Expr {
    Expr::Lit(Lit::Num(Number {
        span: DUMMY_SP,
        value,
        raw: None,
    }))
}

// -----------------------------------------------------------------------------
// Numeric conversions
// -----------------------------------------------------------------------------

/// ECMAScript Number::toString(10).
pub fn number_to_js_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_to_js_string(-n));
    }

    // `{:e}` yields the shortest round-tripping digits, e.g. "1.2345e-7".
    let formatted = format!("{n:e}");
    let (mantissa, exponent) = match formatted.split_once('e') {
        Some(parts) => parts,
        None => return formatted,
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let k = digits.len() as i32;
    let point = exponent + 1;

    if k <= point && point <= 21 {
        format!("{digits}{}", "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    } else if -6 < point && point <= 0 {
        format!("0.{}{digits}", "0".repeat((-point) as usize))
    } else {
        let sign = if point - 1 < 0 { '-' } else { '+' };
        let magnitude = (point - 1).abs();
        if k == 1 {
            format!("{digits}e{sign}{magnitude}")
        } else {
            let (first, rest) = digits.split_at(1);
            format!("{first}.{rest}e{sign}{magnitude}")
        }
    }
}

/// ECMAScript ToInt32.
pub fn to_int32(n: f64) -> i32 {
    if !n.is_finite() {
        return 0;
    }
    let wrapped = n.trunc().rem_euclid(4_294_967_296.0);
    wrapped as u32 as i32
}

/// ECMAScript ToUint32.
pub fn to_uint32(n: f64) -> u32 {
    to_int32(n) as u32
}

/// ECMAScript `**`, which disagrees with `powf` on a few edge cases.
pub fn js_pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting_matches_js() {
        let cases = [
            (1.0, "1"),
            (-1.5, "-1.5"),
            (0.1 + 0.2, "0.30000000000000004"),
            (123456789.0, "123456789"),
            (1e21, "1e+21"),
            (1.5e21, "1.5e+21"),
            (1e20, "100000000000000000000"),
            (0.000001, "0.000001"),
            (1e-7, "1e-7"),
            (1.25e-7, "1.25e-7"),
            (-0.0, "0"),
            (f64::INFINITY, "Infinity"),
            (f64::NAN, "NaN"),
        ];
        for (n, expected) in cases {
            assert_eq!(number_to_js_string(n), expected, "formatting {n:?}");
        }
    }

    #[test]
    fn int32_conversion_wraps() {
        assert_eq!(to_int32(4_294_967_296.0 + 5.0), 5);
        assert_eq!(to_int32(2_147_483_648.0), i32::MIN);
        assert_eq!(to_int32(-1.9), -1);
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_uint32(-1.0), u32::MAX);
    }

    #[test]
    fn truthiness() {
        assert!(!LitValue::Number(0.0).is_truthy());
        assert!(!LitValue::Number(f64::NAN).is_truthy());
        assert!(!LitValue::Str(String::new()).is_truthy());
        assert!(!LitValue::Null.is_truthy());
        assert!(LitValue::Str("0".into()).is_truthy());
        assert!(LitValue::Number(-3.0).is_truthy());
    }

    #[test]
    fn pow_edge_cases() {
        assert!(js_pow(1.0, f64::NAN).is_nan());
        assert!(js_pow(-1.0, f64::INFINITY).is_nan());
        assert_eq!(js_pow(2.0, 10.0), 1024.0);
        assert_eq!(js_pow(f64::NAN, 0.0), 1.0);
    }

    #[test]
    fn negative_numbers_become_unary_minus() {
        match LitValue::Number(-4.0).into_expr() {
            Expr::Unary(u) => {
                assert_eq!(u.op, UnaryOp::Minus);
                assert_eq!(LitValue::from_expr(&u.arg), Some(LitValue::Number(4.0)));
            }
            other => panic!("expected unary minus, got {other:?}"),
        }
        let round = LitValue::from_expr(&LitValue::Number(-4.0).into_expr());
        assert_eq!(round, Some(LitValue::Number(-4.0)));
    }
}
