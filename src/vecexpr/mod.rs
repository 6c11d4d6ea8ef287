use std::borrow::Cow;
use std::collections::HashMap;

pub mod eval;
pub mod lexer;
pub mod parser;
pub mod validate;

pub use self::eval::VecValue;
pub use self::lexer::ParseError;
pub use self::parser::{Expr, parse};
pub use self::validate::{VecExprErrorCode, VecExprValidation, validate_vec_expr_syntax};

#[derive(Debug, Clone, PartialEq)]
pub struct VecExprEvaluator {
    source: String,
    expr: Expr,
}

pub fn create_vec_expr_evaluator(expr: &str) -> Option<VecExprEvaluator> {
    let parsed = parse(expr).ok()?;
    if validate::check(&parsed, None).is_some() {
        return None;
    }
    Some(VecExprEvaluator {
        source: expr.to_string(),
        expr: parsed,
    })
}

impl VecExprEvaluator {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn evaluate<F>(&self, lookup: F) -> Option<f64>
    where
        F: Fn(&str) -> Option<f64>,
    {
        eval::eval_scalar(&self.expr, &lookup)
    }

    pub fn evaluate_with(&self, symbols: &HashMap<String, f64>) -> Option<f64> {
        self.evaluate(|name| symbols.get(name).copied())
    }

    pub fn evaluate_vectorized<'a, F>(&self, lookup: F) -> Option<VecValue<'a>>
    where
        F: Fn(&str) -> Option<VecValue<'a>>,
    {
        eval::eval_vector(&self.expr, &lookup)
    }

    pub fn evaluate_columns<'a>(
        &self,
        columns: &'a HashMap<String, Vec<f64>>,
    ) -> Option<VecValue<'a>> {
        self.evaluate_vectorized(|name| {
            columns
                .get(name)
                .map(|values| VecValue::Vector(Cow::Borrowed(values.as_slice())))
        })
    }
}
