use std::collections::HashSet;

use serde::Serialize;

use crate::vecexpr::parser::{Expr, parse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VecExprErrorCode {
    InvalidSyntax,
    UnknownIdentifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VecExprValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<VecExprErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl VecExprValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error_code: None,
            error_message: None,
        }
    }

    pub fn error(code: VecExprErrorCode, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_code: Some(code),
            error_message: Some(message.into()),
        }
    }
}

pub(crate) fn check(expr: &Expr, symbols: Option<&HashSet<&str>>) -> Option<VecExprValidation> {
    match expr {
        Expr::Literal(_) => None,
        Expr::Identifier(name) => match symbols {
            Some(symbols) if !symbols.contains(name.as_str()) => Some(VecExprValidation::error(
                VecExprErrorCode::UnknownIdentifier,
                format!("Unknown identifier: {name}"),
            )),
            _ => None,
        },
        Expr::Call { .. } => Some(VecExprValidation::error(
            VecExprErrorCode::InvalidSyntax,
            "Function calls are not supported",
        )),
        Expr::Member { .. } => Some(VecExprValidation::error(
            VecExprErrorCode::InvalidSyntax,
            "Member access is not supported",
        )),
        Expr::Unary { argument, .. } => check(argument, symbols),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            check(left, symbols).or_else(|| check(right, symbols))
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => check(test, symbols)
            .or_else(|| check(consequent, symbols))
            .or_else(|| check(alternate, symbols)),
    }
}

pub fn validate_vec_expr_syntax<S: AsRef<str>>(expr: &str, symbols: &[S]) -> VecExprValidation {
    let parsed = match parse(expr) {
        Ok(parsed) => parsed,
        Err(err) => {
            return VecExprValidation::error(VecExprErrorCode::InvalidSyntax, err.to_string());
        }
    };
    let symbols: HashSet<&str> = symbols.iter().map(|symbol| symbol.as_ref()).collect();
    check(&parsed, Some(&symbols)).unwrap_or_else(VecExprValidation::ok)
}
