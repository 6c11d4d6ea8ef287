use std::borrow::Cow;

use crate::vecexpr::parser::{BinaryOp, Expr, Literal, LogicalOp, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub enum VecValue<'a> {
    Scalar(f64),
    Vector(Cow<'a, [f64]>),
}

impl<'a> VecValue<'a> {
    pub fn len(&self) -> Option<usize> {
        match self {
            VecValue::Scalar(_) => None,
            VecValue::Vector(values) => Some(values.len()),
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            VecValue::Scalar(value) => Some(*value),
            VecValue::Vector(_) => None,
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            VecValue::Scalar(value) => vec![*value],
            VecValue::Vector(values) => values.to_vec(),
        }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> VecValue<'a> {
        match self {
            VecValue::Scalar(value) => VecValue::Scalar(f(value)),
            VecValue::Vector(values) => {
                VecValue::Vector(Cow::Owned(values.iter().map(|v| f(*v)).collect()))
            }
        }
    }
}

impl From<f64> for VecValue<'_> {
    fn from(value: f64) -> Self {
        VecValue::Scalar(value)
    }
}

impl<'a> From<&'a [f64]> for VecValue<'a> {
    fn from(values: &'a [f64]) -> Self {
        VecValue::Vector(Cow::Borrowed(values))
    }
}

impl From<Vec<f64>> for VecValue<'_> {
    fn from(values: Vec<f64>) -> Self {
        VecValue::Vector(Cow::Owned(values))
    }
}

fn zip_with<'a>(
    left: VecValue<'a>,
    right: VecValue<'a>,
    f: impl Fn(f64, f64) -> f64,
) -> VecValue<'a> {
    match (left, right) {
        (VecValue::Scalar(a), VecValue::Scalar(b)) => VecValue::Scalar(f(a, b)),
        (VecValue::Scalar(a), VecValue::Vector(b)) => {
            VecValue::Vector(Cow::Owned(b.iter().map(|b| f(a, *b)).collect()))
        }
        (VecValue::Vector(a), VecValue::Scalar(b)) => {
            VecValue::Vector(Cow::Owned(a.iter().map(|a| f(*a, b)).collect()))
        }
        (VecValue::Vector(a), VecValue::Vector(b)) => VecValue::Vector(Cow::Owned(
            a.iter().zip(b.iter()).map(|(a, b)| f(*a, *b)).collect(),
        )),
    }
}

fn at(value: &VecValue<'_>, index: usize) -> f64 {
    match value {
        VecValue::Scalar(value) => *value,
        VecValue::Vector(values) => values[index],
    }
}

fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

fn from_bool(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

/// ECMAScript ToInt32.
fn to_int32(value: f64) -> i32 {
    to_uint32(value) as i32
}

/// ECMAScript ToUint32.
fn to_uint32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn unary(op: UnaryOp, value: f64) -> f64 {
    match op {
        UnaryOp::Neg => -value,
        UnaryOp::Plus => value,
        UnaryOp::Not => from_bool(!truthy(value)),
        UnaryOp::BitNot => f64::from(!to_int32(value)),
    }
}

fn binary(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::Pow => a.powf(b),
        BinaryOp::Eq => from_bool(a == b),
        BinaryOp::NotEq => from_bool(a != b),
        BinaryOp::Lt => from_bool(a < b),
        BinaryOp::Gt => from_bool(a > b),
        BinaryOp::Le => from_bool(a <= b),
        BinaryOp::Ge => from_bool(a >= b),
        BinaryOp::BitAnd => f64::from(to_int32(a) & to_int32(b)),
        BinaryOp::BitOr => f64::from(to_int32(a) | to_int32(b)),
        BinaryOp::BitXor => f64::from(to_int32(a) ^ to_int32(b)),
        BinaryOp::Shl => f64::from(to_int32(a).wrapping_shl(to_uint32(b) & 31)),
        BinaryOp::Shr => f64::from(to_int32(a).wrapping_shr(to_uint32(b) & 31)),
        BinaryOp::UShr => f64::from(to_uint32(a).wrapping_shr(to_uint32(b) & 31)),
    }
}

fn logical(op: LogicalOp, a: f64, b: f64) -> f64 {
    match (op, truthy(a)) {
        (LogicalOp::And, true) | (LogicalOp::Or, false) => b,
        _ => a,
    }
}

fn literal(value: &Literal) -> Option<f64> {
    match value {
        Literal::Number(number) => Some(*number),
        Literal::Bool(flag) => Some(from_bool(*flag)),
        Literal::Null => Some(0.0),
        Literal::String(_) => None,
    }
}

pub fn eval_scalar(expr: &Expr, lookup: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
    match expr {
        Expr::Literal(value) => literal(value),
        Expr::Identifier(name) => lookup(name),
        Expr::Unary { op, argument } => Some(unary(*op, eval_scalar(argument, lookup)?)),
        Expr::Binary { op, left, right } => {
            let a = eval_scalar(left, lookup)?;
            let b = eval_scalar(right, lookup)?;
            Some(binary(*op, a, b))
        }
        Expr::Logical { op, left, right } => {
            let a = eval_scalar(left, lookup)?;
            match (op, truthy(a)) {
                (LogicalOp::And, true) | (LogicalOp::Or, false) => eval_scalar(right, lookup),
                _ => Some(a),
            }
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if truthy(eval_scalar(test, lookup)?) {
                eval_scalar(consequent, lookup)
            } else {
                eval_scalar(alternate, lookup)
            }
        }
        Expr::Call { .. } | Expr::Member { .. } => None,
    }
}

pub fn eval_vector<'a>(
    expr: &Expr,
    lookup: &dyn Fn(&str) -> Option<VecValue<'a>>,
) -> Option<VecValue<'a>> {
    match expr {
        Expr::Literal(value) => literal(value).map(VecValue::Scalar),
        Expr::Identifier(name) => lookup(name),
        Expr::Unary { op, argument } => {
            let op = *op;
            Some(eval_vector(argument, lookup)?.map(|value| unary(op, value)))
        }
        Expr::Binary { op, left, right } => {
            let op = *op;
            let a = eval_vector(left, lookup)?;
            let b = eval_vector(right, lookup)?;
            Some(zip_with(a, b, |a, b| binary(op, a, b)))
        }
        Expr::Logical { op, left, right } => {
            let op = *op;
            let a = eval_vector(left, lookup)?;
            if let Some(value) = a.as_scalar() {
                return match (op, truthy(value)) {
                    (LogicalOp::And, true) | (LogicalOp::Or, false) => eval_vector(right, lookup),
                    _ => Some(a),
                };
            }
            let b = eval_vector(right, lookup)?;
            Some(zip_with(a, b, |a, b| logical(op, a, b)))
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            let test = eval_vector(test, lookup)?;
            if let Some(value) = test.as_scalar() {
                return if truthy(value) {
                    eval_vector(consequent, lookup)
                } else {
                    eval_vector(alternate, lookup)
                };
            }
            let consequent = eval_vector(consequent, lookup)?;
            let alternate = eval_vector(alternate, lookup)?;
            let len = [test.len(), consequent.len(), alternate.len()]
                .into_iter()
                .flatten()
                .min()
                .unwrap_or(0);
            Some(VecValue::Vector(Cow::Owned(
                (0..len)
                    .map(|i| {
                        if truthy(at(&test, i)) {
                            at(&consequent, i)
                        } else {
                            at(&alternate, i)
                        }
                    })
                    .collect(),
            )))
        }
        Expr::Call { .. } | Expr::Member { .. } => None,
    }
}
