use std::borrow::Cow;
use std::collections::HashMap;

use tile_widgets::vecexpr::parser::{BinaryOp, Literal};
use tile_widgets::vecexpr::{
    Expr, VecExprErrorCode, VecValue, create_vec_expr_evaluator, parse, validate_vec_expr_syntax,
};

fn scalar(expr: &str, symbols: &[(&str, f64)]) -> Option<f64> {
    let symbols: HashMap<String, f64> = symbols
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect();
    create_vec_expr_evaluator(expr)
        .expect("evaluator")
        .evaluate_with(&symbols)
}

#[test]
fn averages_two_columns() {
    let mut columns = HashMap::new();
    columns.insert("a".to_string(), vec![1.0, 2.0, 3.0]);
    columns.insert("b".to_string(), vec![3.0, 2.0, 1.0]);
    let evaluator = create_vec_expr_evaluator("(a + b) / 2").expect("evaluator");
    let result = evaluator.evaluate_columns(&columns).expect("value");
    assert_eq!(result, VecValue::Vector(Cow::Owned(vec![2.0, 2.0, 2.0])));
}

#[test]
fn scalars_broadcast_and_vectors_truncate() {
    let long = [1.0, 2.0, 3.0, 4.0];
    let short = [10.0, 20.0];
    let evaluator = create_vec_expr_evaluator("long * k + short").expect("evaluator");
    let result = evaluator
        .evaluate_vectorized(|name| match name {
            "long" => Some(VecValue::from(&long[..])),
            "short" => Some(VecValue::from(&short[..])),
            "k" => Some(VecValue::Scalar(2.0)),
            _ => None,
        })
        .expect("value");
    assert_eq!(result.to_vec(), vec![12.0, 24.0]);
}

#[test]
fn vector_conditional_is_element_wise() {
    let mut columns = HashMap::new();
    columns.insert("band".to_string(), vec![0.2, 0.7, 0.5]);
    let evaluator = create_vec_expr_evaluator("band > 0.4 ? band * 10 : -1").expect("evaluator");
    let result = evaluator.evaluate_columns(&columns).expect("value");
    assert_eq!(result.to_vec(), vec![-1.0, 7.0, 5.0]);
}

#[test]
fn operator_precedence() {
    assert_eq!(scalar("1 + 2 * 3", &[]), Some(7.0));
    assert_eq!(scalar("(1 + 2) * 3", &[]), Some(9.0));
    assert_eq!(scalar("2 ** 3 ** 2", &[]), Some(512.0));
    assert_eq!(scalar("10 - 4 - 3", &[]), Some(3.0));
    assert_eq!(scalar("1 + 2 < 4 == true", &[]), Some(1.0));
    assert_eq!(scalar("-x ** 2", &[("x", 3.0)]), Some(9.0));
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(scalar("0 || 5", &[]), Some(5.0));
    assert_eq!(scalar("3 && 4", &[]), Some(4.0));
    assert_eq!(scalar("0 && missing", &[]), Some(0.0));
    assert_eq!(scalar("1 || missing", &[]), Some(1.0));
    assert_eq!(scalar("!0", &[]), Some(1.0));
}

#[test]
fn bitwise_operators_follow_int32() {
    assert_eq!(scalar("5 & 3", &[]), Some(1.0));
    assert_eq!(scalar("5 | 3", &[]), Some(7.0));
    assert_eq!(scalar("5 ^ 3", &[]), Some(6.0));
    assert_eq!(scalar("~5", &[]), Some(-6.0));
    assert_eq!(scalar("1 << 33", &[]), Some(2.0));
    assert_eq!(scalar("-8 >> 1", &[]), Some(-4.0));
    assert_eq!(scalar("-1 >>> 28", &[]), Some(15.0));
}

#[test]
fn unbound_names_and_strings_have_no_value() {
    assert_eq!(scalar("a + 1", &[]), None);
    assert_eq!(scalar("'text' + 1", &[]), None);
    assert_eq!(scalar("null + 1", &[]), Some(1.0));
}

#[test]
fn parses_literals_and_operators() {
    let expr = parse("x === 1.5e1").expect("parse");
    assert_eq!(
        expr,
        Expr::Binary {
            op: BinaryOp::Eq,
            left: Box::new(Expr::Identifier("x".to_string())),
            right: Box::new(Expr::Literal(Literal::Number(15.0))),
        }
    );
    assert!(matches!(
        parse("\"a\\\"b\"").expect("parse"),
        Expr::Literal(Literal::String(text)) if text == "a\"b"
    ));
}

#[test]
fn parse_errors_report_position() {
    assert!(parse("").is_err());
    assert!(parse("1 +").is_err());
    let err = parse("a b").expect_err("trailing token");
    assert_eq!(err.offset, 2);
    assert!(err.message.starts_with("Unexpected"));
    assert!(parse("(1 + 2").is_err());
    assert!(parse("1 # 2").is_err());
}

#[test]
fn calls_and_members_are_rejected() {
    assert!(parse("max(a, b)").is_ok());
    assert!(create_vec_expr_evaluator("max(a, b)").is_none());
    assert!(create_vec_expr_evaluator("a.b").is_none());
    assert!(create_vec_expr_evaluator("a[0]").is_none());
    assert!(create_vec_expr_evaluator("a +").is_none());
}

#[test]
fn numbers_may_start_with_a_dot() {
    assert_eq!(scalar("b1 * .5", &[("b1", 8.0)]), Some(4.0));
    assert_eq!(scalar(".25e1 + 1", &[]), Some(3.5));
    assert!(validate_vec_expr_syntax("b1 * .5", &["b1"]).valid);
}

#[test]
fn conditionals_nest_to_the_right() {
    assert_eq!(scalar("x < 0 ? -1 : x > 0 ? 1 : 0", &[("x", 5.0)]), Some(1.0));
    assert_eq!(scalar("x < 0 ? -1 : x > 0 ? 1 : 0", &[("x", 0.0)]), Some(0.0));
    assert_eq!(scalar("(x ? 2 : 3) * 2", &[("x", 0.0)]), Some(6.0));
}

#[test]
fn calls_and_members_keep_their_shape() {
    assert_eq!(
        parse("a.b(1)").expect("parse"),
        Expr::Call {
            callee: Box::new(Expr::Member {
                object: Box::new(Expr::Identifier("a".to_string())),
                property: Box::new(Expr::Identifier("b".to_string())),
                computed: false,
            }),
            arguments: vec![Expr::Literal(Literal::Number(1.0))],
        }
    );
    assert!(matches!(
        parse("-a[0]").expect("parse"),
        Expr::Unary { argument, .. } if matches!(*argument, Expr::Member { computed: true, .. })
    ));
    let err = parse("(1 + 2").expect_err("unclosed");
    assert_eq!(err.offset, 6);
    assert_eq!(err.message, "Unexpected end of expression");
}

#[test]
fn validation_reports_codes() {
    let ok = validate_vec_expr_syntax("a * 2", &["a"]);
    assert!(ok.valid);
    assert_eq!(ok.error_code, None);

    let call = validate_vec_expr_syntax("a()", &["a"]);
    assert!(!call.valid);
    assert_eq!(call.error_code, Some(VecExprErrorCode::InvalidSyntax));

    let unknown = validate_vec_expr_syntax("a + c", &["a".to_string()]);
    assert_eq!(unknown.error_code, Some(VecExprErrorCode::UnknownIdentifier));
    assert_eq!(unknown.error_message.as_deref(), Some("Unknown identifier: c"));

    let broken = validate_vec_expr_syntax("a +", &["a"]);
    assert_eq!(broken.error_code, Some(VecExprErrorCode::InvalidSyntax));
}

#[test]
fn validation_serializes_camel_case() {
    let unknown = validate_vec_expr_syntax("c", &["a"]);
    let json = serde_json::to_value(&unknown).expect("json");
    assert_eq!(
        json,
        serde_json::json!({
            "valid": false,
            "errorCode": "UnknownIdentifier",
            "errorMessage": "Unknown identifier: c"
        })
    );
    let ok = serde_json::to_value(validate_vec_expr_syntax("1", &[] as &[&str])).expect("json");
    assert_eq!(ok, serde_json::json!({"valid": true}));
}
