use chumsky::{BoxedParser, Stream};
use chumsky::error::{Error as _, SimpleReason};
use chumsky::prelude::*;

use crate::vecexpr::lexer::{ParseError, Token, tokenize};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Bool(bool),
    Null,
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    Unary {
        op: UnaryOp,
        argument: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
        computed: bool,
    },
}

#[derive(Debug, Clone, Copy)]
enum Infix {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

impl Infix {
    fn build(self, left: Expr, right: Expr) -> Expr {
        let left = Box::new(left);
        let right = Box::new(right);
        match self {
            Infix::Binary(op) => Expr::Binary { op, left, right },
            Infix::Logical(op) => Expr::Logical { op, left, right },
        }
    }
}

const POWER: u8 = 11;

// Precedence tier of each infix operator, higher binds tighter.
fn infix(op: &str) -> Option<(u8, Infix)> {
    let entry = match op {
        "||" => (1, Infix::Logical(LogicalOp::Or)),
        "&&" => (2, Infix::Logical(LogicalOp::And)),
        "|" => (3, Infix::Binary(BinaryOp::BitOr)),
        "^" => (4, Infix::Binary(BinaryOp::BitXor)),
        "&" => (5, Infix::Binary(BinaryOp::BitAnd)),
        "==" | "===" => (6, Infix::Binary(BinaryOp::Eq)),
        "!=" | "!==" => (6, Infix::Binary(BinaryOp::NotEq)),
        "<" => (7, Infix::Binary(BinaryOp::Lt)),
        ">" => (7, Infix::Binary(BinaryOp::Gt)),
        "<=" => (7, Infix::Binary(BinaryOp::Le)),
        ">=" => (7, Infix::Binary(BinaryOp::Ge)),
        "<<" => (8, Infix::Binary(BinaryOp::Shl)),
        ">>" => (8, Infix::Binary(BinaryOp::Shr)),
        ">>>" => (8, Infix::Binary(BinaryOp::UShr)),
        "+" => (9, Infix::Binary(BinaryOp::Add)),
        "-" => (9, Infix::Binary(BinaryOp::Sub)),
        "*" => (10, Infix::Binary(BinaryOp::Mul)),
        "/" => (10, Infix::Binary(BinaryOp::Div)),
        "%" => (10, Infix::Binary(BinaryOp::Rem)),
        "**" => (POWER, Infix::Binary(BinaryOp::Pow)),
        _ => return None,
    };
    Some(entry)
}

fn prefix(op: &str) -> Option<UnaryOp> {
    match op {
        "-" => Some(UnaryOp::Neg),
        "+" => Some(UnaryOp::Plus),
        "!" => Some(UnaryOp::Not),
        "~" => Some(UnaryOp::BitNot),
        _ => None,
    }
}

fn unexpected(span: std::ops::Range<usize>, token: Token) -> Simple<Token> {
    Simple::expected_input_found(span, Vec::new(), Some(token))
}

fn infix_operator(tier: u8) -> impl Parser<Token, Infix, Error = Simple<Token>> + Clone {
    filter_map(move |span, token: Token| {
        let found = match &token {
            Token::Op(op) => infix(op)
                .filter(|(level, _)| *level == tier)
                .map(|(_, infix)| infix),
            _ => None,
        };
        found.ok_or_else(|| unexpected(span, token))
    })
}

fn prefix_operator() -> impl Parser<Token, UnaryOp, Error = Simple<Token>> + Clone {
    filter_map(|span, token: Token| {
        let found = match &token {
            Token::Op(op) => prefix(op),
            _ => None,
        };
        found.ok_or_else(|| unexpected(span, token))
    })
}

fn left_assoc<'a, P>(operand: P, tier: u8) -> BoxedParser<'a, Token, Expr, Simple<Token>>
where
    P: Parser<Token, Expr, Error = Simple<Token>> + Clone + 'a,
{
    operand
        .clone()
        .then(infix_operator(tier).then(operand).repeated())
        .foldl(|left, (infix, right)| infix.build(left, right))
        .boxed()
}

#[derive(Clone)]
enum Postfix {
    Call(Vec<Expr>),
    Member(String),
    Index(Expr),
}

fn identifier(name: String) -> Expr {
    match name.as_str() {
        "true" => Expr::Literal(Literal::Bool(true)),
        "false" => Expr::Literal(Literal::Bool(false)),
        "null" => Expr::Literal(Literal::Null),
        _ => Expr::Identifier(name),
    }
}

pub fn parser() -> impl Parser<Token, Expr, Error = Simple<Token>> + Clone {
    recursive(|expr| {
        let number = select! { Token::Number(text) => text }.try_map(|text: String, span| {
            text.parse::<f64>()
                .map(|value| Expr::Literal(Literal::Number(value)))
                .map_err(|_| Simple::custom(span, format!("invalid number {text}")))
        });
        let atom = choice((
            number,
            select! {
                Token::Str(text) => Expr::Literal(Literal::String(text)),
                Token::Ident(name) => identifier(name),
            },
            expr.clone()
                .delimited_by(just(Token::LParen), just(Token::RParen)),
        ));

        let call = expr
            .clone()
            .separated_by(just(Token::Comma))
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(Postfix::Call);
        let member = just(Token::Dot)
            .ignore_then(select! { Token::Ident(name) => name })
            .map(Postfix::Member);
        let index = expr
            .clone()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(Postfix::Index);
        let postfix = atom
            .then(choice((call, member, index)).repeated())
            .foldl(|object, postfix| match postfix {
                Postfix::Call(arguments) => Expr::Call {
                    callee: Box::new(object),
                    arguments,
                },
                Postfix::Member(name) => Expr::Member {
                    object: Box::new(object),
                    property: Box::new(Expr::Identifier(name)),
                    computed: false,
                },
                Postfix::Index(property) => Expr::Member {
                    object: Box::new(object),
                    property: Box::new(property),
                    computed: true,
                },
            });

        let unary = prefix_operator()
            .repeated()
            .then(postfix)
            .foldr(|op, argument| Expr::Unary {
                op,
                argument: Box::new(argument),
            })
            .boxed();

        // `**` is right associative: `a ** b ** c` is `a ** (b ** c)`.
        let power = recursive(|power| {
            unary
                .clone()
                .then(infix_operator(POWER).then(power).or_not())
                .map(|(base, exponent)| match exponent {
                    Some((infix, exponent)) => infix.build(base, exponent),
                    None => base,
                })
        })
        .boxed();

        let mut binary = power;
        for tier in (1..POWER).rev() {
            binary = left_assoc(binary, tier);
        }

        binary
            .then(
                just(Token::Question)
                    .ignore_then(expr.clone())
                    .then_ignore(just(Token::Colon))
                    .then(expr)
                    .or_not(),
            )
            .map(|(test, branches)| match branches {
                Some((consequent, alternate)) => Expr::Conditional {
                    test: Box::new(test),
                    consequent: Box::new(consequent),
                    alternate: Box::new(alternate),
                },
                None => test,
            })
    })
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(text) => format!("number {text}"),
        Token::Str(text) => format!("string \"{text}\""),
        Token::Ident(name) => format!("identifier \"{name}\""),
        Token::Op(op) => format!("\"{op}\""),
        Token::LParen => "\"(\"".to_string(),
        Token::RParen => "\")\"".to_string(),
        Token::LBracket => "\"[\"".to_string(),
        Token::RBracket => "\"]\"".to_string(),
        Token::Dot => "\".\"".to_string(),
        Token::Comma => "\",\"".to_string(),
        Token::Question => "\"?\"".to_string(),
        Token::Colon => "\":\"".to_string(),
    }
}

fn to_parse_error(error: Simple<Token>) -> ParseError {
    let message = match (error.reason(), error.found()) {
        (SimpleReason::Custom(message), _) => message.clone(),
        (_, Some(token)) => format!("Unexpected {}", describe(token)),
        (_, None) => "Unexpected end of expression".to_string(),
    };
    ParseError::new(message, error.span().start)
}

pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    let len = input.chars().count();
    parser()
        .then_ignore(end())
        .parse(Stream::from_iter(len..len + 1, tokens.into_iter()))
        .map_err(|errors| match errors.into_iter().next() {
            Some(error) => to_parse_error(error),
            None => ParseError::new("invalid expression", 0),
        })
}
