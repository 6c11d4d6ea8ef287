use std::ops::Range;

use chumsky::prelude::*;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at character {offset}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Number(String),
    Str(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Question,
    Colon,
}

pub type Span = Range<usize>;

fn quoted(quote: char) -> impl Parser<char, String, Error = Simple<char>> + Clone {
    let escape = just('\\').ignore_then(choice((
        just('n').to('\n'),
        just('t').to('\t'),
        just('r').to('\r'),
        any(),
    )));
    just(quote)
        .ignore_then(
            filter(move |c: &char| *c != '\\' && *c != quote)
                .or(escape)
                .repeated(),
        )
        .then_ignore(just(quote))
        .collect::<String>()
}

pub fn lexer() -> impl Parser<char, Vec<(Token, Span)>, Error = Simple<char>> {
    let frac = just('.').chain(text::digits(10));
    let exp = just('e')
        .or(just('E'))
        .chain(just('+').or(just('-')).or_not())
        .chain::<char, _, _>(text::digits(10));
    let number = text::int(10)
        .chain::<char, _, _>(frac.clone().or_not().flatten())
        .or(frac)
        .chain::<char, _, _>(exp.or_not().flatten())
        .collect::<String>()
        .try_map(|text, span| match text.parse::<f64>() {
            Ok(_) => Ok(Token::Number(text)),
            Err(_) => Err(Simple::custom(span, format!("invalid number {text}"))),
        });

    let string = quoted('"').or(quoted('\'')).map(Token::Str);
    let ident = text::ident().map(Token::Ident);

    // Longest first, so `>>>` is never read as `>>` then `>`.
    let long_operators = choice((
        just(">>>").to(Token::Op(">>>")),
        just("===").to(Token::Op("===")),
        just("!==").to(Token::Op("!==")),
        just("**").to(Token::Op("**")),
        just("==").to(Token::Op("==")),
        just("!=").to(Token::Op("!=")),
        just("<=").to(Token::Op("<=")),
        just(">=").to(Token::Op(">=")),
        just("<<").to(Token::Op("<<")),
        just(">>").to(Token::Op(">>")),
        just("&&").to(Token::Op("&&")),
        just("||").to(Token::Op("||")),
    ));
    let short_operators = choice((
        just('+').to(Token::Op("+")),
        just('-').to(Token::Op("-")),
        just('*').to(Token::Op("*")),
        just('/').to(Token::Op("/")),
        just('%').to(Token::Op("%")),
        just('<').to(Token::Op("<")),
        just('>').to(Token::Op(">")),
        just('&').to(Token::Op("&")),
        just('|').to(Token::Op("|")),
        just('^').to(Token::Op("^")),
        just('!').to(Token::Op("!")),
        just('~').to(Token::Op("~")),
    ));
    let punctuation = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('.').to(Token::Dot),
        just(',').to(Token::Comma),
        just('?').to(Token::Question),
        just(':').to(Token::Colon),
    ));

    number
        .or(string)
        .or(ident)
        .or(long_operators)
        .or(short_operators)
        .or(punctuation)
        .map_with_span(|token, span: Span| (token, span))
        .padded()
        .repeated()
        .then_ignore(end())
}

pub fn tokenize(input: &str) -> Result<Vec<(Token, Span)>, ParseError> {
    lexer().parse(input).map_err(|errors| {
        match errors.into_iter().next() {
            Some(error) => ParseError::new(error.to_string(), error.span().start),
            None => ParseError::new("invalid expression", 0),
        }
    })
}
