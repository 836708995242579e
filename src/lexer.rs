//! Field recognizers.
//!
//! The parser hands every complete textual field here for
//! classification. A field that could read several ways resolves in
//! this priority order: operator, key, date, number, string, boolean.

use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

use crate::ast::{Date, Literal, Op};
use crate::error::ParseError;

type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Classification of one field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Operator(Op),
    Literal(Literal),
}

/// Classify the field starting at byte `at` of the source.
pub(crate) fn classify(field: &str, at: usize) -> Result<Token, ParseError> {
    if let Ok(op) = operator.parse(field) {
        return Ok(Token::Operator(op));
    }
    if let Some(name) = delimited_by(field, b'[', b']') {
        return Ok(Token::Literal(Literal::Key(name.to_string())));
    }
    if let Ok(date) = date.parse(field) {
        if !(1..=12).contains(&date.month) || !(1..=31).contains(&date.day) {
            return Err(ParseError::DateOutOfRange {
                text: field.to_string(),
                at,
            });
        }
        return Ok(Token::Literal(Literal::Date(date)));
    }
    if number.parse(field).is_ok() {
        // The grammar is a subset of what f64's FromStr accepts.
        let value = field.parse::<f64>().unwrap_or(f64::INFINITY);
        if !value.is_finite() {
            return Err(ParseError::NumberOverflow {
                text: field.to_string(),
                at,
            });
        }
        return Ok(Token::Literal(Literal::Number(value)));
    }
    if let Some(payload) = delimited_by(field, b'\'', b'\'') {
        return Ok(Token::Literal(Literal::Str(payload.to_string())));
    }
    match field {
        "TRUE" => Ok(Token::Literal(Literal::True)),
        "FALSE" => Ok(Token::Literal(Literal::False)),
        _ => Err(ParseError::BadToken {
            text: field.to_string(),
            at,
        }),
    }
}

/// First/last byte delimiter check; returns the payload between them.
fn delimited_by(field: &str, open: u8, close: u8) -> Option<&str> {
    let bytes = field.as_bytes();
    if bytes.len() >= 2 && bytes[0] == open && bytes[bytes.len() - 1] == close {
        Some(&field[1..field.len() - 1])
    } else {
        None
    }
}

fn operator(input: &mut &str) -> PResult<Op> {
    // Two-byte tokens first so `!=` never lexes as `!`.
    alt((
        "!=".value(Op::Neq),
        "<=".value(Op::Lte),
        ">=".value(Op::Gte),
        '!'.value(Op::Not),
        '&'.value(Op::And),
        '|'.value(Op::Or),
        '='.value(Op::Eq),
        '<'.value(Op::Lt),
        '>'.value(Op::Gt),
        '?'.value(Op::Exst),
    ))
    .parse_next(input)
}

/// Number shape: optional sign, `0` or a non-zero-led integer part,
/// optional fraction, optional exponent. Leading zeros are rejected.
fn number(input: &mut &str) -> PResult<()> {
    (
        opt(one_of(['+', '-'])),
        alt((
            (one_of('1'..='9'), take_while(0.., |c: char| c.is_ascii_digit())).void(),
            '0'.void(),
        )),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
        opt((
            one_of(['e', 'E']),
            opt(one_of(['+', '-'])),
            take_while(1.., |c: char| c.is_ascii_digit()),
        )),
    )
        .void()
        .parse_next(input)
}

fn date(input: &mut &str) -> PResult<Date> {
    let year = take_while(4..=4, |c: char| c.is_ascii_digit()).parse_next(input)?;
    '-'.parse_next(input)?;
    let month = take_while(2..=2, |c: char| c.is_ascii_digit()).parse_next(input)?;
    '-'.parse_next(input)?;
    let day = take_while(2..=2, |c: char| c.is_ascii_digit()).parse_next(input)?;
    Ok(Date {
        year: fold_digits(year) as u16,
        month: fold_digits(month) as u8,
        day: fold_digits(day) as u8,
    })
}

fn fold_digits(digits: &str) -> u32 {
    digits.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}
