//! Literal values for `foreach` lists.
//!
//! The bracketed list of a loop header is parsed as data, never evaluated:
//! numbers, quoted strings, tuples and lists are the only accepted forms.

use nom::{
    branch::alt,
    character::complete::{anychar, char, multispace0, none_of},
    combinator::{all_consuming, cut, map, opt, value},
    error::{context, ContextError, ErrorKind, ParseError as NomParseError, VerboseError},
    multi::{fold_many0, separated_list0},
    number::complete::recognize_float,
    sequence::{delimited, preceded, terminated},
    IResult,
};
use std::fmt;

/// A literal value from a loop list.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    /// Integer too wide for `i64`, kept as its decimal digits.
    BigInt(String),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
}

impl Value {
    /// The positional values this element binds to loop variables.
    ///
    /// Sequences bind element-wise, scalars bind as a one-element tuple.
    pub fn as_bindings(&self) -> Vec<&Value> {
        match self {
            Value::Tuple(items) | Value::List(items) => items.iter().collect(),
            scalar => vec![scalar],
        }
    }

    fn fmt_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => write!(f, "{}", other),
        }
    }
}

fn fmt_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        item.fmt_repr(f)?;
    }
    Ok(())
}

/// Shortest round-trip form; exponent notation below 1e-4 and from 1e16 on,
/// whole numbers keep a trailing `.0`.
fn fmt_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let magnitude = x.abs();
    if x.is_finite() && x != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{:e}", x);
        let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let (sign, digits) = match exponent.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exponent),
        };
        return write!(f, "{}e{}{:0>2}", mantissa, sign, digits);
    }
    if x.is_finite() && x.fract() == 0.0 {
        write!(f, "{:.1}", x)
    } else {
        write!(f, "{}", x)
    }
}

/// Substitution text: strings appear bare, sequences as literals.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::BigInt(digits) => f.write_str(digits),
            Value::Float(x) => fmt_float(f, *x),
            Value::Str(s) => f.write_str(s),
            Value::Tuple(items) => {
                f.write_str("(")?;
                fmt_items(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Value::List(items) => {
                f.write_str("[")?;
                fmt_items(f, items)?;
                f.write_str("]")
            }
        }
    }
}

/// Parses the inside of a loop list, e.g. `1, 2, 3` or `('a', 1), ('b', 2)`.
pub fn parse_list(input: &str) -> Result<Vec<Value>, String> {
    match all_consuming(delimited(
        multispace0::<_, VerboseError<&str>>,
        items,
        multispace0,
    ))(input)
    {
        Ok((_, values)) => Ok(values),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(nom::error::convert_error(input, e))
        }
        Err(nom::Err::Incomplete(_)) => Err("Incomplete input".to_string()),
    }
}

// ============================================================================
// Internal Parsers
// ============================================================================

type Res<'a, T, E> = IResult<&'a str, T, E>;

fn ws<'a, T, E, F>(inner: F) -> impl FnMut(&'a str) -> Res<'a, T, E>
where
    E: NomParseError<&'a str>,
    F: FnMut(&'a str) -> Res<'a, T, E>,
{
    delimited(multispace0, inner, multispace0)
}

/// Comma separated values with an optional trailing comma.
/// The flag reports whether any comma was seen.
fn items_with_comma<'a, E>(input: &'a str) -> Res<'a, (Vec<Value>, bool), E>
where
    E: NomParseError<&'a str> + ContextError<&'a str>,
{
    let (input, values) = separated_list0(char(','), ws(literal))(input)?;
    let (input, trailing) = opt(terminated(char(','), multispace0))(input)?;
    let had_comma = values.len() > 1 || trailing.is_some();
    Ok((input, (values, had_comma)))
}

fn items<'a, E>(input: &'a str) -> Res<'a, Vec<Value>, E>
where
    E: NomParseError<&'a str> + ContextError<&'a str>,
{
    map(items_with_comma, |(values, _)| values)(input)
}

fn literal<'a, E>(input: &'a str) -> Res<'a, Value, E>
where
    E: NomParseError<&'a str> + ContextError<&'a str>,
{
    context(
        "literal",
        alt((number, map(string, Value::Str), list, parenthesized)),
    )(input)
}

fn number<'a, E>(input: &'a str) -> Res<'a, Value, E>
where
    E: NomParseError<&'a str>,
{
    let (rest, text) = recognize_float(input)?;

    if text.contains(['.', 'e', 'E']) {
        return match text.parse::<f64>() {
            Ok(x) => Ok((rest, Value::Float(x))),
            Err(_) => Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Float))),
        };
    }

    match text.parse::<i64>() {
        Ok(i) => Ok((rest, Value::Int(i))),
        Err(_) => Ok((rest, Value::BigInt(normalize_digits(text)))),
    }
}

/// Drops a leading `+` and redundant leading zeros.
fn normalize_digits(text: &str) -> String {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits = digits.trim_start_matches('0');
    match (negative, digits.is_empty()) {
        (_, true) => "0".to_string(),
        (true, false) => format!("-{}", digits),
        (false, false) => digits.to_string(),
    }
}

/// One piece of a quoted string.
enum Fragment {
    Literal(char),
    Escaped(char),
    /// Unrecognized escape; the backslash is kept.
    Unknown(char),
}

fn fragment<'a, E>(forbidden: &'static str) -> impl FnMut(&'a str) -> Res<'a, Fragment, E>
where
    E: NomParseError<&'a str>,
{
    alt((
        map(none_of(forbidden), Fragment::Literal),
        preceded(
            char('\\'),
            alt((
                map(
                    alt((
                        value('\n', char('n')),
                        value('\r', char('r')),
                        value('\t', char('t')),
                        value('\\', char('\\')),
                        value('"', char('"')),
                        value('\'', char('\'')),
                    )),
                    Fragment::Escaped,
                ),
                map(anychar, Fragment::Unknown),
            )),
        ),
    ))
}

fn quoted<'a, E>(quote: char) -> impl FnMut(&'a str) -> Res<'a, String, E>
where
    E: NomParseError<&'a str>,
{
    let forbidden = if quote == '"' { "\"\\" } else { "'\\" };
    delimited(
        char(quote),
        fold_many0(fragment(forbidden), String::new, |mut acc, piece| {
            match piece {
                Fragment::Literal(c) | Fragment::Escaped(c) => acc.push(c),
                Fragment::Unknown(c) => {
                    acc.push('\\');
                    acc.push(c);
                }
            }
            acc
        }),
        char(quote),
    )
}

fn string<'a, E>(input: &'a str) -> Res<'a, String, E>
where
    E: NomParseError<&'a str>,
{
    alt((quoted('"'), quoted('\'')))(input)
}

fn list<'a, E>(input: &'a str) -> Res<'a, Value, E>
where
    E: NomParseError<&'a str> + ContextError<&'a str>,
{
    let (input, values) = preceded(
        char('['),
        cut(terminated(ws(items), context("closing bracket", char(']')))),
    )(input)?;
    Ok((input, Value::List(values)))
}

/// `(x)` is just `x`; `(x,)`, `(x, y)` and `()` are tuples.
fn parenthesized<'a, E>(input: &'a str) -> Res<'a, Value, E>
where
    E: NomParseError<&'a str> + ContextError<&'a str>,
{
    let (input, (mut values, had_comma)) = preceded(
        char('('),
        cut(terminated(
            ws(items_with_comma),
            context("closing parenthesis", char(')')),
        )),
    )(input)?;
    if values.len() == 1 && !had_comma {
        if let Some(single) = values.pop() {
            return Ok((input, single));
        }
    }
    Ok((input, Value::Tuple(values)))
}
