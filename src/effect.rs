//! Effect parsing and lowering
//!
//! Method effects come in two forms:
//!
//! ```text
//! set this.properties.<prop> to <expr>      -> global <Class>_<prop> = <expr>
//! raw:<stmt>;<stmt>\n<stmt>                 -> one target statement per segment
//! ```
//!
//! Then-step effects are procedure calls on a Given-bound instance:
//!
//! ```text
//! call values.<var>.<method>                -> <Class>_<method>()
//! call values.<var>.<method> with int 3, x  -> <Class>_<method>(3, x)
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{anychar, char, multispace0, multispace1, none_of},
    combinator::{all_consuming, opt, recognize},
    error::ParseError as NomParseError,
    multi::{many1, separated_list1},
    sequence::{delimited, preceded, tuple},
    IResult,
};
use tracing::{debug, warn};

use crate::error::{Result, ScenarioError};
use crate::expr::{BindingTable, EnumIndex, Expr, Scope};
use crate::model::{ClassDef, Domain, MethodDef};

/// Characters of a raw body kept in its summary comment.
pub const RAW_SUMMARY_LEN: usize = 60;

// ============================================================================
// Method effects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodEffect {
    /// `set this.properties.<target> to <value>`
    Assign { target: String, value: Expr },
    /// `raw:` body with escapes already decoded
    RawSplice { body: String },
}

impl MethodEffect {
    /// Parse effect text. `owner` names the method in errors (`Class.method`).
    pub fn parse(text: &str, owner: &str) -> Result<Self> {
        let trimmed = text.trim();

        if let Some(body) = trimmed.strip_prefix("raw:") {
            return Ok(MethodEffect::RawSplice {
                body: decode_escapes(body),
            });
        }

        match all_consuming(assignment::<nom::error::Error<&str>>)(trimmed) {
            Ok((_, (target, value))) => Ok(MethodEffect::Assign {
                target: target.to_string(),
                value: Expr::parse(value.trim()),
            }),
            Err(_) => Err(ScenarioError::UnsupportedEffect {
                owner: owner.to_string(),
                effect: text.to_string(),
            }),
        }
    }
}

/// Lower one method's effect into target statements (without `def`/`end`).
pub fn lower_method(
    class: &ClassDef,
    method: &MethodDef,
    enums: &EnumIndex<'_>,
    comments: bool,
) -> Result<Vec<String>> {
    let owner = format!("{}.{}", class.name, method.name);
    let mut lines = Vec::new();

    match MethodEffect::parse(&method.effect, &owner)? {
        MethodEffect::Assign { target, value } => {
            let prop = class.get_property(&target).ok_or_else(|| {
                ScenarioError::UnknownClassReference {
                    kind: "property",
                    name: target.clone(),
                    context: format!("method {}", owner),
                }
            })?;
            if !prop.mutable {
                warn!("{} assigns immutable property '{}'", owner, target);
            }

            // One statement: a right-hand side written across lines is joined
            let rhs = value.lower(&Scope::Method { class }, enums)?.replace(['\r', '\n'], " ");
            if comments {
                lines.push(comment(method.effect.trim()));
            }
            lines.push(format!("global {} = {}", class.global_name(&target), rhs));
        }
        MethodEffect::RawSplice { body } => {
            if comments {
                lines.push(comment(&format!("raw: {}", raw_summary(&body))));
            }
            let statements = split_statements(&body);
            debug!("{}: raw splice with {} statements", owner, statements.len());
            lines.extend(statements);
        }
    }

    Ok(lines)
}

fn assignment<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (&'a str, &'a str), E> {
    let (input, _) = tag("set")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag("this.properties.")(input)?;
    let (input, target) = identifier(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag("to")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, value) = recognize(many1(anychar))(input)?;
    Ok((input, (target, value)))
}

/// Decode backslash escapes in a raw body. A literal CRLF is normalised to `\n`.
pub fn decode_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek().copied() {
                Some('n') => {
                    chars.next();
                    out.push('\n');
                }
                Some('r') => {
                    chars.next();
                    // \r\n as written text is one line break
                    if chars.peek() == Some(&'\\') {
                        let mut ahead = chars.clone();
                        ahead.next();
                        if ahead.peek() == Some(&'n') {
                            chars.next();
                            chars.next();
                            out.push('\n');
                            continue;
                        }
                    }
                    out.push('\r');
                }
                Some('t') => {
                    chars.next();
                    out.push('\t');
                }
                Some(q @ ('"' | '\'' | '\\')) => {
                    chars.next();
                    out.push(q);
                }
                _ => out.push('\\'),
            },
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                out.push('\n');
            }
            other => out.push(other),
        }
    }

    out
}

/// Split a decoded raw body on `;` and line breaks, dropping blank segments.
pub fn split_statements(body: &str) -> Vec<String> {
    body.split(|c| c == ';' || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A single-line `#` comment. Line breaks in `text` become spaces so the
/// payload can never spill into a live statement.
pub fn comment(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!("# {}", flat)
}

fn raw_summary(body: &str) -> String {
    body.chars()
        .take(RAW_SUMMARY_LEN)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

// ============================================================================
// Call effects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Double,
    Int,
    Bool,
    String,
}

impl ArgType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "double" => Some(ArgType::Double),
            "int" => Some(ArgType::Int),
            "bool" => Some(ArgType::Bool),
            "string" => Some(ArgType::String),
            _ => None,
        }
    }
}

/// One literal argument; the type tag is recorded but never emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArg {
    pub ty: Option<ArgType>,
    pub value: String,
}

impl CallArg {
    fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some((head, tail)) = text.split_once(char::is_whitespace) {
            if let Some(ty) = ArgType::from_tag(head) {
                return CallArg {
                    ty: Some(ty),
                    value: tail.trim().to_string(),
                };
            }
        }
        CallArg {
            ty: None,
            value: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEffect {
    pub var: String,
    pub method: String,
    pub args: Vec<CallArg>,
}

impl CallEffect {
    pub fn parse(text: &str) -> Result<Self> {
        match all_consuming(call::<nom::error::Error<&str>>)(text.trim()) {
            Ok((_, (var, method, args))) => Ok(CallEffect {
                var: var.to_string(),
                method: method.to_string(),
                args: args
                    .unwrap_or_default()
                    .into_iter()
                    .map(CallArg::parse)
                    .collect(),
            }),
            Err(_) => Err(ScenarioError::UnsupportedCall {
                effect: text.to_string(),
            }),
        }
    }

    /// Lower to a procedure call statement.
    pub fn lower(&self, bindings: &BindingTable, domain: &Domain, effect: &str) -> Result<String> {
        let class_name = bindings
            .class_of(&self.var)
            .ok_or_else(|| ScenarioError::UnknownBinding {
                var: self.var.clone(),
                effect: effect.to_string(),
            })?;

        let class = domain.get_class(class_name).ok_or_else(|| {
            ScenarioError::UnknownClassReference {
                kind: "class",
                name: class_name.to_string(),
                context: format!("binding '{}'", self.var),
            }
        })?;
        if class.get_method(&self.method).is_none() {
            return Err(ScenarioError::UnknownClassReference {
                kind: "method",
                name: self.method.clone(),
                context: format!("class {}", class.name),
            });
        }

        let args: Vec<&str> = self.args.iter().map(|a| a.value.as_str()).collect();
        Ok(format!("{}({})", class.global_name(&self.method), args.join(", ")))
    }
}

/// Parse and lower a Then-step effect in one go.
pub fn lower_call(effect: &str, bindings: &BindingTable, domain: &Domain) -> Result<String> {
    CallEffect::parse(effect)?.lower(bindings, domain, effect)
}

type CallParts<'a> = (&'a str, &'a str, Option<Vec<&'a str>>);

fn call<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, CallParts<'a>, E> {
    let (input, _) = tag("call")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, _) = tag("values.")(input)?;
    let (input, var) = identifier(input)?;
    let (input, _) = char('.')(input)?;
    let (input, method) = identifier(input)?;
    let (input, args) = opt(preceded(
        tuple((multispace1, tag("with"), multispace1)),
        separated_list1(char(','), argument),
    ))(input)?;
    let (input, _) = multispace0(input)?;
    Ok((input, (var, method, args)))
}

/// One comma-separated argument; commas inside quotes do not split.
fn argument<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    let (input, text) = recognize(many1(alt((
        recognize(delimited(
            char('"'),
            opt(recognize(many1(alt((
                recognize(preceded(char('\\'), anychar)),
                recognize(none_of("\"\\")),
            ))))),
            char('"'),
        )),
        recognize(none_of(",\"")),
    ))))(input)?;
    if text.trim().is_empty() {
        return Err(nom::Err::Error(E::from_error_kind(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((input, text))
}

fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(tuple((
        nom::character::complete::satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        nom::bytes::complete::take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    )))(input)
}

// ============================================================================
// Tests
// ============================================================================
