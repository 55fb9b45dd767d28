//! Notation parser
//!
//! Blocks (`scenario`, `domain`, `klass`, `checks`, `steps`) are located with
//! the brace scanner; the argument list of each construct is parsed with nom.
//! Each construct then has its own matcher that maps the argument list onto a
//! model type and reports shape mismatches as `ScenarioError::Syntax`.
//!
//! ```text
//! item     := ident ws args? ws ('{' body '}')?
//! args     := '(' (arg (',' arg)*)? ','? ')'
//! arg      := key '=' value | value
//! key      := ident | string
//! value    := string | list | bare
//! list     := '[' (entry (',' entry)*)? ','? ']'
//! entry    := string ':' value | value
//! string   := '"' escaped '"' | 'r' '#'* '"' verbatim '"' '#'*
//! bare     := [A-Za-z0-9_.+-]+
//! ```

use std::ops::Range;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{anychar, char, multispace1, none_of, not_line_ending, satisfy},
    combinator::{map, opt, recognize, value},
    error::{ErrorKind, ParseError as NomParseError},
    multi::{many0_count, separated_list0},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};
use tracing::debug;

use super::scanner::{balanced_body, line_of, skip_trivia};
use crate::error::{Result, ScenarioError};
use crate::model::{
    Check, ClassDef, Domain, EnumDef, MethodDef, ParamDef, PropertyDef, ScenarioFile, Step,
    ValueRef,
};

// ============================================================================
// Public API
// ============================================================================

/// Parse notation text into a scenario model.
pub fn parse_notation(src: &str) -> Result<ScenarioFile> {
    NotationParser { src }.scenario()
}

// ============================================================================
// Argument values
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Bare(String),
    List(Vec<Value>),
    /// `"key": value`, only inside lists
    Pair(String, Box<Value>),
}

impl Value {
    fn describe(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Bare(_) => "bare token",
            Value::List(_) => "list",
            Value::Pair(..) => "pair",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub key: Option<String>,
    pub value: Value,
}

/// One construct found in a block body.
#[derive(Debug)]
struct Item<'a> {
    name: &'a str,
    offset: usize,
    args: Option<Vec<Arg>>,
    body: Option<Range<usize>>,
}

// ============================================================================
// Block structure
// ============================================================================

struct NotationParser<'a> {
    src: &'a str,
}

impl<'a> NotationParser<'a> {
    fn line(&self, offset: usize) -> usize {
        line_of(self.src, offset)
    }

    fn scenario(&self) -> Result<ScenarioFile> {
        let items = self.items(0..self.src.len(), "scenario")?;
        let mut scenario = None;

        for item in items {
            if item.name != "scenario" {
                return Err(ScenarioError::syntax(
                    item.name,
                    self.line(item.offset),
                    "only a single scenario(..) { } block may appear at top level",
                ));
            }
            if scenario.is_some() {
                return Err(ScenarioError::syntax(
                    "scenario",
                    self.line(item.offset),
                    "duplicate scenario block",
                ));
            }
            scenario = Some(item);
        }

        let item = scenario.ok_or(ScenarioError::MissingBlock { block: "scenario" })?;
        let body = self.require_body(&item)?;
        let args = Args::new(&item, self.line(item.offset))?;
        let title = args.string(0, "title")?;
        args.finish(1)?;

        let mut domain = None;
        let mut checks = None;
        let mut steps = None;

        for block in self.items(body, "scenario")? {
            let slot = match block.name {
                "domain" => &mut domain,
                "checks" => &mut checks,
                "steps" => &mut steps,
                other => {
                    return Err(ScenarioError::syntax(
                        other,
                        self.line(block.offset),
                        "unknown block; expected domain, checks or steps",
                    ))
                }
            };
            if slot.is_some() {
                return Err(ScenarioError::syntax(
                    block.name,
                    self.line(block.offset),
                    "duplicate block",
                ));
            }
            self.expect_no_args(&block)?;
            *slot = Some(self.require_body(&block)?);
        }

        let domain = self.domain(domain.ok_or(ScenarioError::MissingBlock { block: "domain" })?)?;
        let checks = match checks {
            Some(range) => self.checks(range)?,
            None => Vec::new(),
        };
        let steps = self.steps(steps.ok_or(ScenarioError::MissingBlock { block: "steps" })?)?;

        debug!(
            "parsed notation '{}': {} enums, {} classes, {} checks, {} steps",
            title,
            domain.enums.len(),
            domain.classes.len(),
            checks.len(),
            steps.len()
        );

        Ok(ScenarioFile {
            scenario: title,
            checks,
            domain,
            steps,
        })
    }

    fn domain(&self, range: Range<usize>) -> Result<Domain> {
        let mut domain = Domain::default();

        for item in self.items(range, "domain")? {
            match item.name {
                "enumType" => {
                    self.expect_no_body(&item)?;
                    domain.enums.push(self.enum_type(&item)?);
                }
                "klass" => domain.classes.push(self.klass(&item)?),
                other => {
                    return Err(ScenarioError::syntax(
                        other,
                        self.line(item.offset),
                        "expected enumType(..) or klass(..) { }",
                    ))
                }
            }
        }

        Ok(domain)
    }

    fn enum_type(&self, item: &Item<'_>) -> Result<EnumDef> {
        let args = Args::new(item, self.line(item.offset))?;
        if args.positional.is_empty() {
            return Err(args.error("expected an enum name"));
        }
        let name = args.string(0, "enum name")?;
        let values = (1..args.positional.len())
            .map(|i| args.string(i, "enum member"))
            .collect::<Result<Vec<_>>>()?;
        args.finish(args.positional.len())?;
        Ok(EnumDef { name, values })
    }

    fn klass(&self, item: &Item<'_>) -> Result<ClassDef> {
        let body = self.require_body(item)?;
        let args = Args::new(item, self.line(item.offset))?;
        let name = args.string(0, "class name")?;
        args.finish(1)?;

        let mut class = ClassDef {
            name,
            ..ClassDef::default()
        };

        for member in self.items(body, item.name)? {
            self.expect_no_body(&member)?;
            match member.name {
                "prop" => class.properties.push(self.prop(&member)?),
                "method" => class.methods.push(self.method(&member)?),
                other => {
                    return Err(ScenarioError::syntax(
                        other,
                        self.line(member.offset),
                        "expected prop(..) or method(..)",
                    ))
                }
            }
        }

        Ok(class)
    }

    fn prop(&self, item: &Item<'_>) -> Result<PropertyDef> {
        let mut args = Args::new(item, self.line(item.offset))?;
        let name = args.string(0, "property name")?;
        let ty = args.string(1, "property type")?;
        let mutable = match args.take_named("mutable") {
            None => false,
            Some(Value::Bare(b)) if b == "true" => true,
            Some(Value::Bare(b)) if b == "false" => false,
            Some(other) => {
                return Err(args.error(format!(
                    "mutable must be true or false, found {}",
                    other.describe()
                )))
            }
        };
        let initial = match args.take_named("initial") {
            None => None,
            Some(v) => Some(args.text(v, "initial")?),
        };
        args.finish(2)?;

        Ok(PropertyDef {
            name,
            ty,
            mutable,
            initial,
        })
    }

    fn method(&self, item: &Item<'_>) -> Result<MethodDef> {
        let mut args = Args::new(item, self.line(item.offset))?;
        let name = args.string(0, "method name")?;

        let inputs = match args.take_named("inputs") {
            None => Vec::new(),
            Some(Value::List(entries)) => entries
                .into_iter()
                .map(|entry| match entry {
                    Value::Pair(name, ty) => match *ty {
                        Value::Str(ty) => Ok(ParamDef { name, ty }),
                        other => Err(args.error(format!(
                            "input '{}' type must be a string, found {}",
                            name,
                            other.describe()
                        ))),
                    },
                    other => Err(args.error(format!(
                        "inputs entries must be \"name\": \"type\", found {}",
                        other.describe()
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(args.error(format!("inputs must be a list, found {}", other.describe())))
            }
        };

        let effect = match args.take_named("effect") {
            Some(Value::Str(effect)) => effect,
            Some(other) => {
                return Err(args.error(format!("effect must be a string, found {}", other.describe())))
            }
            None => return Err(args.error("missing effect = \"...\"")),
        };
        args.finish(1)?;

        Ok(MethodDef {
            name,
            inputs,
            effect,
        })
    }

    fn checks(&self, range: Range<usize>) -> Result<Vec<Check>> {
        self.items(range, "checks")?
            .into_iter()
            .map(|item| {
                if item.name != "check" {
                    return Err(ScenarioError::syntax(
                        item.name,
                        self.line(item.offset),
                        "expected check(..)",
                    ));
                }
                self.expect_no_body(&item)?;
                let args = Args::new(&item, self.line(item.offset))?;
                let check = Check {
                    name: args.string(0, "check name")?,
                    predicate: args.string(1, "predicate")?,
                };
                args.finish(2)?;
                Ok(check)
            })
            .collect()
    }

    fn steps(&self, range: Range<usize>) -> Result<Vec<Step>> {
        let mut steps = Vec::new();

        for item in self.items(range, "steps")? {
            self.expect_no_body(&item)?;
            let line = self.line(item.offset);
            let mut args = if item.name == "given" {
                Args::with_repeated_keys(&item, line)?
            } else {
                Args::new(&item, line)?
            };
            let step = match item.name {
                "given" => {
                    let values = std::mem::take(&mut args.named)
                        .into_iter()
                        .map(|(name, v)| match v {
                            Value::Str(ty) => Ok(ValueRef { name, ty }),
                            other => Err(args.error(format!(
                                "binding '{}' must name a class string, found {}",
                                name,
                                other.describe()
                            ))),
                        })
                        .collect::<Result<Vec<_>>>()?;
                    args.finish(0)?;
                    Step::Given { values }
                }
                "whenCond" => {
                    let condition = args.string(0, "condition")?;
                    args.finish(1)?;
                    Step::When { condition }
                }
                "then" => {
                    let effect = args.string(0, "effect")?;
                    args.finish(1)?;
                    Step::Then { effect }
                }
                other => {
                    return Err(ScenarioError::syntax(
                        other,
                        self.line(item.offset),
                        "expected given(..), whenCond(..) or then(..)",
                    ))
                }
            };
            steps.push(step);
        }

        Ok(steps)
    }

    // ------------------------------------------------------------------------
    // Item scanning
    // ------------------------------------------------------------------------

    /// Split a block body into its constructs.
    fn items(&self, range: Range<usize>, block: &str) -> Result<Vec<Item<'a>>> {
        let src = self.src;
        let end = range.end;
        let mut pos = range.start;
        let mut items = Vec::new();

        loop {
            pos = skip_trivia(src, pos, end);
            if pos >= end {
                break;
            }

            let offset = pos;
            let name = match identifier::<nom::error::Error<&str>>(&src[pos..end]) {
                Ok((_, name)) => name,
                Err(_) => {
                    return Err(ScenarioError::syntax(
                        block,
                        self.line(pos),
                        format!("expected a construct, found '{}'", snippet(&src[pos..end])),
                    ))
                }
            };
            pos = skip_trivia(src, pos + name.len(), end);

            let args = if src[pos..end].starts_with('(') {
                match arg_list::<nom::error::Error<&str>>(&src[pos..end]) {
                    Ok((rest, args)) => {
                        pos = end - rest.len();
                        Some(args)
                    }
                    Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                        let at = end - e.input.len();
                        return Err(ScenarioError::syntax(
                            name,
                            self.line(at),
                            format!("malformed arguments near '{}'", snippet(e.input)),
                        ));
                    }
                    Err(nom::Err::Incomplete(_)) => {
                        return Err(ScenarioError::syntax(name, self.line(pos), "incomplete input"))
                    }
                }
            } else {
                None
            };

            let after = skip_trivia(src, pos, end);
            let body = if src[after..end].starts_with('{') {
                let (inner, next) = balanced_body(src, after, end, name)?;
                pos = next;
                Some(inner)
            } else {
                None
            };

            items.push(Item {
                name,
                offset,
                args,
                body,
            });
        }

        Ok(items)
    }

    fn require_body(&self, item: &Item<'_>) -> Result<Range<usize>> {
        item.body.clone().ok_or_else(|| {
            ScenarioError::syntax(item.name, self.line(item.offset), "expected a { } block")
        })
    }

    fn expect_no_body(&self, item: &Item<'_>) -> Result<()> {
        match item.body {
            Some(_) => Err(ScenarioError::syntax(
                item.name,
                self.line(item.offset),
                "unexpected { } block",
            )),
            None => Ok(()),
        }
    }

    fn expect_no_args(&self, item: &Item<'_>) -> Result<()> {
        match &item.args {
            Some(args) if !args.is_empty() => Err(ScenarioError::syntax(
                item.name,
                self.line(item.offset),
                "block takes no arguments",
            )),
            _ => Ok(()),
        }
    }
}

fn snippet(s: &str) -> String {
    let line = s.lines().next().unwrap_or("");
    line.chars().take(24).collect()
}

// ============================================================================
// Construct matchers
// ============================================================================

/// Argument list of one construct, split into positional and named values.
struct Args {
    construct: String,
    line: usize,
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
}

impl Args {
    fn new(item: &Item<'_>, line: usize) -> Result<Self> {
        Self::collect(item, line, false)
    }

    /// Like `new`, but a key may repeat; order is kept. Used by `given`,
    /// whose duplicate bindings are reported by validation instead.
    fn with_repeated_keys(item: &Item<'_>, line: usize) -> Result<Self> {
        Self::collect(item, line, true)
    }

    fn collect(item: &Item<'_>, line: usize, repeated_keys: bool) -> Result<Self> {
        let args = item
            .args
            .clone()
            .ok_or_else(|| ScenarioError::syntax(item.name, line, "expected (..) arguments"))?;

        let mut positional = Vec::new();
        let mut named = Vec::new();
        for arg in args {
            match arg.key {
                Some(key) => {
                    if !repeated_keys && named.iter().any(|(k, _)| *k == key) {
                        return Err(ScenarioError::syntax(
                            item.name,
                            line,
                            format!("argument '{}' given twice", key),
                        ));
                    }
                    named.push((key, arg.value));
                }
                None if !named.is_empty() => {
                    return Err(ScenarioError::syntax(
                        item.name,
                        line,
                        "positional argument after named argument",
                    ))
                }
                None => positional.push(arg.value),
            }
        }

        Ok(Self {
            construct: item.name.to_string(),
            line,
            positional,
            named,
        })
    }

    fn error(&self, message: impl Into<String>) -> ScenarioError {
        ScenarioError::syntax(&self.construct, self.line, message)
    }

    fn string(&self, index: usize, what: &str) -> Result<String> {
        match self.positional.get(index) {
            Some(Value::Str(s)) => Ok(s.clone()),
            Some(other) => Err(self.error(format!(
                "{} must be a string, found {}",
                what,
                other.describe()
            ))),
            None => Err(self.error(format!("missing {}", what))),
        }
    }

    fn text(&self, value: Value, what: &str) -> Result<String> {
        match value {
            Value::Str(s) | Value::Bare(s) => Ok(s),
            other => Err(self.error(format!(
                "{} must be a string or token, found {}",
                what,
                other.describe()
            ))),
        }
    }

    fn take_named(&mut self, key: &str) -> Option<Value> {
        let idx = self.named.iter().position(|(k, _)| k == key)?;
        Some(self.named.remove(idx).1)
    }

    /// Reject leftover named arguments and positional arguments past `expected`.
    fn finish(&self, expected: usize) -> Result<()> {
        if let Some((key, _)) = self.named.first() {
            return Err(self.error(format!("unknown argument '{}'", key)));
        }
        if self.positional.len() > expected {
            return Err(self.error(format!(
                "expected {} positional argument(s), found {}",
                expected,
                self.positional.len()
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Argument parsers
// ============================================================================

fn ws<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value(
        (),
        many0_count(alt((
            multispace1,
            recognize(preceded(tag("//"), not_line_ending)),
        ))),
    )(input)
}

fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn comma<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value((), tuple((ws, char(','), ws)))(input)
}

fn trailing_comma<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value((), pair(ws, opt(pair(char(','), ws))))(input)
}

fn arg_list<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Vec<Arg>, E> {
    delimited(
        pair(char('('), ws),
        terminated(separated_list0(comma, argument), trailing_comma),
        char(')'),
    )(input)
}

fn argument<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Arg, E> {
    alt((
        map(
            separated_pair(arg_key, tuple((ws, char('='), ws)), arg_value),
            |(key, value)| Arg {
                key: Some(key),
                value,
            },
        ),
        map(arg_value, |value| Arg { key: None, value }),
    ))(input)
}

fn arg_key<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    alt((map(identifier, str::to_string), string_literal))(input)
}

fn arg_value<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    alt((
        map(string_literal, Value::Str),
        list,
        map(bare_token, |s: &str| Value::Bare(s.to_string())),
    ))(input)
}

fn list<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    map(
        delimited(
            pair(char('['), ws),
            terminated(separated_list0(comma, list_entry), trailing_comma),
            char(']'),
        ),
        Value::List,
    )(input)
}

fn list_entry<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    alt((
        map(
            separated_pair(string_literal, tuple((ws, char(':'), ws)), arg_value),
            |(key, value)| Value::Pair(key, Box::new(value)),
        ),
        arg_value,
    ))(input)
}

pub(crate) fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '+' | '-')
}

fn bare_token<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while1(is_bare_char)(input)
}

fn string_literal<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    alt((raw_string, quoted_string))(input)
}

fn quoted_string<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    map(
        recognize(delimited(
            char('"'),
            many0_count(alt((preceded(char('\\'), anychar), none_of("\"\\")))),
            char('"'),
        )),
        |s: &str| unescape(&s[1..s.len() - 1]),
    )(input)
}

fn raw_string<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    let (input, _) = char('r')(input)?;
    let (input, hashes) = many0_count(char('#'))(input)?;
    let (input, _) = char('"')(input)?;
    let closing = format!("\"{}", "#".repeat(hashes));
    match input.find(&closing) {
        Some(idx) => Ok((&input[idx + closing.len()..], input[..idx].to_string())),
        None => Err(nom::Err::Failure(E::from_error_kind(input, ErrorKind::TakeUntil))),
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const TRAFFIC_LIGHT: &str = r##"
// traffic light controller
scenario("Traffic light") {
    domain {
        enumType("LightStatus", "GREEN", "RED", "YELLOW")
        klass("Light") {
            prop("status", "enums.LightStatus", mutable = true, initial = LightStatus.GREEN)
            method("turnRed", effect = "set this.properties.status to LightStatus.RED")
        }
        klass("Program") {
            method("whenGreen", inputs = ["speed": "double", "count": "int"], effect = r#"raw:textmsg("go {now}")
sleep(1)"#)
        }
    }
    checks {
        check("isGreen", "values.light.status == LightStatus.GREEN")
    }
    steps {
        given(light = "Light", prog = "Program")
        whenCond("checks.isGreen")
        then("call values.prog.whenGreen")
    }
}
"##;

    #[test]
    fn test_parse_full_scenario() {
        let file = parse_notation(TRAFFIC_LIGHT).unwrap();
        assert_eq!(file.scenario, "Traffic light");
        assert_eq!(file.domain.enums[0].values, vec!["GREEN", "RED", "YELLOW"]);

        let light = file.domain.get_class("Light").unwrap();
        assert_eq!(light.properties[0].ty, "enums.LightStatus");
        assert!(light.properties[0].mutable);
        assert_eq!(light.properties[0].initial.as_deref(), Some("LightStatus.GREEN"));

        let program = file.domain.get_class("Program").unwrap();
        assert_eq!(program.methods[0].inputs.len(), 2);
        assert_eq!(program.methods[0].inputs[1].ty, "int");
        assert_eq!(program.methods[0].effect, "raw:textmsg(\"go {now}\")\nsleep(1)");

        assert_eq!(file.checks[0].predicate, "values.light.status == LightStatus.GREEN");
        assert_eq!(file.given().unwrap().len(), 2);
        assert_eq!(file.given().unwrap()[1].name, "prog");
        assert_eq!(file.when(), Some("checks.isGreen"));
        assert_eq!(file.then(), Some("call values.prog.whenGreen"));
    }

    #[test]
    fn test_parens_and_braces_inside_literals() {
        let src = r#"scenario("t (draft) {1}") {
            domain { }
            checks { check("c", "(values.a.x + 1) > (2)") }
            steps { then("call values.a.b with string \"x)\"") }
        }"#;
        let file = parse_notation(src).unwrap();
        assert_eq!(file.scenario, "t (draft) {1}");
        assert_eq!(file.checks[0].predicate, "(values.a.x + 1) > (2)");
        assert_eq!(file.then(), Some("call values.a.b with string \"x)\""));
    }

    #[test]
    fn test_checks_block_optional() {
        let file = parse_notation("scenario(\"s\") { domain { } steps { } }").unwrap();
        assert!(file.checks.is_empty());
        assert!(file.steps.is_empty());
    }

    #[test]
    fn test_missing_blocks() {
        let err = parse_notation("scenario(\"s\") { steps { } }").unwrap_err();
        assert!(matches!(err, ScenarioError::MissingBlock { block: "domain" }));

        let err = parse_notation("scenario(\"s\") { domain { } }").unwrap_err();
        assert!(matches!(err, ScenarioError::MissingBlock { block: "steps" }));

        let err = parse_notation("  // nothing here\n").unwrap_err();
        assert!(matches!(err, ScenarioError::MissingBlock { block: "scenario" }));
    }

    #[test]
    fn test_unbalanced_class_block() {
        let src = "scenario(\"s\") {\n domain {\n  klass(\"A\") {\n   prop(\"x\", \"int\")\n }\n steps { }\n}";
        let err = parse_notation(src).unwrap_err();
        assert!(matches!(err, ScenarioError::UnbalancedBlock { ref block, line: 1 } if block == "scenario"));

        let src = "scenario(\"s\") {\n domain {\n  klass(\"A\") {\n }\n steps { }\n}\n}";
        let err = parse_notation(src).unwrap_err();
        assert!(err.is_notation_error());
    }

    #[test]
    fn test_syntax_errors_carry_line() {
        let src = "scenario(\"s\") {\n domain {\n  klass(\"A\") {\n   prop(\"x\", mutable = yes)\n  }\n }\n steps { }\n}";
        match parse_notation(src).unwrap_err() {
            ScenarioError::Syntax {
                construct, line, ..
            } => {
                assert_eq!(construct, "prop");
                assert_eq!(line, 4);
            }
            other => panic!("Expected Syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_constructs_rejected() {
        for src in [
            "scenario(\"s\") { domain { widget(\"x\") } steps { } }",
            "scenario(\"s\") { domain { } steps { } extras { } }",
            "scenario(\"s\") { domain { } steps { given(\"light\") } }",
            "scenario(\"s\") { domain { } steps { then(\"a\", \"b\") } }",
            "scenario(\"s\") { domain { klass(\"A\") } steps { } }",
            "scenario(\"s\") { domain { klass(\"A\") { method(\"m\") } } steps { } }",
            "scenario(\"s\") { domain { } steps { } } trailing",
            "scenario(\"s\") { domain { } domain { } steps { } }",
        ] {
            let err = parse_notation(src).unwrap_err();
            assert!(
                matches!(err, ScenarioError::Syntax { .. }),
                "{} should be a syntax error, got {:?}",
                src,
                err
            );
        }
    }

    #[test]
    fn test_given_keeps_repeated_bindings_in_order() {
        let src = "scenario(\"s\") { domain { } steps { given(r = \"Robot\", r = \"Arm\") } }";
        let file = parse_notation(src).unwrap();
        let given = file.given().unwrap();
        assert_eq!(given.len(), 2);
        assert_eq!(given[0].ty, "Robot");
        assert_eq!(given[1].ty, "Arm");

        let src = "scenario(\"s\") { domain { klass(\"A\") { prop(\"x\", \"int\", mutable = true, mutable = false) } } steps { } }";
        match parse_notation(src).unwrap_err() {
            ScenarioError::Syntax {
                construct, message, ..
            } => {
                assert_eq!(construct, "prop");
                assert!(message.contains("given twice"));
            }
            other => panic!("Expected Syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_quoted_given_keys_and_trailing_commas() {
        let src = r#"scenario("s") {
            domain { enumType("E", "A", "B",) }
            steps { given("my light" = "Light",) }
        }"#;
        let file = parse_notation(src).unwrap();
        assert_eq!(file.domain.enums[0].values, vec!["A", "B"]);
        assert_eq!(file.given().unwrap()[0].name, "my light");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#"a\"b\\c\nd\te\q"#), "a\"b\\c\nd\te\\q");
    }

    #[test]
    fn test_arg_values() {
        let (rest, args) =
            arg_list::<nom::error::Error<&str>>(r#"("a", b = 1.5, c = ["k": "v", -2], r"x")tail"#)
                .unwrap();
        assert_eq!(rest, "tail");
        assert_eq!(args.len(), 4);
        assert_eq!(args[1].value, Value::Bare("1.5".into()));
        assert_eq!(
            args[2].value,
            Value::List(vec![
                Value::Pair("k".into(), Box::new(Value::Str("v".into()))),
                Value::Bare("-2".into()),
            ])
        );
        assert_eq!(args[3].value, Value::Str("x".into()));
    }
}
