//! Expression translator
//!
//! Expressions are a flat token stream, not a grammar with precedence. The
//! tokenizer only picks out dotted paths and classifies them; everything
//! else (numbers, operators, parentheses, quoted strings, whitespace) is kept
//! verbatim as `Term::Literal`.
//!
//! ```text
//! LightStatus.GREEN          -> EnumRef   -> LightStatus_GREEN
//! this.properties.xPos       -> PropRef   -> Robot_xPos          (method scope)
//! values.light.status        -> BoundRef  -> Light_status        (step scope, must be bound)
//! light.status               -> BoundRef  -> Light_status        (step scope, left as-is if unbound)
//! ```
//!
//! Enum references are resolved before bound paths, so `Enum.MEMBER` never
//! collides with a variable that happens to share the enum's name.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{take, take_while, take_while1},
    character::complete::{anychar, char, none_of, satisfy},
    combinator::{map, recognize},
    error::ParseError as NomParseError,
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::{Result, ScenarioError};
use crate::model::{ClassDef, EnumDef, ValueRef};

// ============================================================================
// Public API
// ============================================================================

/// Translate a step-scope expression (check predicate, property initial) into
/// flat target identifiers.
pub fn translate(expr: &str, enums: &EnumIndex<'_>, bindings: &BindingTable) -> Result<String> {
    Expr::parse(expr).lower(&Scope::Bindings(bindings), enums)
}

/// Declared enums by name.
#[derive(Debug, Clone, Default)]
pub struct EnumIndex<'a> {
    enums: HashMap<&'a str, &'a EnumDef>,
}

impl<'a> EnumIndex<'a> {
    pub fn new(enums: &'a [EnumDef]) -> Self {
        Self {
            enums: enums.iter().map(|e| (e.name.as_str(), e)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a EnumDef> {
        self.enums.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }
}

/// Given-step variable to class name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingTable {
    bindings: BTreeMap<String, String>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: &[ValueRef]) -> Self {
        let mut table = Self::new();
        for v in values {
            table.bind(&v.name, &v.ty);
        }
        table
    }

    pub fn bind(&mut self, var: impl Into<String>, class: impl Into<String>) {
        self.bindings.insert(var.into(), class.into());
    }

    pub fn class_of(&self, var: &str) -> Option<&str> {
        self.bindings.get(var).map(String::as_str)
    }

    /// Whether any variable is bound to `class`.
    pub fn binds_class(&self, class: &str) -> bool {
        self.bindings.values().any(|c| c == class)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }
}

/// Where an expression is being lowered.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    /// Method body: `this.properties.*` resolves against the owning class,
    /// bound paths are left untouched.
    Method { class: &'a ClassDef },
    /// Check predicates and initial values: bound paths resolve through the
    /// Given bindings.
    Bindings(&'a BindingTable),
}

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `Enum.MEMBER`
    EnumRef { enum_name: String, member: String },
    /// `this.properties.<name>`
    PropRef { name: String },
    /// `values.<var>.<prop>` (qualified) or `<var>.<prop>`
    BoundRef {
        var: String,
        prop: String,
        qualified: bool,
    },
    /// Verbatim text
    Literal(String),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::EnumRef { enum_name, member } => write!(f, "{}.{}", enum_name, member),
            Term::PropRef { name } => write!(f, "this.properties.{}", name),
            Term::BoundRef {
                var,
                prop,
                qualified: true,
            } => write!(f, "values.{}.{}", var, prop),
            Term::BoundRef { var, prop, .. } => write!(f, "{}.{}", var, prop),
            Term::Literal(text) => f.write_str(text),
        }
    }
}

/// A tokenized expression. Displaying it reproduces the source text exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expr {
    pub terms: Vec<Term>,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for term in &self.terms {
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}

impl Expr {
    /// Tokenize an expression. Never fails: unrecognised text becomes literals.
    pub fn parse(input: &str) -> Self {
        let mut terms: Vec<Term> = Vec::new();
        let mut rest = input;

        while !rest.is_empty() {
            match token::<nom::error::Error<&str>>(rest) {
                Ok((next, produced)) => {
                    for term in produced {
                        push_term(&mut terms, term);
                    }
                    rest = next;
                }
                Err(_) => {
                    push_term(&mut terms, Term::Literal(rest.to_string()));
                    break;
                }
            }
        }

        Expr { terms }
    }

    /// Rewrite references into flat target identifiers.
    pub fn lower(&self, scope: &Scope<'_>, enums: &EnumIndex<'_>) -> Result<String> {
        let mut out = String::new();
        for term in &self.terms {
            out.push_str(&lower_term(term, scope, enums, self)?);
        }
        Ok(out)
    }

    /// Property names referenced through `this.properties.*`.
    pub fn prop_refs(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().filter_map(|t| match t {
            Term::PropRef { name } => Some(name.as_str()),
            _ => None,
        })
    }
}

fn push_term(terms: &mut Vec<Term>, term: Term) {
    if let Term::Literal(text) = &term {
        if let Some(Term::Literal(prev)) = terms.last_mut() {
            prev.push_str(text);
            return;
        }
    }
    terms.push(term);
}

fn lower_term(term: &Term, scope: &Scope<'_>, enums: &EnumIndex<'_>, expr: &Expr) -> Result<String> {
    match (term, scope) {
        (Term::EnumRef { enum_name, member }, _) if enums.contains(enum_name) => {
            Ok(format!("{}_{}", enum_name, member))
        }
        // Not a declared enum: it is an ordinary two-segment path after all
        (Term::EnumRef { enum_name, member }, Scope::Bindings(bindings)) => {
            Ok(match bindings.class_of(enum_name) {
                Some(class) => format!("{}_{}", class, member),
                None => term.to_string(),
            })
        }
        (Term::PropRef { name }, Scope::Method { class }) => {
            if class.get_property(name).is_none() {
                return Err(ScenarioError::UnknownClassReference {
                    kind: "property",
                    name: name.clone(),
                    context: format!("class {}", class.name),
                });
            }
            Ok(class.global_name(name))
        }
        (
            Term::BoundRef {
                var,
                prop,
                qualified,
            },
            Scope::Bindings(bindings),
        ) => match bindings.class_of(var) {
            Some(class) => Ok(format!("{}_{}", class, prop)),
            None if *qualified => Err(ScenarioError::UnresolvedReference {
                var: var.clone(),
                reference: term.to_string(),
                expr: expr.to_string(),
            }),
            None => Ok(term.to_string()),
        },
        _ => Ok(term.to_string()),
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

fn token<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Vec<Term>, E> {
    alt((
        map(path, classify_path),
        map(alt((number, quoted_string, operators)), |s: &str| {
            vec![Term::Literal(s.to_string())]
        }),
        // Unterminated quote or anything else the rules above refuse
        map(take(1usize), |s: &str| vec![Term::Literal(s.to_string())]),
    ))(input)
}

fn identifier<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn path<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Vec<&'a str>, E> {
    let (input, first) = identifier(input)?;
    let (input, rest) = many0(preceded(char('.'), identifier))(input)?;
    let mut segments = Vec::with_capacity(rest.len() + 1);
    segments.push(first);
    segments.extend(rest);
    Ok((input, segments))
}

/// Digits followed by anything number-like, so `1.5` and `2e3` stay whole.
fn number<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        satisfy(|c| c.is_ascii_digit()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
    ))(input)
}

fn quoted_string<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    alt((
        recognize(delimited(
            char('"'),
            many0(alt((preceded(char('\\'), anychar), none_of("\"\\")))),
            char('"'),
        )),
        recognize(delimited(
            char('\''),
            many0(alt((preceded(char('\\'), anychar), none_of("'\\")))),
            char('\''),
        )),
    ))(input)
}

fn operators<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| {
        !(c.is_ascii_alphanumeric() || c == '_' || c == '"' || c == '\'')
    })(input)
}

fn is_enum_member(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase() || c == '_')
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn classify_path(segments: Vec<&str>) -> Vec<Term> {
    let (head, consumed) = match segments.as_slice() {
        [enum_name, member] if is_enum_member(member) => (
            Term::EnumRef {
                enum_name: enum_name.to_string(),
                member: member.to_string(),
            },
            2,
        ),
        ["this", "properties", name, ..] => (
            Term::PropRef {
                name: name.to_string(),
            },
            3,
        ),
        ["values", var, prop, ..] => (
            Term::BoundRef {
                var: var.to_string(),
                prop: prop.to_string(),
                qualified: true,
            },
            3,
        ),
        [var, prop, ..] => (
            Term::BoundRef {
                var: var.to_string(),
                prop: prop.to_string(),
                qualified: false,
            },
            2,
        ),
        _ => (Term::Literal(segments.join(".")), segments.len()),
    };

    let mut terms = vec![head];
    if consumed < segments.len() {
        terms.push(Term::Literal(format!(".{}", segments[consumed..].join("."))));
    }
    terms
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PropertyDef;

    fn light_status() -> Vec<EnumDef> {
        vec![EnumDef {
            name: "LightStatus".into(),
            values: vec!["GREEN".into(), "RED".into(), "YELLOW".into()],
        }]
    }

    fn robot() -> ClassDef {
        ClassDef {
            name: "Robot".into(),
            properties: vec![PropertyDef {
                name: "xPos".into(),
                ty: "double".into(),
                mutable: true,
                initial: None,
            }],
            methods: vec![],
        }
    }

    fn bindings() -> BindingTable {
        let mut table = BindingTable::new();
        table.bind("light", "Light");
        table.bind("prog", "Program");
        table
    }

    #[test]
    fn test_enum_member_reference() {
        let enums = light_status();
        let out = translate("LightStatus.RED", &EnumIndex::new(&enums), &bindings()).unwrap();
        assert_eq!(out, "LightStatus_RED");
    }

    #[test]
    fn test_qualified_bound_path() {
        let enums = light_status();
        let out = translate(
            "values.light.status == LightStatus.GREEN",
            &EnumIndex::new(&enums),
            &bindings(),
        )
        .unwrap();
        assert_eq!(out, "Light_status == LightStatus_GREEN");
    }

    #[test]
    fn test_bare_bound_path() {
        let out = translate("light.status != 0", &EnumIndex::default(), &bindings()).unwrap();
        assert_eq!(out, "Light_status != 0");
    }

    #[test]
    fn test_unbound_qualified_path_fails() {
        let err = translate("values.robot.xPos > 1", &EnumIndex::default(), &bindings()).unwrap_err();
        match err {
            ScenarioError::UnresolvedReference { var, reference, .. } => {
                assert_eq!(var, "robot");
                assert_eq!(reference, "values.robot.xPos");
            }
            other => panic!("Expected UnresolvedReference, got {:?}", other),
        }
    }

    #[test]
    fn test_unbound_bare_path_untouched() {
        let out = translate("math.pi * 2", &EnumIndex::default(), &bindings()).unwrap();
        assert_eq!(out, "math.pi * 2");
    }

    #[test]
    fn test_numeric_literals_pass_through() {
        let out = translate("(light.level + 0.25) * 3.5e2", &EnumIndex::default(), &bindings()).unwrap();
        assert_eq!(out, "(Light_level + 0.25) * 3.5e2");
    }

    #[test]
    fn test_undeclared_enum_falls_back_to_binding() {
        let mut table = BindingTable::new();
        table.bind("Mode", "Controller");
        let out = translate("Mode.AUTO", &EnumIndex::default(), &table).unwrap();
        assert_eq!(out, "Controller_AUTO");

        let out = translate("Other.AUTO", &EnumIndex::default(), &table).unwrap();
        assert_eq!(out, "Other.AUTO");
    }

    #[test]
    fn test_enum_wins_over_binding_with_same_name() {
        let enums = light_status();
        let mut table = BindingTable::new();
        table.bind("LightStatus", "Light");
        let out = translate("LightStatus.RED", &EnumIndex::new(&enums), &table).unwrap();
        assert_eq!(out, "LightStatus_RED");
    }

    #[test]
    fn test_lowercase_member_is_not_enum_ref() {
        let enums = light_status();
        let expr = Expr::parse("LightStatus.red");
        assert!(matches!(expr.terms[0], Term::BoundRef { .. }));
        let out = expr.lower(&Scope::Bindings(&bindings()), &EnumIndex::new(&enums)).unwrap();
        assert_eq!(out, "LightStatus.red");
    }

    #[test]
    fn test_method_scope() {
        let class = robot();
        let expr = Expr::parse("this.properties.xPos + amount");
        let out = expr
            .lower(&Scope::Method { class: &class }, &EnumIndex::default())
            .unwrap();
        assert_eq!(out, "Robot_xPos + amount");
    }

    #[test]
    fn test_method_scope_leaves_bound_paths() {
        let class = robot();
        let expr = Expr::parse("values.light.status");
        let out = expr
            .lower(&Scope::Method { class: &class }, &EnumIndex::default())
            .unwrap();
        assert_eq!(out, "values.light.status");
    }

    #[test]
    fn test_method_scope_unknown_property() {
        let class = robot();
        let expr = Expr::parse("this.properties.yPos");
        let err = expr
            .lower(&Scope::Method { class: &class }, &EnumIndex::default())
            .unwrap_err();
        assert!(matches!(err, ScenarioError::UnknownClassReference { kind: "property", .. }));
    }

    #[test]
    fn test_display_reproduces_source() {
        for src in [
            "values.light.status == LightStatus.GREEN and (x.y.z > 1.5)",
            "this.properties.a.b + 'it''s' + \"q\\\"uote\"",
            "\"unterminated",
            "",
            "  spaced  ",
        ] {
            assert_eq!(Expr::parse(src).to_string(), src);
        }
    }

    #[test]
    fn test_long_paths_keep_tail() {
        let expr = Expr::parse("values.light.pose.x");
        assert_eq!(expr.terms.len(), 2);
        assert_eq!(expr.terms[1], Term::Literal(".x".into()));
        let out = expr.lower(&Scope::Bindings(&bindings()), &EnumIndex::default()).unwrap();
        assert_eq!(out, "Light_pose.x");
    }

    #[test]
    fn test_quoted_strings_are_opaque() {
        let out = translate("\"light.status\" + light.status", &EnumIndex::default(), &bindings()).unwrap();
        assert_eq!(out, "\"light.status\" + Light_status");
    }

    #[test]
    fn test_prop_refs() {
        let expr = Expr::parse("this.properties.a + this.properties.b * c");
        assert_eq!(expr.prop_refs().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
