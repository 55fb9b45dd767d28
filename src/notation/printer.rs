//! Notation printer
//!
//! Renders a scenario model as notation text that `parse_notation` reads back
//! to an equal model. Layout is fixed (4-space indent, one construct per line)
//! so that a one-field model edit changes exactly one printed line.

use super::parser::is_bare_char;
use crate::model::{Check, ClassDef, EnumDef, MethodDef, PropertyDef, ScenarioFile, Step};

const INDENT: &str = "    ";

/// Render a scenario model as notation text.
pub fn print_notation(file: &ScenarioFile) -> String {
    let mut out = String::new();
    out.push_str(&format!("scenario({}) {{\n", quote(&file.scenario)));

    line(&mut out, 1, "domain {");
    for e in &file.domain.enums {
        line(&mut out, 2, &enum_type(e));
    }
    for class in &file.domain.classes {
        klass(&mut out, class);
    }
    line(&mut out, 1, "}");

    line(&mut out, 1, "checks {");
    for c in &file.checks {
        line(&mut out, 2, &check(c));
    }
    line(&mut out, 1, "}");

    line(&mut out, 1, "steps {");
    for s in &file.steps {
        line(&mut out, 2, &step(s));
    }
    line(&mut out, 1, "}");

    out.push_str("}\n");
    out
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}

fn enum_type(e: &EnumDef) -> String {
    let mut parts = vec![quote(&e.name)];
    parts.extend(e.values.iter().map(|v| quote(v)));
    format!("enumType({})", parts.join(", "))
}

fn klass(out: &mut String, class: &ClassDef) {
    line(out, 2, &format!("klass({}) {{", quote(&class.name)));
    for p in &class.properties {
        line(out, 3, &prop(p));
    }
    for m in &class.methods {
        line(out, 3, &method(m));
    }
    line(out, 2, "}");
}

fn prop(p: &PropertyDef) -> String {
    let mut s = format!("prop({}, {}", quote(&p.name), quote(&p.ty));
    if p.mutable {
        s.push_str(", mutable = true");
    }
    if let Some(initial) = &p.initial {
        s.push_str(&format!(", initial = {}", bare_or_quoted(initial)));
    }
    s.push(')');
    s
}

fn method(m: &MethodDef) -> String {
    let mut s = format!("method({}", quote(&m.name));
    if !m.inputs.is_empty() {
        let inputs: Vec<String> = m
            .inputs
            .iter()
            .map(|p| format!("{}: {}", quote(&p.name), quote(&p.ty)))
            .collect();
        s.push_str(&format!(", inputs = [{}]", inputs.join(", ")));
    }
    s.push_str(&format!(", effect = {})", effect_literal(&m.effect)));
    s
}

fn check(c: &Check) -> String {
    format!("check({}, {})", quote(&c.name), quote(&c.predicate))
}

fn step(s: &Step) -> String {
    match s {
        Step::Given { values } => {
            let bindings: Vec<String> = values
                .iter()
                .map(|v| format!("{} = {}", given_key(&v.name), quote(&v.ty)))
                .collect();
            format!("given({})", bindings.join(", "))
        }
        Step::When { condition } => format!("whenCond({})", quote(condition)),
        Step::Then { effect } => format!("then({})", quote(effect)),
    }
}

// ============================================================================
// Literals
// ============================================================================

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn given_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

/// `initial` values print bare when they are a single token.
fn bare_or_quoted(value: &str) -> String {
    if !value.is_empty() && value.chars().all(is_bare_char) {
        value.to_string()
    } else {
        quote(value)
    }
}

/// Multi-line effects print as raw strings to keep the layout readable.
fn effect_literal(effect: &str) -> String {
    if effect.contains('\n') || effect.contains('\r') || effect.contains("\"\"\"") {
        raw(effect)
    } else {
        quote(effect)
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn raw(s: &str) -> String {
    let mut hashes = 1;
    while s.contains(&format!("\"{}", "#".repeat(hashes))) {
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{s}\"{fence}")
}
