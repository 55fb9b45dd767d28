//! Script generator
//!
//! Compiles a validated scenario into a flat target script:
//!
//! ```text
//! # Scenario: Traffic light
//! global LightStatus_GREEN = 0
//! global Light_status = LightStatus_GREEN
//! def Light_turnRed():
//!   # set this.properties.status to LightStatus.RED
//!   global Light_status = LightStatus_RED
//! end
//! def check_isGreen():
//!   return Light_status == LightStatus_GREEN
//! end
//! def main():
//!   if check_isGreen():
//!     Light_turnRed()
//!   end
//! end
//! ```
//!
//! Each section is produced by its own fragment function returning lines;
//! `generate_with` only concatenates them.

use tracing::{debug, info, warn};

use crate::config::CompilerConfig;
use crate::effect::{comment, lower_call, lower_method};
use crate::error::{Result, ScenarioError};
use crate::expr::{translate, BindingTable, EnumIndex};
use crate::model::{Check, Domain, PropertyDef, PropertyType, ScenarioFile};
use crate::validate::validate;

// ============================================================================
// Entry points
// ============================================================================

/// Generate a script with the default configuration.
pub fn generate(file: &ScenarioFile) -> Result<String> {
    generate_with(file, &CompilerConfig::default())
}

/// Validate and generate a script. Any error aborts the whole compilation.
pub fn generate_with(file: &ScenarioFile, config: &CompilerConfig) -> Result<String> {
    validate(file)?;

    let domain = &file.domain;
    let enums = EnumIndex::new(&domain.enums);
    let bindings = file
        .given()
        .map(BindingTable::from_values)
        .unwrap_or_default();

    let mut lines = Vec::new();
    if config.emit_comments {
        lines.push(comment(&format!("Scenario: {}", file.scenario)));
    }
    lines.extend(enum_constants(domain));
    lines.extend(class_storage(domain, &enums, &bindings, config)?);
    lines.extend(method_procedures(domain, &enums, &bindings, config)?);
    lines.extend(check_procedures(&file.checks, &enums, &bindings, config)?);
    lines.extend(entry_procedure(file, &bindings, config)?);

    info!(
        "compiled scenario '{}': {} enums, {} classes ({} bound), {} checks, {} lines",
        file.scenario,
        domain.enums.len(),
        domain.classes.len(),
        domain
            .classes
            .iter()
            .filter(|c| bindings.binds_class(&c.name))
            .count(),
        file.checks.len(),
        lines.len()
    );

    let mut script = lines.join("\n");
    script.push('\n');
    Ok(script)
}

// ============================================================================
// Fragments
// ============================================================================

/// One global per enum member, valued by ordinal.
pub fn enum_constants(domain: &Domain) -> Vec<String> {
    domain
        .enums
        .iter()
        .flat_map(|e| {
            e.values
                .iter()
                .enumerate()
                .map(move |(i, member)| format!("global {} = {}", e.constant_name(member), i))
        })
        .collect()
}

/// Property storage globals for every allocated class.
pub fn class_storage(
    domain: &Domain,
    enums: &EnumIndex<'_>,
    bindings: &BindingTable,
    config: &CompilerConfig,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    for class in &domain.classes {
        if !config.allocate_unbound_classes && !bindings.binds_class(&class.name) {
            debug!("class {} is not bound; no storage allocated", class.name);
            continue;
        }
        for prop in &class.properties {
            let value = match &prop.initial {
                Some(initial) => translate(initial, enums, bindings)?,
                None => zero_value(prop, enums)?,
            };
            lines.push(format!("global {} = {}", class.global_name(&prop.name), value));
        }
    }

    Ok(lines)
}

fn zero_value(prop: &PropertyDef, enums: &EnumIndex<'_>) -> Result<String> {
    match prop.property_type() {
        PropertyType::Primitive(p) => Ok(p.zero_value().to_string()),
        PropertyType::Enum(name) => {
            let def = enums
                .get(name)
                .ok_or_else(|| ScenarioError::UnknownClassReference {
                    kind: "enum",
                    name: name.to_string(),
                    context: format!("property {}", prop.name),
                })?;
            Ok(match def.values.first() {
                Some(first) => def.constant_name(first),
                None => "0".to_string(),
            })
        }
        PropertyType::Unknown(tag) => Err(ScenarioError::UnknownClassReference {
            kind: "type",
            name: tag.to_string(),
            context: format!("property {}", prop.name),
        }),
    }
}

/// One procedure per method of every class, bound or not.
pub fn method_procedures(
    domain: &Domain,
    enums: &EnumIndex<'_>,
    bindings: &BindingTable,
    config: &CompilerConfig,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    for class in &domain.classes {
        if !class.methods.is_empty()
            && !class.properties.is_empty()
            && !config.allocate_unbound_classes
            && !bindings.binds_class(&class.name)
        {
            warn!(
                "class {} has methods but no storage; it is not bound by the Given step",
                class.name
            );
        }

        for method in &class.methods {
            let params: Vec<&str> = method.inputs.iter().map(|p| p.name.as_str()).collect();
            lines.push(format!(
                "def {}({}):",
                class.global_name(&method.name),
                params.join(", ")
            ));
            for stmt in lower_method(class, method, enums, config.emit_comments)? {
                lines.push(format!("{}{}", config.indent, stmt));
            }
            lines.push("end".to_string());
        }
    }

    Ok(lines)
}

/// One boolean procedure per check.
pub fn check_procedures(
    checks: &[Check],
    enums: &EnumIndex<'_>,
    bindings: &BindingTable,
    config: &CompilerConfig,
) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    for check in checks {
        let predicate = translate(&check.predicate, enums, bindings)?;
        lines.push(format!("def {}():", config.check_procedure(&check.name)));
        lines.push(format!("{}return {}", config.indent, predicate));
        lines.push("end".to_string());
    }
    Ok(lines)
}

/// The entry procedure: the Then call, guarded by the When check if present.
pub fn entry_procedure(
    file: &ScenarioFile,
    bindings: &BindingTable,
    config: &CompilerConfig,
) -> Result<Vec<String>> {
    let guard = match file.when() {
        Some(condition) => Some(resolve_condition(file, condition)?),
        None => None,
    };

    let mut lines = vec![format!("def {}():", config.entry_procedure)];
    let indent = &config.indent;

    match file.then() {
        Some(effect) => {
            let call = lower_call(effect, bindings, &file.domain)?;
            match guard {
                Some(check) => {
                    lines.push(format!("{}if {}():", indent, config.check_procedure(&check.name)));
                    lines.push(format!("{}{}{}", indent, indent, call));
                    lines.push(format!("{}end", indent));
                }
                None => lines.push(format!("{}{}", indent, call)),
            }
        }
        None => debug!("scenario '{}' has no Then step; entry body is empty", file.scenario),
    }

    lines.push("end".to_string());
    Ok(lines)
}

/// `checks.<name>` naming a declared check.
fn resolve_condition<'a>(file: &'a ScenarioFile, condition: &str) -> Result<&'a Check> {
    condition
        .trim()
        .strip_prefix("checks.")
        .and_then(|name| file.get_check(name))
        .ok_or_else(|| ScenarioError::UnknownCheck {
            condition: condition.to_string(),
        })
}

// ============================================================================
// Tests
// ============================================================================
