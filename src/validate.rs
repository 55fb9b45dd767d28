//! Model validation
//!
//! Structural checks that hold regardless of how the model was produced
//! (JSON or notation). Generation runs this first, so the code generator can
//! assume names are unique, property types resolve and Given bindings name
//! declared classes.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Result, ScenarioError};
use crate::model::{PropertyType, ScenarioFile, Step};

// =============================================================================
// ENTRY POINT
// =============================================================================

/// Validate a scenario model. Returns the first problem found.
pub fn validate(file: &ScenarioFile) -> Result<()> {
    unique_names(file)?;
    property_types(file)?;
    given_bindings(file)?;
    step_counts(file)?;
    debug!("validated scenario '{}'", file.scenario);
    Ok(())
}

// =============================================================================
// CHECKS
// =============================================================================

fn ensure_unique<'a>(
    names: impl IntoIterator<Item = &'a str>,
    kind: &'static str,
    scope: &str,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ScenarioError::DuplicateName {
                kind,
                name: name.to_string(),
                scope: scope.to_string(),
            });
        }
    }
    Ok(())
}

fn unique_names(file: &ScenarioFile) -> Result<()> {
    let domain = &file.domain;
    ensure_unique(domain.enums.iter().map(|e| e.name.as_str()), "enum", "domain")?;
    ensure_unique(domain.classes.iter().map(|c| c.name.as_str()), "class", "domain")?;
    ensure_unique(file.checks.iter().map(|c| c.name.as_str()), "check", "checks")?;

    for e in &domain.enums {
        let scope = format!("enum {}", e.name);
        ensure_unique(e.values.iter().map(String::as_str), "member", &scope)?;
    }

    for class in &domain.classes {
        let scope = format!("class {}", class.name);
        ensure_unique(class.properties.iter().map(|p| p.name.as_str()), "property", &scope)?;
        ensure_unique(class.methods.iter().map(|m| m.name.as_str()), "method", &scope)?;

        for method in &class.methods {
            let scope = format!("method {}.{}", class.name, method.name);
            ensure_unique(method.inputs.iter().map(|p| p.name.as_str()), "input", &scope)?;
        }
    }

    Ok(())
}

fn property_types(file: &ScenarioFile) -> Result<()> {
    for class in &file.domain.classes {
        for prop in &class.properties {
            let context = format!("property {}.{}", class.name, prop.name);
            match prop.property_type() {
                PropertyType::Primitive(_) => {}
                PropertyType::Enum(name) if file.domain.get_enum(name).is_some() => {}
                PropertyType::Enum(name) => {
                    return Err(ScenarioError::UnknownClassReference {
                        kind: "enum",
                        name: name.to_string(),
                        context,
                    })
                }
                PropertyType::Unknown(tag) => {
                    return Err(ScenarioError::UnknownClassReference {
                        kind: "type",
                        name: tag.to_string(),
                        context,
                    })
                }
            }
        }
    }
    Ok(())
}

fn given_bindings(file: &ScenarioFile) -> Result<()> {
    for values in file.steps.iter().filter_map(|s| match s {
        Step::Given { values } => Some(values),
        _ => None,
    }) {
        ensure_unique(values.iter().map(|v| v.name.as_str()), "binding", "Given step")?;
        for v in values {
            if file.domain.get_class(&v.ty).is_none() {
                return Err(ScenarioError::UnknownClassReference {
                    kind: "class",
                    name: v.ty.clone(),
                    context: format!("Given binding '{}'", v.name),
                });
            }
        }
    }
    Ok(())
}

fn step_counts(file: &ScenarioFile) -> Result<()> {
    for keyword in ["Given", "When", "Then"] {
        let count = file.steps.iter().filter(|s| s.keyword() == keyword).count();
        if count > 1 {
            return Err(ScenarioError::DuplicateStep { keyword, count });
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
