//! Error types shared by the notation codec, validation and code generation.
//!
//! Every variant is fatal to the current compilation. Nothing in this crate
//! returns a partial model or a partial script alongside an error.

use thiserror::Error;

/// Errors raised while decoding, parsing, validating or compiling a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A Given binding or property type names an undeclared class or enum.
    #[error("unknown {kind} reference '{name}' in {context}")]
    UnknownClassReference {
        kind: &'static str,
        name: String,
        context: String,
    },

    /// An expression references a variable absent from the binding table.
    #[error("unresolved reference '{reference}' in expression '{expr}': '{var}' is not bound by the Given step")]
    UnresolvedReference {
        var: String,
        reference: String,
        expr: String,
    },

    /// Method effect text matches neither the assignment nor the raw-splice form.
    #[error("unsupported effect on {owner}: '{effect}'")]
    UnsupportedEffect { owner: String, effect: String },

    /// Then-step effect text matches neither call form.
    #[error("unsupported call effect: '{effect}'")]
    UnsupportedCall { effect: String },

    /// A call effect names a variable the Given step does not bind.
    #[error("unknown binding '{var}' in call '{effect}'")]
    UnknownBinding { var: String, effect: String },

    /// A When step references something other than a declared check.
    #[error("unknown check in condition '{condition}'")]
    UnknownCheck { condition: String },

    /// A notation block opened with `{` never closes.
    #[error("unbalanced block '{block}' opened at line {line}")]
    UnbalancedBlock { block: String, line: usize },

    /// A required notation block is absent.
    #[error("missing required block '{block}'")]
    MissingBlock { block: &'static str },

    /// A notation construct does not match its expected argument shape.
    #[error("syntax error in '{construct}' at line {line}: {message}")]
    Syntax {
        construct: String,
        line: usize,
        message: String,
    },

    /// More than one step of the same kind.
    #[error("scenario has {count} {keyword} steps, expected at most one")]
    DuplicateStep { keyword: &'static str, count: usize },

    /// Two declarations share a name within the same scope.
    #[error("duplicate {kind} '{name}' in {scope}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        scope: String,
    },

    /// Structured form could not be decoded or encoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScenarioError {
    /// Check if this error comes from the notation text rather than the model.
    pub fn is_notation_error(&self) -> bool {
        matches!(
            self,
            ScenarioError::UnbalancedBlock { .. }
                | ScenarioError::MissingBlock { .. }
                | ScenarioError::Syntax { .. }
        )
    }

    pub(crate) fn syntax(construct: &str, line: usize, message: impl Into<String>) -> Self {
        ScenarioError::Syntax {
            construct: construct.to_string(),
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScenarioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ScenarioError::UnbalancedBlock {
            block: "domain".into(),
            line: 3,
        };
        assert!(err.to_string().contains("domain"));
        assert!(err.to_string().contains("line 3"));

        let err = ScenarioError::UnresolvedReference {
            var: "robot".into(),
            reference: "values.robot.xPos".into(),
            expr: "values.robot.xPos > 10".into(),
        };
        assert!(err.to_string().contains("'robot'"));
        assert!(err.to_string().contains("values.robot.xPos > 10"));
    }

    #[test]
    fn notation_errors() {
        assert!(ScenarioError::MissingBlock { block: "steps" }.is_notation_error());
        assert!(ScenarioError::syntax("prop", 1, "bad").is_notation_error());
        assert!(!ScenarioError::UnsupportedCall {
            effect: "jump".into()
        }
        .is_notation_error());
    }
}
