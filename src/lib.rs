//! robot-scenario: scenario compiler for robot-control scripts
//!
//! A scenario is a small domain model (enums, stateful classes, boolean
//! checks) plus a Given/When/Then test. This crate:
//! - decodes and encodes scenarios as JSON
//! - parses and prints the human-editable notation (lossless round-trip)
//! - validates the model
//! - translates expressions and lowers method/call effects
//! - generates a flat `global` / `def ... end` robot script
//!
//! Compilation is a pure transformation; nothing here does I/O except the
//! config loader and the `scenarioc` binary.

pub mod codegen;
pub mod config;
pub mod effect;
pub mod error;
pub mod expr;
pub mod model;
pub mod notation;
pub mod validate;

// Re-export commonly used types
pub use codegen::{generate, generate_with};
pub use config::{CompilerConfig, ConfigLoader};
pub use effect::{lower_call, lower_method, CallEffect, MethodEffect};
pub use error::{Result, ScenarioError};
pub use expr::{translate, BindingTable, EnumIndex, Expr, Term};
pub use model::{
    Check, ClassDef, Domain, EnumDef, MethodDef, ParamDef, PropertyDef, ScenarioFile, Step,
    ValueRef,
};
pub use notation::{parse_notation, print_notation};
pub use validate::validate;
