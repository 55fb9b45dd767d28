//! Scenario model
//!
//! Pure data describing a robot-control scenario: enumerations, stateful
//! classes, named boolean checks and the Given/When/Then steps. The serde
//! attributes fix the structured (JSON) field names:
//!
//! ```text
//! { "scenario": "...",
//!   "checks":  [{ "name": "...", "true": "<predicate>" }],
//!   "domain":  { "enums": [...], "classes": [...] },
//!   "steps":   [{ "keyword": "Given", "values": [...] }, ...] }
//! ```
//!
//! Unknown fields are ignored on decode. Effects and expressions are kept as
//! the author wrote them; `expr` and `effect` parse them on demand.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root document: a domain model plus a single behavioural test.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Free-text title
    pub scenario: String,
    #[serde(default)]
    pub checks: Vec<Check>,
    #[serde(default)]
    pub domain: Domain,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl ScenarioFile {
    /// Decode the structured form.
    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Encode to compact structured form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encode to indented structured form.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// First Given step's bindings, if any.
    pub fn given(&self) -> Option<&[ValueRef]> {
        self.steps.iter().find_map(|s| match s {
            Step::Given { values } => Some(values.as_slice()),
            _ => None,
        })
    }

    /// First When step's condition, if any.
    pub fn when(&self) -> Option<&str> {
        self.steps.iter().find_map(|s| match s {
            Step::When { condition } => Some(condition.as_str()),
            _ => None,
        })
    }

    /// First Then step's effect, if any.
    pub fn then(&self) -> Option<&str> {
        self.steps.iter().find_map(|s| match s {
            Step::Then { effect } => Some(effect.as_str()),
            _ => None,
        })
    }

    pub fn get_check(&self, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Enumerations and classes of a scenario, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Domain {
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    #[serde(default)]
    pub classes: Vec<ClassDef>,
}

impl Domain {
    pub fn get_enum(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn get_class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// An enumeration. Member order defines the generated integer encoding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl EnumDef {
    /// Ordinal of a member, which is also its generated constant value.
    pub fn ordinal(&self, member: &str) -> Option<usize> {
        self.values.iter().position(|v| v == member)
    }

    /// Flat target identifier for a member: `Enum_MEMBER`
    pub fn constant_name(&self, member: &str) -> String {
        format!("{}_{}", self.name, member)
    }
}

/// A stateful class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<PropertyDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
}

impl ClassDef {
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn get_method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Flat global name for one of this class's members: `Class_member`
    pub fn global_name(&self, member: &str) -> String {
        format!("{}_{}", self.name, member)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: String,
    /// Primitive tag (`int`, `double`, ...) or `enums.<EnumName>`
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub mutable: bool,
    /// Initial value expression; the type's zero value when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
}

impl PropertyDef {
    pub fn property_type(&self) -> PropertyType<'_> {
        PropertyType::parse(&self.ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<ParamDef>,
    /// Assignment form (`set this.properties.x to ...`) or raw splice (`raw:...`)
    pub effect: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A named boolean predicate over bound instance properties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    #[serde(rename = "true")]
    pub predicate: String,
}

/// Given-step binding of an instance variable to a class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValueRef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

/// A scenario step, tagged by `keyword` in the structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "keyword")]
pub enum Step {
    Given {
        #[serde(default)]
        values: Vec<ValueRef>,
    },
    When {
        condition: String,
    },
    Then {
        effect: String,
    },
}

impl Step {
    pub fn keyword(&self) -> &'static str {
        match self {
            Step::Given { .. } => "Given",
            Step::When { .. } => "When",
            Step::Then { .. } => "Then",
        }
    }
}

// =============================================================================
// PROPERTY TYPES
// =============================================================================

/// Interpreted view of a property's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType<'a> {
    Primitive(Primitive),
    /// `enums.<name>`
    Enum(&'a str),
    /// Anything else; rejected by validation
    Unknown(&'a str),
}

impl<'a> PropertyType<'a> {
    pub fn parse(tag: &'a str) -> Self {
        if let Some(name) = tag.strip_prefix("enums.") {
            return PropertyType::Enum(name);
        }
        match Primitive::from_tag(tag) {
            Some(p) => PropertyType::Primitive(p),
            None => PropertyType::Unknown(tag),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int,
    Double,
    Bool,
    String,
}

impl Primitive {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(Primitive::Int),
            "double" | "float" | "number" => Some(Primitive::Double),
            "bool" | "boolean" => Some(Primitive::Bool),
            "string" => Some(Primitive::String),
            _ => None,
        }
    }

    /// Target-script literal used when a property has no `initial`.
    pub fn zero_value(self) -> &'static str {
        match self {
            Primitive::Int => "0",
            Primitive::Double => "0.0",
            Primitive::Bool => "False",
            Primitive::String => "\"\"",
        }
    }
}
