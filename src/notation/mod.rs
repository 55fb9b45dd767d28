//! Human-editable notation for scenario files
//!
//! ```text
//! scenario("Traffic light") {
//!     domain {
//!         enumType("LightStatus", "GREEN", "RED")
//!         klass("Light") {
//!             prop("status", "enums.LightStatus", mutable = true, initial = LightStatus.GREEN)
//!             method("turnRed", effect = "set this.properties.status to LightStatus.RED")
//!         }
//!     }
//!     checks {
//!         check("isGreen", "values.light.status == LightStatus.GREEN")
//!     }
//!     steps {
//!         given(light = "Light")
//!         whenCond("checks.isGreen")
//!         then("call values.light.turnRed")
//!     }
//! }
//! ```
//!
//! `print_notation` output always parses back to an equal model.

mod parser;
mod printer;
pub mod scanner;

pub use parser::parse_notation;
pub use printer::print_notation;

use crate::error::Result;
use crate::model::ScenarioFile;

impl ScenarioFile {
    pub fn from_notation(src: &str) -> Result<Self> {
        parse_notation(src)
    }

    pub fn to_notation(&self) -> String {
        print_notation(self)
    }
}
