//! End-to-end scenarios: JSON and notation in, robot script out.

use pretty_assertions::assert_eq;
use robot_scenario::{generate, ScenarioError, ScenarioFile};

const TRAFFIC_LIGHT_JSON: &str = r#"{
    "scenario": "Traffic light",
    "checks": [
        { "name": "isGreen", "true": "values.light.status == LightStatus.GREEN" }
    ],
    "domain": {
        "enums": [
            { "name": "LightStatus", "values": ["GREEN", "RED", "YELLOW"] }
        ],
        "classes": [
            {
                "name": "Light",
                "properties": [
                    { "name": "status", "type": "enums.LightStatus", "mutable": true, "initial": "LightStatus.GREEN" }
                ],
                "methods": [
                    { "name": "turnRed", "inputs": [], "effect": "set this.properties.status to LightStatus.RED" }
                ]
            },
            {
                "name": "Program",
                "properties": [],
                "methods": [
                    { "name": "whenGreen", "inputs": [], "effect": "raw:textmsg(\"green\")\\nsleep(1)" }
                ]
            }
        ]
    },
    "steps": [
        { "keyword": "Given", "values": [
            { "name": "light", "type": "Light" },
            { "name": "prog", "type": "Program" }
        ] },
        { "keyword": "When", "condition": "checks.isGreen" },
        { "keyword": "Then", "effect": "call values.prog.whenGreen" }
    ]
}"#;

const TRAFFIC_LIGHT_SCRIPT: &str = r#"# Scenario: Traffic light
global LightStatus_GREEN = 0
global LightStatus_RED = 1
global LightStatus_YELLOW = 2
global Light_status = LightStatus_GREEN
def Light_turnRed():
  # set this.properties.status to LightStatus.RED
  global Light_status = LightStatus_RED
end
def Program_whenGreen():
  # raw: textmsg("green") sleep(1)
  textmsg("green")
  sleep(1)
end
def check_isGreen():
  return Light_status == LightStatus_GREEN
end
def main():
  if check_isGreen():
    Program_whenGreen()
  end
end
"#;

fn traffic_light() -> ScenarioFile {
    ScenarioFile::from_json(TRAFFIC_LIGHT_JSON).unwrap()
}

#[test]
fn test_compile_traffic_light() {
    assert_eq!(generate(&traffic_light()).unwrap(), TRAFFIC_LIGHT_SCRIPT);
}

#[test]
fn test_notation_and_json_compile_identically() {
    let file = traffic_light();
    let reparsed = ScenarioFile::from_notation(&file.to_notation()).unwrap();
    assert_eq!(reparsed, file);
    assert_eq!(generate(&reparsed).unwrap(), TRAFFIC_LIGHT_SCRIPT);
}

#[test]
fn test_storage_only_for_bound_classes() {
    let mut file = traffic_light();
    file.steps = vec![file.steps[0].clone()];
    file.checks.clear();
    if let robot_scenario::Step::Given { values } = &mut file.steps[0] {
        values.retain(|v| v.name != "light");
    }

    let script = generate(&file).unwrap();
    assert!(!script.contains("global Light_status"));
    // methods are still emitted
    assert!(script.contains("def Light_turnRed():"));
}

#[test]
fn test_editing_initial_changes_one_line() {
    let file = traffic_light();
    let before = generate(&file).unwrap();

    let notation = file.to_notation();
    assert!(notation.contains("initial = LightStatus.GREEN"));
    let edited = notation.replace("initial = LightStatus.GREEN", "initial = LightStatus.RED");
    let after = generate(&ScenarioFile::from_notation(&edited).unwrap()).unwrap();

    let before: Vec<&str> = before.lines().collect();
    let after: Vec<&str> = after.lines().collect();
    assert_eq!(before.len(), after.len());

    let changed: Vec<(&str, &str)> = before
        .iter()
        .zip(&after)
        .filter(|(b, a)| b != a)
        .map(|(b, a)| (*b, *a))
        .collect();
    assert_eq!(
        changed,
        vec![(
            "global Light_status = LightStatus_GREEN",
            "global Light_status = LightStatus_RED"
        )]
    );
}

#[test]
fn test_unresolved_reference_iff_unbound() {
    let mut file = traffic_light();
    file.checks[0].predicate =
        "values.light.status == LightStatus.GREEN and values.prog.count > 0".into();
    // prog is bound, so this resolves even though Program has no such property
    assert!(generate(&file).is_ok());

    file.checks[0].predicate = "values.lamp.status == LightStatus.GREEN".into();
    match generate(&file).unwrap_err() {
        ScenarioError::UnresolvedReference { var, reference, .. } => {
            assert_eq!(var, "lamp");
            assert_eq!(reference, "values.lamp.status");
        }
        other => panic!("Expected UnresolvedReference, got {:?}", other),
    }
}

#[test]
fn test_json_fixed_point() {
    let file = traffic_light();
    let json = file.to_json_pretty().unwrap();
    assert_eq!(ScenarioFile::from_json(&json).unwrap(), file);
}
