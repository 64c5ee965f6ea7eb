//! Scenarios compiled into the binary

use crate::error::{E2eError, E2eResult};
use crate::scenario::Scenario;

const DC003_YAML: &str = include_str!("../scenarios/dc003_second_discount_code.yaml");

/// DC-003: applying a second code after SAVE15 is rejected and SAVE15 stays applied
pub fn second_discount_code() -> E2eResult<Scenario> {
    Scenario::from_yaml(DC003_YAML)
}

/// Every built-in scenario
pub fn all() -> E2eResult<Vec<Scenario>> {
    Ok(vec![second_discount_code()?])
}

/// Built-in scenarios matching an optional name and tag; an empty selection is an error
pub fn select(name: Option<&str>, tag: Option<&str>) -> E2eResult<Vec<Scenario>> {
    let scenarios: Vec<Scenario> = all()?
        .into_iter()
        .filter(|s| name.map_or(true, |n| s.name == n))
        .filter(|s| tag.map_or(true, |t| s.tags.iter().any(|x| x == t)))
        .collect();

    if scenarios.is_empty() {
        let wanted = match (name, tag) {
            (Some(n), Some(t)) => format!("{} with tag '{}'", n, t),
            (Some(n), None) => n.to_string(),
            (None, Some(t)) => format!("tag '{}'", t),
            (None, None) => "no built-in scenarios".to_string(),
        };
        return Err(E2eError::ScenarioNotFound(wanted));
    }
    Ok(scenarios)
}
