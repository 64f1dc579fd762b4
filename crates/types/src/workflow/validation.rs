//! Run input validation shared by the engine and anything that pre-checks a run request.
//!
//! A run request supplies a flat `name -> value` mapping. Every declared required input must be
//! present; optional inputs fall back to an empty string; undeclared keys are dropped.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::WorkflowInputDefinition;

/// Normalize caller-supplied inputs against the declared inputs of a workflow.
///
/// Returns the inputs keyed in declaration order, or the name of the first required input
/// (in declaration order) the caller did not supply.
pub fn normalize_run_inputs(
    declared: &[WorkflowInputDefinition],
    provided: &HashMap<String, String>,
) -> Result<IndexMap<String, String>, String> {
    let mut normalized = IndexMap::with_capacity(declared.len());

    for input in declared {
        match provided.get(&input.name) {
            Some(value) => {
                normalized.insert(input.name.clone(), value.clone());
            }
            None if input.required => return Err(input.name.clone()),
            None => {
                normalized.insert(input.name.clone(), String::new());
            }
        }
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared() -> Vec<WorkflowInputDefinition> {
        vec![
            WorkflowInputDefinition::required("topic"),
            WorkflowInputDefinition::optional("audience"),
            WorkflowInputDefinition::required("tone"),
        ]
    }

    #[test]
    fn optional_inputs_default_to_empty_text() {
        let provided = HashMap::from([("topic".to_string(), "demo".to_string()), ("tone".to_string(), "dry".to_string())]);

        let normalized = normalize_run_inputs(&declared(), &provided).expect("inputs are complete");

        let keys: Vec<_> = normalized.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["topic", "audience", "tone"]);
        assert_eq!(normalized["audience"], "");
        assert_eq!(normalized["topic"], "demo");
    }

    #[test]
    fn first_missing_required_input_is_reported() {
        let provided = HashMap::from([("audience".to_string(), "ops".to_string())]);

        let missing = normalize_run_inputs(&declared(), &provided).expect_err("topic is missing");
        assert_eq!(missing, "topic");
    }

    #[test]
    fn undeclared_inputs_are_dropped() {
        let provided = HashMap::from([
            ("topic".to_string(), "demo".to_string()),
            ("tone".to_string(), "dry".to_string()),
            ("extra".to_string(), "ignored".to_string()),
        ]);

        let normalized = normalize_run_inputs(&declared(), &provided).expect("inputs are complete");
        assert!(!normalized.contains_key("extra"));
    }

    #[test]
    fn empty_string_satisfies_a_required_input() {
        let declared = vec![WorkflowInputDefinition::required("topic")];
        let provided = HashMap::from([("topic".to_string(), String::new())]);

        assert!(normalize_run_inputs(&declared, &provided).is_ok());
    }
}
