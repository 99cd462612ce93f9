//! Group and step selection.

use serde_json::Value;
use stackup_types::{STEPS_KEY, SetupContent, is_hidden_group};

use crate::error::EngineError;

/// A group chosen for the run together with the steps to plan for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSelection {
    pub group: String,
    pub steps: Vec<String>,
    /// `_`-prefixed groups are selected but never planned.
    pub hidden: bool,
}

/// Picks the groups of a run and the step list of each.
///
/// Groups default to every top-level key in document order. Step lists come
/// from `step_lists` (one per selected group, hidden groups included), else
/// from the group's `steps` entry, else from the group's remaining keys.
pub fn select_groups(
    content: &SetupContent,
    groups: Option<&[String]>,
    step_lists: Option<&[Vec<String>]>,
) -> Result<Vec<GroupSelection>, EngineError> {
    let groups: Vec<String> = match groups {
        Some(groups) => groups.to_vec(),
        None => content.keys().cloned().collect(),
    };

    if let Some(step_lists) = step_lists
        && step_lists.len() != groups.len()
    {
        return Err(EngineError::GroupStepMismatch {
            groups: groups.len(),
            step_lists: step_lists.len(),
        });
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(index, group)| {
            let hidden = is_hidden_group(&group);
            let explicit_steps = step_lists.map(|step_lists| step_lists[index].clone());
            let steps = match (explicit_steps, hidden) {
                (Some(steps), _) => steps,
                (None, true) => Vec::new(),
                (None, false) => default_steps(content, &group)?,
            };
            if !hidden && !content.contains_key(&group) {
                return Err(EngineError::UnknownGroup { group });
            }
            Ok(GroupSelection { group, steps, hidden })
        })
        .collect()
}

fn default_steps(content: &SetupContent, group: &str) -> Result<Vec<String>, EngineError> {
    let data = match content.get(group) {
        Some(Value::Object(data)) => data,
        Some(_) => return Err(EngineError::InvalidGroup { group: group.to_string() }),
        None => return Err(EngineError::UnknownGroup { group: group.to_string() }),
    };

    match data.get(STEPS_KEY) {
        Some(Value::Array(steps)) => steps
            .iter()
            .map(|step| match step {
                Value::String(step) => Ok(step.clone()),
                _ => Err(EngineError::InvalidStepList { group: group.to_string() }),
            })
            .collect(),
        Some(_) => Err(EngineError::InvalidStepList { group: group.to_string() }),
        None => Ok(data.keys().filter(|key| key.as_str() != STEPS_KEY).cloned().collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content(value: Value) -> SetupContent {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be a mapping"),
        }
    }

    fn names(selection: &[GroupSelection]) -> Vec<(&str, Vec<&str>, bool)> {
        selection
            .iter()
            .map(|entry| (entry.group.as_str(), entry.steps.iter().map(String::as_str).collect(), entry.hidden))
            .collect()
    }

    #[test]
    fn defaults_to_every_group_and_its_keys_in_document_order() {
        let content = content(json!({
            "storage": {"createBucket": {}, "putObject": {}},
            "_shared": {"region": "eu-west-1"},
            "compute": {"runInstances": {}, "steps": ["runInstances"]},
        }));

        let selection = select_groups(&content, None, None).unwrap();
        assert_eq!(
            names(&selection),
            vec![
                ("storage", vec!["createBucket", "putObject"], false),
                ("_shared", vec![], true),
                ("compute", vec!["runInstances"], false),
            ]
        );
    }

    #[test]
    fn explicit_step_lists_pair_with_groups() {
        let content = content(json!({"storage": {"createBucket": {}}, "compute": {"runInstances": {}}}));
        let groups = vec!["compute".to_string(), "storage".to_string()];
        let step_lists = vec![vec!["runInstances".to_string()], vec![]];

        let selection = select_groups(&content, Some(&groups), Some(&step_lists)).unwrap();
        assert_eq!(
            names(&selection),
            vec![("compute", vec!["runInstances"], false), ("storage", vec![], false)]
        );
    }

    #[test]
    fn step_list_count_must_match_group_count() {
        let content = content(json!({"a": {}, "b": {}}));
        let step_lists = vec![vec!["x".to_string()]];

        assert!(matches!(
            select_groups(&content, None, Some(&step_lists)),
            Err(EngineError::GroupStepMismatch { groups: 2, step_lists: 1 })
        ));
    }

    #[test]
    fn hidden_groups_count_toward_the_step_list_check() {
        let content = content(json!({"_defaults": {}, "web": {}}));
        let step_lists = vec![vec!["x".to_string()]];

        assert!(matches!(
            select_groups(&content, None, Some(&step_lists)),
            Err(EngineError::GroupStepMismatch { groups: 2, step_lists: 1 })
        ));
    }

    #[test]
    fn invalid_groups_are_rejected() {
        let unknown = vec!["missing".to_string()];
        assert!(matches!(
            select_groups(&content(json!({"web": {}})), Some(&unknown), None),
            Err(EngineError::UnknownGroup { ref group }) if group == "missing"
        ));
        assert!(matches!(
            select_groups(&content(json!({"web": "nope"})), None, None),
            Err(EngineError::InvalidGroup { .. })
        ));
        assert!(matches!(
            select_groups(&content(json!({"web": {"steps": "createBucket"}})), None, None),
            Err(EngineError::InvalidStepList { .. })
        ));
        assert!(matches!(
            select_groups(&content(json!({"web": {"steps": [1]}})), None, None),
            Err(EngineError::InvalidStepList { .. })
        ));
    }

    #[test]
    fn explicitly_named_hidden_groups_may_be_absent() {
        let groups = vec!["_later".to_string()];
        let selection = select_groups(&content(json!({})), Some(&groups), None).unwrap();
        assert_eq!(names(&selection), vec![("_later", vec![], true)]);
    }
}
