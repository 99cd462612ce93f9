use std::time::Duration;

use serde_json::Value;
use stackup_types::{GroupData, Payload, SetupContent};
use tracing::{debug, info};

use super::{
    plan::{ExecutionPlan, PlanBuilder, PlannedCall},
    selection::GroupSelection,
};
use crate::{actions::ActionRegistry, error::EngineError, formatters::FormatterRegistry, resolve::resolve_value};

/// Turns selected groups into an execution plan.
///
/// Every step is bound before its configuration is resolved, so unknown
/// steps and providers fail the run before anything executes. A group value
/// that is a list queues one call per item; any other value (including a
/// missing key, read as `null`) queues a single call.
pub fn build_plan(
    selection: &[GroupSelection],
    content: &SetupContent,
    payload: &Payload,
    registry: &mut ActionRegistry,
    formatters: &FormatterRegistry,
    delay: Duration,
) -> Result<ExecutionPlan, EngineError> {
    let mut builder = PlanBuilder::new(delay);

    for selected in selection {
        if selected.hidden {
            debug!(group = %selected.group, "skipping hidden group");
            continue;
        }
        let group_data: &GroupData = match content.get(&selected.group) {
            Some(Value::Object(data)) => data,
            Some(_) => {
                return Err(EngineError::InvalidGroup {
                    group: selected.group.clone(),
                });
            }
            None => {
                return Err(EngineError::UnknownGroup {
                    group: selected.group.clone(),
                });
            }
        };

        for step in &selected.steps {
            let config_key = registry.action(step)?.binding.config_key.clone();
            let items = match group_data.get(&config_key).cloned().unwrap_or(Value::Null) {
                Value::Array(items) => items,
                other => vec![other],
            };

            for item in &items {
                let config = resolve_value(item, payload, formatters)?;
                info!(group = %selected.group, step = %step, "queue step");
                debug!(group = %selected.group, step = %step, config = %config, "resolved step config");
                builder.push_call(PlannedCall {
                    group: selected.group.clone(),
                    step: step.clone(),
                    config,
                });
            }
        }
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        provider::ProviderCatalog,
        scheduler::{plan::PlanEntry, selection::select_groups},
    };
    use serde_json::json;
    use stackup_types::{StepBinding, StepMapping};

    fn registry() -> ActionRegistry {
        let mapping: StepMapping = [
            ("make", StepBinding::new("P", "Op", "cfg")),
            ("createBucket", StepBinding::new("S3", "createBucket", "createBucket")),
        ]
        .into_iter()
        .collect();
        ActionRegistry::new(mapping, ProviderCatalog::dry_run())
    }

    fn content(value: Value) -> SetupContent {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be a mapping"),
        }
    }

    fn plan(content: &SetupContent, payload: &Payload, delay: Duration) -> Result<ExecutionPlan, EngineError> {
        let selection = select_groups(content, None, None)?;
        build_plan(&selection, content, payload, &mut registry(), &FormatterRegistry::with_builtins(), delay)
    }

    #[test]
    fn single_call_plans_have_no_delay() {
        let content = content(json!({"g": {"cfg": {"v": "${n|x}"}, "steps": ["make"]}}));
        let payload = Payload::from([("n".to_string(), "y".to_string())]);

        let plan = plan(&content, &payload, Duration::from_secs(1)).unwrap();
        assert_eq!(
            plan.entries(),
            &[PlanEntry::Call(PlannedCall {
                group: "g".into(),
                step: "make".into(),
                config: json!({"v": "y"}),
            })]
        );
    }

    #[test]
    fn list_values_queue_one_call_per_item() {
        let content = content(json!({
            "storage": {"createBucket": [{"Bucket": "a"}, {"Bucket": "${name}"}]}
        }));
        let payload = Payload::from([("name".to_string(), "b".to_string())]);

        let plan = plan(&content, &payload, Duration::ZERO).unwrap();
        let configs: Vec<&Value> = plan.calls().map(|call| &call.config).collect();
        assert_eq!(configs, vec![&json!({"Bucket": "a"}), &json!({"Bucket": "b"})]);
        assert_eq!(plan.entries().len(), 3);
    }

    #[test]
    fn missing_config_keys_queue_null_and_empty_lists_queue_nothing() {
        let content = content(json!({
            "a": {"steps": ["make"]},
            "b": {"steps": ["make"], "cfg": []},
        }));

        let plan = plan(&content, &Payload::new(), Duration::ZERO).unwrap();
        let calls: Vec<&PlannedCall> = plan.calls().collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].group, "a");
        assert_eq!(calls[0].config, Value::Null);
    }

    #[test]
    fn hidden_groups_are_never_planned() {
        let content = content(json!({
            "_template": {"createBucket": {"Bucket": "skipped"}},
            "storage": {"createBucket": {"Bucket": "kept"}},
        }));

        let plan = plan(&content, &Payload::new(), Duration::ZERO).unwrap();
        let groups: Vec<&str> = plan.calls().map(|call| call.group.as_str()).collect();
        assert_eq!(groups, vec!["storage"]);
    }

    #[test]
    fn unknown_steps_fail_planning() {
        let content = content(json!({"g": {"deleteEverything": {}}}));
        assert!(matches!(
            plan(&content, &Payload::new(), Duration::ZERO),
            Err(EngineError::UnknownStep { ref step }) if step == "deleteEverything"
        ));
    }

    #[test]
    fn formatter_failures_fail_planning() {
        let content = content(json!({"g": {"cfg": "%{missing.path}", "steps": ["make"]}}));
        assert!(matches!(
            plan(&content, &Payload::new(), Duration::ZERO),
            Err(EngineError::UnknownFormatter { ref path }) if path == "missing.path"
        ));
    }
}
