use std::time::Duration;

use serde::Serialize;
use stackup_types::ConfigValue;

/// One queued provider call with its fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedCall {
    pub group: String,
    pub step: String,
    pub config: ConfigValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanEntry {
    Call(PlannedCall),
    Delay(Duration),
}

/// Ordered queue of calls and delays, consumed once by the scheduler.
///
/// Plans are only produced by [`PlanBuilder`], which guarantees that the last
/// entry is never a delay.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionPlan {
    entries: Vec<PlanEntry>,
}

impl ExecutionPlan {
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<PlanEntry> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn calls(&self) -> impl Iterator<Item = &PlannedCall> {
        self.entries.iter().filter_map(|entry| match entry {
            PlanEntry::Call(call) => Some(call),
            PlanEntry::Delay(_) => None,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls().count()
    }
}

/// Appends a delay after every call and drops the trailing one on `finish`.
#[derive(Debug)]
pub struct PlanBuilder {
    delay: Duration,
    entries: Vec<PlanEntry>,
}

impl PlanBuilder {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            entries: Vec::new(),
        }
    }

    pub fn push_call(&mut self, call: PlannedCall) {
        self.entries.push(PlanEntry::Call(call));
        self.entries.push(PlanEntry::Delay(self.delay));
    }

    pub fn finish(mut self) -> ExecutionPlan {
        if matches!(self.entries.last(), Some(PlanEntry::Delay(_))) {
            self.entries.pop();
        }
        ExecutionPlan { entries: self.entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(step: &str) -> PlannedCall {
        PlannedCall {
            group: "web".into(),
            step: step.into(),
            config: json!({}),
        }
    }

    #[test]
    fn delays_separate_calls_but_never_trail() {
        let mut builder = PlanBuilder::new(Duration::from_millis(250));
        builder.push_call(call("createBucket"));
        builder.push_call(call("putObject"));
        let plan = builder.finish();

        assert_eq!(
            plan.entries(),
            &[
                PlanEntry::Call(call("createBucket")),
                PlanEntry::Delay(Duration::from_millis(250)),
                PlanEntry::Call(call("putObject")),
            ]
        );
        assert_eq!(plan.call_count(), 2);
    }

    #[test]
    fn empty_builders_produce_empty_plans() {
        let plan = PlanBuilder::new(Duration::ZERO).finish();
        assert!(plan.is_empty());
        assert_eq!(plan.call_count(), 0);
    }
}
