//! Execution scheduler: turns a setup document into a queue of calls and
//! drains it in order.
//!
//! A run moves through `Selecting → Planning → (Confirming) → Executing`
//! and ends as `Done`, `Aborted` or `Declined`.
//!
//! - `selection`: which groups run and which steps each group contributes
//! - `planning`: binds steps and resolves their configuration into an [`ExecutionPlan`]
//! - `confirm`: the [`ConfirmationPort`] consulted before executing
//! - `plan`: the plan types

mod confirm;
mod plan;
mod planning;
mod selection;

pub use confirm::{AutoConfirm, ConfirmationPort, PromptConfirmation, is_affirmative};
pub use plan::{ExecutionPlan, PlanBuilder, PlanEntry, PlannedCall};
pub use planning::build_plan;
pub use selection::{GroupSelection, select_groups};

use std::{thread, time::Duration};

use stackup_types::{Payload, SetupContent};
use tracing::{debug, error, info};

use crate::{
    actions::{ActionRegistry, CallOutcome},
    error::EngineError,
    formatters::FormatterRegistry,
};

/// Per-run settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// Groups to run; `None` runs every group in document order.
    pub groups: Option<Vec<String>>,
    /// One step list per selected group.
    pub step_lists: Option<Vec<Vec<String>>>,
    /// Pause inserted between consecutive calls.
    pub delay: Duration,
    /// Stop at the first failed call.
    pub abort_on_error: bool,
    /// Skip the confirmation prompt.
    pub execute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Selecting,
    Planning,
    Confirming,
    Executing,
    Done,
    Aborted,
    Declined,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub planned: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The whole plan was drained.
    Completed(RunSummary),
    /// Confirmation was refused; nothing ran.
    Declined { planned: usize },
    /// A call failed while abort mode was on.
    Aborted(RunSummary),
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed(_) | RunOutcome::Declined { .. } => 0,
            RunOutcome::Aborted(_) => 1,
        }
    }
}

pub struct Scheduler {
    options: RunOptions,
    registry: ActionRegistry,
    formatters: FormatterRegistry,
    phase: RunPhase,
}

impl Scheduler {
    pub fn new(options: RunOptions, registry: ActionRegistry, formatters: FormatterRegistry) -> Self {
        Self {
            options,
            registry,
            formatters,
            phase: RunPhase::Selecting,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Selects groups and builds the plan without executing anything.
    pub fn plan(&mut self, content: &SetupContent, payload: &Payload) -> Result<ExecutionPlan, EngineError> {
        self.phase = RunPhase::Selecting;
        let selection = select_groups(content, self.options.groups.as_deref(), self.options.step_lists.as_deref())?;
        debug!(groups = ?selection.iter().map(|selected| selected.group.as_str()).collect::<Vec<_>>(), "selected groups");

        self.phase = RunPhase::Planning;
        build_plan(
            &selection,
            content,
            payload,
            &mut self.registry,
            &self.formatters,
            self.options.delay,
        )
    }

    /// Plans, asks for confirmation unless `execute` is set, then executes.
    pub fn run(
        &mut self,
        content: &SetupContent,
        payload: &Payload,
        confirmation: &mut dyn ConfirmationPort,
    ) -> Result<RunOutcome, EngineError> {
        let plan = self.plan(content, payload)?;

        if !self.options.execute && !plan.is_empty() {
            self.phase = RunPhase::Confirming;
            let planned = plan.call_count();
            if !confirmation.confirm(planned) {
                info!(planned, "queue declined");
                self.phase = RunPhase::Declined;
                return Ok(RunOutcome::Declined { planned });
            }
        }

        self.execute(plan)
    }

    /// Drains `plan` in order. Failed calls are logged and skipped unless abort mode is on.
    pub fn execute(&mut self, plan: ExecutionPlan) -> Result<RunOutcome, EngineError> {
        self.phase = RunPhase::Executing;
        let mut summary = RunSummary {
            planned: plan.call_count(),
            ..RunSummary::default()
        };

        for entry in plan.into_entries() {
            match entry {
                PlanEntry::Call(call) => match self.registry.invoke(&call.step, &call.config)? {
                    CallOutcome::Succeeded(output) => {
                        summary.succeeded += 1;
                        info!(group = %call.group, step = %call.step, "step succeeded");
                        debug!(group = %call.group, step = %call.step, output = %output, "step output");
                    }
                    CallOutcome::Failed(failure) => {
                        summary.failed += 1;
                        if self.options.abort_on_error {
                            error!(fatal = true, group = %call.group, step = %call.step, "{failure}");
                            self.phase = RunPhase::Aborted;
                            return Ok(RunOutcome::Aborted(summary));
                        }
                        error!(group = %call.group, step = %call.step, "{failure}");
                    }
                },
                PlanEntry::Delay(delay) => {
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
            }
        }

        self.phase = RunPhase::Done;
        info!(planned = summary.planned, succeeded = summary.succeeded, failed = summary.failed, "done");
        Ok(RunOutcome::Completed(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderCatalog;
    use serde_json::{Value, json};
    use stackup_types::{StepBinding, StepMapping};

    fn scheduler(options: RunOptions) -> Scheduler {
        let mapping: StepMapping = [("createBucket", StepBinding::new("S3", "createBucket", "createBucket"))]
            .into_iter()
            .collect();
        Scheduler::new(
            options,
            ActionRegistry::new(mapping, ProviderCatalog::dry_run()),
            FormatterRegistry::with_builtins(),
        )
    }

    fn content() -> SetupContent {
        match json!({"storage": {"createBucket": [{"Bucket": "a"}, {"Bucket": "b"}]}}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn phases_follow_the_run() {
        let mut scheduler = scheduler(RunOptions::default());
        assert_eq!(scheduler.phase(), RunPhase::Selecting);

        let mut asked = None;
        let outcome = scheduler
            .run(&content(), &Payload::new(), &mut |count: usize| {
                asked = Some(count);
                true
            })
            .unwrap();

        assert_eq!(asked, Some(2));
        assert_eq!(
            outcome,
            RunOutcome::Completed(RunSummary {
                planned: 2,
                succeeded: 2,
                failed: 0
            })
        );
        assert_eq!(scheduler.phase(), RunPhase::Done);
    }

    #[test]
    fn execute_mode_skips_confirmation() {
        let mut scheduler = scheduler(RunOptions {
            execute: true,
            ..RunOptions::default()
        });
        let outcome = scheduler
            .run(&content(), &Payload::new(), &mut |_: usize| -> bool { panic!("must not ask") })
            .unwrap();
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn empty_plans_skip_confirmation() {
        let mut scheduler = scheduler(RunOptions::default());
        let outcome = scheduler
            .run(&SetupContent::new(), &Payload::new(), &mut |_: usize| -> bool { panic!("must not ask") })
            .unwrap();
        assert_eq!(outcome, RunOutcome::Completed(RunSummary::default()));
    }

    #[test]
    fn declined_runs_exit_cleanly() {
        let mut scheduler = scheduler(RunOptions::default());
        let outcome = scheduler.run(&content(), &Payload::new(), &mut |_: usize| false).unwrap();

        assert_eq!(outcome, RunOutcome::Declined { planned: 2 });
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(scheduler.phase(), RunPhase::Declined);
    }
}
