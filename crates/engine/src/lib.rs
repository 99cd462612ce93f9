//! # Stackup Engine
//!
//! The Stackup Engine turns a setup document into an ordered queue of provider
//! calls and executes it. Configuration values may embed `${name|default}`
//! variable markers and `%{formatter.path:args}` formatter markers, which are
//! resolved against the run payload before anything executes.
//!
//! ## Key Features
//!
//! - **Template Resolution**: Right-to-left, innermost-first marker resolution
//! - **Formatters**: Dot-namespaced functions (`base64`, `keyGen`, `script`, `script64`) with file overrides
//! - **Step Mapping**: Built-in step table with partial overrides
//! - **Execution**: Sequential queue with delays, confirmation and abort mode
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use stackup_engine::{
//!     ActionRegistry, AutoConfirm, FormatterRegistry, ProviderCatalog, RunOptions, RunOutcome, Scheduler,
//!     builtin_step_mapping,
//! };
//! use stackup_types::Payload;
//!
//! let content = json!({
//!     "storage": { "createBucket": { "Bucket": "${bucket|assets}" } }
//! });
//! let content = content.as_object().cloned().unwrap_or_default();
//!
//! let registry = ActionRegistry::new(builtin_step_mapping()?, ProviderCatalog::dry_run());
//! let mut scheduler = Scheduler::new(RunOptions::default(), registry, FormatterRegistry::with_builtins());
//!
//! let outcome = scheduler.run(&content, &Payload::new(), &mut AutoConfirm)?;
//! assert!(matches!(outcome, RunOutcome::Completed(summary) if summary.succeeded == 1));
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - **`resolve`**: Template marker scanning and substitution
//! - **`formatters`**: Formatter registry, built-ins and override files
//! - **`provider`**: Provider trait, catalog, `noop` and `http` providers
//! - **`actions`**: Step bindings and provider instance caching
//! - **`scheduler`**: Group selection, planning, confirmation and execution
//! - **`setup`** / **`stepmap`** / **`document`**: File loaders

pub mod actions;
pub mod document;
pub mod error;
pub mod formatters;
pub mod provider;
pub mod resolve;
pub mod scheduler;
pub mod setup;
pub mod stepmap;

pub use actions::{ActionRegistry, BoundAction, CallOutcome};
pub use document::{locate_optional_file, read_document};
pub use error::EngineError;
pub use formatters::{FormatterRegistry, load_formatter_overrides};
pub use provider::{ActionError, ActionProvider, HttpProvider, NoopProvider, ProviderCatalog, ProvidersConfig};
pub use resolve::resolve_value;
pub use scheduler::{
    AutoConfirm, ConfirmationPort, ExecutionPlan, PlanEntry, PlannedCall, PromptConfirmation, RunOptions, RunOutcome, RunPhase,
    RunSummary, Scheduler,
};
pub use setup::{SetupFile, SetupSource, load_setup_content, locate_setup_file};
pub use stepmap::{builtin_step_mapping, load_step_mapping, merge_step_mapping};
