//! Fatal engine errors.
//!
//! Every variant here stops a run before (or instead of) executing further
//! calls. Recoverable provider failures are [`crate::provider::ActionError`]
//! values and never travel through this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("formatter '{path}' not found")]
    UnknownFormatter { path: String },

    #[error("formatter '{path}' failed: {source}")]
    FormatterFailed {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("unterminated '{marker}' marker at offset {position} in template '{template}'")]
    MalformedTemplate {
        template: String,
        marker: &'static str,
        position: usize,
    },

    #[error("step '{step}' is not defined in the step mapping")]
    UnknownStep { step: String },

    #[error("provider '{provider}' (required by step '{step}') is not registered")]
    UnknownProvider { provider: String, step: String },

    #[error("provider '{provider}' could not be initialised: {source}")]
    ProviderInit {
        provider: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("group '{group}' does not exist in the setup document")]
    UnknownGroup { group: String },

    #[error("group '{group}' must be a mapping of configuration keys")]
    InvalidGroup { group: String },

    #[error("the 'steps' entry of group '{group}' must be a list of step names")]
    InvalidStepList { group: String },

    #[error("steps and groups cannot be matched: {step_lists} step list(s) for {groups} group(s)")]
    GroupStepMismatch { groups: usize, step_lists: usize },
}
