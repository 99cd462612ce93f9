mod args;

use std::{io, path::Path, process};

use anyhow::Result;
use clap::Parser;
use stackup_engine::{
    ActionRegistry, FormatterRegistry, PromptConfirmation, ProviderCatalog, ProvidersConfig, RunOutcome, Scheduler, SetupFile,
    SetupSource, load_formatter_overrides, load_step_mapping, locate_optional_file,
};
use stackup_util::expand_user_path;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, LogLevel};

fn main() {
    let args = Args::parse();
    init_tracing(args.log_level);

    match run(&args) {
        Ok(outcome) => process::exit(outcome.exit_code()),
        Err(error) => {
            error!(fatal = true, "{error:#}");
            process::exit(1);
        }
    }
}

fn init_tracing(level: LogLevel) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.directive().into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(io::stderr)
        .try_init();
}

fn run(args: &Args) -> Result<RunOutcome> {
    let setups_path = expand_user_path(&args.setups_dir);
    let setups_dir = setups_path.is_dir().then_some(setups_path.as_path());

    let catalog = if args.dry_run {
        debug!("dry run: every provider is routed to noop");
        ProviderCatalog::dry_run()
    } else {
        ProvidersConfig::load(&expand_user_path(&args.config_file))?.into_catalog()
    };

    let step_mapping_file = locate_optional_file(Path::new(&args.step_map), setups_dir);
    let step_mapping = load_step_mapping(step_mapping_file.as_deref())?;

    let mut formatters = FormatterRegistry::with_builtins();
    if let Some(formatters_file) = locate_optional_file(Path::new(&args.formatters), setups_dir) {
        formatters.merge(load_formatter_overrides(&formatters_file)?);
    }

    let payload = args.payload()?;
    let setup = SetupFile::locate(Path::new(&args.setup_file), Some(&setups_path))?;
    let content = setup.content(&payload)?;

    let mut scheduler = Scheduler::new(args.run_options(), ActionRegistry::new(step_mapping, catalog), formatters);
    let outcome = scheduler.run(&content, &payload, &mut PromptConfirmation::stdio())?;
    Ok(outcome)
}
