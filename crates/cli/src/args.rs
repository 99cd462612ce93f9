use std::{path::Path, time::Duration};

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use stackup_engine::{RunOptions, read_document};
use stackup_types::Payload;

#[derive(Debug, Parser)]
#[command(name = "stackup", version, about = "Resolve and execute setup documents step by step")]
pub struct Args {
    /// Provider config file (base URLs, headers, timeouts)
    #[arg(short = 'c', long, value_name = "FILE", default_value = "~/.stackup/providers.yml")]
    pub config_file: String,

    /// Directory holding setup documents and override files
    #[arg(short = 'd', long, value_name = "DIR", default_value = "./setups")]
    pub setups_dir: String,

    /// Setup document, with or without its extension
    #[arg(short = 'f', long, value_name = "FILE", default_value = "setup")]
    pub setup_file: String,

    /// Additional step mapping, looked up in the setups dir when not found as given
    #[arg(short = 'm', long, value_name = "FILE", default_value = "stepmap.json")]
    pub step_map: String,

    /// Additional formatters, looked up in the setups dir when not found as given
    #[arg(short = 'F', long, value_name = "FILE", default_value = "formatters.json")]
    pub formatters: String,

    /// Groups to set up (comma separated), default: all groups
    #[arg(short = 'g', long, value_name = "NAME[,...]", value_delimiter = ',')]
    pub group: Vec<String>,

    /// Steps per selected group: a list (,) or a list of lists (:)
    #[arg(short = 's', long, value_name = "NAME[,...][:...]")]
    pub steps: Option<String>,

    /// Payload variable, may be repeated
    #[arg(short = 'p', long = "payload", value_name = "KEY=VALUE", value_parser = parse_payload_entry)]
    pub payload: Vec<(String, String)>,

    /// Flat JSON/YAML mapping of payload variables; `--payload` entries win
    #[arg(short = 'P', long, value_name = "FILE")]
    pub payload_file: Option<String>,

    /// Seconds to wait between calls
    #[arg(short = 't', long, value_name = "SECONDS", default_value = "0", value_parser = parse_delay)]
    pub delay: Duration,

    /// Stop at the first failed call
    #[arg(short = 'a', long)]
    pub abort: bool,

    /// Execute without prompting
    #[arg(short = 'e', long)]
    pub execute: bool,

    /// Route every provider to the noop provider
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Log level; RUST_LOG takes precedence when set
    #[arg(short = 'l', long, value_enum, ignore_case = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    All,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    /// `tracing` filter directive for this level.
    pub fn directive(self) -> &'static str {
        match self {
            LogLevel::All => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Fatal => "error",
        }
    }
}

impl Args {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            groups: (!self.group.is_empty()).then(|| self.group.clone()),
            step_lists: self.steps.as_deref().map(parse_step_lists),
            delay: self.delay,
            abort_on_error: self.abort,
            execute: self.execute,
        }
    }

    /// Payload file entries overlaid with `--payload` flags.
    pub fn payload(&self) -> Result<Payload> {
        let mut payload = match &self.payload_file {
            Some(file) => load_payload_file(&stackup_util::expand_user_path(file))?,
            None => Payload::new(),
        };
        payload.extend(self.payload.iter().cloned());
        Ok(payload)
    }
}

/// `a,b:c` → `[[a, b], [c]]`
pub fn parse_step_lists(raw: &str) -> Vec<Vec<String>> {
    raw.split(':')
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|step| !step.is_empty())
                .map(str::to_string)
                .collect()
        })
        .collect()
}

fn parse_payload_entry(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

fn parse_delay(raw: &str) -> Result<Duration, String> {
    let seconds: f64 = raw.parse().map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(seconds).map_err(|_| format!("'{raw}' must be a non-negative number of seconds within range"))
}

/// Null entries are left out so that marker defaults apply to them.
fn load_payload_file(path: &Path) -> Result<Payload> {
    let Value::Object(entries) = read_document(path)? else {
        bail!("payload file '{}' must contain a mapping", path.display());
    };
    let mut payload = Payload::new();
    for (key, value) in entries {
        let value = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null => continue,
            Value::Array(_) | Value::Object(_) => {
                bail!("payload variable '{key}' in '{}' must be a scalar", path.display())
            }
        };
        payload.insert(key, value);
    }
    Ok(payload)
}
