//! Setup document loading.
//!
//! The setup file may be named with or without its extension and is looked
//! up as given first, then inside the setups directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use stackup_types::{Payload, SetupContent};
use tracing::debug;

use crate::document::{has_extension, read_document};

/// Extensions accepted for setup documents, in probing order.
pub const SETUP_EXTENSIONS: [&str; 3] = ["json", "yml", "yaml"];

/// Produces the setup content for a run.
///
/// Implemented by [`SetupFile`] and by any `Fn(&Payload) -> Result<SetupContent>`,
/// which covers documents generated from the payload.
pub trait SetupSource {
    fn content(&self, payload: &Payload) -> Result<SetupContent>;
}

impl<F> SetupSource for F
where
    F: Fn(&Payload) -> Result<SetupContent>,
{
    fn content(&self, payload: &Payload) -> Result<SetupContent> {
        self(payload)
    }
}

/// A setup document on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupFile {
    path: PathBuf,
}

impl SetupFile {
    /// Locates the setup file and checks that its extension is supported.
    pub fn locate(file: &Path, setups_dir: Option<&Path>) -> Result<Self> {
        Ok(Self {
            path: locate_setup_file(file, setups_dir)?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SetupSource for SetupFile {
    fn content(&self, _payload: &Payload) -> Result<SetupContent> {
        load_setup_content(&self.path)
    }
}

/// Probes `file`, `file.json`, `file.yml` and `file.yaml`, first as given and
/// then under `setups_dir`.
pub fn locate_setup_file(file: &Path, setups_dir: Option<&Path>) -> Result<PathBuf> {
    let located = match find_with_extension(file) {
        Some(path) => path,
        None => {
            let setups_dir = match setups_dir {
                Some(dir) if dir.is_dir() => dir,
                Some(dir) => bail!("setups-dir '{}' does not exist", dir.display()),
                None => bail!("setups-dir '' does not exist"),
            };
            find_with_extension(&setups_dir.join(file)).context("setup-file does not exist")?
        }
    };
    debug!(file = %located.display(), "use setup-file");

    let extension = located
        .extension()
        .and_then(|extension| extension.to_str())
        .unwrap_or_default();
    if !SETUP_EXTENSIONS
        .iter()
        .any(|supported| has_extension(&located, supported))
    {
        bail!("setup-file extension '{extension}' not supported");
    }
    Ok(located)
}

fn find_with_extension(file: &Path) -> Option<PathBuf> {
    if file.is_file() {
        return Some(file.to_path_buf());
    }
    SETUP_EXTENSIONS.iter().find_map(|extension| {
        let mut candidate = file.as_os_str().to_owned();
        candidate.push(".");
        candidate.push(extension);
        let candidate = PathBuf::from(candidate);
        candidate.is_file().then_some(candidate)
    })
}

/// Reads a setup document; the top level must be a mapping of groups.
pub fn load_setup_content(path: &Path) -> Result<SetupContent> {
    match read_document(path)? {
        Value::Object(content) => {
            debug!(file = %path.display(), groups = content.len(), "read setup content");
            Ok(content)
        }
        _ => bail!("setup-file '{}' must contain a mapping of groups", path.display()),
    }
}
