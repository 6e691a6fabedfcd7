use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Dump options read from a JSON file. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DumpConfig {
    /// Pause the guest for the duration of the sweep.
    pub pause: bool,
    /// Show a progress bar.
    pub progress: bool,
    /// fsync the output after the last page.
    pub sync: bool,
}

impl Default for DumpConfig {
    fn default() -> Self {
        DumpConfig {
            pause: false,
            progress: true,
            sync: true,
        }
    }
}

impl DumpConfig {
    pub fn from_jsonfile(filepath: impl AsRef<Path>) -> Result<DumpConfig> {
        let filepath = filepath.as_ref();
        let file = File::open(filepath)
            .with_context(|| format!("failed to open config {}", filepath.display()))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse config {}", filepath.display()))?;
        Ok(config)
    }
}
