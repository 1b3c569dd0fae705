//! Reading encounter descriptions from disk.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use skyraid_system_bootstrap::EncounterConfig;

/// Reads and parses the TOML encounter at `path`.
pub(crate) fn load(path: &Path) -> Result<EncounterConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read encounter at {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to load encounter at {}", path.display()))
}

fn parse(contents: &str) -> Result<EncounterConfig> {
    toml::from_str(contents).context("failed to parse encounter toml contents")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_encounter_parses() {
        let config = parse(include_str!("../../../assets/encounter.toml")).expect("sample parses");
        assert!(config.boss.is_some());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn missing_plan_is_reported() {
        let error = parse("seed = 3\ntemplates = []\n").expect_err("plan is required");
        let message = format!("{error:#}");
        assert!(message.starts_with("failed to parse encounter toml contents"));
        assert!(message.contains("plan"), "{message}");
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let error = load(Path::new("does/not/exist.toml")).expect_err("file is missing");
        assert!(error.to_string().contains("does/not/exist.toml"));
    }
}
