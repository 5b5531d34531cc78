//! Settings file loading and flag overrides.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result, eyre};

use dupetree_core::{DedupeConfig, DisposableRoot};

/// Values given on the command line, applied over the settings file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub disposable: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub min_duplicates: Option<u64>,
}

/// Read a TOML settings file, or defaults when none is given.
pub fn load(path: Option<&Path>) -> Result<DedupeConfig> {
    let Some(path) = path else {
        return Ok(DedupeConfig::default());
    };

    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read settings {}", path.display()))?;
    let config: DedupeConfig = toml::from_str(&text)
        .wrap_err_with(|| format!("Invalid settings in {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Apply flag overrides and check the result.
///
/// A disposable directory given as a flag is resolved to its canonical
/// path so it matches the paths the scanner reports.
pub fn apply(mut config: DedupeConfig, overrides: Overrides) -> Result<DedupeConfig> {
    if let Some(dir) = overrides.disposable {
        let dir = dir
            .canonicalize()
            .wrap_err_with(|| format!("Invalid disposable directory {}", dir.display()))?;
        config.disposable_root = DisposableRoot::directory(dir);
    }
    if let Some(threshold) = overrides.threshold {
        config.threshold = threshold;
    }
    if let Some(min_duplicates) = overrides.min_duplicates {
        config.min_duplicates = min_duplicates;
    }

    config.validate()?;
    if config.disposable_root.as_str().is_empty() {
        return Err(eyre!(
            "No disposable directory; pass --disposable or set disposable_root"
        ));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let config = load(None).unwrap();
        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.min_duplicates, 20);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dupetree.toml");
        fs::write(
            &path,
            "disposable_root = \"/data/old/\"\nthreshold = 0.75\n",
        )
        .unwrap();

        let config = load(Some(path.as_path())).unwrap();
        assert_eq!(config.disposable_root.as_str(), "/data/old/");
        assert_eq!(config.threshold, 0.75);
        assert_eq!(config.chunk_size, 65536);
    }

    #[test]
    fn test_invalid_file_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("dupetree.toml");
        fs::write(&path, "threshold = 3.0\n").unwrap();
        let err = load(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().starts_with("Invalid configuration"));

        assert!(load(Some(temp.path().join("missing.toml").as_path())).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("old");
        fs::create_dir(&dir).unwrap();

        let config = DedupeConfig::new(DisposableRoot::new("/elsewhere/"));
        let config = apply(
            config,
            Overrides {
                disposable: Some(dir.clone()),
                threshold: Some(0.5),
                min_duplicates: None,
            },
        )
        .unwrap();

        assert_eq!(
            config.disposable_root,
            DisposableRoot::directory(dir.canonicalize().unwrap())
        );
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.min_duplicates, 20);
    }

    #[test]
    fn test_disposable_required() {
        let err = apply(DedupeConfig::default(), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("disposable"));
    }

    #[test]
    fn test_bad_threshold_flag() {
        let overrides = Overrides {
            threshold: Some(-1.0),
            ..Default::default()
        };
        let config = DedupeConfig::new(DisposableRoot::new("/x/"));
        assert!(apply(config, overrides).is_err());
    }
}
