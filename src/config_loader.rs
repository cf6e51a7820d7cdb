use crate::config::Config;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::File;
use std::path::Path;

/// Load and parse configuration from a YAML file
pub fn load_config(config_path: &Path) -> Result<Config> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .wrap_err_with(|| format!("Failed to open configuration file '{}'", config_path.display()))?;

    let config: Config = serde_yaml::from_reader(file)
        .wrap_err_with(|| format!("Failed to parse configuration file '{}'", config_path.display()))?;

    config.validate()?;

    if !config.comparison.enabled {
        info!("Baseline comparison disabled; running single-window report");
    }

    Ok(config)
}

/// CLI arguments that can override YAML settings
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub reports_dir: Option<std::path::PathBuf>,
    pub no_summary: bool,
}

/// Apply CLI overrides to a loaded configuration
pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) -> Result<()> {
    if let Some(dir) = &overrides.reports_dir {
        info!("Overriding reports directory: {:?}", dir);
        config.general.reports_dir = dir.clone();
    }

    if overrides.no_summary && config.summarizer.enabled {
        info!("Summarization disabled from the command line");
        config.summarizer.enabled = false;
    }

    config.validate()?;

    if config.summarizer.enabled && config.summarizer.api_key.is_none() {
        warn!(
            "Summarizer enabled but ${} is not set; requests will be sent without credentials",
            config.summarizer.api_key_env
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const YAML: &str = r#"
general:
  reports_dir: "/srv/reports"
source:
  path: "samples.json"
comparison:
  baseline_span: "2days"
summarizer:
  enabled: true
"#;

    #[test]
    fn test_load_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", YAML).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.source.path, PathBuf::from("samples.json"));
        assert_eq!(config.comparison.baseline_span.as_secs(), 2 * 86_400);
        assert!(config.summarizer.enabled);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config(Path::new("/nonexistent/energy-report.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "source:\n  path: \"\"\n").unwrap();
        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "{}", YAML).unwrap();
        let mut config = load_config(temp_file.path()).unwrap();

        let overrides = CliOverrides {
            reports_dir: Some(PathBuf::from("/tmp/out")),
            no_summary: true,
        };
        apply_overrides(&mut config, &overrides).unwrap();

        assert_eq!(config.general.reports_dir, PathBuf::from("/tmp/out"));
        assert!(!config.summarizer.enabled);
    }
}
