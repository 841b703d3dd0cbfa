//! Configuration loader with multi-source merging

use crate::{LabConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Default environment variable prefix.
pub const ENV_PREFIX: &str = "SLOWLAB";

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    include_user_config: bool,
    env_source: Option<config::Map<String, String>>,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            include_user_config: true,
            env_source: None,
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Skip `~/.config/slowlab/config.toml`.
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Read variables from `vars` instead of the process environment.
    pub fn with_env_source(mut self, vars: config::Map<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<LabConfig> {
        let mut builder = config::Config::builder();

        // 1. Built-in defaults
        let defaults = LabConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/slowlab/config.toml)
        if self.include_user_config
            && let Ok(user_config_file) = Paths::new().user_config_file()
            && user_config_file.exists()
        {
            builder = builder.add_source(
                config::File::from(user_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 3. Project config (slowlab.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (slowlab.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (SLOWLAB_<SECTION>__<KEY>)
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(self.env_source),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let mut lab_config: LabConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        lab_config.resolve_paths(&self.project_dir);
        lab_config.normalize();
        lab_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(lab_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn loader(project_dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(project_dir)
            .without_user_config()
            .with_env_source(config::Map::new())
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path()).load().expect("Failed to load config");

        assert_eq!(config.seed.orders, 1_000_000);
        assert_eq!(config.seed.batch_size, 1_000);
        assert_eq!(config.seed.seed, 42);
        assert_eq!(config.store.threads, 4);
        assert!(config.run.explain);
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[store]
database = "lab.duckdb"
memory_limit = "512MB"

[seed]
orders = 5000
batch_size = 250

[run]
explain = false
"#;
        fs::write(project_dir.join("slowlab.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(
            PathBuf::from(&config.store.database),
            project_dir.join("lab.duckdb")
        );
        assert_eq!(config.store.memory_limit, "512MB");
        assert_eq!(config.seed.orders, 5000);
        assert_eq!(config.seed.batch_size, 250);
        assert!(!config.run.explain);
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("slowlab.toml"),
            "[seed]\nseed = 7\nbatch_size = 100\n",
        )
        .expect("Failed to write project config");
        fs::write(project_dir.join("slowlab.local.toml"), "[seed]\nseed = 9\n")
            .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.seed.seed, 9);
        assert_eq!(config.seed.batch_size, 100);
    }

    #[test]
    fn test_environment_overrides_files() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();
        fs::write(project_dir.join("slowlab.toml"), "[seed]\norders = 10\n")
            .expect("Failed to write config");

        let vars = config::Map::from([
            ("SLOWLAB_SEED__ORDERS".to_string(), "2000000".to_string()),
            ("SLOWLAB_STORE__DATABASE".to_string(), ":memory:".to_string()),
            ("SLOWLAB_RUN__EXPLAIN".to_string(), "false".to_string()),
        ]);
        let config = ConfigLoader::new()
            .with_project_dir(project_dir)
            .without_user_config()
            .with_env_source(vars)
            .load()
            .expect("Failed to load config");

        assert_eq!(config.seed.orders, 2_000_000);
        assert_eq!(config.store.database, ":memory:");
        assert!(!config.run.explain);
    }

    #[test]
    fn test_zero_batch_size_uses_default() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();
        fs::write(project_dir.join("slowlab.toml"), "[seed]\nbatch_size = 0\n")
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");
        assert_eq!(config.seed.batch_size, crate::DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_malformed_params_are_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();
        fs::write(
            project_dir.join("slowlab.toml"),
            "[store]\nparams = \"threads\"\n",
        )
        .expect("Failed to write config");

        let err = loader(project_dir).load().unwrap_err();
        assert!(format!("{err:#}").contains("expected key=value"));
    }
}
