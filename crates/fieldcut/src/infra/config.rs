//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::app::process::DEFAULT_MAX_LINE_BYTES;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));

/// Layered configuration loaded from defaults, the global file, an explicit file, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub limits: Limits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "Defaults::default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub separated_only: bool,
}

impl Defaults {
    fn default_delimiter() -> String {
        "\t".to_owned()
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            delimiter: Self::default_delimiter(),
            separated_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default = "Limits::default_max_line_bytes")]
    pub max_line_bytes: usize,
}

impl Limits {
    fn default_max_line_bytes() -> usize {
        DEFAULT_MAX_LINE_BYTES
    }

    /// A line buffer can never grow past `isize::MAX` bytes.
    fn validate(&self) -> Result<()> {
        if self.max_line_bytes == 0 {
            bail!("max_line_bytes must be positive");
        }
        if self.max_line_bytes > isize::MAX as usize {
            bail!(
                "max_line_bytes must not exceed {}, got {}",
                isize::MAX,
                self.max_line_bytes
            );
        }
        Ok(())
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_line_bytes: Self::default_max_line_bytes(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    delimiter: Option<String>,
    max_line_bytes: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            delimiter: env::var("FIELDCUT_DELIMITER").ok(),
            max_line_bytes: env::var("FIELDCUT_MAX_LINE_BYTES").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(delimiter: Option<&str>, max_line_bytes: Option<&str>) -> Self {
        Self {
            delimiter: delimiter.map(str::to_owned),
            max_line_bytes: max_line_bytes.map(str::to_owned),
        }
    }
}

impl Config {
    /// Load configuration from defaults, the global config, an optional explicit file, and env
    /// overrides. The explicit file must exist; the global one is skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with_layers(global_config_path(), explicit, EnvOverrides::from_env())
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        explicit: Option<&Path>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading global config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(path) = explicit {
            layers.push(Self::from_file(path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        let config = apply_env_overrides(merged, env_overrides)?;
        config.limits.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("in config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            limits: merge_limits(self.limits, other.limits),
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        delimiter: if overlay.delimiter != Defaults::default_delimiter() {
            overlay.delimiter
        } else {
            base.delimiter
        },
        separated_only: overlay.separated_only || base.separated_only,
    }
}

fn merge_limits(base: Limits, overlay: Limits) -> Limits {
    Limits {
        max_line_bytes: if overlay.max_line_bytes != Limits::default_max_line_bytes() {
            overlay.max_line_bytes
        } else {
            base.max_line_bytes
        },
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("fieldcut/config.toml"))
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(delimiter) = env.delimiter {
        config.defaults.delimiter = delimiter;
    }
    if let Some(raw) = env.max_line_bytes {
        config.limits.max_line_bytes = raw
            .trim()
            .parse()
            .with_context(|| format!("FIELDCUT_MAX_LINE_BYTES is not a number: {raw:?}"))?;
    }
    Ok(config)
}
