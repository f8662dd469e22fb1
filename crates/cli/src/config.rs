//! Configuration management for the CLI
//!
//! Settings are layered: built-in defaults, then an optional
//! `~/.config/kshow/config.{toml,json,yaml}`, then `KSHOW_*` environment
//! variables. Nested keys use a double underscore, for example
//! `KSHOW_LABEL_KEYS__CAPACITY_TYPE=karpenter.sh/capacity-type`.

use anyhow::{Context, Result};
use kshow_lib::LabelKeys;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// CLI settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Namespace used when `-n` is not given (all namespaces if unset)
    pub default_namespace: Option<String>,
    /// Output format used when `--format` is not given
    pub format: Option<OutputFormat>,
    /// Kubeconfig path used when `--kubeconfig` is not given
    pub kubeconfig: Option<String>,
    /// Kubeconfig context used when `--context` is not given
    pub context: Option<String>,
    /// Label keys identifying node hostname, capacity type, group, ...
    pub label_keys: LabelKeys,
}

impl Settings {
    /// Load settings from the user config file and environment
    pub fn load() -> Result<Self> {
        let base = Self::config_base()?;
        Self::load_from(Some(&base))
    }

    /// Load settings from `base` (any supported extension) and environment
    pub fn load_from(base: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(base) = base {
            builder = builder.add_source(
                config::File::with_name(&base.to_string_lossy()).required(false),
            );
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("KSHOW")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Config file path without extension
    fn config_base() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("kshow").join("config"))
    }
}
