use mimic_core::{MimicError, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::MimicConfig;

/// Loads the Mimic configuration and applies environment overrides.
pub struct ConfigLoader {
    config: MimicConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > MIMIC_CONFIG env > ~/.mimic/mimic.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("MIMIC_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mimic")
            .join("mimic.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = Self::read(&config_path)?;
        let config = Self::apply_env_overrides(config);
        Self::check(&config)?;
        Ok(Self { config, config_path })
    }

    /// Validate a config: log warnings, fail on errors.
    pub fn check(config: &MimicConfig) -> Result<()> {
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
                Ok(())
            }
            Err(e) => Err(MimicError::Config(e)),
        }
    }

    /// Parse a config file without overrides or validation.
    /// A missing file yields the defaults.
    pub fn read(config_path: &Path) -> Result<MimicConfig> {
        if !config_path.exists() {
            warn!(?config_path, "config file not found, using defaults");
            return Ok(MimicConfig::default());
        }
        info!(?config_path, "loading configuration");
        let raw = std::fs::read_to_string(config_path)?;
        toml::from_str::<MimicConfig>(&raw).map_err(|e| {
            MimicError::Config(format!("failed to parse {}: {}", config_path.display(), e))
        })
    }

    /// Get a copy of the loaded config.
    pub fn get(&self) -> MimicConfig {
        self.config.clone()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (MIMIC_MAX_STEPS, MIMIC_POLICY, etc.)
    pub fn apply_env_overrides(config: MimicConfig) -> MimicConfig {
        Self::apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `var`, so the rules can be exercised
    /// without touching the process environment.
    pub fn apply_overrides_from(mut config: MimicConfig, var: impl Fn(&str) -> Option<String>) -> MimicConfig {
        if let Some(v) = var("MIMIC_MAX_STEPS") {
            match v.parse::<usize>() {
                Ok(steps) => config.simulation.max_steps = steps,
                Err(_) => warn!(value = %v, "ignoring invalid MIMIC_MAX_STEPS"),
            }
        }
        if let Some(v) = var("MIMIC_POLICY") {
            config.simulation.policy = v;
        }
        if let Some(v) = var("MIMIC_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Some(v) = var("MIMIC_OUTPUT_DIR") {
            config.simulation.output_dir = PathBuf::from(v);
        }
        if let Some(v) = var("OPENAI_BASE_URL") {
            config.llm.base_url = v;
        }
        // API key: the config file takes priority, env is the fallback.
        if config.llm.api_key.is_none() {
            if let Some(v) = var("OPENAI_API_KEY") {
                config.llm.api_key = Some(v);
            }
        }
        config
    }
}
