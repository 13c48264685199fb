//! Configuration management
//!
//! This module handles loading, validation, and management of the Stride
//! configuration. Configuration is stored in TOML format at
//! ~/.stride/config.toml and created with defaults on first use.
//!
//! # Configuration Sections
//!
//! - **core**: Log level and step budget
//! - **llm**: Backend endpoint, model and sampling temperature
//! - **tools**: Code runner, puzzle site and reviewer settings
//!
//! # Environment Overrides
//!
//! Applied after the file is loaded (a `.env` file in the working directory is
//! read first by the binary):
//!
//! - `STRIDE_MAX_STEPS` -> `core.max_steps`
//! - `STRIDE_LOG` -> `core.log_level`
//! - `OPENAI_MODEL` -> `llm.model`
//! - `OPENAI_BASE_URL` -> `llm.base_url`
//!
//! Secrets (`OPENAI_API_KEY`, `AOC_SESSION`) are never stored here.
//!
//! # Examples
//!
//! ```no_run
//! use stride_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = Config::load_or_create()?;
//! config.apply_env_overrides(|key| std::env::var(key).ok())?;
//! println!("Model: {}", config.llm.model);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Core loop settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Backend settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Capability settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Core loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum backend calls per run
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Sampling temperature (0.0-2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    // Note: API key read from OPENAI_API_KEY, not from config
}

/// Capability configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    /// Interpreter used by run_python
    #[serde(default = "default_python")]
    pub python: String,

    /// Wall-clock limit for one run_python call (seconds)
    #[serde(default = "default_python_timeout")]
    pub python_timeout_secs: u64,

    /// Base URL of the puzzle site
    #[serde(default = "default_advent_base_url")]
    pub advent_base_url: String,

    /// Year used when a call omits one
    #[serde(default = "default_year")]
    pub default_year: i64,

    /// Register the run_reviewer sub-agent
    #[serde(default = "default_true")]
    pub reviewer: bool,

    /// Step budget of each reviewer run
    #[serde(default = "default_reviewer_max_steps")]
    pub reviewer_max_steps: usize,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_steps() -> usize {
    20
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-5-mini".to_string()
}

fn default_temperature() -> f64 {
    1.0
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_python_timeout() -> u64 {
    5
}

fn default_advent_base_url() -> String {
    "https://adventofcode.com".to_string()
}

fn default_year() -> i64 {
    2024
}

fn default_true() -> bool {
    true
}

fn default_reviewer_max_steps() -> usize {
    10
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            max_steps: default_max_steps(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: default_temperature(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            python_timeout_secs: default_python_timeout(),
            advent_base_url: default_advent_base_url(),
            default_year: default_year(),
            reviewer: true,
            reviewer_max_steps: default_reviewer_max_steps(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.stride/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, TOML parsing
    /// fails, or validation fails.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate configuration text
    pub fn from_toml(contents: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.stride/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".stride").join("config.toml"))
    }

    /// Apply environment overrides, then re-validate
    ///
    /// `lookup` abstracts the environment so tests need not mutate it.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(steps) = lookup("STRIDE_MAX_STEPS") {
            self.core.max_steps = steps.trim().parse().map_err(|_| {
                EngineError::Config(format!("STRIDE_MAX_STEPS is not a number: '{}'", steps))
            })?;
        }
        if let Some(level) = lookup("STRIDE_LOG") {
            self.core.log_level = level.trim().to_lowercase();
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.llm.model = model;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.llm.base_url = url;
        }

        self.validate()
    }

    /// Validate field ranges
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.core.max_steps == 0 {
            return Err(EngineError::Config(
                "max_steps must be at least 1".to_string(),
            ));
        }

        if self.tools.reviewer_max_steps == 0 {
            return Err(EngineError::Config(
                "reviewer_max_steps must be at least 1".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EngineError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.tools.python_timeout_secs == 0 {
            return Err(EngineError::Config(
                "python_timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(EngineError::Config("llm.model must not be empty".to_string()));
        }

        Ok(())
    }
}
