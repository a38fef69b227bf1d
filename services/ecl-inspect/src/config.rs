//! Configuration file for the inspector.
//!
//! ```yaml
//! summary:
//!   follow_restarts: true
//!   bulk_load_fraction: 0.25
//! logging:
//!   level: ${INSPECT_LOG_LEVEL:-info}
//!   format: json
//! ```
//!
//! Values may reference environment variables as `${VAR}` or
//! `${VAR:-default}`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use summary_reader::SummaryOptions;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub summary: SummaryOptions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `summary_reader=debug`
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl InspectConfig {
    /// Load a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config from {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: InspectConfig = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let fraction = self.summary.bulk_load_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            anyhow::bail!("summary.bulk_load_fraction must be within [0, 1], got {}", fraction);
        }
        Ok(())
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut expr = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(c) => expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", expr),
                }
            }
            result.push_str(&resolve_var_expr(&expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    match expr.split_once(":-") {
        Some((name, default)) => Ok(std::env::var(name).unwrap_or_else(|_| default.to_string())),
        None => std::env::var(expr)
            .with_context(|| format!("Environment variable {} is not set", expr)),
    }
}
