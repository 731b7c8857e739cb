//! Configuration for the Safe toolkit.
//!
//! A configuration names the Safe, the account implementation that talks to it and
//! the signers that authorize its transactions. It is loaded from TOML with
//! `${VAR}` / `${VAR:-default}` environment substitution.
//!
//! The entry file may move sections into sibling files with
//! `include = ["account.toml", "signers.toml"]`. Each section must come from exactly
//! one file.

mod loader;

#[cfg(any(test, feature = "testing"))]
pub mod builders {
	pub mod config;
}

use alloy_primitives::Address;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	pub safe: SafeConfig,
	pub account: AccountConfig,
	pub signers: SignersConfig,
}

/// The Safe being operated on.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SafeConfig {
	pub address: Address,
}

/// Account implementations able to reach the Safe.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their raw configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// How signers authorize a transaction when no mode is given explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningModeConfig {
	#[default]
	TypedData,
	PrefixedMessage,
	PreApproval,
}

/// Signer implementations holding owner keys.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignersConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	#[serde(default)]
	pub default_mode: SigningModeConfig,
	/// With `pre_approval`, skip the `approveHash` call and assume the owners already
	/// approved on-chain.
	#[serde(default)]
	pub skip_on_chain: bool,
	/// Map of signer implementation names to their raw configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut replacements = Vec::new();
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	let mut result = input.to_string();
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		loader::load(Path::new(path)).await
	}

	/// Checks cross-section consistency that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.safe.address == Address::ZERO {
			return Err(ConfigError::Validation(
				"Safe address cannot be the zero address".into(),
			));
		}

		if self.account.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one account implementation must be configured".into(),
			));
		}
		if !self.account.implementations.contains_key(&self.account.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary account '{}' not found in implementations",
				self.account.primary
			)));
		}

		if self.signers.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one signer implementation must be configured".into(),
			));
		}
		if !self.signers.implementations.contains_key(&self.signers.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary signer '{}' not found in implementations",
				self.signers.primary
			)));
		}

		Ok(())
	}
}

/// Parses TOML, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
