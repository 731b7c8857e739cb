//! Fluent construction of `Config` values for tests.

use crate::{AccountConfig, Config, SafeConfig, SignersConfig, SigningModeConfig};
use alloy_primitives::Address;
use std::collections::HashMap;

/// Builds a `Config` around one account and one signer implementation.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	safe: Address,
	account_primary: String,
	account_config: toml::Table,
	signers_primary: String,
	signers_config: toml::Table,
	default_mode: SigningModeConfig,
	skip_on_chain: bool,
}

impl ConfigBuilder {
	pub fn new(safe: Address) -> Self {
		Self {
			safe,
			account_primary: "evm_alloy".to_string(),
			account_config: toml::Table::new(),
			signers_primary: "local".to_string(),
			signers_config: toml::Table::new(),
			default_mode: SigningModeConfig::default(),
			skip_on_chain: false,
		}
	}

	/// Sets the primary account implementation and its config table.
	pub fn account(mut self, primary: impl Into<String>, config: toml::Table) -> Self {
		self.account_primary = primary.into();
		self.account_config = config;
		self
	}

	/// Sets the primary signer implementation and its config table.
	pub fn signers(mut self, primary: impl Into<String>, config: toml::Table) -> Self {
		self.signers_primary = primary.into();
		self.signers_config = config;
		self
	}

	/// Shorthand for the local signer with the given keys.
	pub fn local_keys(self, keys: &[&str]) -> Self {
		let mut table = toml::Table::new();
		table.insert(
			"private_keys".to_string(),
			toml::Value::Array(keys.iter().map(|k| toml::Value::from(*k)).collect()),
		);
		self.signers("local", table)
	}

	pub fn default_mode(mut self, mode: SigningModeConfig, skip_on_chain: bool) -> Self {
		self.default_mode = mode;
		self.skip_on_chain = skip_on_chain;
		self
	}

	pub fn build(self) -> Config {
		Config {
			safe: SafeConfig { address: self.safe },
			account: AccountConfig {
				implementations: HashMap::from([(
					self.account_primary.clone(),
					toml::Value::Table(self.account_config),
				)]),
				primary: self.account_primary,
			},
			signers: SignersConfig {
				implementations: HashMap::from([(
					self.signers_primary.clone(),
					toml::Value::Table(self.signers_config),
				)]),
				primary: self.signers_primary,
				default_mode: self.default_mode,
				skip_on_chain: self.skip_on_chain,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_builder_sets_primaries() {
		let config = ConfigBuilder::new(address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa0001"))
			.local_keys(&["0x01"])
			.default_mode(SigningModeConfig::PreApproval, true)
			.build();

		assert_eq!(config.signers.primary, "local");
		assert!(config.signers.implementations["local"]
			.get("private_keys")
			.and_then(|v| v.as_array())
			.is_some_and(|keys| keys.len() == 1));
		assert!(config.account.implementations.contains_key("evm_alloy"));
		assert!(config.signers.skip_on_chain);
	}
}
