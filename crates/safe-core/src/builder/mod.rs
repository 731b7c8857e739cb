//! Assembly of the toolkit from configuration.
//!
//! Factories are looked up by the implementation names used in the config file. Every
//! configured implementation with a known factory is built, so a broken secondary
//! entry is reported at startup, and the `primary` one is kept.

use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use safe_account::{AccountError, AccountInterface, AccountService};
use safe_config::{Config, SigningModeConfig};
use safe_signer::{SignerError, SignerInterface, SignerService};
use safe_types::SecretString;
use thiserror::Error;

use crate::collector::SigningMode;
use crate::executor::SafeExecutor;

#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

impl From<BuilderError> for crate::SafeError {
	fn from(err: BuilderError) -> Self {
		crate::SafeError::Config(err.to_string())
	}
}

/// Factory functions keyed by implementation name.
pub struct SafeFactories<SF, AF> {
	pub signer_factories: HashMap<String, SF>,
	pub account_factories: HashMap<String, AF>,
}

/// Everything needed to authorize and execute transactions on one Safe.
pub struct SafeToolkit {
	pub safe: Address,
	pub signers: SignerService,
	pub account: Arc<AccountService>,
	pub executor: SafeExecutor,
	pub default_mode: SigningMode,
}

impl From<(SigningModeConfig, bool)> for SigningMode {
	fn from((mode, skip_on_chain): (SigningModeConfig, bool)) -> Self {
		match mode {
			SigningModeConfig::TypedData => SigningMode::TypedData,
			SigningModeConfig::PrefixedMessage => SigningMode::PrefixedMessage,
			SigningModeConfig::PreApproval => SigningMode::PreApproval { skip_on_chain },
		}
	}
}

pub struct SafeBuilder {
	config: Config,
}

impl SafeBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub async fn build<SF, AF>(self, factories: SafeFactories<SF, AF>) -> Result<SafeToolkit, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Vec<Box<dyn SignerInterface>>, SignerError>,
		AF: Fn(&toml::Value, Address, &[SecretString]) -> Result<Box<dyn AccountInterface>, AccountError>,
	{
		let safe = self.config.safe.address;

		let mut signer_impls = HashMap::new();
		for (name, config) in &self.config.signers.implementations {
			let Some(factory) = factories.signer_factories.get(name) else {
				continue;
			};
			match factory(config) {
				Ok(signers) => {
					if let Some(signer) = signers.first() {
						if let Err(e) = signer.config_schema().validate(config) {
							tracing::error!(
								component = "signers",
								implementation = %name,
								error = %e,
								"Invalid configuration for signer implementation"
							);
							return Err(BuilderError::Config(format!(
								"Invalid configuration for signer implementation '{}': {}",
								name, e
							)));
						}
					}
					let is_primary = &self.config.signers.primary == name;
					tracing::info!(component = "signers", implementation = %name, count = signers.len(), enabled = %is_primary, "Loaded");
					signer_impls.insert(name.clone(), signers);
				},
				Err(e) => {
					tracing::error!(
						component = "signers",
						implementation = %name,
						error = %e,
						"Failed to create signer implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create signer implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary_signers = &self.config.signers.primary;
		let signers = signer_impls.remove(primary_signers).ok_or_else(|| {
			BuilderError::MissingComponent(format!(
				"Primary signer '{}' has no registered implementation",
				primary_signers
			))
		})?;
		let signers = SignerService::new(signers);
		if signers.is_empty() {
			return Err(BuilderError::Config("No signers configured".into()));
		}

		// Owners may need to send approveHash from their own accounts.
		let approver_keys = signers.private_keys();

		let primary_account = &self.config.account.primary;
		let factory = factories
			.account_factories
			.get(primary_account)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!(
					"Primary account '{}' has no registered implementation",
					primary_account
				))
			})?;
		let account_config = self
			.config
			.account
			.implementations
			.get(primary_account)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary account '{}' has no configuration",
					primary_account
				))
			})?;

		let account = match factory(account_config, safe, &approver_keys) {
			Ok(implementation) => {
				if let Err(e) = implementation.config_schema().validate(account_config) {
					tracing::error!(
						component = "account",
						implementation = %primary_account,
						error = %e,
						"Invalid configuration for account implementation"
					);
					return Err(BuilderError::Config(format!(
						"Invalid configuration for account implementation '{}': {}",
						primary_account, e
					)));
				}
				tracing::info!(component = "account", implementation = %primary_account, safe = %safe, "Loaded");
				Arc::new(AccountService::new(implementation))
			},
			Err(e) => {
				tracing::error!(
					component = "account",
					implementation = %primary_account,
					error = %e,
					"Failed to create account implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create account implementation '{}': {}",
					primary_account, e
				)));
			},
		};

		if account.address() != safe {
			return Err(BuilderError::Config(format!(
				"Account implementation targets {} instead of {}",
				account.address(),
				safe
			)));
		}

		Ok(SafeToolkit {
			safe,
			signers,
			executor: SafeExecutor::new(account.clone()),
			account,
			default_mode: SigningMode::from((
				self.config.signers.default_mode,
				self.config.signers.skip_on_chain,
			)),
		})
	}
}
