//! Registry of signer and account factories, keyed by the names used in config files.

use safe_account::AccountFactory;
use safe_config::Config;
use safe_core::{SafeBuilder, SafeFactories, SafeToolkit};
use safe_signer::SignerFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct FactoryRegistry {
	pub signer: HashMap<String, SignerFactory>,
	pub account: HashMap<String, AccountFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			signer: HashMap::new(),
			account: HashMap::new(),
		}
	}

	pub fn register_signer(&mut self, name: impl Into<String>, factory: SignerFactory) {
		self.signer.insert(name.into(), factory);
	}

	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the process-wide registry, populating it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in safe_signer::get_all_implementations() {
			tracing::debug!("Registering signer implementation: {}", name);
			registry.register_signer(name, factory);
		}

		for (name, factory) in safe_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		registry
	})
}

/// Picks the factory for every configured implementation, failing on unknown names.
macro_rules! build_factories {
	($registry:expr, $config_impls:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $config_impls.keys() {
			if let Some(factory) = $registry.$registry_field.get(name) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the toolkit for `config` from the registered implementations.
pub async fn build_toolkit_from_config(
	config: Config,
) -> Result<SafeToolkit, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let signer_factories =
		build_factories!(registry, config.signers.implementations, signer, "signer");
	let account_factories =
		build_factories!(registry, config.account.implementations, account, "account");

	let factories = SafeFactories {
		signer_factories,
		account_factories,
	};

	Ok(SafeBuilder::new(config).build(factories).await?)
}

#[cfg(test)]
mod tests {
	use super::*;

	const CONFIG: &str = r#"
[safe]
address = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa0001"

[account]
primary = "evm_alloy"
[account.implementations.evm_alloy]
rpc_url = "http://localhost:8545"
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"

[signers]
primary = "local"
[signers.implementations.local]
private_keys = [
	"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
	"0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
]
"#;

	#[test]
	fn test_registry_has_builtin_implementations() {
		let registry = get_registry();
		assert!(registry.signer.contains_key("local"));
		assert!(registry.account.contains_key("evm_alloy"));
	}

	#[tokio::test]
	async fn test_build_toolkit_without_network_access() {
		let config: Config = CONFIG.parse().unwrap();
		let toolkit = build_toolkit_from_config(config).await.unwrap();

		assert_eq!(toolkit.signers.len(), 2);
		assert_eq!(toolkit.account.address(), toolkit.safe);
	}

	#[tokio::test]
	async fn test_unknown_implementation_lists_available() {
		let config: Config = CONFIG
			.replace("primary = \"local\"", "primary = \"ledger\"")
			.replace("[signers.implementations.local]", "[signers.implementations.ledger]")
			.parse()
			.unwrap();

		let err = build_toolkit_from_config(config).await.err().unwrap().to_string();
		assert!(err.contains("Unknown signer implementation 'ledger'"));
		assert!(err.contains("local"));
	}
}
