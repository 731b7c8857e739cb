//! Signing capabilities for Safe owners.
//!
//! A signer holds one owner key and produces raw ECDSA signatures over 32-byte digests,
//! EIP-191 personal-sign messages and EIP-712 typed data. Turning those signatures into
//! Safe authorization records is left to the collector in `safe-core`.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloy_primitives::{Address, Signature, B256};
use async_trait::async_trait;
use safe_types::{ConfigSchema, ImplementationRegistry, SecretString, TypedData};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during signing operations.
#[derive(Debug, Error)]
pub enum SignerError {
	/// The underlying key failed to produce a signature.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// A configured key is malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// No signer is registered for the requested address.
	#[error("Unknown signer: {0}")]
	UnknownSigner(Address),
}

/// Trait implemented by every signing backend.
#[async_trait]
pub trait SignerInterface: Send + Sync {
	/// Returns the configuration schema for this signer implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// The owner address this signer signs for.
	fn address(&self) -> Address;

	/// Signs `hash` as-is, with no prefix.
	async fn sign_hash(&self, hash: &B256) -> Result<Signature, SignerError>;

	/// Signs `message` with the EIP-191 `personal_sign` prefix.
	async fn sign_message(&self, message: &[u8]) -> Result<Signature, SignerError>;

	/// Signs the EIP-712 digest of `typed_data`.
	async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Signature, SignerError>;

	/// Returns the private key as a SecretString with 0x prefix.
	///
	/// The account service needs owner keys to send `approveHash` from each owner.
	fn get_private_key(&self) -> SecretString;
}

/// Type alias for signer factory functions.
///
/// One config table may describe several keys, so a factory returns every signer it
/// builds.
pub type SignerFactory = fn(&toml::Value) -> Result<Vec<Box<dyn SignerInterface>>, SignerError>;

/// Registry trait for signer implementations.
pub trait SignerRegistry: ImplementationRegistry<Factory = SignerFactory> {}

/// Get all registered signer implementations.
pub fn get_all_implementations() -> Vec<(&'static str, SignerFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Signers indexed by owner address.
///
/// Iteration order is ascending by address, which is also the order the Safe expects
/// signatures in.
#[derive(Clone, Default)]
pub struct SignerService {
	signers: BTreeMap<Address, Arc<dyn SignerInterface>>,
}

impl SignerService {
	/// Creates a service from a set of signers. A later signer with the same address
	/// replaces an earlier one.
	pub fn new(signers: Vec<Box<dyn SignerInterface>>) -> Self {
		let signers = signers
			.into_iter()
			.map(|signer| {
				let signer: Arc<dyn SignerInterface> = Arc::from(signer);
				(signer.address(), signer)
			})
			.collect();
		Self { signers }
	}

	/// Looks up the signer for `address`.
	pub fn get(&self, address: &Address) -> Result<Arc<dyn SignerInterface>, SignerError> {
		self.signers
			.get(address)
			.cloned()
			.ok_or(SignerError::UnknownSigner(*address))
	}

	/// All registered owner addresses, ascending.
	pub fn addresses(&self) -> Vec<Address> {
		self.signers.keys().copied().collect()
	}

	/// All registered signers, ascending by address.
	pub fn all(&self) -> Vec<Arc<dyn SignerInterface>> {
		self.signers.values().cloned().collect()
	}

	/// Private keys of every registered signer.
	pub fn private_keys(&self) -> Vec<SecretString> {
		self.signers
			.values()
			.map(|signer| signer.get_private_key())
			.collect()
	}

	pub fn len(&self) -> usize {
		self.signers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.signers.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::local::LocalSigner;

	const KEY_A: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const KEY_B: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

	fn service() -> SignerService {
		SignerService::new(vec![
			Box::new(LocalSigner::from_key(&SecretString::from(KEY_B)).unwrap()),
			Box::new(LocalSigner::from_key(&SecretString::from(KEY_A)).unwrap()),
		])
	}

	#[test]
	fn test_addresses_sorted() {
		let addresses = service().addresses();
		assert_eq!(addresses.len(), 2);
		assert!(addresses[0] < addresses[1]);
	}

	#[test]
	fn test_lookup() {
		let service = service();
		let first = service.addresses()[0];
		assert_eq!(service.get(&first).unwrap().address(), first);

		let missing = Address::repeat_byte(0x42);
		assert!(matches!(
			service.get(&missing),
			Err(SignerError::UnknownSigner(addr)) if addr == missing
		));
	}

	#[test]
	fn test_duplicate_keys_collapse() {
		let service = SignerService::new(vec![
			Box::new(LocalSigner::from_key(&SecretString::from(KEY_A)).unwrap()),
			Box::new(LocalSigner::from_key(&SecretString::from(KEY_A)).unwrap()),
		]);
		assert_eq!(service.len(), 1);
		assert_eq!(service.private_keys().len(), 1);
	}
}
