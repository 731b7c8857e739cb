//! Local private-key signer.
//!
//! Keys come from `[signers.implementations.local] private_keys = [...]` and are held in
//! memory by an `alloy_signer_local::PrivateKeySigner`.

use crate::{SignerError, SignerInterface};
use alloy_primitives::{Address, Signature, B256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use safe_types::{
	with_0x_prefix, ConfigSchema, Field, FieldType, Schema, SecretString, TypedData,
	ValidationError,
};

pub struct LocalSigner {
	signer: PrivateKeySigner,
}

impl LocalSigner {
	/// Parses a hex private key, with or without `0x`.
	pub fn from_key(key: &SecretString) -> Result<Self, SignerError> {
		let signer = key.with_exposed(|key| {
			key.parse::<PrivateKeySigner>()
				.map_err(|_| SignerError::InvalidKey("Invalid private key format".to_string()))
		})?;
		Ok(Self { signer })
	}
}

pub struct LocalSignerSchema;

impl LocalSignerSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for LocalSignerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new(
				"private_keys",
				FieldType::Array(Box::new(FieldType::PrivateKey)),
			)
			.with_validator(|value| match value.as_array() {
				Some(keys) if keys.is_empty() => Err("private_keys cannot be empty".to_string()),
				_ => Ok(()),
			})],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl SignerInterface for LocalSigner {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalSignerSchema)
	}

	fn address(&self) -> Address {
		self.signer.address()
	}

	async fn sign_hash(&self, hash: &B256) -> Result<Signature, SignerError> {
		self.signer
			.sign_hash(hash)
			.await
			.map_err(|e| SignerError::SigningFailed(e.to_string()))
	}

	async fn sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
		self.signer
			.sign_message(message)
			.await
			.map_err(|e| SignerError::SigningFailed(e.to_string()))
	}

	async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Signature, SignerError> {
		let digest = typed_data
			.signing_hash()
			.map_err(|e| SignerError::SigningFailed(e.to_string()))?;
		self.sign_hash(&digest).await
	}

	fn get_private_key(&self) -> SecretString {
		SecretString::new(with_0x_prefix(&hex::encode(self.signer.to_bytes())))
	}
}

/// Factory function to create local signers from configuration.
///
/// Configuration parameters:
/// - `private_keys`: non-empty array of hex-encoded private keys
pub fn create_signers(config: &toml::Value) -> Result<Vec<Box<dyn SignerInterface>>, SignerError> {
	LocalSignerSchema::validate_config(config)
		.map_err(|e| SignerError::InvalidKey(format!("Invalid configuration: {}", e)))?;

	let keys = config
		.get("private_keys")
		.and_then(|v| v.as_array())
		.ok_or_else(|| SignerError::InvalidKey("private_keys is required".to_string()))?;

	let mut signers: Vec<Box<dyn SignerInterface>> = Vec::with_capacity(keys.len());
	for (index, key) in keys.iter().enumerate() {
		let key = key
			.as_str()
			.map(SecretString::from)
			.ok_or_else(|| SignerError::InvalidKey(format!("private_keys[{}]", index)))?;
		let signer = LocalSigner::from_key(&key)?;
		tracing::debug!(index, signer = %signer.address(), "Loaded local signer");
		signers.push(Box::new(signer));
	}

	Ok(signers)
}

/// Registry for the local signer implementation.
pub struct Registry;

impl safe_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::SignerFactory;

	fn factory() -> Self::Factory {
		create_signers
	}
}

impl crate::SignerRegistry for Registry {}
