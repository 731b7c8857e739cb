//! Shared fixtures for the core tests.

use std::sync::Arc;

use alloy_primitives::{address, Address, Bytes, Signature, B256, U256};
use async_trait::async_trait;
use mockall::mock;
use safe_account::{AccountError, AccountInterface};
use safe_signer::implementations::local::{LocalSigner, LocalSignerSchema};
use safe_signer::{SignerError, SignerInterface};
use safe_types::{
	ConfigSchema, ExecutionResult, Field, FieldType, SafeTransaction, Schema, SecretString,
	TxOverrides, TypedData, ValidationError,
};

pub const SAFE: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa0001");
pub const TARGET: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb0002");

// Well-known development keys.
pub const KEY_A: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const KEY_B: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const KEY_C: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

pub fn local_signer(key: &str) -> Arc<dyn SignerInterface> {
	Arc::new(LocalSigner::from_key(&SecretString::from(key)).unwrap())
}

mock! {
	pub SafeAccount {}

	#[async_trait]
	impl AccountInterface for SafeAccount {
		fn config_schema(&self) -> Box<dyn ConfigSchema>;
		fn address(&self) -> Address;
		async fn nonce(&self) -> Result<U256, AccountError>;
		async fn approve_hash(&self, approver: Address, digest: B256) -> Result<B256, AccountError>;
		async fn exec_transaction(
			&self,
			tx: &SafeTransaction,
			signatures: Bytes,
			overrides: &TxOverrides,
		) -> Result<ExecutionResult, AccountError>;
	}
}

/// Schema requiring each listed key as a string.
pub struct RequiredKeys(pub &'static [&'static str]);

impl ConfigSchema for RequiredKeys {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let required = self
			.0
			.iter()
			.map(|key| Field::new(*key, FieldType::String))
			.collect();
		Schema::new(required, vec![]).validate(config)
	}
}

/// A mock account at `SAFE` whose config schema requires `keys`.
pub fn mock_account_requiring(keys: &'static [&'static str]) -> MockSafeAccount {
	let mut account = MockSafeAccount::new();
	account.expect_address().return_const(SAFE);
	account
		.expect_config_schema()
		.returning(move || Box::new(RequiredKeys(keys)));
	account
}

/// A mock account at `SAFE` with no other expectations set.
pub fn mock_account() -> MockSafeAccount {
	mock_account_requiring(&[])
}

pub fn execution_result() -> ExecutionResult {
	ExecutionResult {
		tx_hash: B256::repeat_byte(0xee),
		block_number: Some(1),
		gas_used: 80_000,
		success: true,
	}
}

/// Signer whose backend always errors.
pub struct FailingSigner(pub Address);

#[async_trait]
impl SignerInterface for FailingSigner {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalSignerSchema)
	}

	fn address(&self) -> Address {
		self.0
	}

	async fn sign_hash(&self, _hash: &B256) -> Result<Signature, SignerError> {
		Err(SignerError::SigningFailed("device unplugged".into()))
	}

	async fn sign_message(&self, _message: &[u8]) -> Result<Signature, SignerError> {
		Err(SignerError::SigningFailed("device unplugged".into()))
	}

	async fn sign_typed_data(&self, _typed_data: &TypedData) -> Result<Signature, SignerError> {
		Err(SignerError::SigningFailed("device unplugged".into()))
	}

	fn get_private_key(&self) -> SecretString {
		SecretString::from("")
	}
}

/// Signer that claims one address but signs with another key.
pub struct ImpostorSigner {
	pub claimed: Address,
	pub inner: Arc<dyn SignerInterface>,
}

#[async_trait]
impl SignerInterface for ImpostorSigner {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		self.inner.config_schema()
	}

	fn address(&self) -> Address {
		self.claimed
	}

	async fn sign_hash(&self, hash: &B256) -> Result<Signature, SignerError> {
		self.inner.sign_hash(hash).await
	}

	async fn sign_message(&self, message: &[u8]) -> Result<Signature, SignerError> {
		self.inner.sign_message(message).await
	}

	async fn sign_typed_data(&self, typed_data: &TypedData) -> Result<Signature, SignerError> {
		self.inner.sign_typed_data(typed_data).await
	}

	fn get_private_key(&self) -> SecretString {
		self.inner.get_private_key()
	}
}
