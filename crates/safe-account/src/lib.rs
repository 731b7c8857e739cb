//! Safe account service.
//!
//! Wraps the on-chain Safe behind `AccountInterface`: reading the nonce, recording
//! `approveHash` pre-approvals and submitting `execTransaction`. The Safe contract is
//! the final verifier of every signature blob; rejections come back as
//! `AccountError::VerificationRejected` and are never retried.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use safe_types::{
	short_hex, ConfigSchema, ExecutionResult, ImplementationRegistry, SafeTransaction,
	SecretString, TxOverrides,
};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur while talking to the Safe.
#[derive(Debug, Error)]
pub enum AccountError {
	/// RPC transport or provider failure.
	#[error("Network error: {0}")]
	Network(String),
	/// The outer transaction reverted or could not be mined.
	#[error("Transaction failed: {0}")]
	TransactionFailed(String),
	/// The Safe refused the signatures (`GS020`..`GS026`).
	#[error("Safe rejected signatures ({code}): {message}")]
	VerificationRejected { code: String, message: String },
	/// The implementation could not be built from its config.
	#[error("Invalid configuration: {0}")]
	Configuration(String),
}

/// Trait defining the interface to a deployed Safe.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Address of the Safe.
	fn address(&self) -> Address;

	/// Current Safe nonce.
	async fn nonce(&self) -> Result<U256, AccountError>;

	/// Calls `approveHash(digest)` from `approver`, returning the transaction hash.
	async fn approve_hash(&self, approver: Address, digest: B256) -> Result<B256, AccountError>;

	/// Submits `execTransaction(tx, signatures)`.
	async fn exec_transaction(
		&self,
		tx: &SafeTransaction,
		signatures: Bytes,
		overrides: &TxOverrides,
	) -> Result<ExecutionResult, AccountError>;
}

/// Type alias for account factory functions.
///
/// Receives the implementation's config table, the Safe address and the keys of the
/// owners that may need to send `approveHash` themselves.
pub type AccountFactory = fn(
	&toml::Value,
	Address,
	&[SecretString],
) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::evm::alloy;

	vec![(alloy::Registry::NAME, alloy::Registry::factory())]
}

/// Service that fronts the configured account implementation.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	pub fn address(&self) -> Address {
		self.implementation.address()
	}

	pub async fn nonce(&self) -> Result<U256, AccountError> {
		let nonce = self.implementation.nonce().await?;
		tracing::debug!(safe = %self.address(), %nonce, "Read Safe nonce");
		Ok(nonce)
	}

	pub async fn approve_hash(&self, approver: Address, digest: B256) -> Result<B256, AccountError> {
		let tx_hash = self.implementation.approve_hash(approver, digest).await?;
		tracing::info!(
			signer = %approver,
			digest = %short_hex(&digest.to_string()),
			tx_hash = %tx_hash,
			"Approved hash on-chain"
		);
		Ok(tx_hash)
	}

	pub async fn exec_transaction(
		&self,
		tx: &SafeTransaction,
		signatures: Bytes,
		overrides: &TxOverrides,
	) -> Result<ExecutionResult, AccountError> {
		let result = self
			.implementation
			.exec_transaction(tx, signatures, overrides)
			.await
			.inspect_err(|e| tracing::warn!(safe = %self.address(), nonce = %tx.nonce, error = %e, "execTransaction failed"))?;

		tracing::info!(
			safe = %self.address(),
			nonce = %tx.nonce,
			tx_hash = %result.tx_hash,
			gas_used = result.gas_used,
			success = result.success,
			"Executed Safe transaction"
		);
		Ok(result)
	}
}
