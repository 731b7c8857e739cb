//! Alloy-backed Safe account.
//!
//! Talks to a single EVM chain over HTTP. The provider's wallet holds the executor key,
//! which pays for `execTransaction`, plus the keys of every owner that may need to send
//! `approveHash` from its own address.

use std::collections::HashSet;

use crate::{AccountError, AccountInterface};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use safe_types::{
	ConfigSchema, ExecutionResult, Field, FieldType, SafeTransaction, Schema, SecretString,
	TxOverrides, ValidationError,
};

sol! {
	interface ISafe {
		function nonce() external view returns (uint256);
		function approveHash(bytes32 hashToApprove) external;
		function execTransaction(
			address to,
			uint256 value,
			bytes data,
			uint8 operation,
			uint256 safeTxGas,
			uint256 baseGas,
			uint256 gasPrice,
			address gasToken,
			address refundReceiver,
			bytes signatures
		) external payable returns (bool success);
	}
}

/// Safe revert codes raised by signature verification.
const SIGNATURE_REVERT_CODES: [&str; 7] = [
	"GS020", "GS021", "GS022", "GS023", "GS024", "GS025", "GS026",
];

pub struct AlloySafeAccount {
	safe: Address,
	executor: Address,
	approvers: HashSet<Address>,
	provider: DynProvider,
}

impl AlloySafeAccount {
	/// Builds an account on top of `rpc_url`. The executor key becomes the wallet's
	/// default signer.
	pub fn new(
		rpc_url: &str,
		safe: Address,
		executor: PrivateKeySigner,
		approvers: Vec<PrivateKeySigner>,
	) -> Result<Self, AccountError> {
		let url = rpc_url
			.parse()
			.map_err(|e| AccountError::Configuration(format!("Invalid RPC URL: {}", e)))?;

		let executor_address = executor.address();
		let mut wallet = EthereumWallet::from(executor);
		let mut approver_addresses = HashSet::new();
		for approver in approvers {
			approver_addresses.insert(approver.address());
			wallet.register_signer(approver);
		}
		approver_addresses.insert(executor_address);

		let provider = ProviderBuilder::new()
			.wallet(wallet)
			.connect_http(url)
			.erased();

		Ok(Self {
			safe,
			executor: executor_address,
			approvers: approver_addresses,
			provider,
		})
	}

	async fn send(&self, request: TransactionRequest) -> Result<(B256, ExecutionResult), AccountError> {
		let pending = self
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| classify_error(e.to_string()))?;
		let tx_hash = *pending.tx_hash();
		tracing::debug!(tx_hash = %tx_hash, "Submitted transaction");

		let receipt = pending
			.get_receipt()
			.await
			.map_err(|e| AccountError::Network(format!("Failed to get receipt: {}", e)))?;

		Ok((
			tx_hash,
			ExecutionResult {
				tx_hash: receipt.transaction_hash,
				block_number: receipt.block_number,
				gas_used: receipt.gas_used,
				success: receipt.status(),
			},
		))
	}
}

/// Encodes the `execTransaction` call for `tx`.
pub fn exec_calldata(tx: &SafeTransaction, signatures: Bytes) -> Bytes {
	ISafe::execTransactionCall {
		to: tx.to,
		value: tx.value,
		data: tx.data.clone(),
		operation: tx.operation.as_u8(),
		safeTxGas: tx.safe_tx_gas,
		baseGas: tx.base_gas,
		gasPrice: tx.gas_price,
		gasToken: tx.gas_token,
		refundReceiver: tx.refund_receiver,
		signatures,
	}
	.abi_encode()
	.into()
}

/// Maps a provider error message to an `AccountError`, singling out Safe signature
/// check reverts.
pub fn classify_error(message: String) -> AccountError {
	match SIGNATURE_REVERT_CODES
		.iter()
		.find(|code| message.contains(*code))
	{
		Some(code) => AccountError::VerificationRejected {
			code: code.to_string(),
			message,
		},
		None if message.contains("revert") => AccountError::TransactionFailed(message),
		None => AccountError::Network(message),
	}
}

pub struct AlloySafeAccountSchema;

impl AlloySafeAccountSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		Self.validate(config)
	}
}

impl ConfigSchema for AlloySafeAccountSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("rpc_url", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
							Ok(())
						},
						_ => Err("rpc_url must be an http(s) URL".to_string()),
					}
				}),
				Field::new("private_key", FieldType::PrivateKey),
			],
			vec![],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl AccountInterface for AlloySafeAccount {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AlloySafeAccountSchema)
	}

	fn address(&self) -> Address {
		self.safe
	}

	async fn nonce(&self) -> Result<U256, AccountError> {
		let request = TransactionRequest::default()
			.to(self.safe)
			.input(ISafe::nonceCall {}.abi_encode().into());

		let result = self
			.provider
			.call(request)
			.await
			.map_err(|e| AccountError::Network(format!("Failed to call nonce: {}", e)))?;

		if result.len() < 32 {
			return Err(AccountError::Network("Invalid nonce response".to_string()));
		}
		Ok(U256::from_be_slice(&result[..32]))
	}

	async fn approve_hash(&self, approver: Address, digest: B256) -> Result<B256, AccountError> {
		if !self.approvers.contains(&approver) {
			return Err(AccountError::Configuration(format!(
				"No key configured for approver {}",
				approver
			)));
		}

		let request = TransactionRequest::default()
			.from(approver)
			.to(self.safe)
			.input(
				ISafe::approveHashCall {
					hashToApprove: digest,
				}
				.abi_encode()
				.into(),
			);

		let (tx_hash, result) = self.send(request).await?;
		if !result.success {
			return Err(AccountError::TransactionFailed(format!(
				"approveHash reverted in {}",
				tx_hash
			)));
		}
		Ok(tx_hash)
	}

	async fn exec_transaction(
		&self,
		tx: &SafeTransaction,
		signatures: Bytes,
		overrides: &TxOverrides,
	) -> Result<ExecutionResult, AccountError> {
		let mut request = TransactionRequest::default()
			.from(self.executor)
			.to(self.safe)
			.input(exec_calldata(tx, signatures).into());

		if let Some(value) = overrides.value {
			request = request.value(value);
		}
		if let Some(gas_limit) = overrides.gas_limit {
			request = request.gas_limit(gas_limit);
		}
		if let Some(max_fee) = overrides.max_fee_per_gas {
			request = request.max_fee_per_gas(max_fee);
		}
		if let Some(priority_fee) = overrides.max_priority_fee_per_gas {
			request = request.max_priority_fee_per_gas(priority_fee);
		}

		let (tx_hash, result) = self.send(request).await?;
		if !result.success {
			return Err(AccountError::TransactionFailed(format!(
				"execTransaction reverted in {}",
				tx_hash
			)));
		}
		Ok(result)
	}
}

fn parse_signer(key: &SecretString, what: &str) -> Result<PrivateKeySigner, AccountError> {
	key.with_exposed(|key| {
		key.parse::<PrivateKeySigner>()
			.map_err(|_| AccountError::Configuration(format!("Invalid {} private key format", what)))
	})
}

/// Factory function to create an alloy Safe account from configuration.
///
/// Configuration parameters:
/// - `rpc_url`: HTTP(S) endpoint of the chain the Safe lives on
/// - `private_key`: key of the executor paying for `execTransaction`
///
/// `approver_keys` are registered with the wallet so each owner can send its own
/// `approveHash`.
pub fn create_alloy_account(
	config: &toml::Value,
	safe: Address,
	approver_keys: &[SecretString],
) -> Result<Box<dyn AccountInterface>, AccountError> {
	AlloySafeAccountSchema::validate_config(config)
		.map_err(|e| AccountError::Configuration(e.to_string()))?;

	let rpc_url = config
		.get("rpc_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::Configuration("rpc_url is required".to_string()))?;

	let executor_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| AccountError::Configuration("private_key is required".to_string()))?;
	let executor = parse_signer(&executor_key, "executor")?;

	let approvers = approver_keys
		.iter()
		.map(|key| parse_signer(key, "approver"))
		.collect::<Result<Vec<_>, _>>()?;

	let account = AlloySafeAccount::new(rpc_url, safe, executor, approvers)?;
	tracing::debug!(safe = %safe, executor = %account.executor, "Created alloy Safe account");
	Ok(Box::new(account))
}

/// Registry for the alloy Safe account implementation.
pub struct Registry;

impl safe_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "evm_alloy";
	type Factory = crate::AccountFactory;

	fn factory() -> Self::Factory {
		create_alloy_account
	}
}

impl crate::AccountRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;
	use safe_types::SafeTransactionTemplate;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const SAFE: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa0001");

	fn config(rpc_url: &str, key: &str) -> toml::Value {
		toml::from_str(&format!("rpc_url = \"{}\"\nprivate_key = \"{}\"", rpc_url, key)).unwrap()
	}

	#[test]
	fn test_signature_reverts_classified() {
		let err = classify_error("server returned an error response: execution reverted: GS026".to_string());
		assert!(matches!(err, AccountError::VerificationRejected { ref code, .. } if code == "GS026"));

		let err = classify_error("execution reverted: GS013".to_string());
		assert!(matches!(err, AccountError::TransactionFailed(_)));

		let err = classify_error("connection refused".to_string());
		assert!(matches!(err, AccountError::Network(_)));
	}

	#[test]
	fn test_exec_calldata_layout() {
		let tx = SafeTransactionTemplate::new(
			address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb0002"),
			U256::from(3),
		)
		.with_value(U256::from(5))
		.build()
		.unwrap();
		let signatures = Bytes::from(vec![0xab; 65]);

		let calldata = exec_calldata(&tx, signatures.clone());
		assert_eq!(&calldata[..4], ISafe::execTransactionCall::SELECTOR.as_slice());

		let decoded = ISafe::execTransactionCall::abi_decode(&calldata).unwrap();
		assert_eq!(decoded.to, tx.to);
		assert_eq!(decoded.value, tx.value);
		assert_eq!(decoded.operation, 0);
		assert_eq!(decoded.signatures, signatures);
	}

	#[test]
	fn test_schema_rejects_bad_config() {
		assert!(AlloySafeAccountSchema::validate_config(&config("http://localhost:8545", KEY)).is_ok());
		assert!(AlloySafeAccountSchema::validate_config(&config("localhost:8545", KEY)).is_err());
		assert!(AlloySafeAccountSchema::validate_config(&config("http://localhost:8545", "0x12")).is_err());
	}

	#[test]
	fn test_factory_registers_approvers() {
		let approver = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
		let account = create_alloy_account(
			&config("http://localhost:8545", KEY),
			SAFE,
			&[SecretString::from(approver)],
		)
		.unwrap();
		assert_eq!(account.address(), SAFE);
	}

	#[test]
	fn test_factory_rejects_invalid_approver() {
		let result = create_alloy_account(
			&config("http://localhost:8545", KEY),
			SAFE,
			&[SecretString::from("not-a-key")],
		);
		assert!(matches!(result, Err(AccountError::Configuration(_))));
	}

	#[tokio::test]
	async fn test_unknown_approver_rejected_before_sending() {
		let account = create_alloy_account(&config("http://localhost:8545", KEY), SAFE, &[]).unwrap();
		let stranger = address!("0x00000000000000000000000000000000000000ee");

		let result = account.approve_hash(stranger, B256::ZERO).await;
		assert!(matches!(result, Err(AccountError::Configuration(_))));
	}
}
