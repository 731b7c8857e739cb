//! Submission of authorized Safe transactions.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use safe_account::AccountService;
use safe_signer::SignerInterface;
use safe_types::{
	build_contract_call, ExecutionResult, Operation, SafeSignature, SafeTransaction,
	SafeTransactionTemplate, TxOverrides,
};

use crate::aggregate::aggregate;
use crate::collector::{AuthorizationCollector, SigningMode};
use crate::SafeError;

pub struct SafeExecutor {
	account: Arc<AccountService>,
	collector: AuthorizationCollector,
}

impl SafeExecutor {
	pub fn new(account: Arc<AccountService>) -> Self {
		Self {
			collector: AuthorizationCollector::new(account.clone()),
			account,
		}
	}

	pub fn collector(&self) -> &AuthorizationCollector {
		&self.collector
	}

	/// Aggregates `signatures` and submits `tx`.
	///
	/// Rejections by the Safe come back as `AccountError::VerificationRejected`
	/// unchanged.
	pub async fn execute(
		&self,
		tx: &SafeTransaction,
		signatures: &[SafeSignature],
		overrides: &TxOverrides,
	) -> Result<ExecutionResult, SafeError> {
		let blob = aggregate(signatures)?;
		Ok(self
			.account
			.exec_transaction(tx, blob, overrides)
			.await?)
	}

	/// Encodes `call` against `target` at the current nonce, has every signer sign it
	/// as typed data and submits it. Any signer failure aborts before submission.
	pub async fn execute_with_signers<C: SolCall>(
		&self,
		target: Address,
		call: &C,
		signers: &[Arc<dyn SignerInterface>],
		delegate: bool,
		overrides: &TxOverrides,
	) -> Result<ExecutionResult, SafeError> {
		let nonce = self.account.nonce().await?;
		let tx = build_contract_call(target, call, nonce, delegate)?;
		self.sign_and_execute(&tx, signers, overrides).await
	}

	/// Same as `execute_with_signers` for calldata that is already encoded.
	pub async fn execute_calldata_with_signers(
		&self,
		target: Address,
		data: Bytes,
		signers: &[Arc<dyn SignerInterface>],
		delegate: bool,
		overrides: &TxOverrides,
	) -> Result<ExecutionResult, SafeError> {
		let nonce = self.account.nonce().await?;
		let tx = SafeTransactionTemplate::new(target, nonce)
			.with_data(data)
			.with_operation(Operation::from_delegate(delegate))
			.build()?;
		self.sign_and_execute(&tx, signers, overrides).await
	}

	async fn sign_and_execute(
		&self,
		tx: &SafeTransaction,
		signers: &[Arc<dyn SignerInterface>],
		overrides: &TxOverrides,
	) -> Result<ExecutionResult, SafeError> {
		let signatures = self
			.collector
			.collect(signers, tx, SigningMode::TypedData)
			.await?
			.into_result()?;
		self.execute(tx, &signatures, overrides).await
	}
}
