//! Per-signer authorization of Safe digests.
//!
//! Each signer is asked independently. A typed-data or prefixed-message signature is
//! only accepted once it recovers to the signer's own address, so a misconfigured key
//! is caught here instead of as a `GS026` revert on-chain.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use futures::future::join_all;
use safe_account::AccountService;
use safe_signer::SignerInterface;
use safe_types::{
	short_hex, transaction_digest, transaction_typed_data, SafeSignature, SafeTransaction,
	TypedData,
};

use crate::{SafeError, SigningFailure};

/// How every signer in a `collect` call authorizes the transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMode {
	/// ECDSA over the EIP-712 digest.
	TypedData,
	/// `personal_sign` over the digest.
	PrefixedMessage,
	/// On-chain `approveHash`, or an already recorded approval when `skip_on_chain`.
	PreApproval { skip_on_chain: bool },
}

/// Outcome of a fan-out over several signers.
#[derive(Debug, Default)]
pub struct Collection {
	pub signatures: Vec<SafeSignature>,
	pub failures: Vec<SafeError>,
}

impl Collection {
	/// All signatures, or the first failure if any signer failed.
	pub fn into_result(self) -> Result<Vec<SafeSignature>, SafeError> {
		match self.failures.into_iter().next() {
			Some(failure) => Err(failure),
			None => Ok(self.signatures),
		}
	}
}

pub struct AuthorizationCollector {
	account: Arc<AccountService>,
}

impl AuthorizationCollector {
	pub fn new(account: Arc<AccountService>) -> Self {
		Self { account }
	}

	/// Address of the Safe the digests are bound to.
	pub fn safe(&self) -> Address {
		self.account.address()
	}

	/// Signs `typed_data` and returns an ECDSA record.
	pub async fn sign_typed_data(
		&self,
		signer: &dyn SignerInterface,
		typed_data: &TypedData,
	) -> Result<SafeSignature, SafeError> {
		let digest = typed_data.signing_hash()?;
		let signature = signer
			.sign_typed_data(typed_data)
			.await
			.map_err(|e| SafeError::signing(signer.address(), digest, e))?;

		verify(SafeSignature::ecdsa(signer.address(), signature), digest)
	}

	/// Signs the Safe's typed data for `tx`.
	pub async fn sign_transaction_typed(
		&self,
		signer: &dyn SignerInterface,
		tx: &SafeTransaction,
	) -> Result<SafeSignature, SafeError> {
		self.sign_typed_data(signer, &transaction_typed_data(self.safe(), tx))
			.await
	}

	/// Signs `digest` with the `personal_sign` prefix and returns a prefixed record.
	pub async fn sign_hash(
		&self,
		signer: &dyn SignerInterface,
		digest: B256,
	) -> Result<SafeSignature, SafeError> {
		let signature = signer
			.sign_message(digest.as_slice())
			.await
			.map_err(|e| SafeError::signing(signer.address(), digest, e))?;

		verify(SafeSignature::prefixed(signer.address(), signature), digest)
	}

	/// Signs the digest of `tx` with the `personal_sign` prefix.
	pub async fn sign_transaction_prefixed(
		&self,
		signer: &dyn SignerInterface,
		tx: &SafeTransaction,
	) -> Result<SafeSignature, SafeError> {
		let digest = transaction_digest(self.safe(), tx)?;
		self.sign_hash(signer, digest).await
	}

	/// Records `signer`'s approval of `digest`.
	///
	/// Unless `skip_on_chain` is set, `approveHash` is sent from the signer's account
	/// first. With `skip_on_chain` the caller asserts the approval already exists.
	pub async fn approve_hash(
		&self,
		signer: &dyn SignerInterface,
		digest: B256,
		skip_on_chain: bool,
	) -> Result<SafeSignature, SafeError> {
		let owner = signer.address();
		if !skip_on_chain {
			self.account
				.approve_hash(owner, digest)
				.await
				.map_err(|e| SafeError::signing(owner, digest, e))?;
		}
		Ok(SafeSignature::pre_approved(owner))
	}

	/// Records `signer`'s approval of the digest of `tx`.
	pub async fn approve_transaction(
		&self,
		signer: &dyn SignerInterface,
		tx: &SafeTransaction,
		skip_on_chain: bool,
	) -> Result<SafeSignature, SafeError> {
		let digest = transaction_digest(self.safe(), tx)?;
		self.approve_hash(signer, digest, skip_on_chain).await
	}

	/// Asks every signer for an authorization of `tx` concurrently.
	///
	/// A failing signer is reported in `failures` and does not stop the others.
	/// Errors in hashing `tx` itself fail the whole call.
	pub async fn collect(
		&self,
		signers: &[Arc<dyn SignerInterface>],
		tx: &SafeTransaction,
		mode: SigningMode,
	) -> Result<Collection, SafeError> {
		let safe = self.safe();
		let typed_data = transaction_typed_data(safe, tx);
		let digest = typed_data.signing_hash()?;
		tracing::debug!(
			safe = %safe,
			nonce = %tx.nonce,
			digest = %short_hex(&digest.to_string()),
			signers = signers.len(),
			?mode,
			"Collecting authorizations"
		);

		let typed_data = &typed_data;
		let requests = signers.iter().map(|signer| async move {
			let signer = signer.as_ref();
			match mode {
				SigningMode::TypedData => self.sign_typed_data(signer, typed_data).await,
				SigningMode::PrefixedMessage => self.sign_hash(signer, digest).await,
				SigningMode::PreApproval { skip_on_chain } => {
					self.approve_hash(signer, digest, skip_on_chain).await
				},
			}
		});

		let mut collection = Collection::default();
		for result in join_all(requests).await {
			match result {
				Ok(signature) => {
					tracing::debug!(
						signer = %signature.signer,
						mode = signature.authorization.mode(),
						"Collected authorization"
					);
					collection.signatures.push(signature);
				},
				Err(e) => {
					tracing::warn!(error = %e, "Signer failed to authorize");
					collection.failures.push(e);
				},
			}
		}

		Ok(collection)
	}
}

/// Checks that `record` recovers to its own signer for `digest`.
fn verify(record: SafeSignature, digest: B256) -> Result<SafeSignature, SafeError> {
	let recovered = record
		.recover(&digest)
		.map_err(|e| SafeError::signing(record.signer, digest, e))?;
	if recovered != record.signer {
		return Err(SafeError::signing(
			record.signer,
			digest,
			SigningFailure::RecoveredMismatch { recovered },
		));
	}
	Ok(record)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{
		local_signer, mock_account, FailingSigner, ImpostorSigner, KEY_A, KEY_B, SAFE, TARGET,
	};
	use alloy_primitives::U256;
	use safe_account::AccountError;
	use safe_types::{Authorization, SafeTransactionTemplate};

	fn sample_tx() -> SafeTransaction {
		SafeTransactionTemplate::new(TARGET, U256::from(4))
			.with_value(U256::from(10))
			.build()
			.unwrap()
	}

	fn collector(account: crate::test_utils::MockSafeAccount) -> AuthorizationCollector {
		AuthorizationCollector::new(Arc::new(AccountService::new(Box::new(account))))
	}

	#[tokio::test]
	async fn test_typed_data_record_recovers() {
		let collector = collector(mock_account());
		let signer = local_signer(KEY_A);
		let tx = sample_tx();

		let record = collector
			.sign_transaction_typed(signer.as_ref(), &tx)
			.await
			.unwrap();

		assert!(matches!(record.authorization, Authorization::Ecdsa(_)));
		assert!(matches!(record.data()[64], 27 | 28));
		let digest = transaction_digest(SAFE, &tx).unwrap();
		assert_eq!(record.recover(&digest).unwrap(), signer.address());
	}

	#[tokio::test]
	async fn test_prefixed_record_bumps_v() {
		let collector = collector(mock_account());
		let signer = local_signer(KEY_B);

		let record = collector
			.sign_transaction_prefixed(signer.as_ref(), &sample_tx())
			.await
			.unwrap();

		assert!(matches!(record.authorization, Authorization::PrefixedMessage(_)));
		assert!(matches!(record.data()[64], 31 | 32));
	}

	#[tokio::test]
	async fn test_approval_sent_on_chain() {
		let signer = local_signer(KEY_A);
		let owner = signer.address();
		let tx = sample_tx();
		let digest = transaction_digest(SAFE, &tx).unwrap();

		let mut account = mock_account();
		account
			.expect_approve_hash()
			.withf(move |approver, hash| *approver == owner && *hash == digest)
			.times(1)
			.returning(|_, _| Ok(B256::repeat_byte(0x01)));

		let record = collector(account)
			.approve_transaction(signer.as_ref(), &tx, false)
			.await
			.unwrap();
		assert_eq!(record, SafeSignature::pre_approved(owner));
	}

	#[tokio::test]
	async fn test_approval_skips_chain_when_asked() {
		let signer = local_signer(KEY_A);
		let mut account = mock_account();
		account.expect_approve_hash().never();

		let record = collector(account)
			.approve_hash(signer.as_ref(), B256::repeat_byte(0x42), true)
			.await
			.unwrap();
		assert_eq!(record.data()[64], 1);
	}

	#[tokio::test]
	async fn test_approval_failure_carries_context() {
		let signer = local_signer(KEY_A);
		let digest = B256::repeat_byte(0x42);
		let mut account = mock_account();
		account
			.expect_approve_hash()
			.returning(|_, _| Err(AccountError::Network("timeout".into())));

		let err = collector(account)
			.approve_hash(signer.as_ref(), digest, false)
			.await
			.unwrap_err();
		assert!(matches!(
			err,
			SafeError::Signing { signer: s, digest: d, source: SigningFailure::Account(_) }
				if s == signer.address() && d == digest
		));
	}

	#[tokio::test]
	async fn test_wrong_key_rejected() {
		let impostor = ImpostorSigner {
			claimed: local_signer(KEY_B).address(),
			inner: local_signer(KEY_A),
		};
		let err = collector(mock_account())
			.sign_transaction_typed(&impostor, &sample_tx())
			.await
			.unwrap_err();

		assert!(matches!(
			err,
			SafeError::Signing { source: SigningFailure::RecoveredMismatch { .. }, .. }
		));
	}

	#[tokio::test]
	async fn test_collect_isolates_failing_signer() {
		let broken = Address::repeat_byte(0x0f);
		let signers: Vec<Arc<dyn SignerInterface>> = vec![
			local_signer(KEY_A),
			Arc::new(FailingSigner(broken)),
			local_signer(KEY_B),
		];

		let collection = collector(mock_account())
			.collect(&signers, &sample_tx(), SigningMode::TypedData)
			.await
			.unwrap();

		assert_eq!(collection.signatures.len(), 2);
		assert_eq!(collection.failures.len(), 1);
		assert!(matches!(
			collection.failures[0],
			SafeError::Signing { signer, source: SigningFailure::Signer(_), .. } if signer == broken
		));
		assert!(collection.into_result().is_err());
	}

	#[tokio::test]
	async fn test_collect_every_mode() {
		let signers = vec![local_signer(KEY_A), local_signer(KEY_B)];
		let tx = sample_tx();
		let digest = transaction_digest(SAFE, &tx).unwrap();

		let mut account = mock_account();
		account.expect_approve_hash().times(2).returning(|_, _| Ok(B256::ZERO));
		let collector = collector(account);

		for mode in [
			SigningMode::TypedData,
			SigningMode::PrefixedMessage,
			SigningMode::PreApproval {
				skip_on_chain: false,
			},
		] {
			let signatures = collector
				.collect(&signers, &tx, mode)
				.await
				.unwrap()
				.into_result()
				.unwrap();
			assert_eq!(signatures.len(), 2);
			for signature in signatures {
				assert_eq!(signature.recover(&digest).unwrap(), signature.signer);
			}
		}
	}
}
