//! Authorization collection, aggregation and execution for Safe transactions.
//!
//! The collector asks each owner for an authorization of the Safe transaction digest,
//! the aggregator packs those records into the blob `execTransaction` expects, and the
//! executor ties both to the account service. The builder assembles all of it from a
//! `safe_config::Config`.

use alloy_primitives::{Address, B256};
use safe_account::AccountError;
use safe_signer::SignerError;
use safe_types::{Eip712Error, SignatureError, TransactionError};
use thiserror::Error;

pub mod aggregate;
pub mod builder;
pub mod collector;
pub mod executor;

#[cfg(test)]
pub(crate) mod test_utils;

pub use aggregate::aggregate;
pub use builder::{BuilderError, SafeBuilder, SafeFactories, SafeToolkit};
pub use collector::{AuthorizationCollector, Collection, SigningMode};
pub use executor::SafeExecutor;

/// Why a single signer failed to produce an authorization.
#[derive(Debug, Error)]
pub enum SigningFailure {
	#[error(transparent)]
	Signer(#[from] SignerError),
	#[error(transparent)]
	Account(#[from] AccountError),
	#[error(transparent)]
	Signature(#[from] SignatureError),
	/// The produced signature recovers to someone else.
	#[error("Signature recovers to {recovered}")]
	RecoveredMismatch { recovered: Address },
}

/// Errors surfaced by the collector, aggregator and executor.
#[derive(Debug, Error)]
pub enum SafeError {
	#[error(transparent)]
	Transaction(#[from] TransactionError),
	#[error(transparent)]
	Eip712(#[from] Eip712Error),
	#[error(transparent)]
	Signature(#[from] SignatureError),
	#[error("Signer {signer} failed to authorize {digest}: {source}")]
	Signing {
		signer: Address,
		digest: B256,
		#[source]
		source: SigningFailure,
	},
	/// Two authorizations name the same owner.
	#[error("Duplicate signer {0}")]
	DuplicateSigner(Address),
	#[error(transparent)]
	Account(#[from] AccountError),
	#[error("Configuration error: {0}")]
	Config(String),
}

impl SafeError {
	pub(crate) fn signing(signer: Address, digest: B256, source: impl Into<SigningFailure>) -> Self {
		SafeError::Signing {
			signer,
			digest,
			source: source.into(),
		}
	}
}
