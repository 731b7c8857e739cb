//! Shared types for Safe multisig transaction tooling.
//!
//! Holds the transaction model, the EIP-712 digests the Safe contract recomputes,
//! the 65-byte authorization records it verifies, and the config-validation and
//! registry plumbing used by the signer and account crates.

/// Safe transaction and message digests.
pub mod digest;
/// Outer-transaction overrides and execution results.
pub mod execution;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Redacting wrapper for private keys.
pub mod secret_string;
/// Per-signer authorization records.
pub mod signature;
/// Safe transaction model and builders.
pub mod transaction;
/// EIP-712 hashing and string helpers.
pub mod utils;
/// Configuration validation types.
pub mod validation;

pub use digest::{
	domain_separator, message_digest, message_typed_data, transaction_digest,
	transaction_typed_data, SAFE_MESSAGE_TYPE, SAFE_TX_TYPE,
};
pub use execution::{ExecutionResult, TxOverrides};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use signature::{
	Authorization, SafeSignature, SignatureError, SignatureRecord, PRE_APPROVED_TYPE,
	SIGNATURE_LENGTH,
};
pub use transaction::{
	build_contract_call, build_dynamic_call, build_transaction, encode_dynamic_call,
	MetaTransaction, Operation, SafeTransaction, SafeTransactionTemplate, TransactionError,
};
pub use utils::eip712::{Eip712Error, TypedData};
pub use utils::{short_hex, with_0x_prefix, without_0x_prefix};
pub use validation::*;
