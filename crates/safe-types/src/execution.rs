//! Types exchanged with the Safe account service when submitting transactions.

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

/// Optional parameters of the Ethereum transaction wrapping `execTransaction`.
///
/// Unset fields are left to the provider's fillers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOverrides {
	/// Gas limit of the outer transaction.
	pub gas_limit: Option<u64>,
	/// EIP-1559 fee cap in wei.
	pub max_fee_per_gas: Option<u128>,
	/// EIP-1559 priority fee in wei.
	pub max_priority_fee_per_gas: Option<u128>,
	/// Native value attached to the outer transaction.
	pub value: Option<U256>,
}

/// Outcome of a submitted `execTransaction` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
	/// Hash of the outer Ethereum transaction.
	pub tx_hash: B256,
	/// Block the transaction was included in, when known.
	pub block_number: Option<u64>,
	/// Gas consumed by the outer transaction.
	pub gas_used: u64,
	/// Whether the outer transaction succeeded.
	pub success: bool,
}
