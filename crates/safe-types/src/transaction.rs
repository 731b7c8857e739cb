//! Safe transaction types and the transaction builder.
//!
//! A `SafeTransaction` is the complete, canonical record that gets hashed and
//! authorized. It is produced from a partial `SafeTransactionTemplate` by filling
//! every optional field with its protocol default.

use alloy_dyn_abi::{JsonAbiExt, Specifier};
use alloy_json_abi::Function;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::eip712::TypedValue;

/// Errors that can occur while building a Safe transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
	/// A mandatory field (`to` or `nonce`) was not provided.
	#[error("Missing required transaction field: {0}")]
	MissingField(&'static str),
	/// The operation byte is neither CALL (0) nor DELEGATECALL (1).
	#[error("Invalid operation type: {0}")]
	InvalidOperation(u8),
	/// The call data could not be ABI-encoded.
	#[error("ABI encoding failed: {0}")]
	Abi(String),
}

/// Execution mode of a Safe transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Operation {
	/// Regular `CALL` from the Safe.
	#[default]
	Call = 0,
	/// `DELEGATECALL` executing the target's code in the Safe's context.
	DelegateCall = 1,
}

impl Operation {
	pub fn as_u8(&self) -> u8 {
		*self as u8
	}

	/// `DelegateCall` when `delegate` is set, `Call` otherwise.
	pub fn from_delegate(delegate: bool) -> Self {
		if delegate {
			Operation::DelegateCall
		} else {
			Operation::Call
		}
	}
}

impl From<Operation> for u8 {
	fn from(op: Operation) -> Self {
		op.as_u8()
	}
}

impl TryFrom<u8> for Operation {
	type Error = TransactionError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(Operation::Call),
			1 => Ok(Operation::DelegateCall),
			other => Err(TransactionError::InvalidOperation(other)),
		}
	}
}

/// An unsigned call intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTransaction {
	pub to: Address,
	pub value: U256,
	pub data: Bytes,
	pub operation: Operation,
}

/// A fully specified Safe transaction.
///
/// Any field change after authorizations were collected invalidates them, since
/// the digest no longer matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransaction {
	pub to: Address,
	pub value: U256,
	pub data: Bytes,
	pub operation: Operation,
	pub safe_tx_gas: U256,
	pub base_gas: U256,
	pub gas_price: U256,
	pub gas_token: Address,
	pub refund_receiver: Address,
	pub nonce: U256,
}

impl SafeTransaction {
	/// Projects the call-intent part of the transaction.
	pub fn meta(&self) -> MetaTransaction {
		MetaTransaction {
			to: self.to,
			value: self.value,
			data: self.data.clone(),
			operation: self.operation,
		}
	}

	/// Field values in `SafeTx` schema order.
	pub fn eip712_values(&self) -> Vec<TypedValue> {
		vec![
			TypedValue::Address(self.to),
			TypedValue::Uint(self.value),
			TypedValue::Bytes(self.data.clone()),
			TypedValue::Uint(U256::from(self.operation.as_u8())),
			TypedValue::Uint(self.safe_tx_gas),
			TypedValue::Uint(self.base_gas),
			TypedValue::Uint(self.gas_price),
			TypedValue::Address(self.gas_token),
			TypedValue::Address(self.refund_receiver),
			TypedValue::Uint(self.nonce),
		]
	}
}

/// Partial description of a Safe transaction. Only `to` and `nonce` are mandatory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeTransactionTemplate {
	pub to: Option<Address>,
	pub value: Option<U256>,
	pub data: Option<Bytes>,
	pub operation: Option<Operation>,
	pub safe_tx_gas: Option<U256>,
	pub base_gas: Option<U256>,
	pub gas_price: Option<U256>,
	pub gas_token: Option<Address>,
	pub refund_receiver: Option<Address>,
	pub nonce: Option<U256>,
}

impl SafeTransactionTemplate {
	/// Template with the two mandatory fields set.
	pub fn new(to: Address, nonce: U256) -> Self {
		Self {
			to: Some(to),
			nonce: Some(nonce),
			..Default::default()
		}
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.value = Some(value);
		self
	}

	pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
		self.data = Some(data.into());
		self
	}

	pub fn with_operation(mut self, operation: Operation) -> Self {
		self.operation = Some(operation);
		self
	}

	pub fn with_safe_tx_gas(mut self, safe_tx_gas: U256) -> Self {
		self.safe_tx_gas = Some(safe_tx_gas);
		self
	}

	pub fn with_base_gas(mut self, base_gas: U256) -> Self {
		self.base_gas = Some(base_gas);
		self
	}

	/// Sets the refund parameters: gas price, payment token and refund receiver.
	pub fn with_refund(mut self, gas_price: U256, gas_token: Address, receiver: Address) -> Self {
		self.gas_price = Some(gas_price);
		self.gas_token = Some(gas_token);
		self.refund_receiver = Some(receiver);
		self
	}

	/// Fills defaults and returns the canonical transaction.
	pub fn build(self) -> Result<SafeTransaction, TransactionError> {
		build_transaction(self)
	}
}

/// Normalizes a template into a complete `SafeTransaction`.
///
/// Defaults: zero value, empty data, `Call`, zero gas parameters, and the zero
/// address for both `gasToken` (native asset) and `refundReceiver` (tx origin).
pub fn build_transaction(
	template: SafeTransactionTemplate,
) -> Result<SafeTransaction, TransactionError> {
	let to = template.to.ok_or(TransactionError::MissingField("to"))?;
	let nonce = template
		.nonce
		.ok_or(TransactionError::MissingField("nonce"))?;

	Ok(SafeTransaction {
		to,
		value: template.value.unwrap_or_default(),
		data: template.data.unwrap_or_default(),
		operation: template.operation.unwrap_or_default(),
		safe_tx_gas: template.safe_tx_gas.unwrap_or_default(),
		base_gas: template.base_gas.unwrap_or_default(),
		gas_price: template.gas_price.unwrap_or_default(),
		gas_token: template.gas_token.unwrap_or(Address::ZERO),
		refund_receiver: template.refund_receiver.unwrap_or(Address::ZERO),
		nonce,
	})
}

/// Builds a transaction calling `call` on `target`.
pub fn build_contract_call<C: SolCall>(
	target: Address,
	call: &C,
	nonce: U256,
	delegate: bool,
) -> Result<SafeTransaction, TransactionError> {
	SafeTransactionTemplate::new(target, nonce)
		.with_data(call.abi_encode())
		.with_operation(Operation::from_delegate(delegate))
		.build()
}

/// Encodes a call from a human-readable signature such as `transfer(address,uint256)`
/// and string arguments.
pub fn encode_dynamic_call(signature: &str, args: &[String]) -> Result<Bytes, TransactionError> {
	let function = Function::parse(signature)
		.map_err(|e| TransactionError::Abi(format!("Invalid function signature: {}", e)))?;

	if function.inputs.len() != args.len() {
		return Err(TransactionError::Abi(format!(
			"{} expects {} arguments, got {}",
			function.name,
			function.inputs.len(),
			args.len()
		)));
	}

	let values = function
		.inputs
		.iter()
		.zip(args)
		.map(|(param, arg)| {
			let ty = param
				.resolve()
				.map_err(|e| TransactionError::Abi(e.to_string()))?;
			ty.coerce_str(arg).map_err(|e| {
				TransactionError::Abi(format!("Invalid argument '{}' for {}: {}", arg, ty, e))
			})
		})
		.collect::<Result<Vec<_>, _>>()?;

	let calldata = function
		.abi_encode_input(&values)
		.map_err(|e| TransactionError::Abi(e.to_string()))?;

	Ok(calldata.into())
}

/// Like `build_contract_call`, for a call described at runtime.
pub fn build_dynamic_call(
	target: Address,
	signature: &str,
	args: &[String],
	nonce: U256,
	delegate: bool,
) -> Result<SafeTransaction, TransactionError> {
	let data = encode_dynamic_call(signature, args)?;
	SafeTransactionTemplate::new(target, nonce)
		.with_data(data)
		.with_operation(Operation::from_delegate(delegate))
		.build()
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;
	use alloy_sol_types::sol;

	sol! {
		function transfer(address to, uint256 amount) returns (bool);
	}

	const TARGET: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb0002");

	#[test]
	fn test_defaults_filled() {
		let tx = build_transaction(SafeTransactionTemplate::new(TARGET, U256::from(3))).unwrap();

		assert_eq!(tx.to, TARGET);
		assert_eq!(tx.nonce, U256::from(3));
		assert_eq!(tx.value, U256::ZERO);
		assert!(tx.data.is_empty());
		assert_eq!(tx.operation, Operation::Call);
		assert_eq!(tx.safe_tx_gas, U256::ZERO);
		assert_eq!(tx.base_gas, U256::ZERO);
		assert_eq!(tx.gas_price, U256::ZERO);
		assert_eq!(tx.gas_token, Address::ZERO);
		assert_eq!(tx.refund_receiver, Address::ZERO);
	}

	#[test]
	fn test_missing_to_rejected() {
		let template = SafeTransactionTemplate {
			nonce: Some(U256::ZERO),
			..Default::default()
		};
		assert_eq!(
			build_transaction(template),
			Err(TransactionError::MissingField("to"))
		);
	}

	#[test]
	fn test_missing_nonce_rejected() {
		let template = SafeTransactionTemplate {
			to: Some(TARGET),
			..Default::default()
		};
		assert_eq!(
			build_transaction(template),
			Err(TransactionError::MissingField("nonce"))
		);
	}

	#[test]
	fn test_explicit_fields_kept() {
		let receiver = address!("0x00000000000000000000000000000000000000cc");
		let tx = SafeTransactionTemplate::new(TARGET, U256::from(1))
			.with_value(U256::from(10))
			.with_data(vec![0xde, 0xad])
			.with_operation(Operation::DelegateCall)
			.with_safe_tx_gas(U256::from(50_000))
			.with_base_gas(U256::from(21_000))
			.with_refund(U256::from(7), Address::ZERO, receiver)
			.build()
			.unwrap();

		assert_eq!(tx.value, U256::from(10));
		assert_eq!(tx.data, Bytes::from(vec![0xde, 0xad]));
		assert_eq!(tx.operation, Operation::DelegateCall);
		assert_eq!(tx.safe_tx_gas, U256::from(50_000));
		assert_eq!(tx.base_gas, U256::from(21_000));
		assert_eq!(tx.gas_price, U256::from(7));
		assert_eq!(tx.refund_receiver, receiver);
	}

	#[test]
	fn test_contract_call_operation() {
		let call = transferCall {
			to: address!("0x00000000000000000000000000000000000000dd"),
			amount: U256::from(5),
		};

		let tx = build_contract_call(TARGET, &call, U256::from(9), false).unwrap();
		assert_eq!(tx.to, TARGET);
		assert_eq!(tx.operation, Operation::Call);
		assert_eq!(tx.data, Bytes::from(call.abi_encode()));

		let delegated = build_contract_call(TARGET, &call, U256::from(9), true).unwrap();
		assert_eq!(delegated.operation, Operation::DelegateCall);
	}

	#[test]
	fn test_dynamic_call_matches_static_encoding() {
		let call = transferCall {
			to: address!("0x00000000000000000000000000000000000000dd"),
			amount: U256::from(5),
		};

		let data = encode_dynamic_call(
			"transfer(address,uint256)",
			&[
				"0x00000000000000000000000000000000000000dd".to_string(),
				"5".to_string(),
			],
		)
		.unwrap();

		assert_eq!(data, Bytes::from(call.abi_encode()));
	}

	#[test]
	fn test_dynamic_call_argument_count_checked() {
		let err = encode_dynamic_call("transfer(address,uint256)", &["0x00".to_string()])
			.unwrap_err();
		assert!(matches!(err, TransactionError::Abi(_)));
	}

	#[test]
	fn test_operation_serde_as_number() {
		let json = serde_json::to_string(&Operation::DelegateCall).unwrap();
		assert_eq!(json, "1");
		assert!(serde_json::from_str::<Operation>("2").is_err());
	}
}
