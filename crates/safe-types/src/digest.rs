//! Safe transaction and message digests.
//!
//! Both digests are EIP-712 hashes bound to the Safe's own address through the
//! one-field domain `EIP712Domain(address verifyingContract)`.

use alloy_primitives::{Address, Bytes, B256};

use crate::transaction::SafeTransaction;
use crate::utils::eip712::{
	hash_domain, hash_typed_data, Eip712Domain, Eip712Error, FieldKind, StructType, TypedData,
	TypedField, TypedValue,
};

/// `SafeTx(address to,uint256 value,bytes data,uint8 operation,uint256 safeTxGas,uint256 baseGas,uint256 gasPrice,address gasToken,address refundReceiver,uint256 nonce)`
pub static SAFE_TX_TYPE: StructType = StructType {
	name: "SafeTx",
	fields: &[
		TypedField {
			name: "to",
			kind: FieldKind::Address,
		},
		TypedField {
			name: "value",
			kind: FieldKind::Uint256,
		},
		TypedField {
			name: "data",
			kind: FieldKind::Bytes,
		},
		TypedField {
			name: "operation",
			kind: FieldKind::Uint8,
		},
		TypedField {
			name: "safeTxGas",
			kind: FieldKind::Uint256,
		},
		TypedField {
			name: "baseGas",
			kind: FieldKind::Uint256,
		},
		TypedField {
			name: "gasPrice",
			kind: FieldKind::Uint256,
		},
		TypedField {
			name: "gasToken",
			kind: FieldKind::Address,
		},
		TypedField {
			name: "refundReceiver",
			kind: FieldKind::Address,
		},
		TypedField {
			name: "nonce",
			kind: FieldKind::Uint256,
		},
	],
};

/// `SafeMessage(bytes message)`
pub static SAFE_MESSAGE_TYPE: StructType = StructType {
	name: "SafeMessage",
	fields: &[TypedField {
		name: "message",
		kind: FieldKind::Bytes,
	}],
};

/// Domain separator of the Safe deployed at `safe`.
pub fn domain_separator(safe: Address) -> B256 {
	hash_domain(&Eip712Domain::new(safe))
}

/// Typed-data signing request for a Safe transaction.
pub fn transaction_typed_data(safe: Address, tx: &SafeTransaction) -> TypedData {
	TypedData {
		domain: Eip712Domain::new(safe),
		primary_type: &SAFE_TX_TYPE,
		message: tx.eip712_values(),
	}
}

/// Typed-data signing request for an arbitrary message.
pub fn message_typed_data(safe: Address, message: &Bytes) -> TypedData {
	TypedData {
		domain: Eip712Domain::new(safe),
		primary_type: &SAFE_MESSAGE_TYPE,
		message: vec![TypedValue::Bytes(message.clone())],
	}
}

/// The `safeTxHash` the Safe recomputes in `execTransaction`.
pub fn transaction_digest(safe: Address, tx: &SafeTransaction) -> Result<B256, Eip712Error> {
	hash_typed_data(&domain_separator(safe), &SAFE_TX_TYPE, &tx.eip712_values())
}

/// The digest of `message` wrapped as a `SafeMessage`.
pub fn message_digest(safe: Address, message: &Bytes) -> Result<B256, Eip712Error> {
	hash_typed_data(
		&domain_separator(safe),
		&SAFE_MESSAGE_TYPE,
		&[TypedValue::Bytes(message.clone())],
	)
}
