//! Hashing and string helpers shared across the workspace.

pub mod eip712;
pub mod formatting;

pub use eip712::{
	compute_final_digest, hash_domain, hash_typed_data, Eip712AbiEncoder, Eip712Domain,
	Eip712Error, FieldKind, StructType, TypedData, TypedField, TypedValue, EIP712_DOMAIN_TYPE,
};
pub use formatting::{short_hex, with_0x_prefix, without_0x_prefix};
