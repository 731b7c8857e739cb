//! EIP-712 typed structured data hashing.
//!
//! These helpers provide:
//! - Schema descriptors (`StructType`, `TypedField`) declared as static constants
//! - `hashStruct` over a flat schema in declaration order
//! - Domain hash computation for the single-field `EIP712Domain(address verifyingContract)`
//! - Final digest computation (0x1901 || domainSeparator || structHash)
//!
//! Only the field kinds used by Safe schemas (and their close relatives) are supported.
//! Nested structs and arrays are not.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use thiserror::Error;

/// Errors raised when values do not match the schema they are hashed against.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Eip712Error {
	/// The number of values differs from the number of schema fields.
	#[error("Struct {ty} expects {expected} values, got {actual}")]
	FieldCount {
		ty: &'static str,
		expected: usize,
		actual: usize,
	},
	/// A value's variant does not match the declared field kind.
	#[error("Field '{field}' expects a value of type {expected}")]
	TypeMismatch {
		field: &'static str,
		expected: &'static str,
	},
	/// An integer value does not fit in the declared width.
	#[error("Value of field '{field}' does not fit in {kind}")]
	OutOfRange {
		field: &'static str,
		kind: &'static str,
	},
}

/// Solidity type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
	Address,
	Uint8,
	Uint256,
	Bytes32,
	Bytes,
	String,
}

impl FieldKind {
	/// Canonical type name as it appears in `encodeType`.
	pub const fn as_str(&self) -> &'static str {
		match self {
			FieldKind::Address => "address",
			FieldKind::Uint8 => "uint8",
			FieldKind::Uint256 => "uint256",
			FieldKind::Bytes32 => "bytes32",
			FieldKind::Bytes => "bytes",
			FieldKind::String => "string",
		}
	}
}

/// One `{type, name}` entry of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedField {
	pub name: &'static str,
	pub kind: FieldKind,
}

/// A flat EIP-712 struct schema. Field order is part of the type and is never re-sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructType {
	pub name: &'static str,
	pub fields: &'static [TypedField],
}

impl StructType {
	/// Returns `Name(type1 name1,type2 name2,...)`.
	pub fn encode_type(&self) -> String {
		let members = self
			.fields
			.iter()
			.map(|field| format!("{} {}", field.kind.as_str(), field.name))
			.collect::<Vec<_>>()
			.join(",");
		format!("{}({})", self.name, members)
	}

	/// keccak256 of `encode_type`.
	pub fn type_hash(&self) -> B256 {
		keccak256(self.encode_type().as_bytes())
	}

	/// Computes `hashStruct(s) = keccak256(typeHash || encodeData(s))`.
	///
	/// `values` must be given in schema order. Dynamic fields (`bytes`, `string`) are
	/// hashed; value types are left-padded to a 32-byte word.
	pub fn hash_struct(&self, values: &[TypedValue]) -> Result<B256, Eip712Error> {
		if values.len() != self.fields.len() {
			return Err(Eip712Error::FieldCount {
				ty: self.name,
				expected: self.fields.len(),
				actual: values.len(),
			});
		}

		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&self.type_hash());
		for (field, value) in self.fields.iter().zip(values) {
			value.encode_into(field, &mut enc)?;
		}
		Ok(keccak256(enc.finish()))
	}
}

/// A value to be encoded against a `TypedField`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
	Address(Address),
	Uint(U256),
	Bytes32(B256),
	Bytes(Bytes),
	String(String),
}

impl TypedValue {
	fn encode_into(
		&self,
		field: &TypedField,
		enc: &mut Eip712AbiEncoder,
	) -> Result<(), Eip712Error> {
		match (field.kind, self) {
			(FieldKind::Address, TypedValue::Address(addr)) => enc.push_address(addr),
			(FieldKind::Uint256, TypedValue::Uint(v)) => enc.push_u256(*v),
			(FieldKind::Uint8, TypedValue::Uint(v)) => {
				if *v > U256::from(u8::MAX) {
					return Err(Eip712Error::OutOfRange {
						field: field.name,
						kind: "uint8",
					});
				}
				enc.push_u256(*v)
			},
			(FieldKind::Bytes32, TypedValue::Bytes32(v)) => enc.push_b256(v),
			(FieldKind::Bytes, TypedValue::Bytes(v)) => enc.push_b256(&keccak256(v)),
			(FieldKind::String, TypedValue::String(v)) => {
				enc.push_b256(&keccak256(v.as_bytes()))
			},
			(kind, _) => {
				return Err(Eip712Error::TypeMismatch {
					field: field.name,
					expected: kind.as_str(),
				})
			},
		}
		Ok(())
	}
}

/// Schema of the domain used by Safe accounts: only the verifying contract.
pub static EIP712_DOMAIN_TYPE: StructType = StructType {
	name: "EIP712Domain",
	fields: &[TypedField {
		name: "verifyingContract",
		kind: FieldKind::Address,
	}],
};

/// Domain descriptor binding a digest to one verifying contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eip712Domain {
	pub verifying_contract: Address,
}

impl Eip712Domain {
	pub fn new(verifying_contract: Address) -> Self {
		Self { verifying_contract }
	}

	/// The domain separator for this domain.
	pub fn separator(&self) -> B256 {
		hash_domain(self)
	}
}

/// Compute the EIP-712 domain hash (keccak256(abi.encode(typeHash, verifyingContract))).
pub fn hash_domain(domain: &Eip712Domain) -> B256 {
	let mut enc = Eip712AbiEncoder::new();
	enc.push_b256(&EIP712_DOMAIN_TYPE.type_hash());
	enc.push_address(&domain.verifying_contract);
	keccak256(enc.finish())
}

/// Compute the final EIP-712 digest: keccak256(0x1901 || domainSeparator || structHash).
pub fn compute_final_digest(domain_separator: &B256, struct_hash: &B256) -> B256 {
	let mut out = Vec::with_capacity(2 + 32 + 32);
	out.push(0x19);
	out.push(0x01);
	out.extend_from_slice(domain_separator.as_slice());
	out.extend_from_slice(struct_hash.as_slice());
	keccak256(out)
}

/// Hashes `values` against `ty` and binds the result to `domain_separator`.
pub fn hash_typed_data(
	domain_separator: &B256,
	ty: &StructType,
	values: &[TypedValue],
) -> Result<B256, Eip712Error> {
	let struct_hash = ty.hash_struct(values)?;
	Ok(compute_final_digest(domain_separator, &struct_hash))
}

/// A complete typed-data signing request: domain, schema and message values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedData {
	pub domain: Eip712Domain,
	pub primary_type: &'static StructType,
	pub message: Vec<TypedValue>,
}

impl TypedData {
	/// The 32-byte digest a typed-data signer signs.
	pub fn signing_hash(&self) -> Result<B256, Eip712Error> {
		hash_typed_data(&self.domain.separator(), self.primary_type, &self.message)
	}
}

/// Minimal ABI encoder for the static words used in EIP-712 struct hashing.
pub struct Eip712AbiEncoder {
	buf: Vec<u8>,
}

impl Default for Eip712AbiEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl Eip712AbiEncoder {
	pub fn new() -> Self {
		Self { buf: Vec::new() }
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	pub fn push_address(&mut self, addr: &Address) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u256(&mut self, v: U256) {
		let word: [u8; 32] = v.to_be_bytes::<32>();
		self.buf.extend_from_slice(&word);
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	static PERSON: StructType = StructType {
		name: "Person",
		fields: &[
			TypedField {
				name: "wallet",
				kind: FieldKind::Address,
			},
			TypedField {
				name: "age",
				kind: FieldKind::Uint8,
			},
			TypedField {
				name: "bio",
				kind: FieldKind::Bytes,
			},
		],
	};

	#[test]
	fn test_encode_type_keeps_declaration_order() {
		assert_eq!(
			PERSON.encode_type(),
			"Person(address wallet,uint8 age,bytes bio)"
		);
		assert_eq!(
			EIP712_DOMAIN_TYPE.encode_type(),
			"EIP712Domain(address verifyingContract)"
		);
	}

	#[test]
	fn test_domain_hash_matches_alloy() {
		let safe = address!("0x1234567890123456789012345678901234567890");
		let reference = alloy_sol_types::Eip712Domain {
			verifying_contract: Some(safe),
			..Default::default()
		};

		assert_eq!(hash_domain(&Eip712Domain::new(safe)), reference.hash_struct());
	}

	#[test]
	fn test_bytes_are_hashed_not_embedded() {
		let wallet = address!("0x00000000000000000000000000000000000000aa");
		let hash = PERSON
			.hash_struct(&[
				TypedValue::Address(wallet),
				TypedValue::Uint(U256::from(42)),
				TypedValue::Bytes(Bytes::new()),
			])
			.unwrap();

		let mut enc = Eip712AbiEncoder::new();
		enc.push_b256(&PERSON.type_hash());
		enc.push_address(&wallet);
		enc.push_u256(U256::from(42));
		enc.push_b256(&keccak256(b""));
		assert_eq!(hash, keccak256(enc.finish()));
	}

	#[test]
	fn test_wrong_value_count_rejected() {
		let err = PERSON
			.hash_struct(&[TypedValue::Address(Address::ZERO)])
			.unwrap_err();
		assert_eq!(
			err,
			Eip712Error::FieldCount {
				ty: "Person",
				expected: 3,
				actual: 1
			}
		);
	}

	#[test]
	fn test_type_mismatch_rejected() {
		let err = PERSON
			.hash_struct(&[
				TypedValue::Uint(U256::ZERO),
				TypedValue::Uint(U256::ZERO),
				TypedValue::Bytes(Bytes::new()),
			])
			.unwrap_err();
		assert_eq!(
			err,
			Eip712Error::TypeMismatch {
				field: "wallet",
				expected: "address"
			}
		);
	}

	#[test]
	fn test_uint8_overflow_rejected() {
		let err = PERSON
			.hash_struct(&[
				TypedValue::Address(Address::ZERO),
				TypedValue::Uint(U256::from(256)),
				TypedValue::Bytes(Bytes::new()),
			])
			.unwrap_err();
		assert!(matches!(err, Eip712Error::OutOfRange { field: "age", .. }));
	}

	#[test]
	fn test_final_digest_prefix() {
		let domain = B256::repeat_byte(0x11);
		let struct_hash = B256::repeat_byte(0x22);

		let mut preimage = vec![0x19, 0x01];
		preimage.extend_from_slice(domain.as_slice());
		preimage.extend_from_slice(struct_hash.as_slice());

		assert_eq!(
			compute_final_digest(&domain, &struct_hash),
			keccak256(preimage)
		);
	}
}
