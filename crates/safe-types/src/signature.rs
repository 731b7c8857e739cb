//! Per-signer authorization records.
//!
//! Every authorization contributes exactly 65 bytes to the signature blob passed to
//! `execTransaction`. The Safe tells the modes apart by the trailing byte:
//!
//! | Mode             | bytes 0..32        | bytes 32..64 | byte 64  |
//! |------------------|--------------------|--------------|----------|
//! | ECDSA typed data | r                  | s            | 27 / 28  |
//! | Prefixed message | r                  | s            | 31 / 32  |
//! | Pre-approved     | 12 zeros ‖ signer  | zeros        | 1        |

use alloy_primitives::{Address, Bytes, Signature, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of one authorization record.
pub const SIGNATURE_LENGTH: usize = 65;

/// Trailing byte marking a record verified against the Safe's `approvedHashes`.
pub const PRE_APPROVED_TYPE: u8 = 1;

/// Offset added to `v` for signatures over the EIP-191 prefixed digest.
pub const PREFIXED_V_OFFSET: u8 = 4;

/// Errors raised when parsing or recovering authorization records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
	/// The record is not 65 bytes long.
	#[error("Signature must be 65 bytes, got {0}")]
	InvalidLength(usize),
	/// The trailing byte does not identify a supported mode.
	#[error("Unsupported signature type byte {0}")]
	UnsupportedType(u8),
	/// A pre-approval record has non-zero filler bytes.
	#[error("Malformed pre-approval record")]
	MalformedApproval,
	/// A pre-approval record names a different signer.
	#[error("Pre-approval record embeds {embedded}, expected {signer}")]
	SignerMismatch { signer: Address, embedded: Address },
	/// ECDSA recovery failed.
	#[error("Failed to recover signer: {0}")]
	Recovery(String),
}

/// The way one signer authorized a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
	/// ECDSA signature over the EIP-712 digest.
	Ecdsa(Signature),
	/// ECDSA signature over the EIP-191 prefixed digest (`personal_sign`).
	PrefixedMessage(Signature),
	/// Assent recorded on-chain through `approveHash`.
	PreApproved,
}

impl Authorization {
	/// Encodes the record the Safe expects for `signer`.
	pub fn encode(&self, signer: &Address) -> [u8; SIGNATURE_LENGTH] {
		match self {
			Authorization::Ecdsa(signature) => signature.as_bytes(),
			Authorization::PrefixedMessage(signature) => {
				let mut bytes = signature.as_bytes();
				bytes[64] += PREFIXED_V_OFFSET;
				bytes
			},
			Authorization::PreApproved => {
				let mut bytes = [0u8; SIGNATURE_LENGTH];
				bytes[12..32].copy_from_slice(signer.as_slice());
				bytes[64] = PRE_APPROVED_TYPE;
				bytes
			},
		}
	}

	pub fn mode(&self) -> &'static str {
		match self {
			Authorization::Ecdsa(_) => "typed_data",
			Authorization::PrefixedMessage(_) => "prefixed_message",
			Authorization::PreApproved => "pre_approval",
		}
	}
}

/// One signer's authorization of a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeSignature {
	pub signer: Address,
	pub authorization: Authorization,
}

impl SafeSignature {
	pub fn ecdsa(signer: Address, signature: Signature) -> Self {
		Self {
			signer,
			authorization: Authorization::Ecdsa(signature),
		}
	}

	pub fn prefixed(signer: Address, signature: Signature) -> Self {
		Self {
			signer,
			authorization: Authorization::PrefixedMessage(signature),
		}
	}

	pub fn pre_approved(signer: Address) -> Self {
		Self {
			signer,
			authorization: Authorization::PreApproved,
		}
	}

	/// The 65-byte record contributed to the signature blob.
	pub fn data(&self) -> [u8; SIGNATURE_LENGTH] {
		self.authorization.encode(&self.signer)
	}

	/// Parses a 65-byte record attributed to `signer`.
	pub fn from_bytes(signer: Address, bytes: &[u8]) -> Result<Self, SignatureError> {
		if bytes.len() != SIGNATURE_LENGTH {
			return Err(SignatureError::InvalidLength(bytes.len()));
		}

		let v = bytes[64];
		match v {
			27 | 28 => Ok(Self::ecdsa(signer, split_signature(bytes, v))),
			31 | 32 => Ok(Self::prefixed(
				signer,
				split_signature(bytes, v - PREFIXED_V_OFFSET),
			)),
			PRE_APPROVED_TYPE => {
				let filler_is_zero = bytes[..12].iter().all(|b| *b == 0)
					&& bytes[32..64].iter().all(|b| *b == 0);
				if !filler_is_zero {
					return Err(SignatureError::MalformedApproval);
				}
				let embedded = Address::from_slice(&bytes[12..32]);
				if embedded != signer {
					return Err(SignatureError::SignerMismatch { signer, embedded });
				}
				Ok(Self::pre_approved(signer))
			},
			other => Err(SignatureError::UnsupportedType(other)),
		}
	}

	/// Recovers the address that produced this record for `digest`.
	///
	/// Prefixed-message records are recovered against the EIP-191 hash of the digest,
	/// as the Safe does. Pre-approval records carry no signature and return the
	/// embedded signer.
	pub fn recover(&self, digest: &B256) -> Result<Address, SignatureError> {
		match &self.authorization {
			Authorization::Ecdsa(signature) => signature
				.recover_address_from_prehash(digest)
				.map_err(|e| SignatureError::Recovery(e.to_string())),
			Authorization::PrefixedMessage(signature) => signature
				.recover_address_from_msg(digest.as_slice())
				.map_err(|e| SignatureError::Recovery(e.to_string())),
			Authorization::PreApproved => Ok(self.signer),
		}
	}
}

/// Splits `r ‖ s ‖ v` with `v` already normalized to 27/28.
fn split_signature(bytes: &[u8], v: u8) -> Signature {
	let r = U256::from_be_slice(&bytes[..32]);
	let s = U256::from_be_slice(&bytes[32..64]);
	Signature::new(r, s, v == 28)
}

/// Serializable `{ signer, data }` form of a `SafeSignature`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
	pub signer: Address,
	pub data: Bytes,
}

impl From<&SafeSignature> for SignatureRecord {
	fn from(signature: &SafeSignature) -> Self {
		Self {
			signer: signature.signer,
			data: Bytes::copy_from_slice(&signature.data()),
		}
	}
}

impl TryFrom<SignatureRecord> for SafeSignature {
	type Error = SignatureError;

	fn try_from(record: SignatureRecord) -> Result<Self, Self::Error> {
		SafeSignature::from_bytes(record.signer, &record.data)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, b256};

	const SIGNER: Address = address!("0x70997970c51812dc3a010c7d01b50e0d17dc79c8");

	fn sample_signature(parity: bool) -> Signature {
		Signature::new(
			U256::from_be_bytes(
				b256!("0x1111111111111111111111111111111111111111111111111111111111111111").0,
			),
			U256::from_be_bytes(
				b256!("0x2222222222222222222222222222222222222222222222222222222222222222").0,
			),
			parity,
		)
	}

	#[test]
	fn test_pre_approval_layout() {
		let data = SafeSignature::pre_approved(SIGNER).data();

		assert!(data[..12].iter().all(|b| *b == 0));
		assert_eq!(&data[12..32], SIGNER.as_slice());
		assert!(data[32..64].iter().all(|b| *b == 0));
		assert_eq!(data[64], 0x01);
	}

	#[test]
	fn test_prefixed_bumps_only_v() {
		for (parity, raw_v, bumped_v) in [(false, 27u8, 31u8), (true, 28, 32)] {
			let signature = sample_signature(parity);
			let raw = SafeSignature::ecdsa(SIGNER, signature).data();
			let prefixed = SafeSignature::prefixed(SIGNER, signature).data();

			assert_eq!(raw[64], raw_v);
			assert_eq!(prefixed[64], bumped_v);
			assert_eq!(raw[..64], prefixed[..64]);
		}
	}

	#[test]
	fn test_from_bytes_classifies_modes() {
		let signature = sample_signature(true);
		for original in [
			SafeSignature::ecdsa(SIGNER, signature),
			SafeSignature::prefixed(SIGNER, signature),
			SafeSignature::pre_approved(SIGNER),
		] {
			let parsed = SafeSignature::from_bytes(SIGNER, &original.data()).unwrap();
			assert_eq!(parsed, original);
		}
	}

	#[test]
	fn test_from_bytes_rejects_bad_input() {
		assert_eq!(
			SafeSignature::from_bytes(SIGNER, &[0u8; 64]),
			Err(SignatureError::InvalidLength(64))
		);

		let mut unknown = SafeSignature::ecdsa(SIGNER, sample_signature(false)).data();
		unknown[64] = 0;
		assert_eq!(
			SafeSignature::from_bytes(SIGNER, &unknown),
			Err(SignatureError::UnsupportedType(0))
		);

		let approval = SafeSignature::pre_approved(SIGNER).data();
		let other = address!("0x00000000000000000000000000000000000000aa");
		assert_eq!(
			SafeSignature::from_bytes(other, &approval),
			Err(SignatureError::SignerMismatch {
				signer: other,
				embedded: SIGNER
			})
		);

		let mut dirty = approval;
		dirty[40] = 1;
		assert_eq!(
			SafeSignature::from_bytes(SIGNER, &dirty),
			Err(SignatureError::MalformedApproval)
		);
	}

	#[test]
	fn test_record_round_trip_through_json() {
		let signature = SafeSignature::pre_approved(SIGNER);
		let json = serde_json::to_string(&SignatureRecord::from(&signature)).unwrap();
		let record: SignatureRecord = serde_json::from_str(&json).unwrap();

		assert_eq!(SafeSignature::try_from(record).unwrap(), signature);
	}
}
