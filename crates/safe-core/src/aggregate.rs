//! Packing of authorization records into the `execTransaction` signature blob.

use alloy_primitives::Bytes;
use safe_types::{SafeSignature, SIGNATURE_LENGTH};

use crate::SafeError;

/// Concatenates the 65-byte records of `signatures`, ascending by signer address.
///
/// Address byte order equals case-insensitive hex order, which is what the Safe's
/// strictly-increasing owner check uses. The blob carries no length prefix and is
/// empty for an empty input. A repeated signer is rejected, since the Safe would
/// revert on it anyway.
pub fn aggregate(signatures: &[SafeSignature]) -> Result<Bytes, SafeError> {
	let mut sorted: Vec<&SafeSignature> = signatures.iter().collect();
	sorted.sort_by_key(|signature| signature.signer);

	if let Some(pair) = sorted.windows(2).find(|pair| pair[0].signer == pair[1].signer) {
		return Err(SafeError::DuplicateSigner(pair[0].signer));
	}

	let mut blob = Vec::with_capacity(SIGNATURE_LENGTH * sorted.len());
	for signature in sorted {
		blob.extend_from_slice(&signature.data());
	}
	Ok(blob.into())
}
