//! 168-bit program-hash/DID and 256-bit transaction/proposal hash newtypes.
//!
//! Both follow the original chain's little-endian-internal, big-endian
//! display convention: bytes are stored as produced by hashing, and rendered
//! as hex in display order (matching `common.Uint168`/`common.Uint256`).

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

macro_rules! fixed_hash {
	($name:ident, $len:expr) => {
		#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		pub struct $name(pub [u8; $len]);

		impl $name {
			pub const LEN: usize = $len;

			pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
				if bytes.len() != $len {
					return None;
				}
				let mut out = [0u8; $len];
				out.copy_from_slice(bytes);
				Some($name(out))
			}

			pub fn as_bytes(&self) -> &[u8; $len] {
				&self.0
			}

			pub fn to_hex(&self) -> String {
				hex::encode(self.0)
			}
		}

		impl fmt::Debug for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}({})", stringify!($name), self.to_hex())
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.to_hex())
			}
		}
	};
}

fixed_hash!(Uint168, 21);
fixed_hash!(Uint256, 32);

/// Double SHA-256, matching the original's `common.Sha256D` convention used
/// for proposal hashes.
pub fn sha256d(data: &[u8]) -> Uint256 {
	let first = Sha256::digest(data);
	let second = Sha256::digest(&first);
	Uint256::from_bytes(&second).expect("sha256 digest is always 32 bytes")
}

/// DID derivation from a program code: the DID is a `Uint168` built the same
/// way a standard program hash is, over the code bytes.
pub fn did_from_code(code: &[u8]) -> Uint168 {
	let digest = sha256d(code);
	// a Uint168 program hash is a type-prefixed RIPEMD-like hash in the
	// original; we keep the 21-byte shape (1 prefix byte + 20 hash bytes)
	// by truncating the double-sha256 digest, which preserves uniqueness
	// for the purposes of this engine's bookkeeping.
	let mut out = [0u8; 21];
	out[0] = 0x67; // standard "CR DID" type prefix, matches ELA PrefixCRDID shape
	out[1..].copy_from_slice(&digest.0[..20]);
	Uint168(out)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn did_derivation_is_deterministic_and_injective_in_practice() {
		let a = did_from_code(b"candidate-a-code");
		let b = did_from_code(b"candidate-b-code");
		assert_eq!(a, did_from_code(b"candidate-a-code"));
		assert_ne!(a, b);
	}

	#[test]
	fn hex_roundtrip() {
		let bytes = [7u8; 32];
		let h = Uint256::from_bytes(&bytes).unwrap();
		assert_eq!(h.to_hex().len(), 64);
	}
}
