//! 33-byte compressed secp256k1 public key, used both as a producer's node
//! identity and as a P2P peer id (`PID` in the original).

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `serde`'s built-in array support only covers `[T; 0..=32]`, so a 33-byte
/// key needs its own `Serialize`/`Deserialize` pair; written by hand here
/// rather than pulling in `serde-big-array`, the same way the teacher's own
/// fixed-size key types hand-roll their (de)serialization instead of
/// depending on array length.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodePublicKey(pub [u8; 33]);

impl Serialize for NodePublicKey {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let mut tup = serializer.serialize_tuple(33)?;
		for byte in &self.0 {
			tup.serialize_element(byte)?;
		}
		tup.end()
	}
}

impl<'de> Deserialize<'de> for NodePublicKey {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		struct NodePublicKeyVisitor;

		impl<'de> Visitor<'de> for NodePublicKeyVisitor {
			type Value = NodePublicKey;

			fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
				formatter.write_str("a 33-byte compressed public key")
			}

			fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
			where
				A: SeqAccess<'de>,
			{
				let mut out = [0u8; 33];
				for (i, slot) in out.iter_mut().enumerate() {
					*slot = seq.next_element()?.ok_or_else(|| de::Error::invalid_length(i, &self))?;
				}
				Ok(NodePublicKey(out))
			}
		}

		deserializer.deserialize_tuple(33, NodePublicKeyVisitor)
	}
}

impl NodePublicKey {
	pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
		if bytes.len() != 33 {
			return None;
		}
		let mut out = [0u8; 33];
		out.copy_from_slice(bytes);
		Some(NodePublicKey(out))
	}

	pub fn to_hex(&self) -> String {
		hex::encode(self.0)
	}

	pub fn from_hex(s: &str) -> Option<Self> {
		let bytes = hex::decode(s).ok()?;
		Self::from_bytes(&bytes)
	}
}

impl fmt::Debug for NodePublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "NodePublicKey({})", self.to_hex())
	}
}

impl fmt::Display for NodePublicKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_hex())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn hex_roundtrip() {
		let bytes = [3u8; 33];
		let pk = NodePublicKey::from_bytes(&bytes).unwrap();
		let hex = pk.to_hex();
		assert_eq!(NodePublicKey::from_hex(&hex).unwrap(), pk);
	}

	#[test]
	fn rejects_wrong_length() {
		assert!(NodePublicKey::from_bytes(&[0u8; 32]).is_none());
	}
}
