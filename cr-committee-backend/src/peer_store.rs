//! Direct-peer list persistence: a length-prefixed list of
//! `(public_key, address)` pairs.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{BackendError, Result};
use crate::util::ensure_dir;

/// One persisted direct-peer entry: a 33-byte compressed node public key and
/// its advertised network address (`host:port`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistedPeer {
	pub public_key: [u8; 33],
	pub address: String,
}

pub struct PeerListStore {
	path: PathBuf,
}

impl PeerListStore {
	pub fn open(data_dir: &Path) -> Result<Self> {
		ensure_dir(data_dir)?;
		Ok(Self { path: data_dir.join("direct_peers.dat") })
	}

	pub fn save(&self, peers: &[PersistedPeer]) -> Result<()> {
		let tmp_path = self.path.with_extension("dat.tmp");
		{
			let mut file = fs::File::create(&tmp_path)?;
			file.write_u32::<LittleEndian>(peers.len() as u32)?;
			for peer in peers {
				file.write_all(&peer.public_key)?;
				let addr_bytes = peer.address.as_bytes();
				file.write_u32::<LittleEndian>(addr_bytes.len() as u32)?;
				file.write_all(addr_bytes)?;
			}
			file.sync_all()?;
		}
		fs::rename(&tmp_path, &self.path)?;
		Ok(())
	}

	pub fn load(&self) -> Result<Vec<PersistedPeer>> {
		if !self.path.exists() {
			return Ok(Vec::new());
		}
		let mut file = fs::File::open(&self.path)?;
		let count = file.read_u32::<LittleEndian>()?;
		let mut peers = Vec::with_capacity(count as usize);
		for _ in 0..count {
			let mut public_key = [0u8; 33];
			file.read_exact(&mut public_key)?;
			let addr_len = file.read_u32::<LittleEndian>()?;
			let mut addr_bytes = vec![0u8; addr_len as usize];
			file.read_exact(&mut addr_bytes)?;
			let address = String::from_utf8(addr_bytes)
				.map_err(|e| BackendError::CorruptPeerList(e.to_string()))?;
			peers.push(PersistedPeer { public_key, address });
		}
		Ok(peers)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn save_and_load_roundtrip() {
		let dir = tempfile::tempdir().unwrap();
		let store = PeerListStore::open(dir.path()).unwrap();
		let peers = vec![
			PersistedPeer { public_key: [1u8; 33], address: "10.0.0.1:20866".into() },
			PersistedPeer { public_key: [2u8; 33], address: "10.0.0.2:20866".into() },
		];
		store.save(&peers).unwrap();
		assert_eq!(store.load().unwrap(), peers);
	}

	#[test]
	fn missing_file_loads_empty() {
		let dir = tempfile::tempdir().unwrap();
		let store = PeerListStore::open(dir.path()).unwrap();
		assert!(store.load().unwrap().is_empty());
	}
}
