//! The persisted map from arbiter public key to connection state (spec
//! §4.8): `public_key_hex -> PeerEntry{addr, need_connect, live_peer?}`.

use hashbrown::HashMap;

use cr_committee_backend::peer_store::{PeerListStore, PersistedPeer};
use cr_committee_common::{NodePublicKey, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerEntry {
	pub addr: String,
	pub need_connect: bool,
	pub connected: bool,
}

#[derive(Default)]
pub struct PeerTable {
	entries: HashMap<NodePublicKey, PeerEntry>,
}

impl PeerTable {
	pub fn load(store: &PeerListStore) -> Result<Self> {
		let persisted = store.load().map_err(|e| cr_committee_common::EngineError::Other(e.to_string()))?;
		let mut entries = HashMap::new();
		for p in persisted {
			if let Some(key) = NodePublicKey::from_bytes(&p.public_key) {
				entries.insert(key, PeerEntry { addr: p.address, need_connect: true, connected: false });
			}
		}
		Ok(PeerTable { entries })
	}

	pub fn save(&self, store: &PeerListStore) -> Result<()> {
		let persisted: Vec<PersistedPeer> =
			self.entries.iter().map(|(k, v)| PersistedPeer { public_key: k.0, address: v.addr.clone() }).collect();
		store.save(&persisted).map_err(|e| cr_committee_common::EngineError::Other(e.to_string()))
	}

	pub fn get(&self, key: &NodePublicKey) -> Option<&PeerEntry> {
		self.entries.get(key)
	}

	pub fn insert(&mut self, key: NodePublicKey, addr: String) {
		self.entries.entry(key).or_insert_with(|| PeerEntry { addr: addr.clone(), need_connect: true, connected: false }).addr = addr;
	}

	pub fn set_connected(&mut self, key: &NodePublicKey, connected: bool) {
		if let Some(entry) = self.entries.get_mut(key) {
			entry.connected = connected;
		}
	}

	/// Recompute every entry's `need_connect` flag against the current
	/// arbiter set: arbiters need a connection, everyone else doesn't.
	pub fn recompute_need_connect(&mut self, current_arbiters: &[NodePublicKey]) {
		let wanted: std::collections::HashSet<&NodePublicKey> = current_arbiters.iter().collect();
		for (key, entry) in self.entries.iter_mut() {
			entry.need_connect = wanted.contains(key);
		}
	}

	/// Keys that need a connection but don't have one yet.
	pub fn pending_connections(&self) -> Vec<NodePublicKey> {
		self.entries.iter().filter(|(_, e)| e.need_connect && !e.connected).map(|(k, _)| *k).collect()
	}

	/// Connections that are live but no longer wanted.
	pub fn stale_connections(&self) -> Vec<NodePublicKey> {
		self.entries.iter().filter(|(_, e)| !e.need_connect && e.connected).map(|(k, _)| *k).collect()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn key(byte: u8) -> NodePublicKey {
		NodePublicKey([byte; 33])
	}

	#[test]
	fn recompute_marks_only_current_arbiters() {
		let mut table = PeerTable::default();
		table.insert(key(1), "1.1.1.1:1".into());
		table.insert(key(2), "2.2.2.2:2".into());
		table.recompute_need_connect(&[key(1)]);
		assert!(table.get(&key(1)).unwrap().need_connect);
		assert!(!table.get(&key(2)).unwrap().need_connect);
	}

	#[test]
	fn pending_and_stale_partition_correctly() {
		let mut table = PeerTable::default();
		table.insert(key(1), "a".into());
		table.insert(key(2), "b".into());
		table.set_connected(&key(2), true);
		table.recompute_need_connect(&[key(1)]);
		assert_eq!(table.pending_connections(), vec![key(1)]);
		assert_eq!(table.stale_connections(), vec![key(2)]);
	}
}
