//! Maps the current arbiter set onto a connection topology, asking a P2P
//! server to (dis)connect peers until the live connection set matches
//! `need_connect`.

use std::path::Path;

use cr_committee_common::{NodePublicKey, Result};

use cr_committee_backend::peer_store::PeerListStore;

use super::table::PeerTable;

/// The subset of a P2P server's surface the projector drives. Sends and
/// broadcasts otherwise flow through the server directly; this crate only
/// asks it to open/close specific connections.
pub trait PeerServer: Send + Sync {
	fn connect(&self, public_key: &NodePublicKey, addr: &str);
	fn disconnect(&self, public_key: &NodePublicKey);
}

pub struct PeerProjector<S: PeerServer> {
	table: PeerTable,
	store: PeerListStore,
	server: S,
}

impl<S: PeerServer> PeerProjector<S> {
	pub fn open(data_dir: &Path, server: S) -> Result<Self> {
		let store = PeerListStore::open(data_dir).map_err(|e| cr_committee_common::EngineError::Other(e.to_string()))?;
		let table = PeerTable::load(&store)?;
		Ok(PeerProjector { table, store, server })
	}

	/// Register a directly-dialable peer address (e.g. a configured CRC
	/// arbiter's `net_address`), independent of the rotating producer set.
	pub fn add_direct_peer(&mut self, public_key: NodePublicKey, addr: String) -> Result<()> {
		self.table.insert(public_key, addr);
		self.table.save(&self.store)
	}

	/// React to an arbiter-set change: recompute `need_connect` against
	/// `current_arbitrators`, then (dis)connect to match.
	pub fn on_arbiter_set_changed(&mut self, current_arbitrators: &[NodePublicKey]) -> Result<()> {
		self.table.recompute_need_connect(current_arbitrators);

		for key in self.table.pending_connections() {
			if let Some(entry) = self.table.get(&key) {
				self.server.connect(&key, &entry.addr);
				self.table.set_connected(&key, true);
			}
		}
		for key in self.table.stale_connections() {
			self.server.disconnect(&key);
			self.table.set_connected(&key, false);
		}

		self.table.save(&self.store)
	}

	pub fn table(&self) -> &PeerTable {
		&self.table
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use std::sync::Mutex;

	fn key(byte: u8) -> NodePublicKey {
		NodePublicKey([byte; 33])
	}

	#[derive(Default)]
	struct RecordingServer {
		connected: Mutex<Vec<NodePublicKey>>,
		disconnected: Mutex<Vec<NodePublicKey>>,
	}

	impl PeerServer for RecordingServer {
		fn connect(&self, public_key: &NodePublicKey, _addr: &str) {
			self.connected.lock().unwrap().push(*public_key);
		}
		fn disconnect(&self, public_key: &NodePublicKey) {
			self.disconnected.lock().unwrap().push(*public_key);
		}
	}

	#[test]
	fn arbiter_change_connects_and_disconnects() {
		let dir = tempfile::tempdir().unwrap();
		let mut projector = PeerProjector::open(dir.path(), RecordingServer::default()).unwrap();
		projector.add_direct_peer(key(1), "1.1.1.1:1".into()).unwrap();
		projector.add_direct_peer(key(2), "2.2.2.2:2".into()).unwrap();

		projector.on_arbiter_set_changed(&[key(1)]).unwrap();
		assert_eq!(*projector.server.connected.lock().unwrap(), vec![key(1)]);

		projector.on_arbiter_set_changed(&[key(2)]).unwrap();
		assert_eq!(*projector.server.disconnected.lock().unwrap(), vec![key(1)]);
	}
}
