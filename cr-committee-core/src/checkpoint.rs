//! Checkpoint Manager (C2): periodic snapshots of the committee/proposal/
//! producer/arbiter key-frames, used for deep rollback beyond the history
//! log's sealed window (spec §4.2).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cr_committee_backend::checkpoint_store::CheckpointStore;
use cr_committee_common::{EngineError, Result};

use crate::engine_state::EngineState;

/// An immutable bundle of every key-frame at a given height (spec §3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
	pub height: u32,
	pub state: EngineState,
}

pub struct CheckpointManager {
	store: CheckpointStore,
	in_memory: BTreeMap<u32, Checkpoint>,
	retention: usize,
	interval: u32,
}

impl CheckpointManager {
	pub fn open(data_dir: &Path, interval: u32, retention: usize) -> Result<Self> {
		let store = CheckpointStore::open(data_dir).map_err(|e| EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
		Ok(CheckpointManager { store, in_memory: BTreeMap::new(), retention, interval })
	}

	pub fn interval(&self) -> u32 {
		self.interval
	}

	/// Whether `height` lands on the checkpoint cadence.
	pub fn is_checkpoint_height(&self, height: u32) -> bool {
		self.interval > 0 && height % self.interval == 0
	}

	/// Snapshot `state` at `height`, keeping it in memory (bounded by
	/// `retention`, oldest pruned) and flushing it to disk.
	pub fn snapshot(&mut self, height: u32, state: &EngineState) -> Result<()> {
		let checkpoint = Checkpoint { height, state: state.clone() };
		self.store
			.store(height, &checkpoint)
			.map_err(|e| EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
		self.in_memory.insert(height, checkpoint);
		while self.in_memory.len() > self.retention {
			if let Some(&oldest) = self.in_memory.keys().next() {
				self.in_memory.remove(&oldest);
			}
		}
		Ok(())
	}

	/// The checkpoint at the greatest height `<= h`, checking the
	/// in-memory cache before falling back to disk (spec §4.2).
	pub fn recover_at(&self, h: u32) -> Result<Checkpoint> {
		if let Some((_, checkpoint)) = self.in_memory.range(..=h).next_back() {
			return Ok(checkpoint.clone());
		}
		self.store
			.greatest_at_or_below::<Checkpoint>(h)
			.map_err(|e| EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?
			.map(|(_, c)| c)
			.ok_or(EngineError::NoCheckpoint(h))
	}

	/// Drop in-memory and on-disk checkpoints above `height`, called after
	/// a rollback so stale future snapshots don't linger.
	pub fn prune_above(&mut self, height: u32) -> Result<()> {
		self.in_memory.retain(|h, _| *h <= height);
		self.store
			.prune_above(height)
			.map_err(|e| EngineError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn snapshot_and_recover_roundtrip() {
		let dir = tempfile::tempdir().unwrap();
		let mut mgr = CheckpointManager::open(dir.path(), 100, 10).unwrap();
		let mut state = EngineState::default();
		state.committee.last_committee_height = 42;
		mgr.snapshot(100, &state).unwrap();

		let recovered = mgr.recover_at(150).unwrap();
		assert_eq!(recovered.height, 100);
		assert_eq!(recovered.state.committee.last_committee_height, 42);
	}

	#[test]
	fn recover_with_no_checkpoint_fails() {
		let dir = tempfile::tempdir().unwrap();
		let mgr = CheckpointManager::open(dir.path(), 100, 10).unwrap();
		assert!(matches!(mgr.recover_at(50), Err(EngineError::NoCheckpoint(50))));
	}

	#[test]
	fn is_checkpoint_height_matches_interval() {
		let dir = tempfile::tempdir().unwrap();
		let mgr = CheckpointManager::open(dir.path(), 2000, 10).unwrap();
		assert!(mgr.is_checkpoint_height(4000));
		assert!(!mgr.is_checkpoint_height(4001));
	}
}
