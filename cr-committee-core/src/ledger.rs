//! Wires the history log, checkpoint manager and `EngineState` together
//! behind one `record`/`rollback_to` surface, so every other component
//! mutates state exclusively through invertible `Change`s.

use cr_committee_common::Result;

use crate::checkpoint::CheckpointManager;
use crate::engine_state::EngineState;
use crate::history::{Change, HistoryLog};

pub struct Ledger {
	pub state: EngineState,
	history: HistoryLog,
	checkpoints: CheckpointManager,
}

impl Ledger {
	pub fn new(checkpoints: CheckpointManager) -> Self {
		Ledger { state: EngineState::default(), history: HistoryLog::default(), checkpoints }
	}

	/// Apply `change` to `state` and record it at `height` in one step:
	/// `append` records and immediately executes.
	pub fn record(&mut self, height: u32, change: Change) {
		change.apply(&mut self.state);
		self.history.push(height, change);
	}

	/// Seal history at `height` and snapshot if `height` lands on the
	/// checkpoint cadence.
	pub fn commit(&mut self, height: u32) -> Result<()> {
		if self.checkpoints.is_checkpoint_height(height) {
			self.checkpoints.snapshot(height, &self.state)?;
		}
		self.history.commit(height);
		Ok(())
	}

	/// Roll back to `target_height`: undo history effects above it via the
	/// log when still within the commit window, otherwise restore the
	/// nearest checkpoint at or below it and replay is left to the caller
	/// (the block ingestor re-applies blocks after a checkpoint recovery).
	pub fn rollback_to(&mut self, target_height: u32) -> Result<()> {
		match self.history.rollback_to(&mut self.state, target_height) {
			Ok(()) => {
				self.checkpoints.prune_above(target_height)?;
				Ok(())
			}
			Err(e @ cr_committee_common::EngineError::BeyondCommitWindow { .. }) => {
				let checkpoint = self.checkpoints.recover_at(target_height).map_err(|_| e)?;
				let checkpoint_height = checkpoint.height;
				self.state = checkpoint.state;
				self.history = HistoryLog::with_sealed_height(checkpoint_height);
				self.checkpoints.prune_above(target_height)?;
				Ok(())
			}
			Err(e) => Err(e),
		}
	}

	pub fn sealed_height(&self) -> u32 {
		self.history.sealed_height()
	}
}
