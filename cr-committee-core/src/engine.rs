//! `CommitteeEngine`: the single write-locked entry point a host chain
//! process holds onto for the lifetime of the node (spec §9, "Ambient
//! singletons" — no free-standing globals, everything lives on this
//! struct).

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use cr_committee_common::{NodePublicKey, Result, Uint168, Uint256};

use crate::arbiter::{self, ArbiterKeyFrame};
use crate::candidate::Candidate;
use crate::chain_integration::ChainIntegration;
use crate::checkpoint::CheckpointManager;
use crate::committee::{CRMember, CommitteeKeyFrame};
use crate::config::ChainParams;
use crate::ingestor::{self, IngestOutcome};
use crate::ledger::Ledger;
use crate::producer::Producer;
use crate::proposal::Proposal;
use crate::types::{Block, Confirm};

/// Owns the committee/arbiter/proposal state and the chain integration
/// handle for the node's lifetime. Readers take the read lock; block
/// ingestion, rollback and recovery take the write lock for the full
/// duration of one call (spec §5).
pub struct CommitteeEngine<C: ChainIntegration> {
	params: ChainParams,
	integration: Arc<C>,
	ledger: RwLock<Ledger>,
}

impl<C: ChainIntegration> CommitteeEngine<C> {
	pub fn new(params: ChainParams, integration: Arc<C>) -> Result<Self> {
		Self::open(params, integration, None)
	}

	pub fn open_at(params: ChainParams, integration: Arc<C>, data_dir: &Path) -> Result<Self> {
		Self::open(params, integration, Some(data_dir))
	}

	fn open(params: ChainParams, integration: Arc<C>, data_dir: Option<&Path>) -> Result<Self> {
		let dir = data_dir.map(Path::to_path_buf).unwrap_or_else(|| params.data_dir.clone());
		let checkpoints = CheckpointManager::open(&dir, params.checkpoint_interval, params.checkpoint_retention)?;
		Ok(CommitteeEngine { params, integration, ledger: RwLock::new(Ledger::new(checkpoints)) })
	}

	/// Ingest one confirmed block under the write lock (spec §4.7). This only
	/// appends to the history log; it does not seal it. The host decides
	/// separately, via [`Self::commit`], when a height is irreversible (a
	/// confirmation-depth or BFT-confirm policy of its own), keeping the
	/// rollback window open for everything not yet sealed (spec §4.1).
	pub fn process_block(&self, block: &Block, confirm: &Confirm) -> Result<IngestOutcome> {
		let mut ledger = self.ledger.write();
		ingestor::process_block(&mut ledger, self.integration.as_ref(), &self.params, block, confirm)
	}

	/// Seal history at `height`: everything at or below it can no longer be
	/// undone by [`Self::rollback_to`] (spec §4.1), and a checkpoint is
	/// snapshotted if `height` lands on the configured cadence (spec §4.2).
	pub fn commit(&self, height: u32) -> Result<()> {
		self.ledger.write().commit(height)
	}

	/// Roll the engine back to `target_height` under the write lock (spec
	/// §4.1/§4.2).
	pub fn rollback_to(&self, target_height: u32) -> Result<()> {
		self.ledger.write().rollback_to(target_height)
	}

	pub fn params(&self) -> &ChainParams {
		&self.params
	}

	// --- read accessors ---

	pub fn producer(&self, owner_public_key: &NodePublicKey) -> Option<Producer> {
		self.ledger.read().state.producers.get(owner_public_key).cloned()
	}

	pub fn candidate(&self, did: &Uint168) -> Option<Candidate> {
		self.ledger.read().state.candidates.get(did).cloned()
	}

	pub fn committee_member(&self, did: &Uint168) -> Option<CRMember> {
		self.ledger.read().state.committee.members.get(did).cloned()
	}

	pub fn committee_key_frame(&self) -> CommitteeKeyFrame {
		self.ledger.read().state.committee.clone()
	}

	pub fn arbiter_key_frame(&self) -> ArbiterKeyFrame {
		self.ledger.read().state.arbiters.clone()
	}

	pub fn proposal(&self, hash: &Uint256) -> Option<Proposal> {
		self.ledger.read().state.proposals.get(hash).cloned()
	}

	pub fn on_duty_arbiter(&self, offset: u32) -> Option<NodePublicKey> {
		self.ledger.read().state.arbiters.on_duty_arbiter(offset).copied()
	}

	pub fn has_majority(&self, n: u32) -> bool {
		arbiter::has_majority(n, self.params.arbiters_count())
	}

	pub fn has_minority(&self, n: u32) -> bool {
		arbiter::has_minority(n, self.params.arbiters_count())
	}

	pub fn sealed_height(&self) -> u32 {
		self.ledger.read().sealed_height()
	}
}
