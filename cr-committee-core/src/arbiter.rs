//! Arbiter Rotation (C4): current/next arbiter and candidate lists, on-duty
//! scheduling, and majority/minority thresholds.

use std::collections::HashSet;

use rayon::slice::ParallelSliceMut;
use serde::{Deserialize, Serialize};

use cr_committee_common::{EngineError, NodePublicKey, Result};

use crate::config::ChainParams;
use crate::producer::ProducerRegistry;

/// The arbiter snapshot-target key-frame (spec §3).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArbiterKeyFrame {
	pub current_arbitrators: Vec<NodePublicKey>,
	pub current_candidates: Vec<NodePublicKey>,
	pub next_arbitrators: Vec<NodePublicKey>,
	pub next_candidates: Vec<NodePublicKey>,
	pub duty_index: u32,
	pub crc_arbiter_program_hashes: HashSet<NodePublicKey>,
}

impl ArbiterKeyFrame {
	pub fn arbiters_count(&self, params: &ChainParams) -> u32 {
		params.arbiters_count()
	}

	/// `current_arbitrators[(duty_index + k) mod len]` per spec §4.4.
	pub fn on_duty_arbiter(&self, offset: u32) -> Option<&NodePublicKey> {
		if self.current_arbitrators.is_empty() {
			return None;
		}
		let idx = (self.duty_index + offset) as usize % self.current_arbitrators.len();
		self.current_arbitrators.get(idx)
	}

	/// Promote `next_*` into `current_*`, sorting the new current
	/// arbitrators by the hex string of their node public key for
	/// deterministic ordering (spec §4.4).
	pub fn promote_next_to_current(&mut self) {
		let mut current = std::mem::take(&mut self.next_arbitrators);
		current.sort_unstable_by(|a, b| a.to_hex().cmp(&b.to_hex()));
		self.current_arbitrators = current;
		self.current_candidates = std::mem::take(&mut self.next_candidates);
	}
}

/// `force_change` per spec §4.4: an illegality/inactivity special
/// transaction landed in the block, or the next height is a protocol
/// version handover.
pub fn force_change(block_has_inactive_or_illegal_tx: bool, next_height: u32, params: &ChainParams) -> bool {
	block_has_inactive_or_illegal_tx || params.height_versions.iter().any(|h| *h == next_height)
}

/// `normal_change` per spec §4.4: the rotation has wrapped back to the
/// first slot.
pub fn normal_change(frame: &ArbiterKeyFrame, params: &ChainParams) -> bool {
	let count = frame.arbiters_count(params);
	count > 0 && frame.duty_index == count - 1
}

/// Recompute `next_arbitrators`/`next_candidates` for height `h+1` from the
/// live producer table and the configured CRC seats (spec §4.4).
///
/// `next_arbitrators` is CRC arbiters not currently inactive, in
/// configuration order, followed by the top
/// `NormalArbitratorsCount + inactive_crc_count` producers by
/// `(votes desc, public_key asc)`. `next_candidates` continues the same
/// ordered list for the next `CandidatesCount` entries.
pub fn recompute_next(
	producers: &ProducerRegistry,
	inactive_crc: &HashSet<NodePublicKey>,
	params: &ChainParams,
) -> Result<(Vec<NodePublicKey>, Vec<NodePublicKey>)> {
	let arbiters_count = params.arbiters_count();
	let required = arbiters_count / 2 + 1;
	if producers.active_count() < required {
		return Err(EngineError::InsufficientProducers { have: producers.active_count(), required });
	}

	let active_crc: Vec<NodePublicKey> = params
		.crc_arbiters
		.iter()
		.map(|c| c.public_key)
		.filter(|pk| !inactive_crc.contains(pk))
		.collect();
	let inactive_crc_count = params.crc_arbiters.len() as u32 - active_crc.len() as u32;

	let mut ranked: Vec<&crate::producer::Producer> = producers.iter().filter(|p| p.is_active()).collect();
	// independent, read-only comparator sort: safe to parallelize, never
	// touches shared mutable state (spec §5).
	ranked.par_sort_unstable_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.owner_public_key.to_hex().cmp(&b.owner_public_key.to_hex())));

	let normal_slots = (params.normal_arbitrators_count + inactive_crc_count) as usize;
	let normal: Vec<NodePublicKey> = ranked.iter().take(normal_slots).map(|p| p.node_public_key).collect();
	let candidates: Vec<NodePublicKey> = ranked
		.iter()
		.skip(normal_slots)
		.take(params.candidates_count as usize)
		.map(|p| p.node_public_key)
		.collect();

	let mut next_arbitrators = active_crc;
	next_arbitrators.extend(normal);

	Ok((next_arbitrators, candidates))
}

/// Minimum signatures for a majority: `floor(arbiters_count * 2 / 3)`.
pub fn majority_threshold(arbiters_count: u32) -> u32 {
	arbiters_count * 2 / 3
}

/// `has_majority`: strictly more than the threshold.
pub fn has_majority(n: u32, arbiters_count: u32) -> bool {
	n > majority_threshold(arbiters_count)
}

/// `has_minority`: at least `arbiters_count - threshold`.
pub fn has_minority(n: u32, arbiters_count: u32) -> bool {
	n >= arbiters_count.saturating_sub(majority_threshold(arbiters_count))
}
