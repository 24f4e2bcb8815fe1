//! History Log (C1): append-only, height-bucketed record of invertible
//! changes enabling deterministic rollback (spec §4.1).
//!
//! `Change` is a tagged enum rather than a closure pair (spec §9, "Undoable
//! mutations": "the latter is more auditable and serializable"); each
//! variant carries the `before`/`after` value of exactly one entity so
//! `undo` is a pure restore.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use cr_committee_common::{EngineError, Fixed64, NodePublicKey, Result, Uint168, Uint256};

use crate::arbiter::ArbiterKeyFrame;
use crate::candidate::Candidate;
use crate::committee::CRMember;
use crate::engine_state::EngineState;
use crate::producer::Producer;
use crate::proposal::Proposal;

/// A scalar field of the committee key-frame, addressed by tag so a single
/// `Change` variant can cover all of them.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CommitteeField {
	LastCommitteeHeight,
	LastVotingStartHeight,
	InElectionPeriod,
	NeedAppropriation,
	CirculationAmount,
	CrcFoundationBalance,
	CrcCommitteeBalance,
	DestroyedAmount,
	CrcCommitteeUsedAmount,
	TreasuryInitialized,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CommitteeScalar {
	U32(u32),
	Bool(bool),
	Amount(Fixed64),
}

impl CommitteeField {
	fn write(self, state: &mut EngineState, value: CommitteeScalar) {
		let committee = &mut state.committee;
		match (self, value) {
			(CommitteeField::LastCommitteeHeight, CommitteeScalar::U32(v)) => committee.last_committee_height = v,
			(CommitteeField::LastVotingStartHeight, CommitteeScalar::U32(v)) => committee.last_voting_start_height = v,
			(CommitteeField::InElectionPeriod, CommitteeScalar::Bool(v)) => committee.in_election_period = v,
			(CommitteeField::NeedAppropriation, CommitteeScalar::Bool(v)) => committee.need_appropriation = v,
			(CommitteeField::CirculationAmount, CommitteeScalar::Amount(v)) => committee.circulation_amount = v,
			(CommitteeField::CrcFoundationBalance, CommitteeScalar::Amount(v)) => committee.crc_foundation_balance = v,
			(CommitteeField::CrcCommitteeBalance, CommitteeScalar::Amount(v)) => committee.crc_committee_balance = v,
			(CommitteeField::DestroyedAmount, CommitteeScalar::Amount(v)) => committee.destroyed_amount = v,
			(CommitteeField::CrcCommitteeUsedAmount, CommitteeScalar::Amount(v)) => committee.crc_committee_used_amount = v,
			(CommitteeField::TreasuryInitialized, CommitteeScalar::Bool(v)) => committee.treasury_initialized = v,
			(field, value) => unreachable!("committee field {:?} written with mismatched scalar {:?}", field, value),
		}
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Change {
	ProducerSet { owner: NodePublicKey, before: Option<Producer>, after: Option<Producer> },
	CandidateSet { did: Uint168, before: Option<Candidate>, after: Option<Candidate> },
	MemberSet { did: Uint168, before: Option<CRMember>, after: Option<CRMember> },
	HistoryMemberSet { did: Uint168, before: Option<CRMember>, after: Option<CRMember> },
	ProposalSet { hash: Uint256, before: Option<Proposal>, after: Option<Proposal> },
	CommitteeScalarSet { field: CommitteeField, before: CommitteeScalar, after: CommitteeScalar },
	ArbiterFrameSet { before: Box<ArbiterKeyFrame>, after: Box<ArbiterKeyFrame> },
	HistoryMembersReplace { before: HashMap<Uint168, CRMember>, after: HashMap<Uint168, CRMember> },
}

impl Change {
	pub fn apply(&self, state: &mut EngineState) {
		match self {
			Change::ProducerSet { owner, after, .. } => state.producers.restore(*owner, after.clone()),
			Change::CandidateSet { did, after, .. } => state.candidates.restore(*did, after.clone()),
			Change::MemberSet { did, after, .. } => match after {
				Some(m) => {
					state.committee.members.insert(*did, m.clone());
				}
				None => {
					state.committee.members.remove(did);
				}
			},
			Change::HistoryMemberSet { did, after, .. } => match after {
				Some(m) => {
					state.committee.history_members.insert(*did, m.clone());
				}
				None => {
					state.committee.history_members.remove(did);
				}
			},
			Change::ProposalSet { hash, after, .. } => state.proposals.restore(*hash, after.clone()),
			Change::CommitteeScalarSet { field, after, .. } => field.write(state, *after),
			Change::ArbiterFrameSet { after, .. } => state.arbiters = (**after).clone(),
			Change::HistoryMembersReplace { after, .. } => state.committee.history_members = after.clone(),
		}
	}

	pub fn undo(&self, state: &mut EngineState) {
		match self {
			Change::ProducerSet { owner, before, .. } => state.producers.restore(*owner, before.clone()),
			Change::CandidateSet { did, before, .. } => state.candidates.restore(*did, before.clone()),
			Change::MemberSet { did, before, .. } => match before {
				Some(m) => {
					state.committee.members.insert(*did, m.clone());
				}
				None => {
					state.committee.members.remove(did);
				}
			},
			Change::HistoryMemberSet { did, before, .. } => match before {
				Some(m) => {
					state.committee.history_members.insert(*did, m.clone());
				}
				None => {
					state.committee.history_members.remove(did);
				}
			},
			Change::ProposalSet { hash, before, .. } => state.proposals.restore(*hash, before.clone()),
			Change::CommitteeScalarSet { field, before, .. } => field.write(state, *before),
			Change::ArbiterFrameSet { before, .. } => state.arbiters = (**before).clone(),
			Change::HistoryMembersReplace { before, .. } => state.committee.history_members = before.clone(),
		}
	}
}

/// Append-only, height-bucketed, invertible change log (spec §4.1).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HistoryLog {
	buckets: BTreeMap<u32, Vec<Change>>,
	sealed_height: u32,
}

impl HistoryLog {
	/// A fresh log with no recorded effects, sealed up to `height` — used
	/// right after restoring a checkpoint, since nothing before the
	/// checkpoint's height can be undone anymore.
	pub fn with_sealed_height(height: u32) -> Self {
		HistoryLog { buckets: BTreeMap::new(), sealed_height: height }
	}

	pub fn sealed_height(&self) -> u32 {
		self.sealed_height
	}

	/// Record `change` at `height`. Does not itself mutate state — callers
	/// apply the change via `Ledger::record` so the do/record pairing in
	/// spec §4.1 stays atomic from the caller's point of view.
	pub fn push(&mut self, height: u32, change: Change) {
		self.buckets.entry(height).or_insert_with(Vec::new).push(change);
	}

	/// Seal every effect at or below `height`: their undoes are discarded
	/// and `rollback_to` below `height` is no longer possible.
	pub fn commit(&mut self, height: u32) {
		self.buckets.retain(|h, _| *h > height);
		if height > self.sealed_height {
			self.sealed_height = height;
		}
	}

	/// Roll `state` back to `target_height` by undoing every recorded
	/// change at heights `> target_height`, in reverse insertion order
	/// within each height bucket and from the highest height down.
	pub fn rollback_to(&mut self, state: &mut EngineState, target_height: u32) -> Result<()> {
		if target_height < self.sealed_height {
			return Err(EngineError::BeyondCommitWindow { target: target_height, sealed: self.sealed_height });
		}
		let rollback_heights: Vec<u32> = self.buckets.range((target_height + 1)..).map(|(h, _)| *h).collect();
		for height in rollback_heights.into_iter().rev() {
			if let Some(changes) = self.buckets.remove(&height) {
				for change in changes.iter().rev() {
					change.undo(state);
				}
			}
		}
		Ok(())
	}
}
