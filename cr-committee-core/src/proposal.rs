//! Proposal lifecycle, per-stage budget draws, and CR-member vote tallies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cr_committee_common::{EngineError, Fixed64, NodePublicKey, Result, Uint168, Uint256};

use crate::types::VoteChoice;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
	Registered,
	CrAgreed,
	VoterAgreed,
	Finished,
	CrCanceled,
	VoterCanceled,
	Aborted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
	pub hash: Uint256,
	pub proposal_type: u8,
	pub sponsor_public_key: NodePublicKey,
	pub cr_sponsor_did: Uint168,
	pub draft_hash: Uint256,
	pub budgets: Vec<Fixed64>,
	pub target_address: Uint168,
	pub status: ProposalStatus,
	pub cr_votes: HashMap<Uint168, VoteChoice>,
	pub current_withdrawal_stage: usize,
	pub register_height: u32,
	/// Height at which CR approval quorum was reached; `None` before
	/// `CrAgreed`. Anchors the public-vote window.
	pub cr_agreed_height: Option<u32>,
	/// Height at which the public vote concluded without rejection; `None`
	/// before `VoterAgreed`. Anchors the withdrawal timeout.
	pub voter_agreed_height: Option<u32>,
}

impl Proposal {
	/// Canonical hash over `(type || sponsor || draft || budgets ||
	/// target_address)`, double-SHA256'd to match `common.Sha256D`.
	pub fn compute_hash(
		proposal_type: u8,
		sponsor_public_key: &NodePublicKey,
		draft_hash: &Uint256,
		budgets: &[Fixed64],
		target_address: &Uint168,
	) -> Uint256 {
		let mut buf = Vec::with_capacity(1 + 33 + 32 + budgets.len() * 8 + 21);
		buf.push(proposal_type);
		buf.extend_from_slice(&sponsor_public_key.0);
		buf.extend_from_slice(&draft_hash.0);
		for b in budgets {
			buf.extend_from_slice(&b.units().to_le_bytes());
		}
		buf.extend_from_slice(&target_address.0);
		cr_committee_common::hash::sha256d(&buf)
	}

	/// Sum of `budgets[current_withdrawal_stage..]`: the amount still
	/// reserved against the committee treasury.
	pub fn remaining_budget(&self) -> Fixed64 {
		self.budgets.iter().skip(self.current_withdrawal_stage).copied().sum()
	}

	pub fn is_terminal(&self) -> bool {
		matches!(
			self.status,
			ProposalStatus::Finished | ProposalStatus::CrCanceled | ProposalStatus::VoterCanceled | ProposalStatus::Aborted
		)
	}

	fn cr_vote_counts(&self) -> (u32, u32, u32) {
		let mut approve = 0;
		let mut reject = 0;
		let mut abstain = 0;
		for choice in self.cr_votes.values() {
			match choice {
				VoteChoice::Approve => approve += 1,
				VoteChoice::Reject => reject += 1,
				VoteChoice::Abstain => abstain += 1,
			}
		}
		(approve, reject, abstain)
	}

	/// Pure (clone-and-return) variants of the mutators below, used by the
	/// block ingestor to build `before`/`after` pairs for the history log
	/// instead of mutating `ProposalManager` directly.
	pub fn with_cr_vote(&self, cr_did: Uint168, vote: VoteChoice, cr_member_count: u32, height: u32) -> Result<Proposal> {
		if self.status != ProposalStatus::Registered {
			return Err(EngineError::MalformedTransaction("proposal is not open for CR voting".into()));
		}
		let mut next = self.clone();
		next.cr_votes.insert(cr_did, vote);
		let (approve, reject, _) = next.cr_vote_counts();
		let agree_needed = ((cr_member_count as f64 * 2.0 / 3.0).ceil()) as u32;
		if approve >= agree_needed {
			next.status = ProposalStatus::CrAgreed;
			next.cr_agreed_height = Some(height);
		} else if reject * 2 > cr_member_count {
			next.status = ProposalStatus::CrCanceled;
		}
		Ok(next)
	}

	pub fn with_voter_reject(&self, reject_votes: Fixed64, threshold: Fixed64) -> Result<Proposal> {
		if self.status != ProposalStatus::CrAgreed {
			return Err(EngineError::MalformedTransaction("proposal is not open for public vote".into()));
		}
		let mut next = self.clone();
		if reject_votes >= threshold {
			next.status = ProposalStatus::VoterCanceled;
		}
		Ok(next)
	}

	pub fn with_public_vote_concluded(&self, height: u32) -> Proposal {
		let mut next = self.clone();
		if next.status == ProposalStatus::CrAgreed {
			next.status = ProposalStatus::VoterAgreed;
			next.voter_agreed_height = Some(height);
		}
		next
	}

	pub fn with_stage_withdrawn(&self, stage: usize) -> Result<(Proposal, Fixed64)> {
		if self.status != ProposalStatus::VoterAgreed {
			return Err(EngineError::MalformedTransaction("proposal is not in withdrawal state".into()));
		}
		if stage != self.current_withdrawal_stage || stage >= self.budgets.len() {
			return Err(EngineError::MalformedTransaction("withdrawal stage out of order".into()));
		}
		let mut next = self.clone();
		let amount = next.budgets[stage];
		next.current_withdrawal_stage += 1;
		if next.current_withdrawal_stage == next.budgets.len() {
			next.status = ProposalStatus::Finished;
		}
		Ok((next, amount))
	}

	pub fn with_aborted(&self) -> Proposal {
		let mut next = self.clone();
		next.status = ProposalStatus::Aborted;
		next
	}
}

/// The live set of non-purged proposals, keyed by hash. Purged entirely on
/// every committee change.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProposalManager {
	proposals: HashMap<Uint256, Proposal>,
}

impl ProposalManager {
	pub fn get(&self, hash: &Uint256) -> Option<&Proposal> {
		self.proposals.get(hash)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
		self.proposals.values()
	}

	pub fn non_terminal_used_amount(&self) -> Fixed64 {
		self.proposals.values().filter(|p| !p.is_terminal()).map(|p| p.remaining_budget()).sum()
	}

	pub fn upsert(&mut self, proposal: Proposal) -> Option<Proposal> {
		self.proposals.insert(proposal.hash, proposal)
	}

	pub fn restore(&mut self, hash: Uint256, before: Option<Proposal>) {
		match before {
			Some(p) => {
				self.proposals.insert(hash, p);
			}
			None => {
				self.proposals.remove(&hash);
			}
		}
	}

	pub fn register(&mut self, proposal: Proposal) -> Result<()> {
		if self.proposals.contains_key(&proposal.hash) {
			return Err(EngineError::MalformedTransaction("duplicate proposal hash".into()));
		}
		self.proposals.insert(proposal.hash, proposal);
		Ok(())
	}

	/// Purge every proposal, as happens at each committee change.
	pub fn clear(&mut self) -> HashMap<Uint256, Proposal> {
		std::mem::take(&mut self.proposals)
	}

}

#[cfg(test)]
mod test {
	use super::*;

	fn did(byte: u8) -> Uint168 {
		Uint168([byte; 21])
	}

	fn hash(byte: u8) -> Uint256 {
		Uint256([byte; 32])
	}

	fn sample_proposal(budgets: Vec<i64>) -> Proposal {
		Proposal {
			hash: hash(1),
			proposal_type: 0,
			sponsor_public_key: NodePublicKey([9u8; 33]),
			cr_sponsor_did: did(1),
			draft_hash: hash(2),
			budgets: budgets.into_iter().map(Fixed64::from_units).collect(),
			target_address: did(3),
			status: ProposalStatus::Registered,
			cr_votes: HashMap::new(),
			current_withdrawal_stage: 0,
			register_height: 10,
			cr_agreed_height: None,
			voter_agreed_height: None,
		}
	}

	/// Drives the same pure `with_*` transitions the block ingestor chains
	/// through the history log, end to end, checking the budget-accounting
	/// invariant at each step.
	#[test]
	fn full_lifecycle_budget_accounting() {
		let mut mgr = ProposalManager::default();
		let proposal = sample_proposal(vec![100, 200, 300]);
		let h = proposal.hash;
		mgr.register(proposal).unwrap();

		let p = mgr.get(&h).unwrap().with_cr_vote(did(10), VoteChoice::Approve, 3, 20).unwrap();
		let p = p.with_cr_vote(did(11), VoteChoice::Approve, 3, 20).unwrap();
		assert_eq!(p.status, ProposalStatus::CrAgreed);
		mgr.upsert(p);

		let p = mgr.get(&h).unwrap().with_public_vote_concluded(80);
		assert_eq!(p.status, ProposalStatus::VoterAgreed);
		mgr.upsert(p);
		assert_eq!(mgr.non_terminal_used_amount(), Fixed64::from_units(600));

		let (p, drawn) = mgr.get(&h).unwrap().with_stage_withdrawn(0).unwrap();
		assert_eq!(drawn, Fixed64::from_units(100));
		mgr.upsert(p);
		assert_eq!(mgr.non_terminal_used_amount(), Fixed64::from_units(500));

		let p = mgr.get(&h).unwrap().with_aborted();
		mgr.upsert(p);
		assert_eq!(mgr.non_terminal_used_amount(), Fixed64::ZERO);
	}

	#[test]
	fn cr_majority_reject_cancels() {
		let proposal = sample_proposal(vec![100]);
		let p = proposal.with_cr_vote(did(10), VoteChoice::Reject, 3, 20).unwrap();
		let p = p.with_cr_vote(did(11), VoteChoice::Reject, 3, 20).unwrap();
		assert_eq!(p.status, ProposalStatus::CrCanceled);
	}

	#[test]
	fn hash_is_deterministic() {
		let a = Proposal::compute_hash(0, &NodePublicKey([1u8; 33]), &hash(2), &[Fixed64::from_units(1)], &did(3));
		let b = Proposal::compute_hash(0, &NodePublicKey([1u8; 33]), &hash(2), &[Fixed64::from_units(1)], &did(3));
		assert_eq!(a, b);
	}
}
