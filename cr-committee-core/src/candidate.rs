//! CR committee election candidates (spec §3 "Candidate").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cr_committee_common::{EngineError, Fixed64, Result, Uint168, Uint256};

use crate::types::CandidateInfo;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateState {
	Pending,
	Active,
	Canceled,
	Returned,
	Impeached,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
	pub info: CandidateInfo,
	pub state: CandidateState,
	pub votes: Fixed64,
	pub deposit_amount: Fixed64,
	pub deposit_hash: Uint256,
	pub cancel_height: u32,
	pub penalty: Fixed64,
}

impl Candidate {
	/// Registration admits the candidate directly into `Active`: unlike a
	/// producer, a CR candidate's deposit is already referenced by
	/// `deposit_hash` at registration time and there is no separate
	/// activation transaction in the wire protocol (spec §3/§4.5 name no
	/// `ActivateCr` payload), so `Pending` is a transient placeholder never
	/// actually produced by this engine.
	pub fn new(info: CandidateInfo, deposit_hash: Uint256, deposit_amount: Fixed64) -> Self {
		Candidate {
			info,
			state: CandidateState::Active,
			votes: Fixed64::ZERO,
			deposit_amount,
			deposit_hash,
			cancel_height: 0,
			penalty: Fixed64::ZERO,
		}
	}

	pub fn is_active(&self) -> bool {
		self.state == CandidateState::Active
	}
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CandidateRegistry {
	candidates: HashMap<Uint168, Candidate>,
}

impl CandidateRegistry {
	pub fn get(&self, did: &Uint168) -> Option<&Candidate> {
		self.candidates.get(did)
	}

	pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
		self.candidates.values()
	}

	pub fn active_count(&self) -> u32 {
		self.candidates.values().filter(|c| c.is_active()).count() as u32
	}

	pub fn upsert(&mut self, candidate: Candidate) -> Option<Candidate> {
		self.candidates.insert(candidate.info.did, candidate)
	}

	pub fn restore(&mut self, did: Uint168, before: Option<Candidate>) {
		match before {
			Some(c) => {
				self.candidates.insert(did, c);
			}
			None => {
				self.candidates.remove(&did);
			}
		}
	}

	pub fn register(&mut self, c: Candidate) -> Result<Option<Candidate>> {
		if self.candidates.contains_key(&c.info.did) {
			return Err(EngineError::MalformedTransaction(format!("CR candidate {} already registered", c.info.did)));
		}
		Ok(self.upsert(c))
	}

	pub fn add_votes(&mut self, did: &Uint168, delta: Fixed64) -> Result<Fixed64> {
		let c = self
			.candidates
			.get_mut(did)
			.ok_or_else(|| EngineError::MalformedTransaction("vote for unknown CR candidate".into()))?;
		let before = c.votes;
		c.votes += delta;
		Ok(before)
	}

	/// Top `n` active candidates by `(votes desc, DID asc)`, matching the
	/// producer tie-break order used throughout arbiter rotation (spec
	/// §4.4), applied here to committee member selection (spec §4.5).
	pub fn top_active(&self, n: usize) -> Vec<&Candidate> {
		let mut actives: Vec<&Candidate> = self.candidates.values().filter(|c| c.is_active()).collect();
		actives.sort_unstable_by(|a, b| b.votes.cmp(&a.votes).then_with(|| a.info.did.cmp(&b.info.did)));
		actives.truncate(n);
		actives
	}
}
