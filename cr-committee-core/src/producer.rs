//! DPoS producer registration, activation, inactivity and penalty
//! bookkeeping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cr_committee_common::{EngineError, Fixed64, NodePublicKey, Result};

/// Sentinel for "activation was never requested", used by seeded CRC
/// producer entries that never go through `ActivateProducer`.
pub const NO_ACTIVATE_REQUEST: u32 = u32::MAX;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProducerState {
	Pending,
	Active,
	Inactive,
	Canceled,
	Illegal,
	Returned,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Producer {
	pub owner_public_key: NodePublicKey,
	pub node_public_key: NodePublicKey,
	pub nickname: String,
	pub url: String,
	pub location: u64,
	pub net_address: String,
	pub state: ProducerState,
	pub votes: Fixed64,
	pub register_height: u32,
	pub cancel_height: u32,
	pub inactive_since: u32,
	pub penalty: Fixed64,
	pub activate_request_height: u32,
}

impl Producer {
	pub fn new(
		owner_public_key: NodePublicKey,
		node_public_key: NodePublicKey,
		nickname: String,
		url: String,
		location: u64,
		net_address: String,
		register_height: u32,
	) -> Self {
		Producer {
			owner_public_key,
			node_public_key,
			nickname,
			url,
			location,
			net_address,
			state: ProducerState::Pending,
			votes: Fixed64::ZERO,
			register_height,
			cancel_height: 0,
			inactive_since: 0,
			penalty: Fixed64::ZERO,
			activate_request_height: NO_ACTIVATE_REQUEST,
		}
	}

	pub fn is_active(&self) -> bool {
		self.state == ProducerState::Active
	}
}

/// Producer table keyed by owner public key. The owner key stays unique
/// even across returned producers, so the map is never pruned on
/// cancellation — only the `state` changes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProducerRegistry {
	producers: HashMap<NodePublicKey, Producer>,
	/// node_public_key -> owner_public_key, used for activation and vote
	/// lookups that arrive keyed by node key rather than owner key.
	node_index: HashMap<NodePublicKey, NodePublicKey>,
}

impl ProducerRegistry {
	pub fn get(&self, owner_public_key: &NodePublicKey) -> Option<&Producer> {
		self.producers.get(owner_public_key)
	}

	pub fn get_by_node_key(&self, node_public_key: &NodePublicKey) -> Option<&Producer> {
		self.node_index.get(node_public_key).and_then(|owner| self.producers.get(owner))
	}

	pub fn iter(&self) -> impl Iterator<Item = &Producer> {
		self.producers.values()
	}

	pub fn active_count(&self) -> u32 {
		self.producers.values().filter(|p| p.is_active()).count() as u32
	}

	pub fn contains(&self, owner_public_key: &NodePublicKey) -> bool {
		self.producers.contains_key(owner_public_key)
	}

	/// Insert or replace a producer entry, returning the previous value (if
	/// any) so callers can build an invertible `Change`.
	pub fn upsert(&mut self, producer: Producer) -> Option<Producer> {
		self.node_index.insert(producer.node_public_key, producer.owner_public_key);
		self.producers.insert(producer.owner_public_key, producer)
	}

	/// Restore `before` exactly (used by `Change::undo`); if `before` is
	/// `None` the owner key is removed entirely (undoing a fresh
	/// registration).
	pub fn restore(&mut self, owner_public_key: NodePublicKey, before: Option<Producer>) {
		match before {
			Some(p) => {
				self.node_index.insert(p.node_public_key, p.owner_public_key);
				self.producers.insert(owner_public_key, p);
			}
			None => {
				if let Some(p) = self.producers.remove(&owner_public_key) {
					self.node_index.remove(&p.node_public_key);
				}
			}
		}
	}

	pub fn register(&mut self, p: Producer) -> Result<Option<Producer>> {
		if self.producers.contains_key(&p.owner_public_key) {
			return Err(EngineError::MalformedTransaction(format!(
				"owner public key {} already registered",
				p.owner_public_key
			)));
		}
		Ok(self.upsert(p))
	}

	pub fn add_votes(&mut self, owner_public_key: &NodePublicKey, delta: Fixed64) -> Result<Fixed64> {
		let p = self
			.producers
			.get_mut(owner_public_key)
			.ok_or_else(|| EngineError::MalformedTransaction("vote for unknown producer".into()))?;
		let before = p.votes;
		p.votes += delta;
		Ok(before)
	}
}

/// Penalty accrued at the end of a committee member's term:
/// `penalty' = penalty + MinDeposit*(1-e) + MinDeposit*(1-v)`, each term
/// clamped into `[0, MinDeposit]`. `proposal_total == 0` forces `v := 1`
/// rather than dividing by zero.
pub fn member_penalty(
	current_penalty: Fixed64,
	min_deposit: Fixed64,
	duty_period: u32,
	blocks_as_member: u32,
	proposals_voted: u32,
	proposal_total: u32,
) -> Fixed64 {
	let election_coverage = if duty_period == 0 {
		1.0
	} else {
		(blocks_as_member as f64 / duty_period as f64).min(1.0).max(0.0)
	};
	let vote_rate = if proposal_total == 0 {
		1.0
	} else {
		(proposals_voted as f64 / proposal_total as f64).min(1.0).max(0.0)
	};

	let election_term = min_deposit.mul_ratio(
		((1.0 - election_coverage) * 1_000_000.0).round() as u64,
		1_000_000,
	);
	let vote_term = min_deposit.mul_ratio(((1.0 - vote_rate) * 1_000_000.0).round() as u64, 1_000_000);

	let election_term = election_term.clamp(min_deposit);
	let vote_term = vote_term.clamp(min_deposit);

	current_penalty + election_term + vote_term
}
