//! Block/transaction shapes the engine consumes. Payload wire decoding is
//! out of scope: by the time a `Tx` reaches this crate its special-
//! transaction payload has already been decoded into the tagged
//! `TxPayload` union below.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cr_committee_common::{Fixed64, NodePublicKey, Uint168, Uint256};

/// One of the handful of well-known treasury program hashes the treasury
/// accounting watches transfers into and out of.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TreasuryAddress {
	CrcFoundation,
	CrcCommittee,
	DestroyEla,
}

#[derive(Clone, Debug)]
pub struct Output {
	pub program_hash: Uint168,
	pub amount: Fixed64,
	/// Set when this output is recognized as paying into one of the
	/// well-known treasury addresses; `None` for ordinary outputs.
	pub treasury: Option<TreasuryAddress>,
}

#[derive(Clone, Debug)]
pub struct Input {
	pub previous_tx: Uint256,
	pub previous_index: u16,
}

/// Candidate/CR member public info, shared shape between `Candidate` and
/// `CRMember`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInfo {
	pub code: Vec<u8>,
	pub did: Uint168,
	pub public_key: NodePublicKey,
	pub nickname: String,
	pub url: String,
	pub location: u64,
}

impl CandidateInfo {
	pub fn new(code: Vec<u8>, public_key: NodePublicKey, nickname: String, url: String, location: u64) -> Self {
		let did = cr_committee_common::hash::did_from_code(&code);
		CandidateInfo { code, did, public_key, nickname, url, location }
	}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteChoice {
	Approve,
	Reject,
	Abstain,
}

/// An exhaustively-matched tagged union over special transaction payloads,
/// dispatched without runtime type assertions. `Unknown` exists only to
/// carry a wire tag this crate does not recognize; it is rejected at
/// ingestion, never matched as a catch-all default.
#[derive(Clone, Debug)]
pub enum TxPayload {
	Transfer,
	RegisterProducer {
		owner_public_key: NodePublicKey,
		node_public_key: NodePublicKey,
		nickname: String,
		url: String,
		location: u64,
		net_address: String,
	},
	UpdateProducer {
		owner_public_key: NodePublicKey,
		node_public_key: NodePublicKey,
		nickname: String,
		url: String,
		location: u64,
		net_address: String,
	},
	CancelProducer {
		owner_public_key: NodePublicKey,
	},
	ActivateProducer {
		node_public_key: NodePublicKey,
	},
	ReturnDepositCoin {
		owner_public_key: NodePublicKey,
	},
	IllegalProducerEvidence {
		node_public_key: NodePublicKey,
		penalty: Fixed64,
	},
	Vote {
		producer_votes: Vec<(NodePublicKey, Fixed64)>,
		candidate_votes: Vec<(Uint168, Fixed64)>,
	},
	RegisterCr {
		info: CandidateInfo,
		deposit_hash: Uint256,
		deposit_amount: Fixed64,
	},
	UpdateCr {
		did: Uint168,
		info: CandidateInfo,
	},
	UnregisterCr {
		did: Uint168,
	},
	ReturnCrDepositCoin {
		did: Uint168,
	},
	CrImpeachment {
		did: Uint168,
		votes: Fixed64,
	},
	ProposalRegister {
		hash: Uint256,
		proposal_type: u8,
		sponsor_public_key: NodePublicKey,
		cr_sponsor_did: Uint168,
		draft_hash: Uint256,
		budgets: Vec<Fixed64>,
		target_address: Uint168,
	},
	ProposalCrVote {
		hash: Uint256,
		cr_did: Uint168,
		vote: VoteChoice,
	},
	ProposalWithdraw {
		hash: Uint256,
		stage: u8,
	},
	ProposalVoterReject {
		hash: Uint256,
		votes: Fixed64,
	},
	InactiveArbitrators {
		node_public_keys: Vec<NodePublicKey>,
	},
	DposIllegalBlocks {
		node_public_keys: Vec<NodePublicKey>,
	},
	/// An on-wire tag this build does not recognize. Always rejected with
	/// `EngineError::UnsupportedPayload`; never matched by a wildcard arm.
	Unknown(u8),
}

#[derive(Clone, Debug)]
pub struct Tx {
	pub hash: Uint256,
	pub inputs: Vec<Input>,
	pub outputs: Vec<Output>,
	pub payload: TxPayload,
}

#[derive(Clone, Debug)]
pub struct Block {
	pub height: u32,
	pub prev_hash: Uint256,
	pub timestamp: u64,
	pub txs: Vec<Tx>,
}

/// Confirmation votes accompanying a block (BFT confirm message in the
/// original; only the vote count matters to this crate).
#[derive(Clone, Debug, Default)]
pub struct Confirm {
	pub votes: HashMap<NodePublicKey, bool>,
}

impl Confirm {
	pub fn approvals(&self) -> usize {
		self.votes.values().filter(|v| **v).count()
	}
}
