//! The cyclic Committee/ProposalManager/arbiter state collapsed into one
//! owning struct (spec §9, "Cyclic references"): rather than modeling
//! Committee, ProposalManager and the producer/arbiter tables as separate
//! objects holding references to each other, a single `EngineState` owns
//! all of them for the node's lifetime and every cross-reference is a
//! lookup by key instead of a pointer.

use serde::{Deserialize, Serialize};

use crate::arbiter::ArbiterKeyFrame;
use crate::candidate::CandidateRegistry;
use crate::committee::CommitteeKeyFrame;
use crate::producer::ProducerRegistry;
use crate::proposal::ProposalManager;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineState {
	pub producers: ProducerRegistry,
	pub candidates: CandidateRegistry,
	pub committee: CommitteeKeyFrame,
	pub proposals: ProposalManager,
	pub arbiters: ArbiterKeyFrame,
}
