//! Committee State (C5): members, history-members, voting/election period
//! arithmetic, impeachment, and treasury accounting.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cr_committee_common::{Fixed64, Uint168, Uint256};

use crate::config::ChainParams;
use crate::types::CandidateInfo;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberState {
	Elected,
	Impeached,
	ReturnedDeposit,
	Terminated,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CRMember {
	pub info: CandidateInfo,
	pub impeachment_votes: Fixed64,
	pub deposit_hash: Uint256,
	pub deposit_amount: Fixed64,
	pub penalty: Fixed64,
	pub member_state: MemberState,
	/// Blocks this member has actually held office, accrued while
	/// `member_state == Elected`; feeds the end-of-term penalty formula
	/// (spec §4.3).
	pub blocks_as_member: u32,
	pub proposals_voted: u32,
}

impl CRMember {
	pub fn from_candidate(info: CandidateInfo, deposit_hash: Uint256, deposit_amount: Fixed64, penalty: Fixed64) -> Self {
		CRMember {
			info,
			impeachment_votes: Fixed64::ZERO,
			deposit_hash,
			deposit_amount,
			penalty,
			member_state: MemberState::Elected,
			blocks_as_member: 0,
			proposals_voted: 0,
		}
	}
}

/// The committee's snapshot-target key-frame (spec §3).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommitteeKeyFrame {
	pub members: HashMap<Uint168, CRMember>,
	pub history_members: HashMap<Uint168, CRMember>,
	pub last_committee_height: u32,
	pub last_voting_start_height: u32,
	pub in_election_period: bool,
	pub need_appropriation: bool,
	pub circulation_amount: Fixed64,
	pub crc_foundation_balance: Fixed64,
	pub crc_committee_balance: Fixed64,
	pub destroyed_amount: Fixed64,
	pub crc_committee_used_amount: Fixed64,
	/// Lazily set once the UTXO oracle has seeded the treasury balances
	/// for the first time (spec §4.5 step 2).
	pub treasury_initialized: bool,
}

impl CommitteeKeyFrame {
	/// `is_in_voting_period` per spec §4.5.
	pub fn is_in_voting_period(&self, params: &ChainParams, height: u32) -> bool {
		if self.last_committee_height < params.cr_committee_start_height {
			params.cr_voting_start_height <= height && height < params.cr_committee_start_height
		} else if !self.in_election_period {
			height < self.last_voting_start_height + params.cr_voting_period
		} else {
			let window_start = (self.last_committee_height + params.cr_duty_period).saturating_sub(params.cr_voting_period);
			let window_end = self.last_committee_height + params.cr_duty_period;
			window_start <= height && height < window_end
		}
	}

	/// `should_change` per spec §4.5, including the emergency-voting fallback:
	/// once a committee has been installed, a term also ends early if the
	/// number of still-`Elected` members drops below `CRAgreementCount`,
	/// rather than waiting for the scheduled height.
	pub fn should_change(&self, params: &ChainParams, height: u32, elected_member_count: u32) -> bool {
		if self.last_committee_height < params.cr_committee_start_height {
			height == params.cr_committee_start_height
		} else {
			height == self.last_voting_start_height + params.cr_voting_period || elected_member_count < params.cr_agreement_count
		}
	}

	/// Range-check version of the "cleanHistory" timing open question
	/// (spec §9): tolerant of a one-block reorg instead of strict
	/// equality.
	pub fn should_clear_history(&self, params: &ChainParams) -> bool {
		self.last_voting_start_height >= self.last_committee_height + params.cr_duty_period - params.cr_voting_period
	}

	pub fn impeachment_threshold(&self, params: &ChainParams) -> Fixed64 {
		self.circulation_amount.mul_ratio(params.voter_reject_percentage, 100)
	}
}
