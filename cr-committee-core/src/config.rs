//! Configuration parameters enumerated in the specification's external
//! interfaces section: everything that branches committee, arbiter, or
//! proposal behavior lives here rather than as a scattered constant.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cr_committee_common::{Fixed64, NodePublicKey};

/// One reserved CRC arbiter seat: a fixed node key with its advertised
/// network address, configured out-of-band rather than elected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrcArbiterConfig {
	pub public_key: NodePublicKey,
	pub net_address: String,
}

/// Every externally supplied parameter from the specification's
/// configuration section, deserializable from whatever format the host
/// node already uses (toml/json/etc — this crate stays format-agnostic and
/// only requires `serde::Deserialize`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainParams {
	pub cr_voting_start_height: u32,
	pub cr_committee_start_height: u32,
	pub cr_duty_period: u32,
	pub cr_voting_period: u32,
	pub cr_member_count: u32,
	pub cr_agreement_count: u32,
	pub voter_reject_percentage: u64,
	pub min_deposit_amount: Fixed64,
	pub reward_per_block: Fixed64,
	pub origin_issuance_amount: Fixed64,
	pub normal_arbitrators_count: u32,
	pub candidates_count: u32,
	pub crc_arbiters: Vec<CrcArbiterConfig>,
	pub height_versions: Vec<u32>,
	/// Blocks after CR approval before the public vote concludes into
	/// `VoterAgreed` absent a qualifying reject tally (spec §4.6, "end of
	/// public period"). Kept independent of `cr_voting_period`/
	/// `cr_duty_period` (which size the *committee's own* election windows)
	/// since a proposal's public-vote clock runs on its own schedule.
	pub public_vote_duration: u32,
	/// Blocks after the public vote concludes before an unfinished
	/// `VoterAgreed` proposal times out into `Aborted`, releasing its
	/// remaining budget (spec §3 transition table, "Aborted (timeout)").
	pub withdrawal_timeout: u32,
	/// Checkpoint cadence (blocks between snapshots). Defaults to 2000, a
	/// round number on the order of one DPoS era, chosen because the
	/// source's checkpoint interval is itself a deployment-tunable
	/// constant rather than a protocol rule.
	pub checkpoint_interval: u32,
	/// How many checkpoints to retain in memory before the oldest is
	/// pruned (disk copies are kept regardless, per `CheckpointStore`).
	pub checkpoint_retention: usize,
	pub data_dir: PathBuf,
}

impl ChainParams {
	pub fn arbiters_count(&self) -> u32 {
		self.normal_arbitrators_count + self.crc_arbiters.len() as u32
	}
}

#[cfg(test)]
pub(crate) fn test_params() -> ChainParams {
	ChainParams {
		cr_voting_start_height: 100,
		cr_committee_start_height: 200,
		cr_duty_period: 500,
		cr_voting_period: 60,
		cr_member_count: 3,
		cr_agreement_count: 2,
		voter_reject_percentage: 10,
		min_deposit_amount: Fixed64::from_units(500_000_000),
		reward_per_block: Fixed64::from_units(1),
		origin_issuance_amount: Fixed64::from_units(1_000_000_000),
		normal_arbitrators_count: 2,
		candidates_count: 2,
		crc_arbiters: Vec::new(),
		height_versions: Vec::new(),
		public_vote_duration: 30,
		withdrawal_timeout: 120,
		checkpoint_interval: 2000,
		checkpoint_retention: 10,
		data_dir: std::env::temp_dir(),
	}
}
