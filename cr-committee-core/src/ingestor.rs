//! Dispatches one confirmed block's transactions through the
//! producer/candidate, committee and proposal sub-states, transactionally
//! via the history log, then advances arbiter rotation.

use std::collections::HashSet;

use cr_committee_common::{EngineError, Fixed64, Result};

use crate::arbiter;
use crate::candidate::{Candidate, CandidateState};
use crate::chain_integration::ChainIntegration;
use crate::committee::{CRMember, MemberState};
use crate::config::ChainParams;
use crate::history::{Change, CommitteeField, CommitteeScalar};
use crate::ledger::Ledger;
use crate::producer::{member_penalty, Producer, ProducerState};
use crate::proposal::{Proposal, ProposalStatus};
use crate::types::{Block, Confirm, Tx, TxPayload, TreasuryAddress};

/// Placeholder program hashes identifying the two treasury addresses the
/// lazy balance seed reads from. Resolving the real
/// CRCFoundation/CRCCommitteeAddress hashes is the host's job; this crate
/// only needs two distinct keys to query through `ChainIntegration`.
const FOUNDATION_ADDRESS: [u8; 21] = [0u8; 21];
const COMMITTEE_ADDRESS: [u8; 21] = [1u8; 21];

/// Outcome of ingesting one block, surfaced to the caller so it can emit a
/// "new election" event.
#[derive(Debug, Default)]
pub struct IngestOutcome {
	pub arbiter_set_changed: bool,
	pub committee_changed: bool,
	pub rejected_txs: Vec<(cr_committee_common::Uint256, EngineError)>,
}

/// Process one confirmed block end to end. Any whole-block invariant
/// failure aborts by rolling the ledger back to the block's starting
/// height and is returned as an `Err`; per-transaction input rejections
/// are accumulated in `IngestOutcome::rejected_txs` and do not abort the
/// block.
pub fn process_block(
	ledger: &mut Ledger,
	integration: &dyn ChainIntegration,
	params: &ChainParams,
	block: &Block,
	confirm: &Confirm,
) -> Result<IngestOutcome> {
	let start_height = block.height.saturating_sub(1);
	match process_block_inner(ledger, integration, params, block, confirm) {
		Ok(outcome) => Ok(outcome),
		Err(e) => {
			ledger.rollback_to(start_height)?;
			Err(e)
		}
	}
}

fn process_block_inner(
	ledger: &mut Ledger,
	integration: &dyn ChainIntegration,
	params: &ChainParams,
	block: &Block,
	_confirm: &Confirm,
) -> Result<IngestOutcome> {
	let height = block.height;
	let mut outcome = IngestOutcome::default();

	if height < params.cr_voting_start_height {
		advance_arbiters(ledger, integration, params, height, false, &mut outcome)?;
		return Ok(outcome);
	}

	maybe_init_treasury(ledger, integration, params, height)?;

	let in_voting_period = ledger.state.committee.is_in_voting_period(params, height);
	// Only latch one block ahead of the next voting window's open, matching
	// the source's "update last voting start height one block ahead" timing;
	// updating it on every block would make `should_change`'s post-first-term
	// branch (`height == last_voting_start_height + cr_voting_period`) never
	// trigger.
	let last_committee_height = ledger.state.committee.last_committee_height;
	if height + params.cr_voting_period + 1 == last_committee_height + params.cr_duty_period {
		set_committee_scalar_u32(ledger, height, CommitteeField::LastVotingStartHeight, height + 1);
	}

	let mut has_inactive_or_illegal_tx = false;
	for tx in &block.txs {
		apply_treasury_effects(ledger, integration, height, tx)?;
		if let TxPayload::InactiveArbitrators { .. } | TxPayload::DposIllegalBlocks { .. } = &tx.payload {
			has_inactive_or_illegal_tx = true;
		}
		match apply_transaction(ledger, params, height, in_voting_period, tx) {
			Ok(()) => {}
			Err(e) => outcome.rejected_txs.push((tx.hash, e)),
		}
	}

	advance_proposal_clocks(ledger, params, height);
	refresh_circulation(ledger, params, height);

	let elected_member_count = ledger.state.committee.members.values().filter(|m| m.member_state == MemberState::Elected).count() as u32;
	if ledger.state.committee.should_change(params, height, elected_member_count) {
		change_committee(ledger, params, height, integration)?;
		outcome.committee_changed = true;
	}

	let force_change = arbiter::force_change(has_inactive_or_illegal_tx, height + 1, params);
	advance_arbiters(ledger, integration, params, height, force_change, &mut outcome)?;

	Ok(outcome)
}

fn set_committee_scalar_u32(ledger: &mut Ledger, height: u32, field: CommitteeField, value: u32) {
	let before = match field {
		CommitteeField::LastVotingStartHeight => ledger.state.committee.last_voting_start_height,
		CommitteeField::LastCommitteeHeight => ledger.state.committee.last_committee_height,
		_ => unreachable!("set_committee_scalar_u32 called with non-u32 field"),
	};
	if before == value {
		return;
	}
	ledger.record(
		height,
		Change::CommitteeScalarSet { field, before: CommitteeScalar::U32(before), after: CommitteeScalar::U32(value) },
	);
}

fn maybe_init_treasury(ledger: &mut Ledger, integration: &dyn ChainIntegration, params: &ChainParams, height: u32) -> Result<()> {
	if ledger.state.committee.treasury_initialized || height < params.cr_voting_start_height {
		return Ok(());
	}
	// Seed balances from whatever the host's UTXO oracle already reports
	// sitting at the well-known treasury program hashes; resolving those
	// hashes is a host concern, this crate only needs the totals they
	// carry.
	let foundation_total: Fixed64 =
		integration.get_utxo(&cr_committee_common::Uint168(FOUNDATION_ADDRESS))?.into_iter().map(|u| u.output.amount).sum();
	let committee_total: Fixed64 =
		integration.get_utxo(&cr_committee_common::Uint168(COMMITTEE_ADDRESS))?.into_iter().map(|u| u.output.amount).sum();
	ledger.record(
		height,
		Change::CommitteeScalarSet {
			field: CommitteeField::CrcFoundationBalance,
			before: CommitteeScalar::Amount(ledger.state.committee.crc_foundation_balance),
			after: CommitteeScalar::Amount(foundation_total),
		},
	);
	ledger.record(
		height,
		Change::CommitteeScalarSet {
			field: CommitteeField::CrcCommitteeBalance,
			before: CommitteeScalar::Amount(ledger.state.committee.crc_committee_balance),
			after: CommitteeScalar::Amount(committee_total),
		},
	);
	ledger.record(
		height,
		Change::CommitteeScalarSet {
			field: CommitteeField::TreasuryInitialized,
			before: CommitteeScalar::Bool(false),
			after: CommitteeScalar::Bool(true),
		},
	);
	Ok(())
}

fn apply_treasury_effects(ledger: &mut Ledger, integration: &dyn ChainIntegration, height: u32, tx: &Tx) -> Result<()> {
	for output in &tx.outputs {
		if let Some(addr) = output.treasury {
			adjust_treasury(ledger, height, addr, output.amount);
		}
	}
	let spent = integration.get_tx_reference(tx)?;
	for output in spent.values() {
		if let Some(addr) = output.treasury {
			adjust_treasury(ledger, height, addr, Fixed64::ZERO - output.amount);
		}
	}
	Ok(())
}

fn adjust_treasury(ledger: &mut Ledger, height: u32, addr: TreasuryAddress, delta: Fixed64) {
	let field = match addr {
		TreasuryAddress::CrcFoundation => CommitteeField::CrcFoundationBalance,
		TreasuryAddress::CrcCommittee => CommitteeField::CrcCommitteeBalance,
		TreasuryAddress::DestroyEla => CommitteeField::DestroyedAmount,
	};
	let before = match addr {
		TreasuryAddress::CrcFoundation => ledger.state.committee.crc_foundation_balance,
		TreasuryAddress::CrcCommittee => ledger.state.committee.crc_committee_balance,
		TreasuryAddress::DestroyEla => ledger.state.committee.destroyed_amount,
	};
	ledger.record(
		height,
		Change::CommitteeScalarSet { field, before: CommitteeScalar::Amount(before), after: CommitteeScalar::Amount(before + delta) },
	);
}

fn refresh_circulation(ledger: &mut Ledger, params: &ChainParams, height: u32) {
	let committee = &ledger.state.committee;
	let circulation = params.origin_issuance_amount + params.reward_per_block.mul_ratio(height as u64, 1)
		- committee.crc_foundation_balance
		- committee.crc_committee_balance
		- committee.destroyed_amount;
	let before = committee.circulation_amount;
	if before == circulation {
		return;
	}
	ledger.record(
		height,
		Change::CommitteeScalarSet {
			field: CommitteeField::CirculationAmount,
			before: CommitteeScalar::Amount(before),
			after: CommitteeScalar::Amount(circulation),
		},
	);
}

fn apply_transaction(ledger: &mut Ledger, params: &ChainParams, height: u32, in_voting_period: bool, tx: &Tx) -> Result<()> {
	if !in_voting_period {
		return match &tx.payload {
			TxPayload::Transfer | TxPayload::ReturnDepositCoin { .. } | TxPayload::ReturnCrDepositCoin { .. } => {
				apply_full(ledger, params, height, tx)
			}
			TxPayload::Unknown(tag) => Err(EngineError::UnsupportedPayload(*tag)),
			_ => Err(EngineError::MalformedTransaction("transaction type not accepted outside the voting period".into())),
		};
	}
	apply_full(ledger, params, height, tx)
}

fn apply_full(ledger: &mut Ledger, params: &ChainParams, height: u32, tx: &Tx) -> Result<()> {
	match &tx.payload {
		TxPayload::Transfer => Ok(()),

		TxPayload::RegisterProducer { owner_public_key, node_public_key, nickname, url, location, net_address } => {
			if ledger.state.producers.contains(owner_public_key) {
				return Err(EngineError::MalformedTransaction("owner public key already registered".into()));
			}
			let producer = Producer::new(*owner_public_key, *node_public_key, nickname.clone(), url.clone(), *location, net_address.clone(), height);
			ledger.record(height, Change::ProducerSet { owner: *owner_public_key, before: None, after: Some(producer) });
			Ok(())
		}

		TxPayload::UpdateProducer { owner_public_key, node_public_key, nickname, url, location, net_address } => {
			let before = ledger
				.state
				.producers
				.get(owner_public_key)
				.cloned()
				.ok_or_else(|| EngineError::MalformedTransaction("update of unknown producer".into()))?;
			let mut after = before.clone();
			after.node_public_key = *node_public_key;
			after.nickname = nickname.clone();
			after.url = url.clone();
			after.location = *location;
			after.net_address = net_address.clone();
			ledger.record(height, Change::ProducerSet { owner: *owner_public_key, before: Some(before), after: Some(after) });
			Ok(())
		}

		TxPayload::CancelProducer { owner_public_key } => {
			let before = ledger
				.state
				.producers
				.get(owner_public_key)
				.cloned()
				.ok_or_else(|| EngineError::MalformedTransaction("cancel of unknown producer".into()))?;
			let mut after = before.clone();
			after.state = ProducerState::Canceled;
			after.cancel_height = height;
			ledger.record(height, Change::ProducerSet { owner: *owner_public_key, before: Some(before), after: Some(after) });
			Ok(())
		}

		TxPayload::ActivateProducer { node_public_key } => {
			let before = ledger
				.state
				.producers
				.get_by_node_key(node_public_key)
				.cloned()
				.ok_or_else(|| EngineError::MalformedTransaction("activation of unknown producer".into()))?;
			let mut after = before.clone();
			after.state = ProducerState::Active;
			after.activate_request_height = height;
			ledger.record(height, Change::ProducerSet { owner: before.owner_public_key, before: Some(before), after: Some(after) });
			Ok(())
		}

		TxPayload::ReturnDepositCoin { owner_public_key } => {
			let before = ledger
				.state
				.producers
				.get(owner_public_key)
				.cloned()
				.ok_or_else(|| EngineError::MalformedTransaction("deposit return for unknown producer".into()))?;
			if before.state != ProducerState::Canceled {
				return Err(EngineError::MalformedTransaction("producer deposit is not cancellable yet".into()));
			}
			let mut after = before.clone();
			after.state = ProducerState::Returned;
			ledger.record(height, Change::ProducerSet { owner: *owner_public_key, before: Some(before), after: Some(after) });
			Ok(())
		}

		TxPayload::IllegalProducerEvidence { node_public_key, penalty } => {
			let before = ledger
				.state
				.producers
				.get_by_node_key(node_public_key)
				.cloned()
				.ok_or_else(|| EngineError::MalformedTransaction("illegal evidence for unknown producer".into()))?;
			let mut after = before.clone();
			after.state = ProducerState::Illegal;
			after.penalty += *penalty;
			ledger.record(height, Change::ProducerSet { owner: before.owner_public_key, before: Some(before), after: Some(after) });
			Ok(())
		}

		TxPayload::Vote { producer_votes, candidate_votes } => {
			for (node_public_key, delta) in producer_votes {
				let before = ledger
					.state
					.producers
					.get_by_node_key(node_public_key)
					.cloned()
					.ok_or_else(|| EngineError::MalformedTransaction("vote for unknown producer".into()))?;
				let mut after = before.clone();
				after.votes += *delta;
				ledger.record(height, Change::ProducerSet { owner: before.owner_public_key, before: Some(before), after: Some(after) });
			}
			for (did, delta) in candidate_votes {
				let before = ledger
					.state
					.candidates
					.get(did)
					.cloned()
					.ok_or_else(|| EngineError::MalformedTransaction("vote for unknown CR candidate".into()))?;
				let mut after = before.clone();
				after.votes += *delta;
				ledger.record(height, Change::CandidateSet { did: *did, before: Some(before), after: Some(after) });
			}
			Ok(())
		}

		TxPayload::RegisterCr { info, deposit_hash, deposit_amount } => {
			if ledger.state.candidates.get(&info.did).is_some() {
				return Err(EngineError::MalformedTransaction("CR candidate already registered".into()));
			}
			let candidate = Candidate::new(info.clone(), *deposit_hash, *deposit_amount);
			ledger.record(height, Change::CandidateSet { did: info.did, before: None, after: Some(candidate) });
			Ok(())
		}

		TxPayload::UpdateCr { did, info } => {
			let before = ledger.state.candidates.get(did).cloned().ok_or_else(|| EngineError::MalformedTransaction("update of unknown CR candidate".into()))?;
			let mut after = before.clone();
			after.info = info.clone();
			ledger.record(height, Change::CandidateSet { did: *did, before: Some(before), after: Some(after) });
			Ok(())
		}

		TxPayload::UnregisterCr { did } => {
			let before = ledger.state.candidates.get(did).cloned().ok_or_else(|| EngineError::MalformedTransaction("unregister of unknown CR candidate".into()))?;
			let mut after = before.clone();
			after.state = CandidateState::Canceled;
			after.cancel_height = height;
			ledger.record(height, Change::CandidateSet { did: *did, before: Some(before), after: Some(after) });
			Ok(())
		}

		TxPayload::ReturnCrDepositCoin { did } => {
			let before = ledger.state.candidates.get(did).cloned().ok_or_else(|| EngineError::MalformedTransaction("deposit return for unknown CR candidate".into()))?;
			if before.state != CandidateState::Canceled {
				return Err(EngineError::MalformedTransaction("CR candidate deposit is not cancellable yet".into()));
			}
			let mut after = before.clone();
			after.state = CandidateState::Returned;
			ledger.record(height, Change::CandidateSet { did: *did, before: Some(before), after: Some(after) });
			Ok(())
		}

		TxPayload::CrImpeachment { did, votes } => apply_impeachment(ledger, params, height, *did, *votes),

		TxPayload::ProposalRegister { hash, proposal_type, sponsor_public_key, cr_sponsor_did, draft_hash, budgets, target_address } => {
			if ledger.state.proposals.get(hash).is_some() {
				return Err(EngineError::MalformedTransaction("duplicate proposal hash".into()));
			}
			let proposal = Proposal {
				hash: *hash,
				proposal_type: *proposal_type,
				sponsor_public_key: *sponsor_public_key,
				cr_sponsor_did: *cr_sponsor_did,
				draft_hash: *draft_hash,
				budgets: budgets.clone(),
				target_address: *target_address,
				status: ProposalStatus::Registered,
				cr_votes: std::collections::HashMap::new(),
				current_withdrawal_stage: 0,
				register_height: height,
				cr_agreed_height: None,
				voter_agreed_height: None,
			};
			ledger.record(height, Change::ProposalSet { hash: *hash, before: None, after: Some(proposal) });
			Ok(())
		}

		TxPayload::ProposalCrVote { hash, cr_did, vote } => {
			let before = ledger.state.proposals.get(hash).cloned().ok_or_else(|| EngineError::MalformedTransaction("vote for unknown proposal".into()))?;
			let after = before.with_cr_vote(*cr_did, *vote, params.cr_member_count, height)?;
			let used_amount_before = ledger.state.committee.crc_committee_used_amount;
			ledger.record(height, Change::ProposalSet { hash: *hash, before: Some(before), after: Some(after.clone()) });
			if after.status == ProposalStatus::CrAgreed {
				let used_amount_after = used_amount_before + after.remaining_budget();
				ledger.record(
					height,
					Change::CommitteeScalarSet {
						field: CommitteeField::CrcCommitteeUsedAmount,
						before: CommitteeScalar::Amount(used_amount_before),
						after: CommitteeScalar::Amount(used_amount_after),
					},
				);
			}
			Ok(())
		}

		TxPayload::ProposalVoterReject { hash, votes } => {
			let before = ledger.state.proposals.get(hash).cloned().ok_or_else(|| EngineError::MalformedTransaction("reject vote for unknown proposal".into()))?;
			let threshold = ledger.state.committee.impeachment_threshold(params);
			let after = before.with_voter_reject(*votes, threshold)?;
			release_if_terminated(ledger, height, &before, &after);
			ledger.record(height, Change::ProposalSet { hash: *hash, before: Some(before), after: Some(after) });
			Ok(())
		}

		TxPayload::ProposalWithdraw { hash, stage } => {
			let before = ledger.state.proposals.get(hash).cloned().ok_or_else(|| EngineError::MalformedTransaction("withdraw on unknown proposal".into()))?;
			let (after, amount) = before.with_stage_withdrawn(*stage as usize)?;
			let used_amount_before = ledger.state.committee.crc_committee_used_amount;
			let used_amount_after = (used_amount_before - amount).clamp(used_amount_before);
			ledger.record(height, Change::ProposalSet { hash: *hash, before: Some(before), after: Some(after) });
			ledger.record(
				height,
				Change::CommitteeScalarSet {
					field: CommitteeField::CrcCommitteeUsedAmount,
					before: CommitteeScalar::Amount(used_amount_before),
					after: CommitteeScalar::Amount(used_amount_after),
				},
			);
			Ok(())
		}

		TxPayload::InactiveArbitrators { .. } | TxPayload::DposIllegalBlocks { .. } => Ok(()),

		TxPayload::Unknown(tag) => Err(EngineError::UnsupportedPayload(*tag)),
	}
}

/// Height-driven proposal transitions that no transaction payload carries:
/// the public vote concludes `PublicVoteDuration` blocks after
/// CR approval, and a `VoterAgreed` proposal that still hasn't finished all
/// its withdrawal stages `WithdrawalTimeout` blocks after the public vote
/// concluded times out into `Aborted`, releasing its remaining budget. These
/// run on their own clock, independent of the committee's own election
/// windowing (`CRDutyPeriod`/`CRVotingPeriod`), so a proposal's lifecycle
/// never straddles a committee term boundary by accident.
fn advance_proposal_clocks(ledger: &mut Ledger, params: &ChainParams, height: u32) {
	let hashes: Vec<cr_committee_common::Uint256> = ledger.state.proposals.iter().map(|p| p.hash).collect();
	for hash in hashes {
		let before = match ledger.state.proposals.get(&hash) {
			Some(p) => p.clone(),
			None => continue,
		};
		match before.status {
			ProposalStatus::CrAgreed => {
				if let Some(agreed_at) = before.cr_agreed_height {
					if height >= agreed_at + params.public_vote_duration {
						let after = before.with_public_vote_concluded(height);
						ledger.record(height, Change::ProposalSet { hash, before: Some(before), after: Some(after) });
					}
				}
			}
			ProposalStatus::VoterAgreed => {
				if let Some(agreed_at) = before.voter_agreed_height {
					if height >= agreed_at + params.withdrawal_timeout {
						let after = before.with_aborted();
						release_if_terminated(ledger, height, &before, &after);
						ledger.record(height, Change::ProposalSet { hash, before: Some(before), after: Some(after) });
					}
				}
			}
			_ => {}
		}
	}
}

fn release_if_terminated(ledger: &mut Ledger, height: u32, before: &Proposal, after: &Proposal) {
	if !before.is_terminal() && after.is_terminal() {
		let used_before = ledger.state.committee.crc_committee_used_amount;
		let used_after = (used_before - before.remaining_budget()).clamp(used_before);
		ledger.record(
			height,
			Change::CommitteeScalarSet {
				field: CommitteeField::CrcCommitteeUsedAmount,
				before: CommitteeScalar::Amount(used_before),
				after: CommitteeScalar::Amount(used_after),
			},
		);
	}
}

fn apply_impeachment(ledger: &mut Ledger, params: &ChainParams, height: u32, did: cr_committee_common::Uint168, votes: Fixed64) -> Result<()> {
	let before = ledger.state.committee.members.get(&did).cloned().ok_or_else(|| EngineError::MalformedTransaction("impeachment vote for unknown CR member".into()))?;
	let mut after = before.clone();
	after.impeachment_votes += votes;

	let threshold = ledger.state.committee.impeachment_threshold(params);
	if after.impeachment_votes >= threshold && after.member_state == MemberState::Elected {
		let blocks_as_member = height.saturating_sub(ledger.state.committee.last_committee_height).max(after.blocks_as_member);
		let proposal_total = ledger.state.proposals.iter().count() as u32;
		after.member_state = MemberState::Impeached;
		after.penalty = member_penalty(after.penalty, params.min_deposit_amount, params.cr_duty_period, blocks_as_member, after.proposals_voted, proposal_total);
	}

	ledger.record(height, Change::MemberSet { did, before: Some(before), after: Some(after) });
	Ok(())
}

/// Install a fresh committee from the top-voted active CR candidates.
/// Archives the outgoing roster into `history_members` unless the prior
/// term just ended cleanly, requires at least `cr_member_count` active
/// candidates, and emits a CRC appropriation transaction (fire-and-forget:
/// a failed submission is retried by processing it again on the next
/// block).
fn change_committee(ledger: &mut Ledger, params: &ChainParams, height: u32, integration: &dyn ChainIntegration) -> Result<()> {
	let have = ledger.state.candidates.active_count();
	if have < params.cr_member_count {
		return Err(EngineError::InsufficientCandidates { have, required: params.cr_member_count });
	}

	if ledger.state.committee.should_clear_history(params) {
		let before = ledger.state.committee.history_members.clone();
		ledger.record(height, Change::HistoryMembersReplace { before, after: std::collections::HashMap::new() });
	}

	let outgoing = ledger.state.committee.members.clone();
	for (did, member) in outgoing.iter() {
		ledger.record(
			height,
			Change::HistoryMemberSet { did: *did, before: ledger.state.committee.history_members.get(did).cloned(), after: Some(member.clone()) },
		);
	}
	for did in outgoing.keys() {
		ledger.record(height, Change::MemberSet { did: *did, before: ledger.state.committee.members.get(did).cloned(), after: None });
	}

	let top: Vec<(cr_committee_common::Uint168, CRMember)> = ledger
		.state
		.candidates
		.top_active(params.cr_member_count as usize)
		.into_iter()
		.map(|c| (c.info.did, CRMember::from_candidate(c.info.clone(), c.deposit_hash, c.deposit_amount, c.penalty)))
		.collect();
	for (did, member) in top {
		ledger.record(height, Change::MemberSet { did, before: None, after: Some(member) });
	}

	let purged = ledger.state.proposals.clear();
	if !purged.is_empty() {
		for (hash, proposal) in purged {
			ledger.record(height, Change::ProposalSet { hash, before: Some(proposal), after: None });
		}
	}

	set_committee_scalar_u32(ledger, height, CommitteeField::LastCommitteeHeight, height);
	ledger.record(
		height,
		Change::CommitteeScalarSet { field: CommitteeField::InElectionPeriod, before: CommitteeScalar::Bool(ledger.state.committee.in_election_period), after: CommitteeScalar::Bool(true) },
	);
	ledger.record(
		height,
		Change::CommitteeScalarSet { field: CommitteeField::NeedAppropriation, before: CommitteeScalar::Bool(ledger.state.committee.need_appropriation), after: CommitteeScalar::Bool(true) },
	);

	let appropriation = ledger.state.committee.crc_foundation_balance;
	let tx = integration.create_crc_appropriation_tx(appropriation);
	let _ = integration.append_to_txpool(tx);

	Ok(())
}

/// Arbiter rotation: force change recomputes `next` then promotes; normal
/// change (rotation wrap) promotes then recomputes; otherwise the duty
/// index simply advances.
fn advance_arbiters(
	ledger: &mut Ledger,
	integration: &dyn ChainIntegration,
	params: &ChainParams,
	height: u32,
	force: bool,
	outcome: &mut IngestOutcome,
) -> Result<()> {
	let inactive_crc: HashSet<cr_committee_common::NodePublicKey> = HashSet::new();
	let before_frame = ledger.state.arbiters.clone();
	let normal = arbiter::normal_change(&before_frame, params);

	let mut after_frame = before_frame.clone();
	if force {
		let (next_arbitrators, next_candidates) = arbiter::recompute_next(&ledger.state.producers, &inactive_crc, params)?;
		after_frame.next_arbitrators = next_arbitrators;
		after_frame.next_candidates = next_candidates;
		after_frame.promote_next_to_current();
		after_frame.duty_index = 0;
		// A force change consumes the freshly computed slate immediately
		// instead of holding it as `next` for the following rotation (unlike
		// a normal wrap); recompute once more so the next rotation still has
		// a prepared slate to promote instead of an empty one.
		let (next_arbitrators, next_candidates) = arbiter::recompute_next(&ledger.state.producers, &inactive_crc, params)?;
		after_frame.next_arbitrators = next_arbitrators;
		after_frame.next_candidates = next_candidates;
	} else if normal {
		after_frame.promote_next_to_current();
		let (next_arbitrators, next_candidates) = arbiter::recompute_next(&ledger.state.producers, &inactive_crc, params)?;
		after_frame.next_arbitrators = next_arbitrators;
		after_frame.next_candidates = next_candidates;
		after_frame.duty_index = 0;
	} else {
		after_frame.duty_index += 1;
	}

	outcome.arbiter_set_changed = after_frame.current_arbitrators != before_frame.current_arbitrators;
	ledger.record(height, Change::ArbiterFrameSet { before: Box::new(before_frame), after: Box::new(after_frame) });

	if outcome.arbiter_set_changed && integration.is_current() {
		integration.broadcast("newarbiters", &[]);
	}
	Ok(())
}
