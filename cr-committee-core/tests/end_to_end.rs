//! End-to-end scenarios driving a full `CommitteeEngine` through
//! `process_block` with a stub chain integration, exercising the same
//! sequences the unit tests cover in isolation but through the public API a
//! host would actually call.

use std::collections::HashMap;
use std::sync::Arc;

use cr_committee_common::{EngineError, Fixed64, NodePublicKey, Uint168, Uint256};
use cr_committee_core::{
	Block, ChainIntegration, ChainParams, CommitteeEngine, Confirm, CrcArbiterConfig, Output, Tx, TxPayload, Utxo,
};
use cr_committee_core::types::{CandidateInfo, VoteChoice};

struct StubChain;

impl ChainIntegration for StubChain {
	fn get_utxo(&self, _program_hash: &Uint168) -> cr_committee_common::Result<Vec<Utxo>> {
		Ok(Vec::new())
	}

	fn get_tx_reference(&self, _tx: &Tx) -> cr_committee_common::Result<HashMap<usize, Output>> {
		Ok(HashMap::new())
	}

	fn get_height(&self) -> u32 {
		0
	}

	fn is_current(&self) -> bool {
		true
	}

	fn broadcast(&self, _command: &str, _payload: &[u8]) {}

	fn append_to_txpool(&self, _tx: Tx) -> cr_committee_common::Result<()> {
		Ok(())
	}

	fn create_crc_appropriation_tx(&self, _amount: Fixed64) -> Tx {
		Tx { hash: Uint256([0xaa; 32]), inputs: Vec::new(), outputs: Vec::new(), payload: TxPayload::Transfer }
	}

	fn sign_peer_nonce(&self, _node_public_key: &NodePublicKey, _nonce: u64) -> Vec<u8> {
		Vec::new()
	}
}

fn key(byte: u8) -> NodePublicKey {
	NodePublicKey([byte; 33])
}

fn did(byte: u8) -> Uint168 {
	Uint168([byte; 21])
}

fn tx_hash(byte: u8) -> Uint256 {
	Uint256([byte; 32])
}

fn block(height: u32, txs: Vec<Tx>) -> Block {
	Block { height, prev_hash: Uint256([0u8; 32]), timestamp: 0, txs }
}

fn tx(hash_byte: u8, payload: TxPayload) -> Tx {
	Tx { hash: tx_hash(hash_byte), inputs: Vec::new(), outputs: Vec::new(), payload }
}

fn engine(params: ChainParams) -> CommitteeEngine<StubChain> {
	let dir = tempfile::tempdir().unwrap();
	CommitteeEngine::open_at(params, Arc::new(StubChain), dir.path()).unwrap()
}

fn base_params() -> ChainParams {
	ChainParams {
		cr_voting_start_height: 100,
		cr_committee_start_height: 200,
		cr_duty_period: 500,
		cr_voting_period: 60,
		cr_member_count: 3,
		cr_agreement_count: 2,
		voter_reject_percentage: 10,
		min_deposit_amount: Fixed64::from_units(500_000_000),
		reward_per_block: Fixed64::ZERO,
		origin_issuance_amount: Fixed64::from_units(1_000_000),
		normal_arbitrators_count: 0,
		candidates_count: 0,
		crc_arbiters: Vec::new(),
		height_versions: Vec::new(),
		public_vote_duration: 5,
		withdrawal_timeout: 3,
		checkpoint_interval: 2000,
		checkpoint_retention: 10,
		data_dir: std::env::temp_dir(),
	}
}

fn register_cr_tx(hash_byte: u8, code_byte: u8, votes_tiebreak: u8) -> (Tx, Uint168) {
	let info = CandidateInfo::new(vec![code_byte], key(votes_tiebreak), format!("cand-{}", code_byte), "url".into(), 0);
	let did = info.did;
	let tx = tx(hash_byte, TxPayload::RegisterCr { info, deposit_hash: Uint256([code_byte; 32]), deposit_amount: Fixed64::from_units(500_000_000) });
	(tx, did)
}

#[test]
fn first_committee_install_elects_top_voted_candidates() {
	let params = base_params();
	let eng = engine(params);

	let (tx1, did1) = register_cr_tx(1, 1, 1);
	let (tx2, did2) = register_cr_tx(2, 2, 2);
	let (tx3, did3) = register_cr_tx(3, 3, 3);
	let (tx4, did4) = register_cr_tx(4, 4, 4);
	eng.process_block(&block(150, vec![tx1, tx2, tx3, tx4]), &Confirm::default()).unwrap();

	let vote = tx(
		5,
		TxPayload::Vote {
			producer_votes: Vec::new(),
			candidate_votes: vec![
				(did1, Fixed64::from_units(50)),
				(did2, Fixed64::from_units(40)),
				(did3, Fixed64::from_units(30)),
				(did4, Fixed64::from_units(20)),
			],
		},
	);
	eng.process_block(&block(160, vec![vote]), &Confirm::default()).unwrap();

	eng.process_block(&block(200, Vec::new()), &Confirm::default()).unwrap();

	let frame = eng.committee_key_frame();
	assert_eq!(frame.members.len(), 3);
	assert!(frame.members.contains_key(&did1));
	assert!(frame.members.contains_key(&did2));
	assert!(frame.members.contains_key(&did3));
	assert!(!frame.members.contains_key(&did4));
	assert!(frame.in_election_period);
	assert!(frame.need_appropriation);
	assert_eq!(frame.last_committee_height, 200);
}

#[test]
fn arbiter_rotation_wraps_without_changing_an_unchanged_set() {
	let mut params = base_params();
	params.cr_voting_start_height = 1;
	params.cr_committee_start_height = 1_000;
	params.normal_arbitrators_count = 2;
	let eng = engine(params);

	let register1 = tx(1, TxPayload::RegisterProducer { owner_public_key: key(1), node_public_key: key(11), nickname: "a".into(), url: "u".into(), location: 0, net_address: "1.1.1.1:1".into() });
	let register2 = tx(2, TxPayload::RegisterProducer { owner_public_key: key(2), node_public_key: key(12), nickname: "b".into(), url: "u".into(), location: 0, net_address: "1.1.1.2:1".into() });
	eng.process_block(&block(1, vec![register1, register2]), &Confirm::default()).unwrap();

	let activate1 = tx(3, TxPayload::ActivateProducer { node_public_key: key(11) });
	let activate2 = tx(4, TxPayload::ActivateProducer { node_public_key: key(12) });
	eng.process_block(&block(2, vec![activate1, activate2]), &Confirm::default()).unwrap();

	// seed the first arbiter slate via a forced recompute
	let illegal = tx(5, TxPayload::DposIllegalBlocks { node_public_keys: vec![key(11)] });
	eng.process_block(&block(3, vec![illegal]), &Confirm::default()).unwrap();
	let seeded = eng.arbiter_key_frame();
	assert_eq!(seeded.duty_index, 0);
	assert_eq!(seeded.current_arbitrators.len(), 2);

	// two further blocks with no force trigger and no vote changes: exactly
	// `arbiters_count` blocks wrap duty_index back to 0 with the same set.
	eng.process_block(&block(4, Vec::new()), &Confirm::default()).unwrap();
	assert_eq!(eng.arbiter_key_frame().duty_index, 1);
	eng.process_block(&block(5, Vec::new()), &Confirm::default()).unwrap();

	let wrapped = eng.arbiter_key_frame();
	assert_eq!(wrapped.duty_index, 0);
	assert_eq!(wrapped.current_arbitrators, seeded.current_arbitrators);
}

#[test]
fn insufficient_producers_aborts_the_block_without_losing_prior_registrations() {
	let mut params = base_params();
	params.cr_voting_start_height = 1;
	params.cr_committee_start_height = 1_000;
	params.normal_arbitrators_count = 2;
	let eng = engine(params);

	let register1 = tx(1, TxPayload::RegisterProducer { owner_public_key: key(1), node_public_key: key(11), nickname: "a".into(), url: "u".into(), location: 0, net_address: "1.1.1.1:1".into() });
	let activate1 = tx(2, TxPayload::ActivateProducer { node_public_key: key(11) });
	eng.process_block(&block(1, vec![register1, activate1]), &Confirm::default()).unwrap();
	assert!(eng.producer(&key(1)).is_some());

	let illegal = tx(3, TxPayload::DposIllegalBlocks { node_public_keys: vec![key(11)] });
	let err = eng.process_block(&block(2, vec![illegal]), &Confirm::default()).unwrap_err();
	assert!(matches!(err, EngineError::InsufficientProducers { have: 1, required: 2 }));

	// the failed block was rolled back in full, but the earlier registration
	// from block 1 survives untouched
	assert!(eng.producer(&key(1)).is_some());
	assert!(eng.arbiter_key_frame().current_arbitrators.is_empty());

	let register2 = tx(4, TxPayload::RegisterProducer { owner_public_key: key(2), node_public_key: key(12), nickname: "b".into(), url: "u".into(), location: 0, net_address: "1.1.1.2:1".into() });
	let activate2 = tx(5, TxPayload::ActivateProducer { node_public_key: key(12) });
	let illegal_again = tx(6, TxPayload::DposIllegalBlocks { node_public_keys: vec![key(11)] });
	let outcome = eng.process_block(&block(3, vec![register2, activate2, illegal_again]), &Confirm::default()).unwrap();
	assert!(outcome.arbiter_set_changed);
	assert_eq!(eng.arbiter_key_frame().current_arbitrators.len(), 2);
}

#[test]
fn impeachment_crosses_threshold_and_rollback_restores_elected() {
	let mut params = base_params();
	params.origin_issuance_amount = Fixed64::from_units(1_000_000);
	let eng = engine(params);

	let (tx1, did1) = register_cr_tx(1, 1, 1);
	let (tx2, did2) = register_cr_tx(2, 2, 2);
	let (tx3, did3) = register_cr_tx(3, 3, 3);
	eng.process_block(&block(150, vec![tx1, tx2, tx3]), &Confirm::default()).unwrap();
	let vote = tx(
		4,
		TxPayload::Vote {
			producer_votes: Vec::new(),
			candidate_votes: vec![(did1, Fixed64::from_units(50)), (did2, Fixed64::from_units(40)), (did3, Fixed64::from_units(30))],
		},
	);
	eng.process_block(&block(160, vec![vote]), &Confirm::default()).unwrap();
	eng.process_block(&block(200, Vec::new()), &Confirm::default()).unwrap();
	assert_eq!(eng.committee_member(&did1).unwrap().member_state, cr_committee_core::committee::MemberState::Elected);

	// latch last_voting_start_height one block ahead of the next voting
	// window (last_committee_height + duty_period - voting_period - 1 = 639)
	eng.process_block(&block(639, Vec::new()), &Confirm::default()).unwrap();
	assert!(eng.committee_key_frame().is_in_voting_period(eng.params(), 640));

	let first = tx(10, TxPayload::CrImpeachment { did: did1, votes: Fixed64::from_units(60_000) });
	eng.process_block(&block(640, vec![first]), &Confirm::default()).unwrap();
	assert_eq!(eng.committee_member(&did1).unwrap().member_state, cr_committee_core::committee::MemberState::Elected);

	let second = tx(11, TxPayload::CrImpeachment { did: did1, votes: Fixed64::from_units(60_000) });
	eng.process_block(&block(641, vec![second]), &Confirm::default()).unwrap();
	assert_eq!(eng.committee_member(&did1).unwrap().member_state, cr_committee_core::committee::MemberState::Impeached);

	eng.rollback_to(640).unwrap();
	assert_eq!(eng.committee_member(&did1).unwrap().member_state, cr_committee_core::committee::MemberState::Elected);
}

#[test]
fn proposal_full_cycle_tracks_committee_used_amount() {
	let params = base_params();
	let eng = engine(params);

	let (tx1, did1) = register_cr_tx(1, 1, 1);
	let (tx2, did2) = register_cr_tx(2, 2, 2);
	let (tx3, did3) = register_cr_tx(3, 3, 3);
	eng.process_block(&block(150, vec![tx1, tx2, tx3]), &Confirm::default()).unwrap();
	let vote = tx(
		4,
		TxPayload::Vote {
			producer_votes: Vec::new(),
			candidate_votes: vec![(did1, Fixed64::from_units(50)), (did2, Fixed64::from_units(40)), (did3, Fixed64::from_units(30))],
		},
	);
	eng.process_block(&block(160, vec![vote]), &Confirm::default()).unwrap();
	eng.process_block(&block(200, Vec::new()), &Confirm::default()).unwrap();

	// proposal transactions dispatch through `apply_full` only while the
	// committee is in its own voting period, which after installation is the
	// pre-election window [last_committee_height + duty_period -
	// voting_period, last_committee_height + duty_period) = [640, 700).
	let proposal_hash = Uint256([77u8; 32]);
	let register_proposal = tx(
		20,
		TxPayload::ProposalRegister {
			hash: proposal_hash,
			proposal_type: 0,
			sponsor_public_key: key(50),
			cr_sponsor_did: did1,
			draft_hash: Uint256([88u8; 32]),
			budgets: vec![Fixed64::from_units(100), Fixed64::from_units(200), Fixed64::from_units(300)],
			target_address: did(9),
		},
	);
	eng.process_block(&block(640, vec![register_proposal]), &Confirm::default()).unwrap();

	let approve1 = tx(21, TxPayload::ProposalCrVote { hash: proposal_hash, cr_did: did1, vote: VoteChoice::Approve });
	let approve2 = tx(22, TxPayload::ProposalCrVote { hash: proposal_hash, cr_did: did2, vote: VoteChoice::Approve });
	eng.process_block(&block(641, vec![approve1, approve2]), &Confirm::default()).unwrap();
	assert_eq!(eng.committee_key_frame().crc_committee_used_amount, Fixed64::from_units(600));

	// public_vote_duration = 5: CrAgreed at height 641 concludes by height 646
	eng.process_block(&block(646, Vec::new()), &Confirm::default()).unwrap();
	assert_eq!(eng.proposal(&proposal_hash).unwrap().status, cr_committee_core::proposal::ProposalStatus::VoterAgreed);

	let withdraw_stage0 = tx(23, TxPayload::ProposalWithdraw { hash: proposal_hash, stage: 0 });
	eng.process_block(&block(647, vec![withdraw_stage0]), &Confirm::default()).unwrap();
	assert_eq!(eng.committee_key_frame().crc_committee_used_amount, Fixed64::from_units(500));

	// withdrawal_timeout = 3: voter_agreed_height = 646, times out by height 650
	eng.process_block(&block(650, Vec::new()), &Confirm::default()).unwrap();
	assert_eq!(eng.proposal(&proposal_hash).unwrap().status, cr_committee_core::proposal::ProposalStatus::Aborted);
	assert_eq!(eng.committee_key_frame().crc_committee_used_amount, Fixed64::ZERO);
}

#[test]
fn rollback_past_a_committee_change_restores_the_prior_roster() {
	let mut params = base_params();
	params.cr_committee_start_height = 200;
	let eng = engine(params);

	let (tx1, did1) = register_cr_tx(1, 1, 1);
	let (tx2, did2) = register_cr_tx(2, 2, 2);
	let (tx3, did3) = register_cr_tx(3, 3, 3);
	eng.process_block(&block(150, vec![tx1, tx2, tx3]), &Confirm::default()).unwrap();
	let vote = tx(
		4,
		TxPayload::Vote {
			producer_votes: Vec::new(),
			candidate_votes: vec![(did1, Fixed64::from_units(50)), (did2, Fixed64::from_units(40)), (did3, Fixed64::from_units(30))],
		},
	);
	eng.process_block(&block(160, vec![vote]), &Confirm::default()).unwrap();

	// before the change: no members installed yet, need_appropriation false
	assert!(eng.committee_key_frame().members.is_empty());
	assert!(!eng.committee_key_frame().need_appropriation);

	eng.process_block(&block(199, Vec::new()), &Confirm::default()).unwrap();
	eng.process_block(&block(200, Vec::new()), &Confirm::default()).unwrap();
	assert_eq!(eng.committee_key_frame().members.len(), 3);
	assert!(eng.committee_key_frame().need_appropriation);
	assert_eq!(eng.committee_key_frame().last_committee_height, 200);

	eng.process_block(&block(205, Vec::new()), &Confirm::default()).unwrap();

	eng.rollback_to(199).unwrap();
	let frame = eng.committee_key_frame();
	assert!(frame.members.is_empty());
	assert!(!frame.need_appropriation);
	assert_eq!(frame.last_committee_height, 0);

	// a replay from height 200 onward reaches the same installed roster
	eng.process_block(&block(200, Vec::new()), &Confirm::default()).unwrap();
	let replayed = eng.committee_key_frame();
	assert_eq!(replayed.members.len(), 3);
	assert!(replayed.members.contains_key(&did1));
	assert!(replayed.need_appropriation);
}

#[test]
fn treasury_balances_stay_conserved_against_circulation() {
	let mut params = base_params();
	params.origin_issuance_amount = Fixed64::from_units(1_000_000);
	params.reward_per_block = Fixed64::from_units(10);
	let eng = engine(params.clone());

	let foundation_output = Tx {
		hash: tx_hash(1),
		inputs: Vec::new(),
		outputs: vec![Output { program_hash: Uint168([0u8; 21]), amount: Fixed64::from_units(1_000), treasury: Some(cr_committee_core::TreasuryAddress::CrcFoundation) }],
		payload: TxPayload::Transfer,
	};
	eng.process_block(&block(100, vec![foundation_output]), &Confirm::default()).unwrap();

	let destroy_output = Tx {
		hash: tx_hash(2),
		inputs: Vec::new(),
		outputs: vec![Output { program_hash: Uint168([2u8; 21]), amount: Fixed64::from_units(500), treasury: Some(cr_committee_core::TreasuryAddress::DestroyEla) }],
		payload: TxPayload::Transfer,
	};
	eng.process_block(&block(101, vec![destroy_output]), &Confirm::default()).unwrap();

	let frame = eng.committee_key_frame();
	let total_issued = params.origin_issuance_amount + params.reward_per_block.mul_ratio(101, 1);
	assert_eq!(frame.crc_foundation_balance + frame.crc_committee_balance + frame.destroyed_amount + frame.circulation_amount, total_issued);
}
