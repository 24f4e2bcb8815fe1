//! The trait boundary that replaces the original's callback-bag wiring
//! (spec §9, "Function-table wiring"): every oracle the core calls into the
//! host chain for is bundled here and supplied once at construction.

use cr_committee_common::{NodePublicKey, Result, Uint168};

use crate::types::{Output, Tx};

/// One unspent output, as returned by the host's UTXO oracle.
#[derive(Clone, Debug)]
pub struct Utxo {
	pub tx_hash: cr_committee_common::Uint256,
	pub index: u16,
	pub output: Output,
}

/// Everything the state engine needs from the host chain process. Supplied
/// once at `CommitteeEngine::new` and never mutated afterward — there is no
/// "attach wiring later" step.
pub trait ChainIntegration: Send + Sync {
	/// All unspent outputs paying to `program_hash` (used to lazily
	/// initialize treasury balances per spec §4.5).
	fn get_utxo(&self, program_hash: &Uint168) -> Result<Vec<Utxo>>;

	/// Resolve every input of `tx` to the output it spends.
	fn get_tx_reference(&self, tx: &Tx) -> Result<std::collections::HashMap<usize, Output>>;

	/// Current chain tip height, as observed by the host.
	fn get_height(&self) -> u32;

	/// Whether the host considers itself tip-current (safe to broadcast).
	fn is_current(&self) -> bool;

	/// Broadcast a P2P message to the network.
	fn broadcast(&self, command: &str, payload: &[u8]);

	/// Submit a transaction to the host's mempool.
	fn append_to_txpool(&self, tx: Tx) -> Result<()>;

	/// Build a CRC appropriation transaction moving funds from the
	/// foundation address into the committee treasury.
	fn create_crc_appropriation_tx(&self, amount: cr_committee_common::Fixed64) -> Tx;

	/// Sign the nonce a peer's version handshake presents, proving this
	/// node owns `node_public_key`.
	fn sign_peer_nonce(&self, node_public_key: &NodePublicKey, nonce: u64) -> Vec<u8>;
}
