use std::io;
use thiserror::Error;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Errors surfaced by the CR committee state engine.
///
/// Variants are grouped by the taxonomy the engine distinguishes between:
/// invariant violations are fatal, input rejections refuse a single
/// transaction without aborting the block, consensus preconditions ask the
/// caller to retry from a deeper checkpoint, and transient I/O is retried by
/// the caller.
#[derive(Error, Debug)]
pub enum EngineError {
	#[error(transparent)]
	Io(#[from] io::Error),
	#[error(transparent)]
	Serialization(#[from] serde_json::Error),

	// --- invariant violations (fatal) ---
	#[error("invariant violated: {0}")]
	Invariant(String),
	#[error("treasury accounting drift: {0}")]
	TreasuryDrift(String),

	// --- input rejection (tx refused, block continues) ---
	#[error("malformed transaction: {0}")]
	MalformedTransaction(String),
	#[error("duplicate input")]
	DuplicateInput,
	#[error("unsupported special transaction payload tag {0}")]
	UnsupportedPayload(u8),

	// --- consensus preconditions (caller decides) ---
	#[error("fewer than {required} active producers (have {have})")]
	InsufficientProducers { have: u32, required: u32 },
	#[error("fewer than {required} active CR candidates (have {have})")]
	InsufficientCandidates { have: u32, required: u32 },
	#[error("rollback target {target} is before the sealed height {sealed}")]
	BeyondCommitWindow { target: u32, sealed: u32 },
	#[error("no checkpoint at or below height {0}")]
	NoCheckpoint(u32),

	// --- transient I/O / network ---
	#[error("unsupported message command {0:?}")]
	UnsupportedMessage(String),
	#[error("peer already disconnected")]
	PeerDisconnected,
	#[error("channel disconnected")]
	Channel,

	#[error("{0}")]
	Other(String),
}

impl From<&str> for EngineError {
	fn from(e: &str) -> Self {
		EngineError::Other(e.to_string())
	}
}

impl From<String> for EngineError {
	fn from(e: String) -> Self {
		EngineError::Other(e)
	}
}
