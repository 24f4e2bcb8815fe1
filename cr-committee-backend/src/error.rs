use std::io;
use thiserror::Error;

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum BackendError {
	#[error(transparent)]
	Io(#[from] io::Error),
	#[error("checkpoint at height {0} is corrupt: {1}")]
	CorruptCheckpoint(u32, String),
	#[error("no checkpoint at or below height {0}")]
	NoCheckpoint(u32),
	#[error("peer list file is corrupt: {0}")]
	CorruptPeerList(String),
}
