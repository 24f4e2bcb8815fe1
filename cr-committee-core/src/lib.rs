//! CR Committee state engine and DPoS arbiter rotation core.
//!
//! Owns the History Log, Checkpoint Manager, Producer/Candidate State,
//! Arbiter Rotation, Committee State, Proposal Manager, Block Ingestor and
//! the Peer Projector. A host chain process drives the whole thing through
//! [`CommitteeEngine`], supplying its own oracles via the
//! [`ChainIntegration`] trait.

#![forbid(unsafe_code)]

pub mod arbiter;
pub mod candidate;
pub mod chain_integration;
pub mod checkpoint;
pub mod committee;
pub mod config;
pub mod engine;
pub mod engine_state;
pub mod history;
pub mod ingestor;
pub mod ledger;
pub mod peer;
pub mod producer;
pub mod proposal;
pub mod types;

pub use chain_integration::{ChainIntegration, Utxo};
pub use checkpoint::{Checkpoint, CheckpointManager};
pub use config::{ChainParams, CrcArbiterConfig};
pub use engine::CommitteeEngine;
pub use engine_state::EngineState;
pub use ingestor::IngestOutcome;
pub use types::{Block, Confirm, Output, TreasuryAddress, Tx, TxPayload};
