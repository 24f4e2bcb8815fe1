//! Shared types for the CR committee state engine: the fixed-point amount
//! type, hash/public-key newtypes, and the error enum used by every other
//! crate in the workspace.

#![forbid(unsafe_code)]
#![deny(dead_code)]

pub mod amount;
pub mod error;
pub mod hash;
#[cfg(feature = "logging")]
pub mod logger;
pub mod pubkey;

pub use amount::Fixed64;
pub use error::{EngineError, Result};
pub use hash::{Uint168, Uint256};
pub use pubkey::NodePublicKey;

#[cfg(feature = "logging")]
pub use logger::init_logger;
