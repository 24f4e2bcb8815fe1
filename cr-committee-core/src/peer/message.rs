//! Wire framing and the closed set of inbound message commands (spec §6,
//! §4.8): `[4-byte magic][12-byte zero-padded command][4-byte length][4-byte
//! crc32][payload]`.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use cr_committee_common::{EngineError, Result};

pub const COMMAND_LEN: usize = 12;
pub const HEADER_LEN: usize = 4 + COMMAND_LEN + 4 + 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageHeader {
	pub magic: u32,
	pub command: [u8; COMMAND_LEN],
	pub length: u32,
	pub checksum: u32,
}

impl MessageHeader {
	pub fn new(magic: u32, command: &str, payload: &[u8]) -> Self {
		let mut command_bytes = [0u8; COMMAND_LEN];
		let bytes = command.as_bytes();
		let n = bytes.len().min(COMMAND_LEN);
		command_bytes[..n].copy_from_slice(&bytes[..n]);
		MessageHeader { magic, command: command_bytes, length: payload.len() as u32, checksum: crc32fast::hash(payload) }
	}

	pub fn command_str(&self) -> String {
		let end = self.command.iter().position(|b| *b == 0).unwrap_or(COMMAND_LEN);
		String::from_utf8_lossy(&self.command[..end]).into_owned()
	}

	pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
		w.write_u32::<LittleEndian>(self.magic)?;
		w.write_all(&self.command)?;
		w.write_u32::<LittleEndian>(self.length)?;
		w.write_u32::<LittleEndian>(self.checksum)?;
		Ok(())
	}

	pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
		let magic = r.read_u32::<LittleEndian>()?;
		let mut command = [0u8; COMMAND_LEN];
		r.read_exact(&mut command)?;
		let length = r.read_u32::<LittleEndian>()?;
		let checksum = r.read_u32::<LittleEndian>()?;
		Ok(MessageHeader { magic, command, length, checksum })
	}

	pub fn verify_checksum(&self, payload: &[u8]) -> bool {
		self.length as usize == payload.len() && crc32fast::hash(payload) == self.checksum
	}
}

/// The closed set of arbiter P2P message types (spec §4.8). Unknown wire
/// commands are rejected with `EngineError::UnsupportedMessage` rather than
/// matched by a default arm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
	Version,
	Verack,
	Proposal,
	AcceptVote,
	RejectVote,
	Ping,
	Pong,
	Block,
	Inv,
	GetBlock,
	GetBlocks,
	ResponseBlocks,
	RequestConsensus,
	ResponseConsensus,
	RequestProposal,
	IllegalProposals,
	IllegalVotes,
	SidechainIllegalData,
	Tx,
	ResponseInactiveArbitrators,
}

impl Command {
	pub fn as_str(&self) -> &'static str {
		match self {
			Command::Version => "version",
			Command::Verack => "verack",
			Command::Proposal => "proposal",
			Command::AcceptVote => "accept",
			Command::RejectVote => "reject",
			Command::Ping => "ping",
			Command::Pong => "pong",
			Command::Block => "block",
			Command::Inv => "inv",
			Command::GetBlock => "getblock",
			Command::GetBlocks => "getblocks",
			Command::ResponseBlocks => "blocks",
			Command::RequestConsensus => "getconsensus",
			Command::ResponseConsensus => "consensus",
			Command::RequestProposal => "getproposal",
			Command::IllegalProposals => "illegalprop",
			Command::IllegalVotes => "illegalvote",
			Command::SidechainIllegalData => "scillegal",
			Command::Tx => "tx",
			Command::ResponseInactiveArbitrators => "inactivearbs",
		}
	}

	pub fn parse(s: &str) -> Result<Command> {
		Ok(match s {
			"version" => Command::Version,
			"verack" => Command::Verack,
			"proposal" => Command::Proposal,
			"accept" => Command::AcceptVote,
			"reject" => Command::RejectVote,
			"ping" => Command::Ping,
			"pong" => Command::Pong,
			"block" => Command::Block,
			"inv" => Command::Inv,
			"getblock" => Command::GetBlock,
			"getblocks" => Command::GetBlocks,
			"blocks" => Command::ResponseBlocks,
			"getconsensus" => Command::RequestConsensus,
			"consensus" => Command::ResponseConsensus,
			"getproposal" => Command::RequestProposal,
			"illegalprop" => Command::IllegalProposals,
			"illegalvote" => Command::IllegalVotes,
			"scillegal" => Command::SidechainIllegalData,
			"tx" => Command::Tx,
			"inactivearbs" => Command::ResponseInactiveArbitrators,
			other => return Err(EngineError::UnsupportedMessage(other.to_string())),
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn header_roundtrips_through_bytes() {
		let payload = b"hello world";
		let header = MessageHeader::new(0xdead_beef, "ping", payload);
		let mut buf = Vec::new();
		header.write_to(&mut buf).unwrap();
		assert_eq!(buf.len(), HEADER_LEN);
		let parsed = MessageHeader::read_from(&mut &buf[..]).unwrap();
		assert_eq!(parsed, header);
		assert_eq!(parsed.command_str(), "ping");
		assert!(parsed.verify_checksum(payload));
	}

	#[test]
	fn checksum_mismatch_is_detected() {
		let header = MessageHeader::new(1, "ping", b"abc");
		assert!(!header.verify_checksum(b"xyz"));
	}

	#[test]
	fn unknown_command_is_rejected() {
		assert!(matches!(Command::parse("frobnicate"), Err(EngineError::UnsupportedMessage(_))));
	}

	#[test]
	fn every_command_round_trips_through_its_string() {
		let all = [
			Command::Version,
			Command::Verack,
			Command::Proposal,
			Command::AcceptVote,
			Command::RejectVote,
			Command::Ping,
			Command::Pong,
			Command::Block,
			Command::Inv,
			Command::GetBlock,
			Command::GetBlocks,
			Command::ResponseBlocks,
			Command::RequestConsensus,
			Command::ResponseConsensus,
			Command::RequestProposal,
			Command::IllegalProposals,
			Command::IllegalVotes,
			Command::SidechainIllegalData,
			Command::Tx,
			Command::ResponseInactiveArbitrators,
		];
		for cmd in all {
			assert_eq!(Command::parse(cmd.as_str()).unwrap(), cmd);
		}
	}
}
