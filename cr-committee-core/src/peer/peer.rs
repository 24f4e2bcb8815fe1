//! One connected arbiter peer: a blocking `TcpStream` split into a reader
//! thread and a writer thread fed by a bounded outbound queue (spec §4.8,
//! §5). The channel primitive (`flume`) is the same one the workspace's
//! actor mailboxes are built on, used here directly without an actor trait
//! on top (spec §9, "Ambient singletons" / SPEC_FULL §5).

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cr_committee_common::{EngineError, NodePublicKey, Result};

use super::message::{Command, MessageHeader, HEADER_LEN};

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);
pub const NEGOTIATE_TIMEOUT: Duration = Duration::from_secs(5);
pub const OUTBOUND_QUEUE_CAPACITY: usize = 10_000;
pub const MAGIC: u32 = 0xE1A5_0001;

/// One outbound wire message queued for the writer thread.
pub struct OutboundMessage {
	pub command: Command,
	pub payload: Vec<u8>,
}

/// A typed callback invoked by the reader thread for each decoded inbound
/// message (spec §4.8's "invokes a typed listener").
pub trait MessageListener: Send + Sync {
	fn on_message(&self, peer: &NodePublicKey, command: Command, payload: &[u8]);
	fn on_disconnect(&self, peer: &NodePublicKey);
}

pub struct Peer {
	pub public_key: NodePublicKey,
	pub addr: String,
	outbound: flume::Sender<OutboundMessage>,
	alive: Arc<AtomicBool>,
	_reader: jod_thread::JoinHandle<()>,
	_writer: jod_thread::JoinHandle<()>,
}

impl Peer {
	/// Wrap an already-connected stream, spawning the reader/writer
	/// threads. The version handshake (spec §6: `version -> verack`, with
	/// the inbound side proving key ownership via a signed nonce) is the
	/// caller's responsibility before constructing a `Peer` — by this
	/// point the peer's identity is already known.
	pub fn spawn(public_key: NodePublicKey, addr: String, stream: TcpStream, listener: Arc<dyn MessageListener>) -> Result<Self> {
		stream.set_nodelay(true).map_err(EngineError::Io)?;
		stream.set_read_timeout(Some(IDLE_TIMEOUT)).map_err(EngineError::Io)?;
		stream.set_write_timeout(Some(WRITE_TIMEOUT)).map_err(EngineError::Io)?;

		let (tx, rx) = flume::bounded::<OutboundMessage>(OUTBOUND_QUEUE_CAPACITY);
		let alive = Arc::new(AtomicBool::new(true));

		let reader_stream = stream.try_clone().map_err(EngineError::Io)?;
		let reader_key = public_key;
		let reader_alive = alive.clone();
		let reader = jod_thread::spawn(move || {
			read_loop(reader_stream, reader_key, listener, reader_alive);
		});

		let writer_stream = stream;
		let writer_alive = alive.clone();
		let writer = jod_thread::spawn(move || {
			write_loop(writer_stream, rx, writer_alive);
		});

		Ok(Peer { public_key, addr, outbound: tx, alive, _reader: reader, _writer: writer })
	}

	pub fn is_alive(&self) -> bool {
		self.alive.load(Ordering::Relaxed)
	}

	/// Enqueue a message for the writer thread. Fails with
	/// `EngineError::PeerDisconnected` if the connection already tore down
	/// or the bounded queue is full.
	pub fn send(&self, command: Command, payload: Vec<u8>) -> Result<()> {
		if !self.is_alive() {
			return Err(EngineError::PeerDisconnected);
		}
		self.outbound.try_send(OutboundMessage { command, payload }).map_err(|_| EngineError::PeerDisconnected)
	}
}

fn read_loop(mut stream: TcpStream, key: NodePublicKey, listener: Arc<dyn MessageListener>, alive: Arc<AtomicBool>) {
	loop {
		let mut header_buf = [0u8; HEADER_LEN];
		if stream.read_exact(&mut header_buf).is_err() {
			break;
		}
		let header = match MessageHeader::read_from(&mut &header_buf[..]) {
			Ok(h) => h,
			Err(_) => break,
		};
		let mut payload = vec![0u8; header.length as usize];
		if stream.read_exact(&mut payload).is_err() {
			break;
		}
		if !header.verify_checksum(&payload) {
			continue;
		}
		match Command::parse(&header.command_str()) {
			Ok(command) => listener.on_message(&key, command, &payload),
			// Unknown commands are rejected at decode but do not drop the
			// connection, matching the original's default-arm decode error
			// (spec §4.8).
			Err(EngineError::UnsupportedMessage(_)) => continue,
			Err(_) => continue,
		}
	}
	alive.store(false, Ordering::Relaxed);
	listener.on_disconnect(&key);
	let _ = stream.shutdown(Shutdown::Both);
}

fn write_loop(mut stream: TcpStream, rx: flume::Receiver<OutboundMessage>, alive: Arc<AtomicBool>) {
	while let Ok(msg) = rx.recv() {
		if !alive.load(Ordering::Relaxed) {
			break;
		}
		let header = MessageHeader::new(MAGIC, msg.command.as_str(), &msg.payload);
		if header.write_to(&mut stream).is_err() {
			break;
		}
		if stream.write_all(&msg.payload).is_err() {
			break;
		}
	}
	alive.store(false, Ordering::Relaxed);
	let _ = stream.shutdown(Shutdown::Both);
}
