//! On-disk checkpoint storage: one length-prefixed binary file per height
//! under `<data_dir>/checkpoints/<height>.dat`.
//!
//! The record layout is `[4-byte length][4-byte crc32][bincode payload]`.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{BackendError, Result};
use crate::util::ensure_dir;

pub struct CheckpointStore {
	dir: PathBuf,
}

impl CheckpointStore {
	/// Open (creating if necessary) the checkpoint directory under
	/// `data_dir`.
	pub fn open(data_dir: &Path) -> Result<Self> {
		let dir = data_dir.join("checkpoints");
		ensure_dir(&dir)?;
		Ok(Self { dir })
	}

	fn path_for(&self, height: u32) -> PathBuf {
		self.dir.join(format!("{:010}.dat", height))
	}

	/// Persist `value` as the checkpoint at `height`, overwriting any
	/// existing file at that height.
	pub fn store<T: Serialize>(&self, height: u32, value: &T) -> Result<()> {
		let payload = bincode::serialize(value)
			.map_err(|e| BackendError::CorruptCheckpoint(height, e.to_string()))?;
		let checksum = crc32fast::hash(&payload);

		let tmp_path = self.path_for(height).with_extension("dat.tmp");
		{
			let mut file = fs::File::create(&tmp_path)?;
			file.write_u32::<LittleEndian>(payload.len() as u32)?;
			file.write_u32::<LittleEndian>(checksum)?;
			file.write_all(&payload)?;
			file.sync_all()?;
		}
		fs::rename(&tmp_path, self.path_for(height))?;
		Ok(())
	}

	/// Load the checkpoint stored at exactly `height`, if present.
	pub fn load<T: DeserializeOwned>(&self, height: u32) -> Result<Option<T>> {
		let path = self.path_for(height);
		if !path.exists() {
			return Ok(None);
		}
		let mut file = fs::File::open(&path)?;
		let len = file.read_u32::<LittleEndian>()?;
		let checksum = file.read_u32::<LittleEndian>()?;
		let mut payload = vec![0u8; len as usize];
		file.read_exact(&mut payload)?;
		if crc32fast::hash(&payload) != checksum {
			return Err(BackendError::CorruptCheckpoint(height, "checksum mismatch".into()));
		}
		let value = bincode::deserialize(&payload)
			.map_err(|e| BackendError::CorruptCheckpoint(height, e.to_string()))?;
		Ok(Some(value))
	}

	/// Heights of every checkpoint currently on disk, ascending.
	pub fn heights(&self) -> Result<Vec<u32>> {
		let mut heights = Vec::new();
		for entry in fs::read_dir(&self.dir)? {
			let entry = entry?;
			let name = entry.file_name();
			let name = name.to_string_lossy();
			if let Some(stem) = name.strip_suffix(".dat") {
				if let Ok(h) = stem.parse::<u32>() {
					heights.push(h);
				}
			}
		}
		heights.sort_unstable();
		Ok(heights)
	}

	/// Greatest on-disk checkpoint height `<= height`, if any.
	pub fn greatest_at_or_below<T: DeserializeOwned>(&self, height: u32) -> Result<Option<(u32, T)>> {
		let heights = self.heights()?;
		let found = heights.into_iter().rev().find(|h| *h <= height);
		match found {
			Some(h) => Ok(self.load(h)?.map(|v| (h, v))),
			None => Ok(None),
		}
	}

	/// Remove checkpoints strictly above `height` (used after a deep
	/// rollback, so stale future checkpoints don't linger on disk).
	pub fn prune_above(&self, height: u32) -> Result<()> {
		for h in self.heights()? {
			if h > height {
				let _ = fs::remove_file(self.path_for(h));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use serde::Deserialize;

	#[derive(Serialize, Deserialize, PartialEq, Debug)]
	struct Frame {
		a: u32,
		b: String,
	}

	#[test]
	fn store_and_load_roundtrip() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::open(dir.path()).unwrap();
		let frame = Frame { a: 7, b: "hi".into() };
		store.store(100, &frame).unwrap();
		let loaded: Frame = store.load(100).unwrap().unwrap();
		assert_eq!(loaded, frame);
	}

	#[test]
	fn greatest_at_or_below_picks_nearest() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::open(dir.path()).unwrap();
		store.store(100, &Frame { a: 1, b: "a".into() }).unwrap();
		store.store(200, &Frame { a: 2, b: "b".into() }).unwrap();
		let (h, f): (u32, Frame) = store.greatest_at_or_below(150).unwrap().unwrap();
		assert_eq!(h, 100);
		assert_eq!(f.a, 1);
	}

	#[test]
	fn missing_checkpoint_is_none() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::open(dir.path()).unwrap();
		assert!(store.greatest_at_or_below::<Frame>(50).unwrap().is_none());
	}

	#[test]
	fn prune_above_removes_future_checkpoints() {
		let dir = tempfile::tempdir().unwrap();
		let store = CheckpointStore::open(dir.path()).unwrap();
		store.store(100, &Frame { a: 1, b: "a".into() }).unwrap();
		store.store(200, &Frame { a: 2, b: "b".into() }).unwrap();
		store.prune_above(100).unwrap();
		assert_eq!(store.heights().unwrap(), vec![100]);
	}
}
