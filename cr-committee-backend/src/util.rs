//! Filesystem helpers shared by the checkpoint and peer-list stores.

use std::path::PathBuf;

use crate::error::Result;

/// Get the path to a local directory where this node can save CR committee
/// data, following the same per-platform convention the host chain node
/// uses for its own data directory.
///
/// Platform | Value | Example
/// -- | -- | --
/// Linux | `$XDG_DATA_HOME` or `$HOME/.local/share/cr_committee` | `/home/alice/.local/share/cr_committee/`
/// macOS | `$HOME/Library/Application Support/cr_committee` | `/Users/Alice/Library/Application Support/cr_committee/`
/// Windows | `{FOLDERID_LocalAppData}\cr_committee` | `C:\Users\Alice\AppData\Local\cr_committee`
pub fn default_data_dir() -> Result<PathBuf> {
	let base_dirs = dirs::BaseDirs::new().ok_or_else(|| {
		std::io::Error::new(std::io::ErrorKind::NotFound, "could not resolve a home directory")
	})?;
	let mut path = base_dirs.data_local_dir().to_path_buf();
	path.push("cr_committee");
	Ok(path)
}

pub(crate) fn ensure_dir(path: &std::path::Path) -> Result<()> {
	std::fs::create_dir_all(path)?;
	Ok(())
}
