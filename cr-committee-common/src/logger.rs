//! Logging bootstrap, carried over from the host chain node's own
//! fern/chrono setup almost unchanged: colored level on stdout, plain level
//! to a rotating file under the node's data directory.

use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::path::{Path, PathBuf};

/// Initialize global logging: `std` is the stdout level, `file` is the
/// level written to `<log_dir>/cr_committee.log`.
pub fn init_logger(log_dir: &Path, std: LevelFilter, file: LevelFilter) {
	let colors = ColoredLevelConfig::new()
		.info(Color::Green)
		.warn(Color::Yellow)
		.error(Color::Red)
		.debug(Color::Blue)
		.trace(Color::Magenta);

	let mut log_path = PathBuf::from(log_dir);
	let _ = std::fs::create_dir_all(&log_path);
	log_path.push("cr_committee.log");

	let result = fern::Dispatch::new()
		.format(move |out, message, record| {
			out.finish(format_args!(
				"{} [{}][{}] {}",
				chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
				record.target(),
				colors.color(record.level()),
				message,
			))
		})
		.chain(
			fern::Dispatch::new()
				.level(file)
				.level_for("cr_committee_core", file)
				.chain(fern::log_file(log_path).expect("failed to open cr_committee.log")),
		)
		.chain(fern::Dispatch::new().level(std).chain(std::io::stdout()))
		.apply();

	if let Err(e) = result {
		// a second call to init_logger (e.g. in tests) hits this; harmless.
		log::debug!("logger already initialized: {}", e);
	}
}
