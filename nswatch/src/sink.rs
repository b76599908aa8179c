use std::{
	fs::OpenOptions,
	io::{self, Write},
	path::PathBuf,
};

use tracing::warn;

use crate::error::Result;

/// Destination for formatted event lines.
pub trait LogSink: Send {
	/// Writes one complete line. Either the whole line lands or an error is
	/// returned, the sink never keeps a half-written line around.
	fn write_line(&mut self, line: &str) -> Result<()>;
}

/// Appends lines to a log file and mirrors them to the console.
///
/// The file is opened in append mode for each line and closed as soon as the
/// write returns, so no handle outlives a write. The file is the record: a
/// failed console write is logged and does not fail the line.
pub struct FileSink {
	path: PathBuf,
	console: Option<Box<dyn Write + Send>>,
}

impl FileSink {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		FileSink {
			path: path.into(),
			console: Some(Box::new(io::stdout())),
		}
	}

	#[cfg(test)]
	pub fn with_console(mut self, console: impl Write + Send + 'static) -> Self {
		self.console = Some(Box::new(console));
		self
	}

	#[cfg(test)]
	pub fn without_console(mut self) -> Self {
		self.console = None;
		self
	}
}

impl LogSink for FileSink {
	fn write_line(&mut self, line: &str) -> Result<()> {
		let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
		file.write_all(line.as_bytes())?;

		if let Some(console) = self.console.as_mut() {
			if let Err(err) = console.write_all(line.as_bytes()).and_then(|_| console.flush()) {
				warn!("console mirror failed: {err}");
			}
		}

		Ok(())
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use std::sync::{Arc, Mutex};

	/// Console that always fails, like stdout after the reader of a pipe
	/// went away.
	struct BrokenPipe;

	impl Write for BrokenPipe {
		fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
			Err(io::Error::from(io::ErrorKind::BrokenPipe))
		}

		fn flush(&mut self) -> io::Result<()> {
			Err(io::Error::from(io::ErrorKind::BrokenPipe))
		}
	}

	#[derive(Clone, Default)]
	struct SharedConsole(Arc<Mutex<Vec<u8>>>);

	impl Write for SharedConsole {
		fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
			self.0
				.lock()
				.map_err(|_| io::Error::other("console lock poisoned"))?
				.extend_from_slice(buf);
			Ok(buf.len())
		}

		fn flush(&mut self) -> io::Result<()> {
			Ok(())
		}
	}

	#[test]
	fn file_sink_appends_whole_lines() -> Result<()> {
		// -- Setup & Fixtures
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("ebpf_log.txt");
		std::fs::write(&path, "existing line\n")?;
		let mut sink = FileSink::new(&path).without_console();

		// -- Exec
		sink.write_line("first\n")?;
		sink.write_line("second\n")?;

		// -- Check
		let content = std::fs::read_to_string(&path)?;
		assert_eq!(content, "existing line\nfirst\nsecond\n");

		Ok(())
	}

	#[test]
	fn file_sink_creates_missing_file() -> Result<()> {
		// -- Setup & Fixtures
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("new.log");
		let mut sink = FileSink::new(&path).without_console();

		// -- Exec
		sink.write_line("line\n")?;

		// -- Check
		assert_eq!(std::fs::read_to_string(&path)?, "line\n");

		Ok(())
	}

	#[test]
	fn file_sink_keeps_file_when_console_fails() -> Result<()> {
		// -- Setup & Fixtures
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("ebpf_log.txt");
		let mut sink = FileSink::new(&path).with_console(BrokenPipe);

		// -- Exec
		sink.write_line("first\n")?;
		sink.write_line("second\n")?;

		// -- Check
		assert_eq!(std::fs::read_to_string(&path)?, "first\nsecond\n");

		Ok(())
	}

	#[test]
	fn file_sink_mirrors_lines_to_console() -> Result<()> {
		// -- Setup & Fixtures
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("ebpf_log.txt");
		let console = SharedConsole::default();
		let mut sink = FileSink::new(&path).with_console(console.clone());

		// -- Exec
		sink.write_line("line\n")?;

		// -- Check
		let mirrored = console.0.lock().map(|c| c.clone()).map_err(|_| "console lock poisoned")?;
		assert_eq!(mirrored, b"line\n");
		assert_eq!(std::fs::read_to_string(&path)?, "line\n");

		Ok(())
	}

	#[test]
	fn file_sink_reports_unwritable_path() -> Result<()> {
		let dir = tempfile::tempdir()?;
		let mut sink = FileSink::new(dir.path().join("missing").join("x.log")).without_console();
		assert!(sink.write_line("line\n").is_err());
		Ok(())
	}
}

// endregion: --- Tests
