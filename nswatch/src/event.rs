use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use nswatch_common::{event::SYSCALL_EVENT_SIZE, SyscallEvent};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A ring buffer record decoded for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsEvent {
	pub pid: u32,
	pub comm: Arc<str>,
	pub label: Arc<str>,
	/// The raw record was shorter than the wire layout and got zero padded.
	pub truncated: bool,
}

impl NsEvent {
	pub fn from_record(data: &[u8]) -> Self {
		let raw = SyscallEvent::decode(data);
		NsEvent {
			pid: raw.pid,
			comm: Arc::from(String::from_utf8_lossy(raw.comm_bytes())),
			label: Arc::from(String::from_utf8_lossy(raw.label_bytes())),
			truncated: data.len() < SYSCALL_EVENT_SIZE,
		}
	}

	/// One log line, newline included:
	/// `YYYY-MM-DD HH:MM:SS | PID: <pid> | COMM: <comm> | SYSCALL: <label>`.
	pub fn format_line<Tz>(&self, at: &DateTime<Tz>) -> String
	where
		Tz: TimeZone,
		Tz::Offset: std::fmt::Display,
	{
		format!(
			"{} | PID: {:<7} | COMM: {:<15} | SYSCALL: {}\n",
			at.format(TIMESTAMP_FORMAT),
			self.pid,
			self.comm,
			self.label
		)
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use chrono::{NaiveDate, Utc};
	use nswatch_common::event::fixed_bytes;
	use zerocopy::IntoBytes;

	fn fx_time() -> Result<DateTime<Utc>> {
		let naive = NaiveDate::from_ymd_opt(2025, 3, 7)
			.and_then(|d| d.and_hms_opt(9, 4, 5))
			.ok_or("bad fixture date")?;
		Ok(naive.and_utc())
	}

	fn fx_record(pid_tgid: u64, comm: &[u8], label: &[u8]) -> SyscallEvent {
		SyscallEvent::new(pid_tgid, fixed_bytes(comm), fixed_bytes(label))
	}

	#[test]
	fn format_line_pads_pid_and_comm() -> Result<()> {
		// -- Setup & Fixtures
		let record = fx_record(4321 << 32, b"worker", b"clone (new ns)");
		let evt = NsEvent::from_record(record.as_bytes());

		// -- Exec
		let line = evt.format_line(&fx_time()?);

		// -- Check
		assert_eq!(
			line,
			"2025-03-07 09:04:05 | PID: 4321    | COMM: worker          | SYSCALL: clone (new ns)\n"
		);

		Ok(())
	}

	#[test]
	fn format_line_keeps_long_fields_whole() -> Result<()> {
		// -- Setup & Fixtures
		let record = fx_record(12345678 << 32, b"abcdefghijklmnop", b"mkdirat (cgroup)");
		let evt = NsEvent::from_record(record.as_bytes());

		// -- Exec
		let line = evt.format_line(&fx_time()?);

		// -- Check
		assert!(line.contains("| PID: 12345678 |"));
		assert!(line.contains("| COMM: abcdefghijklmnop |"));
		assert!(line.ends_with("SYSCALL: mkdirat (cgroup)\n"));

		Ok(())
	}

	#[test]
	fn from_record_flags_truncation() -> Result<()> {
		// -- Setup & Fixtures
		let record = fx_record(7 << 32, b"runc", b"unshare");
		let bytes = record.as_bytes();

		// -- Exec
		let full = NsEvent::from_record(bytes);
		let short = NsEvent::from_record(&bytes[..10]);

		// -- Check
		assert!(!full.truncated);
		assert_eq!(&*full.label, "unshare");
		assert!(short.truncated);
		assert_eq!(short.pid, 7);
		assert_eq!(&*short.comm, "runc");
		assert_eq!(&*short.label, "");

		Ok(())
	}

	#[test]
	fn from_record_replaces_invalid_utf8() -> Result<()> {
		let record = fx_record(1 << 32, &[0xff, b'x'], b"unshare");
		let evt = NsEvent::from_record(record.as_bytes());
		assert_eq!(&*evt.comm, "\u{fffd}x");
		Ok(())
	}
}

// endregion: --- Tests
