use std::future::Future;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{error::Result, event::NsEvent, sink::LogSink};

/// Where raw event records come from.
pub trait RecordSource: Send {
	/// Waits until records are available and returns them in arrival order.
	/// `Ok(None)` means the source is closed for good.
	fn next_batch(&mut self) -> impl Future<Output = Result<Option<Vec<Vec<u8>>>>> + Send;
}

/// Drains a [`RecordSource`], formats every record and hands the line to a
/// [`LogSink`]. Bad records and failed writes are logged and skipped.
pub struct EventConsumer<S, K> {
	source: S,
	sink: K,
	written: u64,
	failed: u64,
}

impl<S: RecordSource, K: LogSink> EventConsumer<S, K> {
	pub fn new(source: S, sink: K) -> Self {
		EventConsumer {
			source,
			sink,
			written: 0,
			failed: 0,
		}
	}

	/// Runs until `shutdown` is cancelled or the source closes. Cancellation
	/// is only observed while waiting for data, a batch in hand is always
	/// written out in full.
	pub async fn run(mut self, shutdown: CancellationToken) -> Result<()> {
		loop {
			let batch = tokio::select! {
				biased;
				_ = shutdown.cancelled() => break,
				batch = self.source.next_batch() => batch?,
			};

			let Some(batch) = batch else {
				info!("event source closed");
				break;
			};

			for record in &batch {
				self.handle(record);
			}
		}

		info!("event consumer stopped, {} lines written, {} failed", self.written, self.failed);
		Ok(())
	}

	fn handle(&mut self, record: &[u8]) {
		let evt = NsEvent::from_record(record);
		if evt.truncated {
			debug!("short record ({} bytes), missing fields left empty", record.len());
		}

		let line = evt.format_line(&Local::now());
		match self.sink.write_line(&line) {
			Ok(()) => self.written += 1,
			Err(err) => {
				self.failed += 1;
				warn!("failed to write event line: {err}");
			}
		}
	}
}

// region:    --- Tests


// endregion: --- Tests
