use std::future::Future;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::Result;

pub struct Supervisor {
	pub shutdown: CancellationToken,
	pub tasks: JoinSet<Result<()>>,
}

impl Supervisor {
	pub fn new() -> Self {
		Self {
			shutdown: CancellationToken::new(),
			tasks: JoinSet::new(),
		}
	}

	pub fn token(&self) -> CancellationToken {
		self.shutdown.clone()
	}

	/// Spawns a task. A task that fails cancels everything else, so the
	/// process never keeps waiting on a dead worker.
	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = Result<()>> + Send + 'static,
	{
		let token = self.token();
		self.tasks.spawn(async move {
			let res = fut.await;
			if let Err(err) = &res {
				error!("task failed: {err}");
				token.cancel();
			}
			res
		});
	}

	pub async fn shutdown(mut self) -> Result<()> {
		info!("Supervisor shutdown starting");
		self.shutdown.cancel();

		while let Some(res) = self.tasks.join_next().await {
			res??;
		}
		info!("Supervisor shutdown complete");

		Ok(())
	}
}

/// Cancels `token` on SIGINT or SIGTERM.
pub fn install_signal_handlers(token: CancellationToken) -> Result<()> {
	use tokio::signal::unix::{signal, SignalKind};

	let mut sigint = signal(SignalKind::interrupt())?;
	let mut sigterm = signal(SignalKind::terminate())?;

	tokio::spawn(async move {
		tokio::select! {
			_ = sigint.recv() => info!("interrupt received, shutting down"),
			_ = sigterm.recv() => info!("terminate received, shutting down"),
			_ = token.cancelled() => return,
		}
		token.cancel();
	});

	Ok(())
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use crate::Error;

	#[tokio::test]
	async fn failing_task_cancels_the_others() -> Result<()> {
		// -- Setup & Fixtures
		let mut supervisor = Supervisor::new();
		let token = supervisor.token();

		// -- Exec
		supervisor.spawn(async move {
			token.cancelled().await;
			Ok(())
		});
		supervisor.spawn(async { Err(Error::custom("boom")) });
		supervisor.token().cancelled().await;
		let res = supervisor.shutdown().await;

		// -- Check
		assert!(matches!(res, Err(Error::Custom(msg)) if msg == "boom"));

		Ok(())
	}

	#[tokio::test]
	async fn shutdown_joins_cooperative_tasks() -> Result<()> {
		// -- Setup & Fixtures
		let mut supervisor = Supervisor::new();
		let token = supervisor.token();
		supervisor.spawn(async move {
			token.cancelled().await;
			Ok(())
		});

		// -- Exec & Check
		supervisor.shutdown().await?;

		Ok(())
	}
}

// endregion: --- Tests
