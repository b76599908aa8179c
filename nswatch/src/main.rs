// region:    --- Modules
mod cli;
mod config;
mod error;
mod event;
mod sink;
mod supervisor;
mod workers;
// endregion: --- Modules

use crate::{
	cli::args::{AttachMode, Cli},
	config::MonitorConfig,
	sink::FileSink,
	supervisor::{install_signal_handlers, Supervisor},
	workers::{DropCounter, EventConsumer, RingBufSource},
};

pub use self::error::{Error, Result};
use aya::{maps::Array, programs::TracePoint, Ebpf};
use clap::Parser;
use nswatch_common::{FilterConfig, SyscallKind};
use tracing_subscriber::EnvFilter;
#[rustfmt::skip]
use tracing::{debug, info, warn};

const FILTER_CFG_MAP: &str = "FILTER_CFG";
const GENERIC_PROGRAM: &str = "sys_enter";

#[tokio::main]
async fn main() -> Result<()> {
	let args = Cli::parse();
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_target(false)
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let config = MonitorConfig::try_from(&args)?;

	// Bump the memlock rlimit. This is needed for older kernels that don't use the
	// new memcg based accounting, see https://lwn.net/Articles/837122/
	let rlim = libc::rlimit {
		rlim_cur: libc::RLIM_INFINITY,
		rlim_max: libc::RLIM_INFINITY,
	};
	let ret = unsafe { libc::setrlimit(libc::RLIMIT_MEMLOCK, &rlim) };
	if ret != 0 {
		debug!("remove limit on locked memory failed, ret is: {ret}");
	}

	let mut ebpf = aya::Ebpf::load(aya::include_bytes_aligned!(concat!(env!("OUT_DIR"), "/nswatch")))?;
	if let Err(e) = aya_log::EbpfLogger::init(&mut ebpf) {
		// This can happen if you remove all log statements from your eBPF program.
		warn!("failed to initialize eBPF logger: {e}");
	}

	install_filter(&mut ebpf, &config.filter)?;
	load_hooks(&mut ebpf, &config)?;
	let source = RingBufSource::new(&mut ebpf)?;
	let drops = DropCounter::new(&mut ebpf)?;

	let mut supervisor = Supervisor::new();
	install_signal_handlers(supervisor.token())?;

	info!("Starting eBPF monitoring... Press Ctrl+C to exit.");
	let token = supervisor.token();
	let consumer = EventConsumer::new(source, FileSink::new(&config.log_file));
	supervisor.spawn(consumer.run(token.clone()));

	token.cancelled().await;

	supervisor.shutdown().await?;

	match drops.total() {
		Ok(0) => (),
		Ok(n) => warn!("{n} events dropped, the ring buffer was full"),
		Err(e) => debug!("could not read drop counter: {e}"),
	}

	Ok(())
}

/// Writes the filter settings into the probe's config map. Must run before
/// any program is attached, probes emit nothing without it.
fn install_filter(ebpf: &mut Ebpf, filter: &FilterConfig) -> Result<()> {
	let mut cfg_map: Array<_, FilterConfig> = Array::try_from(
		ebpf.map_mut(FILTER_CFG_MAP)
			.ok_or(Error::EbpfMapNotFound(FILTER_CFG_MAP))?,
	)?;
	cfg_map.set(0, *filter, 0)?;
	Ok(())
}

pub fn load_hooks(ebpf: &mut Ebpf, config: &MonitorConfig) -> Result<()> {
	match config.attach {
		AttachMode::Generic => {
			let sys_enter: &mut TracePoint = ebpf
				.program_mut(GENERIC_PROGRAM)
				.ok_or(Error::EbpfProgNotFound(GENERIC_PROGRAM))?
				.try_into()?;
			sys_enter.load()?;
			sys_enter.attach("raw_syscalls", "sys_enter")?;
			info!("attached raw_syscalls/sys_enter");
		}

		AttachMode::PerSyscall => {
			for kind in config.enabled_syscalls() {
				let program = per_syscall_program(kind);
				let tp: &mut TracePoint = ebpf
					.program_mut(program)
					.ok_or(Error::EbpfProgNotFound(program))?
					.try_into()?;
				tp.load()?;
				tp.attach("syscalls", program)?;
				info!("attached syscalls/{program}");
			}
		}
	}

	Ok(())
}

/// Program name in the eBPF object, identical to the tracepoint name.
fn per_syscall_program(kind: SyscallKind) -> &'static str {
	match kind {
		SyscallKind::Clone => "sys_enter_clone",
		SyscallKind::Clone3 => "sys_enter_clone3",
		SyscallKind::Unshare => "sys_enter_unshare",
		SyscallKind::Mkdir => "sys_enter_mkdir",
		SyscallKind::Mkdirat => "sys_enter_mkdirat",
	}
}

// region:    --- Tests


// endregion: --- Tests
