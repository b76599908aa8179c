use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use nswatch_common::config::{DEFAULT_CGROUP_PREFIX, UNSHARE_ALL, UNSHARE_NAMESPACES_ONLY};
use nswatch_common::SyscallKind;

#[derive(Parser, Debug)]
#[command(name = "nswatch", about = "Logs namespace and cgroup creation on this host")]
pub struct Cli {
	#[arg(long, default_value = "ebpf_log.txt")]
	pub log_file: PathBuf,

	#[arg(long, default_value = DEFAULT_CGROUP_PREFIX, help = "mkdir/mkdirat paths starting with this are reported")]
	pub cgroup_prefix: String,

	#[arg(long, help = "Only report syscalls made by tasks whose name starts with this")]
	pub comm: Option<String>,

	#[arg(long, value_enum, default_value = "namespaces")]
	pub unshare_policy: UnsharePolicy,

	#[arg(long, value_enum, default_value = "generic")]
	pub attach: AttachMode,

	#[arg(
		long,
		value_enum,
		value_delimiter = ',',
		default_values = ["clone", "clone3", "unshare", "mkdir", "mkdirat"]
	)]
	pub syscalls: Vec<MonitoredSyscall>,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum AttachMode {
	/// One program on raw_syscalls/sys_enter, dispatched on the syscall id.
	/// Also sees 32-bit compat tasks, whose ids follow the compat table.
	Generic,
	/// One program per syscall on syscalls/sys_enter_<name>.
	PerSyscall,
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum UnsharePolicy {
	/// Only unshare calls that create at least one namespace.
	Namespaces,
	/// Every unshare call.
	All,
}

impl UnsharePolicy {
	pub fn as_raw(self) -> u8 {
		match self {
			UnsharePolicy::Namespaces => UNSHARE_NAMESPACES_ONLY,
			UnsharePolicy::All => UNSHARE_ALL,
		}
	}
}

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum MonitoredSyscall {
	Clone,
	Clone3,
	Unshare,
	Mkdir,
	Mkdirat,
}

impl From<MonitoredSyscall> for SyscallKind {
	fn from(val: MonitoredSyscall) -> Self {
		match val {
			MonitoredSyscall::Clone => SyscallKind::Clone,
			MonitoredSyscall::Clone3 => SyscallKind::Clone3,
			MonitoredSyscall::Unshare => SyscallKind::Unshare,
			MonitoredSyscall::Mkdir => SyscallKind::Mkdir,
			MonitoredSyscall::Mkdirat => SyscallKind::Mkdirat,
		}
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;

	#[test]
	fn cli_defaults() -> Result<()> {
		// -- Exec
		let cli = Cli::try_parse_from(["nswatch"])?;

		// -- Check
		assert_eq!(cli.log_file, PathBuf::from("ebpf_log.txt"));
		assert_eq!(cli.cgroup_prefix, "/sys/fs/cgroup");
		assert_eq!(cli.comm, None);
		assert_eq!(cli.unshare_policy, UnsharePolicy::Namespaces);
		assert_eq!(cli.attach, AttachMode::Generic);
		assert_eq!(cli.syscalls.len(), 5);

		Ok(())
	}

	#[test]
	fn cli_syscall_list_and_modes() -> Result<()> {
		// -- Exec
		let cli = Cli::try_parse_from([
			"nswatch",
			"--syscalls",
			"clone,mkdirat",
			"--attach",
			"per-syscall",
			"--unshare-policy",
			"all",
			"--comm",
			"my_runner",
		])?;

		// -- Check
		assert_eq!(cli.syscalls, vec![MonitoredSyscall::Clone, MonitoredSyscall::Mkdirat]);
		assert_eq!(cli.attach, AttachMode::PerSyscall);
		assert_eq!(cli.unshare_policy.as_raw(), UNSHARE_ALL);
		assert_eq!(cli.comm.as_deref(), Some("my_runner"));

		Ok(())
	}

	#[test]
	fn cli_rejects_unknown_syscall() -> Result<()> {
		let res = Cli::try_parse_from(["nswatch", "--syscalls", "execve"]);
		assert!(res.is_err());
		Ok(())
	}
}

// endregion: --- Tests
