use std::path::PathBuf;

use nswatch_common::{
	config::{CGROUP_PREFIX_CAP, COMM_FILTER_MAX},
	FilterConfig, SyscallKind, SyscallTable,
};

use crate::{
	cli::args::{AttachMode, Cli},
	error::{Error, Result},
};

/// Startup settings, validated before anything touches the kernel.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
	pub filter: FilterConfig,
	pub attach: AttachMode,
	pub log_file: PathBuf,
}

impl TryFrom<&Cli> for MonitorConfig {
	type Error = Error;

	fn try_from(cli: &Cli) -> Result<Self> {
		let mut syscalls = SyscallTable::disabled();
		for kind in cli.syscalls.iter().copied().map(SyscallKind::from) {
			if let Some(nr) = native_nr(kind) {
				syscalls.set(kind, nr);
			}
		}
		if SyscallKind::ALL.iter().all(|kind| !syscalls.is_enabled(*kind)) {
			return Err(Error::NoSyscallSelected);
		}

		let prefix = cli.cgroup_prefix.as_bytes();
		let mut filter = FilterConfig::new(syscalls)
			.with_cgroup_prefix(prefix)
			.ok_or(Error::InvalidCgroupPrefix {
				len: prefix.len(),
				max: CGROUP_PREFIX_CAP,
			})?
			.with_unshare_policy(cli.unshare_policy.as_raw());

		if let Some(comm) = cli.comm.as_deref() {
			filter = filter.with_comm(comm.as_bytes()).ok_or(Error::InvalidCommFilter {
				len: comm.len(),
				max: COMM_FILTER_MAX,
			})?;
		}

		Ok(MonitorConfig {
			filter,
			attach: cli.attach,
			log_file: cli.log_file.clone(),
		})
	}
}

impl MonitorConfig {
	/// Kinds with a live dispatch slot, in table order.
	pub fn enabled_syscalls(&self) -> impl Iterator<Item = SyscallKind> + '_ {
		SyscallKind::ALL
			.into_iter()
			.filter(|kind| self.filter.syscalls.is_enabled(*kind))
	}
}

/// Syscall number on the running architecture, `None` when the call does not
/// exist there (aarch64 only has `mkdirat`).
pub fn native_nr(kind: SyscallKind) -> Option<i64> {
	let nr = match kind {
		SyscallKind::Clone => libc::SYS_clone,
		SyscallKind::Clone3 => libc::SYS_clone3,
		SyscallKind::Unshare => libc::SYS_unshare,
		#[cfg(target_arch = "x86_64")]
		SyscallKind::Mkdir => libc::SYS_mkdir,
		#[cfg(not(target_arch = "x86_64"))]
		SyscallKind::Mkdir => return None,
		SyscallKind::Mkdirat => libc::SYS_mkdirat,
	};
	Some(nr as i64)
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	type Result<T> = core::result::Result<T, Box<dyn std::error::Error>>; // For tests.

	use super::*;
	use clap::Parser;
	use nswatch_common::config::{NR_DISABLED, UNSHARE_ALL};

	#[test]
	fn config_from_default_cli() -> Result<()> {
		// -- Setup & Fixtures
		let cli = Cli::try_parse_from(["nswatch"])?;

		// -- Exec
		let cfg = MonitorConfig::try_from(&cli)?;

		// -- Check
		assert_eq!(cfg.filter.cgroup_prefix(), b"/sys/fs/cgroup");
		assert!(cfg.filter.comm_filter().is_none());
		assert_eq!(cfg.filter.syscalls.clone, libc::SYS_clone as i64);
		assert_eq!(cfg.filter.syscalls.mkdirat, libc::SYS_mkdirat as i64);
		assert!(cfg.enabled_syscalls().any(|k| k == SyscallKind::Clone3));

		Ok(())
	}

	#[test]
	fn config_deselected_syscalls_stay_disabled() -> Result<()> {
		// -- Setup & Fixtures
		let cli = Cli::try_parse_from(["nswatch", "--syscalls", "unshare", "--unshare-policy", "all"])?;

		// -- Exec
		let cfg = MonitorConfig::try_from(&cli)?;

		// -- Check
		assert_eq!(cfg.filter.syscalls.clone, NR_DISABLED);
		assert_eq!(cfg.filter.syscalls.mkdirat, NR_DISABLED);
		assert_eq!(cfg.filter.unshare_policy, UNSHARE_ALL);
		assert_eq!(cfg.enabled_syscalls().collect::<Vec<_>>(), vec![SyscallKind::Unshare]);

		Ok(())
	}

	#[test]
	fn config_rejects_oversized_prefix() -> Result<()> {
		// -- Setup & Fixtures
		let prefix = format!("/sys/fs/cgroup/{}", "x".repeat(CGROUP_PREFIX_CAP));
		let cli = Cli::try_parse_from(["nswatch", "--cgroup-prefix", prefix.as_str()])?;

		// -- Exec
		let res = MonitorConfig::try_from(&cli);

		// -- Check
		assert!(matches!(res, Err(Error::InvalidCgroupPrefix { max: CGROUP_PREFIX_CAP, .. })));

		Ok(())
	}

	#[test]
	fn config_rejects_bad_comm_filter() -> Result<()> {
		// -- Setup & Fixtures
		let long = Cli::try_parse_from(["nswatch", "--comm", "a-very-long-task-name"])?;
		let empty = Cli::try_parse_from(["nswatch", "--comm", ""])?;

		// -- Exec & Check
		assert!(matches!(
			MonitorConfig::try_from(&long),
			Err(Error::InvalidCommFilter { len: 21, .. })
		));
		assert!(matches!(
			MonitorConfig::try_from(&empty),
			Err(Error::InvalidCommFilter { len: 0, .. })
		));

		Ok(())
	}

	#[cfg(not(target_arch = "x86_64"))]
	#[test]
	fn config_mkdir_only_is_unavailable() -> Result<()> {
		let cli = Cli::try_parse_from(["nswatch", "--syscalls", "mkdir"])?;
		assert!(matches!(MonitorConfig::try_from(&cli), Err(Error::NoSyscallSelected)));
		Ok(())
	}
}

// endregion: --- Tests
