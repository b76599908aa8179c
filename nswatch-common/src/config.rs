use crate::event::TASK_COMM_LEN;
use crate::filter::SyscallKind;

pub const CGROUP_PREFIX_CAP: usize = 64;
pub const DEFAULT_CGROUP_PREFIX: &str = "/sys/fs/cgroup";

/// Longest usable process-name filter, the kernel keeps one byte for the NUL.
pub const COMM_FILTER_MAX: usize = TASK_COMM_LEN - 1;

/// Marks a dispatch slot as not monitored.
pub const NR_DISABLED: i64 = -1;

pub const UNSHARE_NAMESPACES_ONLY: u8 = 0;
pub const UNSHARE_ALL: u8 = 1;

/// Syscall numbers for the monitored calls, resolved on the user side since
/// the BPF target has no notion of the host ABI.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyscallTable {
	pub clone: i64,
	pub clone3: i64,
	pub unshare: i64,
	pub mkdir: i64,
	pub mkdirat: i64,
}

impl SyscallTable {
	pub const fn disabled() -> Self {
		SyscallTable {
			clone: NR_DISABLED,
			clone3: NR_DISABLED,
			unshare: NR_DISABLED,
			mkdir: NR_DISABLED,
			mkdirat: NR_DISABLED,
		}
	}

	/// Maps a raw syscall id to a monitored kind. Negative ids never match.
	#[inline(always)]
	pub fn classify(&self, id: i64) -> Option<SyscallKind> {
		if id < 0 {
			return None;
		}
		if id == self.clone {
			Some(SyscallKind::Clone)
		} else if id == self.clone3 {
			Some(SyscallKind::Clone3)
		} else if id == self.unshare {
			Some(SyscallKind::Unshare)
		} else if id == self.mkdir {
			Some(SyscallKind::Mkdir)
		} else if id == self.mkdirat {
			Some(SyscallKind::Mkdirat)
		} else {
			None
		}
	}

	pub fn nr(&self, kind: SyscallKind) -> i64 {
		match kind {
			SyscallKind::Clone => self.clone,
			SyscallKind::Clone3 => self.clone3,
			SyscallKind::Unshare => self.unshare,
			SyscallKind::Mkdir => self.mkdir,
			SyscallKind::Mkdirat => self.mkdirat,
		}
	}

	pub fn set(&mut self, kind: SyscallKind, nr: i64) {
		let slot = match kind {
			SyscallKind::Clone => &mut self.clone,
			SyscallKind::Clone3 => &mut self.clone3,
			SyscallKind::Unshare => &mut self.unshare,
			SyscallKind::Mkdir => &mut self.mkdir,
			SyscallKind::Mkdirat => &mut self.mkdirat,
		};
		*slot = nr;
	}

	pub fn is_enabled(&self, kind: SyscallKind) -> bool {
		self.nr(kind) >= 0
	}
}

/// Filter settings shared with the probe through a single-slot array map.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct FilterConfig {
	pub syscalls: SyscallTable,
	pub cgroup_prefix: [u8; CGROUP_PREFIX_CAP],
	pub comm: [u8; TASK_COMM_LEN],
	pub cgroup_prefix_len: u8,
	/// 0 disables the process-name filter.
	pub comm_len: u8,
	pub unshare_policy: u8,
	pub _pad0: [u8; 5],
}

const _: () = assert!(core::mem::size_of::<FilterConfig>() == 128);

#[cfg(feature = "user")]
unsafe impl aya::Pod for FilterConfig {}

impl FilterConfig {
	/// Every slot disabled, default prefix, no name filter.
	pub const fn new(syscalls: SyscallTable) -> Self {
		FilterConfig {
			syscalls,
			cgroup_prefix: crate::event::fixed_bytes(DEFAULT_CGROUP_PREFIX.as_bytes()),
			comm: [0u8; TASK_COMM_LEN],
			cgroup_prefix_len: DEFAULT_CGROUP_PREFIX.len() as u8,
			comm_len: 0,
			unshare_policy: UNSHARE_NAMESPACES_ONLY,
			_pad0: [0u8; 5],
		}
	}

	/// Returns `None` when the prefix is empty or does not fit the fixed buffer.
	pub fn with_cgroup_prefix(mut self, prefix: &[u8]) -> Option<Self> {
		if prefix.is_empty() || prefix.len() > CGROUP_PREFIX_CAP {
			return None;
		}
		self.cgroup_prefix = crate::event::fixed_bytes(prefix);
		self.cgroup_prefix_len = prefix.len() as u8;
		Some(self)
	}

	/// Returns `None` when the name is empty or longer than [`COMM_FILTER_MAX`].
	pub fn with_comm(mut self, comm: &[u8]) -> Option<Self> {
		if comm.is_empty() || comm.len() > COMM_FILTER_MAX {
			return None;
		}
		self.comm = crate::event::fixed_bytes(comm);
		self.comm_len = comm.len() as u8;
		Some(self)
	}

	pub fn with_unshare_policy(mut self, policy: u8) -> Self {
		self.unshare_policy = policy;
		self
	}

	pub fn cgroup_prefix(&self) -> &[u8] {
		let len = (self.cgroup_prefix_len as usize).min(CGROUP_PREFIX_CAP);
		&self.cgroup_prefix[..len]
	}

	pub fn comm_filter(&self) -> Option<&[u8]> {
		match self.comm_len as usize {
			0 => None,
			len => Some(&self.comm[..len.min(TASK_COMM_LEN)]),
		}
	}
}

// region:    --- Tests


// endregion: --- Tests
