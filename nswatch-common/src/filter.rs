//! Admission logic run by the probe on every monitored syscall entry.
//!
//! Everything here must stay acceptable to the BPF verifier: loops run a
//! fixed number of iterations over fixed buffers, nothing recurses, and user
//! memory is only touched through [`ProbeEnv`], whose reads report failure
//! instead of faulting. A failed read is never a match.

use crate::config::{FilterConfig, CGROUP_PREFIX_CAP, UNSHARE_ALL};
use crate::event::{fixed_bytes, SyscallEvent, EVENT_LABEL_LEN, TASK_COMM_LEN};

pub const CLONE_NEWNS: u64 = 0x0002_0000;
pub const CLONE_NEWCGROUP: u64 = 0x0200_0000;
pub const CLONE_NEWUTS: u64 = 0x0400_0000;
pub const CLONE_NEWIPC: u64 = 0x0800_0000;
pub const CLONE_NEWUSER: u64 = 0x1000_0000;
pub const CLONE_NEWPID: u64 = 0x2000_0000;
pub const CLONE_NEWNET: u64 = 0x4000_0000;

pub const NAMESPACE_FLAGS: u64 =
	CLONE_NEWNS | CLONE_NEWCGROUP | CLONE_NEWUTS | CLONE_NEWIPC | CLONE_NEWUSER | CLONE_NEWPID | CLONE_NEWNET;

/// Bytes of the path argument copied out of the caller's address space.
pub const PATH_READ_LEN: usize = 128;

/// Tracepoint layout shared by `raw_syscalls/sys_enter` and
/// `syscalls/sys_enter_*`: syscall id at 8, 8-byte argument slots from 16.
pub const TP_SYSCALL_ID_OFFSET: usize = 8;
pub const TP_ARGS_OFFSET: usize = 16;
pub const TP_ARG_SLOT: usize = 8;
pub const MAX_SYSCALL_ARGS: usize = 6;

const LABEL_CLONE: [u8; EVENT_LABEL_LEN] = fixed_bytes(b"clone (new ns)");
const LABEL_CLONE3: [u8; EVENT_LABEL_LEN] = fixed_bytes(b"clone3 (new ns)");
const LABEL_UNSHARE: [u8; EVENT_LABEL_LEN] = fixed_bytes(b"unshare");
const LABEL_MKDIR: [u8; EVENT_LABEL_LEN] = fixed_bytes(b"mkdir (cgroup)");
const LABEL_MKDIRAT: [u8; EVENT_LABEL_LEN] = fixed_bytes(b"mkdirat (cgroup)");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyscallKind {
	Clone,
	Clone3,
	Unshare,
	Mkdir,
	Mkdirat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchRule {
	/// Flags argument intersects [`NAMESPACE_FLAGS`].
	NamespaceFlags,
	/// Argument points at a `struct clone_args`, flags are its first u64.
	NamespaceFlagsIndirect,
	/// Path argument starts with the configured cgroup prefix.
	CgroupPath,
}

impl SyscallKind {
	pub const ALL: [SyscallKind; 5] = [
		SyscallKind::Clone,
		SyscallKind::Clone3,
		SyscallKind::Unshare,
		SyscallKind::Mkdir,
		SyscallKind::Mkdirat,
	];

	/// Position of the inspected argument. `mkdirat` takes the directory fd
	/// first, so its path is argument 1.
	#[inline(always)]
	pub const fn arg_index(self) -> usize {
		match self {
			SyscallKind::Mkdirat => 1,
			_ => 0,
		}
	}

	#[inline(always)]
	pub const fn rule(self) -> MatchRule {
		match self {
			SyscallKind::Clone | SyscallKind::Unshare => MatchRule::NamespaceFlags,
			SyscallKind::Clone3 => MatchRule::NamespaceFlagsIndirect,
			SyscallKind::Mkdir | SyscallKind::Mkdirat => MatchRule::CgroupPath,
		}
	}

	#[inline(always)]
	pub const fn label(self) -> [u8; EVENT_LABEL_LEN] {
		match self {
			SyscallKind::Clone => LABEL_CLONE,
			SyscallKind::Clone3 => LABEL_CLONE3,
			SyscallKind::Unshare => LABEL_UNSHARE,
			SyscallKind::Mkdir => LABEL_MKDIR,
			SyscallKind::Mkdirat => LABEL_MKDIRAT,
		}
	}

	/// Syscall name as used by the `syscalls/sys_enter_<name>` tracepoints.
	pub const fn name(self) -> &'static str {
		match self {
			SyscallKind::Clone => "clone",
			SyscallKind::Clone3 => "clone3",
			SyscallKind::Unshare => "unshare",
			SyscallKind::Mkdir => "mkdir",
			SyscallKind::Mkdirat => "mkdirat",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		SyscallKind::ALL.into_iter().find(|k| k.name() == name)
	}
}

/// What the probe can observe about the current task and syscall.
pub trait ProbeEnv {
	/// Raw value of positional argument `idx`, `None` if it cannot be read.
	fn arg(&self, idx: usize) -> Option<u64>;

	fn current_comm(&self) -> [u8; TASK_COMM_LEN];

	fn pid_tgid(&self) -> u64;

	/// Copies a NUL-terminated string from user memory into `buf`, returning
	/// its length without the NUL. `None` when the address faults.
	fn read_user_str(&self, addr: u64, buf: &mut [u8; PATH_READ_LEN]) -> Option<usize>;

	fn read_user_u64(&self, addr: u64) -> Option<u64>;
}

/// Runs the admission rules for an already classified syscall and builds the
/// record to emit. `None` means rejected, which is the common case.
#[inline(always)]
pub fn evaluate<E: ProbeEnv>(cfg: &FilterConfig, kind: SyscallKind, env: &E) -> Option<SyscallEvent> {
	let comm = env.current_comm();
	if !comm_matches(cfg, &comm) {
		return None;
	}

	let arg = env.arg(kind.arg_index())?;

	let admitted = match kind.rule() {
		MatchRule::NamespaceFlags => {
			(kind == SyscallKind::Unshare && cfg.unshare_policy == UNSHARE_ALL) || creates_namespace(arg)
		}
		MatchRule::NamespaceFlagsIndirect => match env.read_user_u64(arg) {
			Some(flags) => creates_namespace(flags),
			None => false,
		},
		MatchRule::CgroupPath => {
			let mut path = [0u8; PATH_READ_LEN];
			match env.read_user_str(arg, &mut path) {
				Some(len) => has_cgroup_prefix(cfg, &path, len),
				None => false,
			}
		}
	};

	if !admitted {
		return None;
	}

	Some(SyscallEvent::new(env.pid_tgid(), comm, kind.label()))
}

#[inline(always)]
pub fn creates_namespace(flags: u64) -> bool {
	flags & NAMESPACE_FLAGS != 0
}

/// Byte-wise prefix test of the task name against the configured target.
/// Always admits when no target is set.
#[inline(always)]
pub fn comm_matches(cfg: &FilterConfig, comm: &[u8; TASK_COMM_LEN]) -> bool {
	let len = cfg.comm_len as usize;
	let mut i = 0;
	while i < TASK_COMM_LEN {
		if i < len && comm[i] != cfg.comm[i] {
			return false;
		}
		i += 1;
	}
	true
}

/// `path` holds `read_len` bytes copied from user memory. Paths shorter than
/// the prefix never match, whatever sits in the rest of the buffer.
#[inline(always)]
pub fn has_cgroup_prefix(cfg: &FilterConfig, path: &[u8; PATH_READ_LEN], read_len: usize) -> bool {
	let len = cfg.cgroup_prefix_len as usize;
	if len == 0 || len > CGROUP_PREFIX_CAP || read_len < len {
		return false;
	}

	let mut i = 0;
	while i < CGROUP_PREFIX_CAP {
		if i < len && path[i] != cfg.cgroup_prefix[i] {
			return false;
		}
		i += 1;
	}
	true
}

/// Offset of positional argument `idx` inside a syscall-entry tracepoint.
#[inline(always)]
pub const fn tp_arg_offset(idx: usize) -> usize {
	TP_ARGS_OFFSET + idx * TP_ARG_SLOT
}

// region:    --- Tests


// endregion: --- Tests
