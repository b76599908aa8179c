use aya_ebpf::{
	helpers::{bpf_get_current_comm, bpf_get_current_pid_tgid, bpf_probe_read_user, bpf_probe_read_user_str_bytes},
	programs::TracePointContext,
};
use nswatch_common::{
	event::TASK_COMM_LEN,
	filter::{tp_arg_offset, MAX_SYSCALL_ARGS, PATH_READ_LEN},
	ProbeEnv,
};

use crate::DROPPED;

macro_rules! try_read {
	($ctx:expr, $offset:expr) => {
		match $ctx.read_at($offset) {
			Ok(val) => val,
			Err(_) => return Err(1),
		}
	};
}

pub(crate) use try_read;

/// Probe view of a syscall-entry tracepoint.
pub struct TracepointEnv<'a> {
	ctx: &'a TracePointContext,
}

impl<'a> TracepointEnv<'a> {
	pub fn new(ctx: &'a TracePointContext) -> Self {
		TracepointEnv { ctx }
	}
}

impl ProbeEnv for TracepointEnv<'_> {
	#[inline(always)]
	fn arg(&self, idx: usize) -> Option<u64> {
		if idx >= MAX_SYSCALL_ARGS {
			return None;
		}
		unsafe { self.ctx.read_at::<u64>(tp_arg_offset(idx)) }.ok()
	}

	#[inline(always)]
	fn current_comm(&self) -> [u8; TASK_COMM_LEN] {
		bpf_get_current_comm().unwrap_or([0u8; TASK_COMM_LEN])
	}

	#[inline(always)]
	fn pid_tgid(&self) -> u64 {
		bpf_get_current_pid_tgid()
	}

	#[inline(always)]
	fn read_user_str(&self, addr: u64, buf: &mut [u8; PATH_READ_LEN]) -> Option<usize> {
		match unsafe { bpf_probe_read_user_str_bytes(addr as *const u8, buf) } {
			Ok(bytes) => Some(bytes.len()),
			Err(_) => None,
		}
	}

	#[inline(always)]
	fn read_user_u64(&self, addr: u64) -> Option<u64> {
		unsafe { bpf_probe_read_user(addr as *const u64) }.ok()
	}
}

/// Counts an event the ring buffer had no room for.
#[inline(always)]
pub fn count_drop() {
	if let Some(slot) = DROPPED.get_ptr_mut(0) {
		unsafe { *slot += 1 };
	}
}
