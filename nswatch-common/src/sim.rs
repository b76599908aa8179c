//! In-process stand-in for the probe context, used to drive [`crate::filter`]
//! from user space.

use crate::event::{fixed_bytes, TASK_COMM_LEN};
use crate::filter::{ProbeEnv, MAX_SYSCALL_ARGS, PATH_READ_LEN};

/// A task entering a syscall. User memory is a list of `(address, bytes)`
/// mappings and any other address faults.
#[derive(Clone, Copy, Debug)]
pub struct SimulatedTask<'m> {
	pub pid_tgid: u64,
	pub comm: [u8; TASK_COMM_LEN],
	pub args: [u64; MAX_SYSCALL_ARGS],
	pub memory: &'m [(u64, &'m [u8])],
}

impl SimulatedTask<'static> {
	/// Single-threaded task, so the thread id equals `pid`.
	pub fn new(pid: u32, comm: &[u8], args: [u64; MAX_SYSCALL_ARGS]) -> Self {
		SimulatedTask {
			pid_tgid: ((pid as u64) << 32) | pid as u64,
			comm: fixed_bytes(comm),
			args,
			memory: &[],
		}
	}
}

impl<'m> SimulatedTask<'m> {
	pub fn with_memory<'n>(self, memory: &'n [(u64, &'n [u8])]) -> SimulatedTask<'n> {
		SimulatedTask {
			pid_tgid: self.pid_tgid,
			comm: self.comm,
			args: self.args,
			memory,
		}
	}

	fn mapping(&self, addr: u64) -> Option<&'m [u8]> {
		self.memory.iter().find(|(base, _)| *base == addr).map(|(_, bytes)| *bytes)
	}
}

impl ProbeEnv for SimulatedTask<'_> {
	fn arg(&self, idx: usize) -> Option<u64> {
		self.args.get(idx).copied()
	}

	fn current_comm(&self) -> [u8; TASK_COMM_LEN] {
		self.comm
	}

	fn pid_tgid(&self) -> u64 {
		self.pid_tgid
	}

	fn read_user_str(&self, addr: u64, buf: &mut [u8; PATH_READ_LEN]) -> Option<usize> {
		let bytes = self.mapping(addr)?;
		let mut len = 0;
		while len < PATH_READ_LEN - 1 && len < bytes.len() && bytes[len] != 0 {
			buf[len] = bytes[len];
			len += 1;
		}
		buf[len] = 0;
		Some(len)
	}

	fn read_user_u64(&self, addr: u64) -> Option<u64> {
		let bytes = self.mapping(addr)?;
		let raw: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
		Some(u64::from_ne_bytes(raw))
	}
}
