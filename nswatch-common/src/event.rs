use zerocopy::{FromBytes, FromZeros};
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout};

pub const TASK_COMM_LEN: usize = 16;
pub const EVENT_LABEL_LEN: usize = 32;

/// Wire size of [`SyscallEvent`]: pid (4) + comm (16) + label (32).
pub const SYSCALL_EVENT_SIZE: usize = 4 + TASK_COMM_LEN + EVENT_LABEL_LEN;

pub const PID_OFFSET: usize = 0;
pub const COMM_OFFSET: usize = 4;
pub const LABEL_OFFSET: usize = COMM_OFFSET + TASK_COMM_LEN;

/// Record pushed by the probe into the ring buffer, one per admitted syscall.
///
/// Layout v1, native endian, no implicit padding. Appending a field means a
/// new layout version and a new size on both sides.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SyscallEvent {
	pub pid: u32,
	pub comm: [u8; TASK_COMM_LEN],
	pub label: [u8; EVENT_LABEL_LEN],
}

const _: () = assert!(core::mem::size_of::<SyscallEvent>() == SYSCALL_EVENT_SIZE);

impl SyscallEvent {
	#[inline(always)]
	pub fn new(pid_tgid: u64, comm: [u8; TASK_COMM_LEN], label: [u8; EVENT_LABEL_LEN]) -> Self {
		SyscallEvent {
			pid: (pid_tgid >> 32) as u32,
			comm,
			label,
		}
	}

	/// Decodes a record of any length. Missing bytes read as zero and bytes
	/// past [`SYSCALL_EVENT_SIZE`] are ignored, so this never fails.
	pub fn decode(data: &[u8]) -> Self {
		if let Ok((evt, _)) = SyscallEvent::read_from_prefix(data) {
			return evt;
		}

		let mut raw = [0u8; SYSCALL_EVENT_SIZE];
		let len = data.len().min(SYSCALL_EVENT_SIZE);
		raw[..len].copy_from_slice(&data[..len]);

		SyscallEvent::read_from_bytes(&raw[..]).unwrap_or_else(|_| SyscallEvent::new_zeroed())
	}

	pub fn comm_bytes(&self) -> &[u8] {
		until_nul(&self.comm)
	}

	pub fn label_bytes(&self) -> &[u8] {
		until_nul(&self.label)
	}
}

/// Bytes before the first NUL, or the whole buffer when it has none.
pub fn until_nul(buf: &[u8]) -> &[u8] {
	match buf.iter().position(|&b| b == 0) {
		Some(end) => &buf[..end],
		None => buf,
	}
}

/// Copies `src` into a NUL-padded fixed buffer, truncating to `N` bytes.
pub const fn fixed_bytes<const N: usize>(src: &[u8]) -> [u8; N] {
	let mut out = [0u8; N];
	let mut i = 0;
	while i < N && i < src.len() {
		out[i] = src[i];
		i += 1;
	}
	out
}

// region:    --- Tests


// endregion: --- Tests
