use derive_more::{Display, From};
use tokio::task::JoinError;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	#[display("eBPF program not found: {_0}")]
	EbpfProgNotFound(&'static str),
	#[display("eBPF map not found: {_0}")]
	EbpfMapNotFound(&'static str),

	// -- Config
	#[display("cgroup prefix must be 1 to {max} bytes, got {len}")]
	InvalidCgroupPrefix {
		len: usize,
		max: usize,
	},
	#[display("process name filter must be 1 to {max} bytes, got {len}")]
	InvalidCommFilter {
		len: usize,
		max: usize,
	},
	#[display("no monitored syscall is available on this architecture")]
	NoSyscallSelected,

	// -- Externals
	#[from]
	JoinError(JoinError),
	#[from]
	AyaEbpf(aya::EbpfError),
	#[from]
	AyaMaps(aya::maps::MapError),
	#[from]
	AyaProgram(aya::programs::ProgramError),
	#[from]
	Io(std::io::Error),
}

// region:    --- Custom

impl Error {
	#[cfg(test)]
	pub fn custom(val: impl Into<String>) -> Self {
		Self::Custom(val.into())
	}
}

// endregion: --- Custom

// region:    --- Error Boilerplate

impl std::error::Error for Error {}

// endregion: --- Error Boilerplate
