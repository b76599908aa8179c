use std::{env, fs, path::PathBuf};

use aya_build::cargo_metadata;
use derive_more::{Display, From};
use which::which;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Display, From)]
#[display("{self:?}")]
pub enum Error {
	#[from(String, &String, &str)]
	Custom(String),
	ExecFail,
	#[from]
	Var(env::VarError),
	#[from]
	Io(std::io::Error),
}

const EBPF_PACKAGE: &str = "nswatch-ebpf";
const EBPF_OBJECT: &str = "nswatch";

fn main() -> Result<()> {
	let cargo_metadata::Metadata { packages, .. } = cargo_metadata::MetadataCommand::new()
		.no_deps()
		.exec()
		.map_err(|_| Error::ExecFail)?;
	let ebpf_package = packages
		.into_iter()
		.find(|cargo_metadata::Package { name, .. }| name == EBPF_PACKAGE)
		.ok_or_else(|| Error::Custom(format!("{EBPF_PACKAGE} package not found")))?;

	if which("bpf-linker").is_err() {
		return write_placeholder("bpf-linker not found in PATH");
	}

	if let Err(err) = aya_build::build_ebpf([ebpf_package]) {
		return write_placeholder(&format!("eBPF build failed: {err}"));
	}

	Ok(())
}

/// Leaves an empty object so the host crate still builds. Loading it fails at
/// startup with a setup error.
fn write_placeholder(reason: &str) -> Result<()> {
	println!("cargo:warning={reason}, {EBPF_OBJECT} will not be able to load its probes");
	let out_dir = PathBuf::from(env::var("OUT_DIR")?);
	fs::write(out_dir.join(EBPF_OBJECT), b"")?;
	Ok(())
}
