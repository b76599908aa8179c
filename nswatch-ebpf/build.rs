use which::which;

/// Rebuild the BPF object when the linker changes. `bpf-linker` does not
/// show up in cargo's dependency graph, so cargo cannot track it alone.
fn main() {
	if let Ok(bpf_linker) = which("bpf-linker") {
		println!("cargo:rerun-if-changed={}", bpf_linker.display());
	}
}
