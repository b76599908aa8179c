use aya::{
	maps::{MapData, PerCpuArray, RingBuf},
	Ebpf,
};
use tokio::io::unix::AsyncFd;

use crate::{
	error::{Error, Result},
	workers::RecordSource,
};

pub const EVT_MAP: &str = "EVT_MAP";
pub const DROPPED_MAP: &str = "DROPPED";

/// The probe's ring buffer, polled through the tokio reactor.
pub struct RingBufSource {
	pub ringbuf_fd: AsyncFd<RingBuf<MapData>>,
}

impl RingBufSource {
	pub fn new(ebpf: &mut Ebpf) -> Result<Self> {
		let ring_buf = RingBuf::try_from(ebpf.take_map(EVT_MAP).ok_or(Error::EbpfMapNotFound(EVT_MAP))?)?;
		let ringbuf_fd = AsyncFd::new(ring_buf)?;
		Ok(RingBufSource { ringbuf_fd })
	}
}

impl RecordSource for RingBufSource {
	async fn next_batch(&mut self) -> Result<Option<Vec<Vec<u8>>>> {
		let mut guard = self.ringbuf_fd.readable_mut().await?;
		let ring_buf = guard.get_inner_mut();

		let mut batch = Vec::new();
		while let Some(item) = ring_buf.next() {
			batch.push(item.to_vec());
		}

		guard.clear_ready();
		Ok(Some(batch))
	}
}

/// Per-CPU count of records the probe could not push because the ring
/// buffer was full.
pub struct DropCounter {
	map: PerCpuArray<MapData, u64>,
}

impl DropCounter {
	pub fn new(ebpf: &mut Ebpf) -> Result<Self> {
		let map = PerCpuArray::try_from(ebpf.take_map(DROPPED_MAP).ok_or(Error::EbpfMapNotFound(DROPPED_MAP))?)?;
		Ok(DropCounter { map })
	}

	pub fn total(&self) -> Result<u64> {
		let per_cpu = self.map.get(&0, 0)?;
		Ok(per_cpu.iter().sum())
	}
}
