use aya_ebpf::programs::TracePointContext;
use aya_log_ebpf::debug;
use nswatch_common::{
	filter::{evaluate, TP_SYSCALL_ID_OFFSET},
	FilterConfig, SyscallKind,
};

use crate::{
	utils::{count_drop, try_read, TracepointEnv},
	EVT_MAP, FILTER_CFG,
};

pub fn try_sys_enter(ctx: &TracePointContext) -> Result<u32, u32> {
	let id: i64 = unsafe { try_read!(ctx, TP_SYSCALL_ID_OFFSET) };

	let cfg = FILTER_CFG.get(0).ok_or(0u32)?;
	let Some(kind) = cfg.syscalls.classify(id) else {
		return Ok(0);
	};

	admit_and_emit(ctx, cfg, kind)
}

pub fn try_sys_enter_kind(ctx: &TracePointContext, kind: SyscallKind) -> Result<u32, u32> {
	let cfg = FILTER_CFG.get(0).ok_or(0u32)?;
	admit_and_emit(ctx, cfg, kind)
}

#[inline(always)]
fn admit_and_emit(ctx: &TracePointContext, cfg: &FilterConfig, kind: SyscallKind) -> Result<u32, u32> {
	let Some(event) = evaluate(cfg, kind, &TracepointEnv::new(ctx)) else {
		return Ok(0);
	};

	match EVT_MAP.output(&event, 0) {
		Ok(_) => debug!(ctx, "namespace event from pid {}", event.pid),
		// Ring buffer full, the record is lost and the syscall goes on.
		Err(_) => count_drop(),
	}

	Ok(0)
}
