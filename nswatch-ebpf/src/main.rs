#![no_std]
#![no_main]

use aya_ebpf::{
	macros::{map, tracepoint},
	maps::{Array, PerCpuArray, RingBuf},
	programs::TracePointContext,
};
use nswatch_common::{FilterConfig, SyscallKind};

mod hooks;
mod utils;

#[map]
static EVT_MAP: RingBuf = RingBuf::with_byte_size(32 * 1024, 0);

#[map]
static FILTER_CFG: Array<FilterConfig> = Array::with_max_entries(1, 0);

#[map]
static DROPPED: PerCpuArray<u64> = PerCpuArray::with_max_entries(1, 0);

// Generic attachment: raw_syscalls/sys_enter, dispatched on the syscall id.

#[tracepoint]
pub fn sys_enter(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter(&ctx) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

// Per-syscall attachment: syscalls/sys_enter_<name>, kind fixed per program.

#[tracepoint]
pub fn sys_enter_clone(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_kind(&ctx, SyscallKind::Clone) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[tracepoint]
pub fn sys_enter_clone3(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_kind(&ctx, SyscallKind::Clone3) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[tracepoint]
pub fn sys_enter_unshare(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_kind(&ctx, SyscallKind::Unshare) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[tracepoint]
pub fn sys_enter_mkdir(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_kind(&ctx, SyscallKind::Mkdir) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[tracepoint]
pub fn sys_enter_mkdirat(ctx: TracePointContext) -> u32 {
	match hooks::try_sys_enter_kind(&ctx, SyscallKind::Mkdirat) {
		Ok(ret) => ret,
		Err(ret) => ret,
	}
}

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
	loop {}
}

#[link_section = "license"]
#[no_mangle]
static LICENSE: [u8; 13] = *b"Dual MIT/GPL\0";
