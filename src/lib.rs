//! Process instrumentation helpers for a single running process
//!
//! Four independent utilities, each usable standalone from a hosting
//! application:
//!
//! - [`CpuProfiler`]: start CPU profiling to a file, stop it with the
//!   returned guard (unix only).
//! - [`memory_stats`] / [`monitor_memory_stats`] / [`log_memory_stats`]:
//!   one-shot or periodic heap-counter snapshots, delivered over a
//!   rendezvous channel or written as text lines to a sink.
//! - [`write_heap_profile`]: one heap-profile snapshot on demand.
//! - [`PidFile`]: PID file creation with a caller-owned cleanup.
//!
//! There is no data flow between the utilities and no shared state beyond
//! the `log` facade, whose default no-op logger doubles as the process-wide
//! discard sink. Heap counters and heap snapshots come from jemalloc, so
//! they are only meaningful in binaries that install `tikv-jemallocator`
//! as their global allocator (the bundled `vitals` binary does).

pub mod error;
pub mod heap;
pub mod memory;
pub mod pid;

#[cfg(unix)]
pub mod cpu;

pub use error::{Result, VitalsError};
pub use heap::write_heap_profile;
pub use memory::{log_memory_stats, memory_stats, monitor_memory_stats, MemoryStats};
pub use pid::PidFile;

#[cfg(unix)]
pub use cpu::CpuProfiler;
