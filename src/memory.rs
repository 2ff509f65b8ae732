//! Memory statistics snapshots and the periodic sampler
//!
//! A [`MemoryStats`] value is a point-in-time read of the allocator's heap
//! counters. The sampler comes in two forms over the same loop: a
//! rendezvous channel of typed snapshots, and a text-line writer into a
//! caller-supplied sink. Both run on one dedicated background thread per
//! call and pace themselves with a blocking sleep between ticks.

use log::warn;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

/// One snapshot of the process heap, taken from the allocator's own
/// counters. Immutable once constructed; a fresh value is produced on
/// every sampling tick.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Heap bytes obtained from the operating system (jemalloc `mapped`).
    pub heap_sys_bytes: u64,
    /// Bytes currently allocated by the application (jemalloc `allocated`).
    pub heap_alloc_bytes: u64,
    /// Resident bytes not backing live allocations (`resident - active`).
    pub heap_idle_bytes: u64,
    /// Bytes retained after being returned to the OS (jemalloc `retained`).
    pub heap_released_bytes: u64,
}

impl fmt::Display for MemoryStats {
    /// Canonical text form: the four raw counters, comma-separated,
    /// unlabeled, in `sys, alloc, idle, released` order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}",
            self.heap_sys_bytes,
            self.heap_alloc_bytes,
            self.heap_idle_bytes,
            self.heap_released_bytes,
        )
    }
}

/// Read one [`MemoryStats`] snapshot synchronously.
///
/// Never fails: if the allocator statistics cannot be read (or jemalloc is
/// not available on this target) a zeroed snapshot is returned and a
/// warning is logged. Counters reflect jemalloc's view of the heap, so
/// they are only meaningful when the hosting binary uses jemalloc as its
/// global allocator.
pub fn memory_stats() -> MemoryStats {
    read_heap_counters()
}

#[cfg(all(not(target_env = "msvc"), not(target_os = "macos")))]
fn read_heap_counters() -> MemoryStats {
    use tikv_jemalloc_ctl::{epoch, stats};

    let read = || -> std::result::Result<MemoryStats, tikv_jemalloc_ctl::Error> {
        // jemalloc caches its statistics; advancing the epoch refreshes them
        epoch::advance()?;
        let allocated = stats::allocated::read()? as u64;
        let active = stats::active::read()? as u64;
        let mapped = stats::mapped::read()? as u64;
        let resident = stats::resident::read()? as u64;
        let retained = stats::retained::read()? as u64;
        Ok(MemoryStats {
            heap_sys_bytes: mapped,
            heap_alloc_bytes: allocated,
            heap_idle_bytes: resident.saturating_sub(active),
            heap_released_bytes: retained,
        })
    };

    match read() {
        Ok(stats) => stats,
        Err(err) => {
            warn!("failed to read jemalloc statistics: {}", err);
            MemoryStats::default()
        }
    }
}

#[cfg(any(target_env = "msvc", target_os = "macos"))]
fn read_heap_counters() -> MemoryStats {
    // No jemalloc on this target; report zeros rather than fail
    MemoryStats::default()
}

/// Spawn a background thread that delivers one [`MemoryStats`] snapshot
/// per `interval` over the returned channel.
///
/// Returns `None` if `interval` is zero (sampling disabled, no thread
/// spawned). The channel is a rendezvous channel: each send blocks until
/// the consumer receives it, so a slow consumer stalls sampling instead of
/// losing samples. Dropping the receiver terminates the sampling thread;
/// otherwise it runs for the life of the process.
pub fn monitor_memory_stats(interval: Duration) -> Option<Receiver<MemoryStats>> {
    if interval.is_zero() {
        return None;
    }

    let (tx, rx) = mpsc::sync_channel(0);
    thread::spawn(move || loop {
        if tx.send(memory_stats()).is_err() {
            // Receiver dropped, nobody is listening anymore
            break;
        }
        thread::sleep(interval);
    });

    Some(rx)
}

/// Spawn a background thread that writes one canonical text line per
/// `interval` to `sink` (see [`MemoryStats`]'s `Display` for the format).
///
/// A zero `interval` makes this a no-op: no thread is spawned. With no
/// sink the output is discarded. Unlike [`monitor_memory_stats`] there is
/// no stop handle: the thread runs until the process exits. Write failures
/// are logged and sampling continues.
pub fn log_memory_stats(interval: Duration, sink: Option<Box<dyn Write + Send>>) {
    if interval.is_zero() {
        return;
    }

    let mut sink = sink.unwrap_or_else(|| Box::new(io::sink()));
    thread::spawn(move || loop {
        let stats = memory_stats();
        if let Err(err) = writeln!(sink, "{}", stats) {
            warn!("failed to write memory stats line: {}", err);
        }
        thread::sleep(interval);
    });
}
