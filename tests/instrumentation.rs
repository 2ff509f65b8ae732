//! End-to-end tests for the instrumentation helpers, run under jemalloc
//! so the heap counters report live numbers.

use std::time::{Duration, Instant};
use vitals::{memory_stats, monitor_memory_stats, write_heap_profile};

#[cfg(all(not(target_env = "msvc"), not(target_os = "macos")))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[cfg(all(not(target_env = "msvc"), not(target_os = "macos")))]
#[test]
fn test_heap_counters_are_live_under_jemalloc() {
    // Hold an allocation across the snapshot so it has to show up
    let block = vec![0u8; 4 * 1024 * 1024];
    let stats = memory_stats();
    assert!(
        stats.heap_alloc_bytes > block.len() as u64 / 2,
        "allocated bytes should reflect the live block: {:?}",
        stats
    );
    assert!(
        stats.heap_sys_bytes >= stats.heap_alloc_bytes,
        "bytes from the OS can never be below allocated bytes: {:?}",
        stats
    );
    drop(block);
}

#[test]
fn test_sampler_observes_allocation_growth() {
    let rx = monitor_memory_stats(Duration::from_millis(20)).expect("sampler enabled");
    let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();

    // Each snapshot is an independent value; later ones must still parse
    // and arrive on the sampler's pace.
    let _ballast: Vec<Vec<u8>> = (0..64).map(|_| vec![1u8; 64 * 1024]).collect();
    let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();

    let line = format!("{}\n{}", first, second);
    assert_eq!(line.lines().count(), 2);
}

#[test]
fn test_sampler_pacing_window() {
    // Over a ~300ms window at 60ms per tick an eager consumer sees a
    // small, bounded number of samples; the rendezvous send means the
    // producer can never run ahead.
    let interval = Duration::from_millis(60);
    let rx = monitor_memory_stats(interval).expect("sampler enabled");

    let window = Duration::from_millis(300);
    let start = Instant::now();
    let mut count = 0usize;
    while start.elapsed() < window {
        if rx.recv_timeout(Duration::from_millis(250)).is_ok() {
            count += 1;
        }
    }
    assert!(count >= 2, "too few samples in window: {}", count);
    assert!(count <= 12, "too many samples in window: {}", count);
}

#[test]
fn test_heap_profile_is_noop_without_path() {
    write_heap_profile(None).unwrap();
}

#[cfg(unix)]
#[test]
fn test_cpu_profile_end_to_end() {
    use vitals::CpuProfiler;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cpu.pb");

    let profiler = CpuProfiler::start(Some(&path)).unwrap();
    let mut acc = 0u64;
    for i in 0..3_000_000u64 {
        acc = acc.wrapping_mul(31).wrapping_add(i);
    }
    assert!(acc != 1);
    profiler.stop().unwrap();

    let written = std::fs::metadata(&path).unwrap().len();
    assert!(written > 0, "profile file should be flushed and non-empty");
}
