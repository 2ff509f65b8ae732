use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use vitals::{memory_stats, monitor_memory_stats, write_heap_profile, CpuProfiler, PidFile};

// The heap counters report jemalloc's view of the process, so this host
// runs under jemalloc.
#[cfg(all(not(target_env = "msvc"), not(target_os = "macos")))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Demo host for the vitals instrumentation helpers
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Write a CPU profile (pprof protobuf) to this file on exit
    #[clap(long, value_name = "FILE")]
    cpu_profile: Option<PathBuf>,

    /// Write a heap-profile snapshot to this file on exit
    #[clap(long, value_name = "FILE")]
    heap_profile: Option<PathBuf>,

    /// Maintain a PID file under the temp directory while running
    #[clap(long)]
    pid_file: bool,

    /// Memory sampling interval in milliseconds (0 disables sampling)
    #[clap(short, long, default_value = "500")]
    interval: u64,

    /// How long to run in seconds (0 = until Ctrl+C)
    #[clap(short, long, default_value = "0")]
    duration: u64,

    /// Print samples as JSON lines instead of the plain text form
    #[clap(short, long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // PID file first, so external tooling can find us as soon as possible
    let pid_file = if args.pid_file {
        match PidFile::create() {
            Ok(f) => {
                println!("PID file: {}", f.path().display().to_string().cyan());
                Some(f)
            }
            Err(err) => {
                eprintln!("Error creating PID file: {}", err);
                exit(1);
            }
        }
    } else {
        None
    };

    let cpu_profiler = match CpuProfiler::start(args.cpu_profile.as_deref()) {
        Ok(p) => p,
        Err(err) => {
            eprintln!("Error starting CPU profiler: {}", err);
            exit(1);
        }
    };
    if cpu_profiler.is_active() {
        println!(
            "CPU profiling to {}",
            args.cpu_profile.as_ref().unwrap().display().to_string().cyan()
        );
    }

    let samples = monitor_memory_stats(Duration::from_millis(args.interval));

    // Graceful shutdown on Ctrl+C so the cleanup actions below still run
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
        println!("\nReceived Ctrl-C, finishing...");
    })
    .unwrap_or_else(|err| {
        eprintln!("Error setting Ctrl-C handler: {}", err);
        exit(1);
    });

    println!("Press Ctrl+C to stop");
    println!();

    let timeout = if args.duration > 0 {
        Some(Duration::from_secs(args.duration))
    } else {
        None
    };

    let start_time = Instant::now();
    let mut sample_count = 0usize;

    while running.load(Ordering::SeqCst) {
        if let Some(timeout) = timeout {
            if start_time.elapsed() >= timeout {
                break;
            }
        }

        match &samples {
            Some(rx) => {
                // Bounded wait keeps the loop responsive to Ctrl+C
                if let Ok(stats) = rx.recv_timeout(Duration::from_millis(100)) {
                    sample_count += 1;
                    if args.json {
                        println!("{}", serde_json::to_string(&stats).unwrap_or_default());
                    } else {
                        println!("{}", stats);
                    }
                }
            }
            None => std::thread::sleep(Duration::from_millis(100)),
        }
    }

    // Cleanup actions, in reverse setup order
    if let Err(err) = write_heap_profile(args.heap_profile.as_deref()) {
        eprintln!("Error writing heap profile: {}", err);
    } else if args.heap_profile.is_some() {
        println!(
            "Heap profile written to {}",
            args.heap_profile.as_ref().unwrap().display().to_string().green()
        );
    }

    if let Err(err) = cpu_profiler.stop() {
        eprintln!("Error stopping CPU profiler: {}", err);
    }

    if let Some(pid_file) = pid_file {
        pid_file.cleanup();
    }

    let runtime = start_time.elapsed();
    println!(
        "\nDone after {:.1} seconds, {} memory samples",
        runtime.as_secs_f64(),
        sample_count
    );
    if args.interval == 0 {
        // Still show one synchronous snapshot so the run reports something
        println!("Final snapshot: {}", memory_stats());
    }
}
