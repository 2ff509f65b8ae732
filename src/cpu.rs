//! CPU profiler controller
//!
//! Thin wrapper around `pprof`'s sampling profiler. Starting returns a
//! guard; the caller owns the obligation to call [`CpuProfiler::stop`]
//! exactly once before process exit, which is what detaches the profiler
//! and writes the encoded report to the file chosen at start time.

use crate::error::{Result, VitalsError};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Sampling frequency in Hz. 99 avoids lockstep with 100Hz kernel ticks.
const SAMPLE_FREQUENCY: i32 = 99;

/// A running (or inert) CPU profiling session.
pub struct CpuProfiler {
    inner: Option<ActiveProfile>,
}

struct ActiveProfile {
    guard: pprof::ProfilerGuard<'static>,
    file: File,
}

impl CpuProfiler {
    /// Start CPU profiling, sampling the whole process until [`stop`] is
    /// called.
    ///
    /// With no path (or an empty one) profiling is disabled and an inert
    /// guard is returned, so callers can hold and stop the guard
    /// unconditionally regardless of configuration. Otherwise the file at
    /// `path` is created (truncating an existing one) before the profiler
    /// is attached; failure at either step surfaces as an error.
    ///
    /// [`stop`]: CpuProfiler::stop
    pub fn start(path: Option<&Path>) -> Result<CpuProfiler> {
        let path = match path {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Ok(CpuProfiler { inner: None }),
        };

        let file = File::create(path)?;
        let guard = pprof::ProfilerGuardBuilder::default()
            .frequency(SAMPLE_FREQUENCY)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()
            .map_err(|err| {
                VitalsError::CpuProfiler(format!("failed to attach profiler: {}", err))
            })?;

        Ok(CpuProfiler {
            inner: Some(ActiveProfile { guard, file }),
        })
    }

    /// Whether this guard is actually profiling (inert guards are not).
    pub fn is_active(&self) -> bool {
        self.inner.is_some()
    }

    /// Stop profiling and write the pprof-encoded report to the file the
    /// session was started with.
    ///
    /// Must be called for the profile file to be valid and complete;
    /// dropping the guard instead detaches the profiler but leaves the
    /// file empty. On an inert guard this is a no-op.
    pub fn stop(self) -> Result<()> {
        let active = match self.inner {
            Some(active) => active,
            None => return Ok(()),
        };
        let ActiveProfile { guard, mut file } = active;

        use pprof::protos::Message;

        let report = guard
            .report()
            .build()
            .map_err(|err| VitalsError::CpuProfiler(format!("failed to build report: {}", err)))?;
        let profile = report
            .pprof()
            .map_err(|err| VitalsError::CpuProfiler(format!("failed to convert report: {}", err)))?;

        let mut body = Vec::new();
        profile.encode(&mut body).map_err(|err| {
            VitalsError::CpuProfiler(format!("failed to encode profile: {}", err))
        })?;
        file.write_all(&body)?;
        file.flush()?;

        Ok(())
    }
}
