//! Error types for the vitals crate
//!
//! Every setup/write operation surfaces its first failure synchronously to
//! the caller; nothing is retried internally.

use std::fmt;

/// Errors produced by the instrumentation helpers.
#[derive(Debug)]
pub enum VitalsError {
    /// Filesystem failure while creating or writing a profile, PID
    /// directory, or PID file.
    Io(std::io::Error),
    /// The CPU profiler could not be attached, or its report could not be
    /// built and encoded.
    CpuProfiler(String),
    /// The allocator refused to dump a heap snapshot, or heap profiling is
    /// not available on this platform.
    HeapProfile(String),
}

impl fmt::Display for VitalsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalsError::Io(err) => write!(f, "I/O error: {}", err),
            VitalsError::CpuProfiler(msg) => write!(f, "CPU profiler error: {}", msg),
            VitalsError::HeapProfile(msg) => write!(f, "heap profile error: {}", msg),
        }
    }
}

impl std::error::Error for VitalsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VitalsError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for VitalsError {
    fn from(err: std::io::Error) -> Self {
        VitalsError::Io(err)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VitalsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion_keeps_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: VitalsError = io.into();
        match err {
            VitalsError::Io(inner) => assert_eq!(inner.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_display_formats_include_context() {
        let err = VitalsError::CpuProfiler("attach failed".to_string());
        assert!(err.to_string().contains("attach failed"));
        let err = VitalsError::HeapProfile("prof.dump rejected".to_string());
        assert!(err.to_string().contains("prof.dump"));
    }
}
