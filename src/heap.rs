//! Heap snapshot writer
//!
//! Writes one jemalloc heap-profile snapshot to a file on demand via the
//! `prof.dump` mallctl. Requires the hosting binary to run under jemalloc
//! with profiling compiled in and activated (`MALLOC_CONF=prof:true`);
//! otherwise the dump stage reports an error.

use crate::error::Result;
use std::fs::File;
use std::path::Path;

/// Write a single heap-profile snapshot to `path`.
///
/// With no path (or an empty one) this is a no-op returning `Ok`. The
/// target file is created (truncating) first, so a missing parent
/// directory or permission problem surfaces as an I/O error with no file
/// left behind; a failure in the dump stage itself leaves the created
/// file on disk, no rollback.
pub fn write_heap_profile(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(()),
    };

    // Surface resource-creation errors before asking the allocator to dump
    File::create(path)?;
    dump(path)
}

#[cfg(all(not(target_env = "msvc"), not(target_os = "macos")))]
fn dump(path: &Path) -> Result<()> {
    use crate::error::VitalsError;
    use std::ffi::CString;

    const PROF_DUMP: &[u8] = b"prof.dump\0";

    let c_path = CString::new(path.to_string_lossy().as_bytes())
        .map_err(|_| VitalsError::HeapProfile("profile path contains a NUL byte".to_string()))?;

    // Safety: prof.dump takes a nul-terminated path; c_path outlives the call
    unsafe {
        tikv_jemalloc_ctl::raw::write(PROF_DUMP, c_path.as_ptr())
            .map_err(|err| VitalsError::HeapProfile(format!("prof.dump failed: {}", err)))
    }
}

#[cfg(any(target_env = "msvc", target_os = "macos"))]
fn dump(_path: &Path) -> Result<()> {
    Err(crate::error::VitalsError::HeapProfile(
        "heap profiling requires jemalloc, which is unavailable on this platform".to_string(),
    ))
}
