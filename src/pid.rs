//! PID file lifecycle management
//!
//! Writes the current process ID to a well-known location derived from the
//! program name: `<temp dir>/.<prog>-pid/<prog>.pid`. External tooling uses
//! the file to locate or signal the process. There is deliberately no
//! locking or staleness check: a second instance of the same program
//! overwrites the file, last writer wins.

use crate::error::Result;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A PID file created for the current process.
///
/// The caller owns the cleanup obligation: call [`PidFile::cleanup`] on
/// graceful shutdown to remove the per-program directory. Nothing happens
/// automatically on drop; after an abnormal termination the stale file is
/// simply overwritten by the next run.
#[derive(Debug)]
pub struct PidFile {
    dir: PathBuf,
    path: PathBuf,
    pid: u32,
}

impl PidFile {
    /// Create the per-program PID directory and write the current process
    /// ID (decimal, no trailing newline) into the PID file.
    ///
    /// The directory is created with mode `0o700` on unix; an already
    /// existing directory is not an error. Any other failure surfaces
    /// immediately and no guard is returned.
    pub fn create() -> Result<PidFile> {
        let prog = program_name();
        let dir = env::temp_dir().join(format!(".{}-pid", prog));
        let path = dir.join(format!("{}.pid", prog));

        create_dir_restricted(&dir)?;

        let pid = std::process::id();
        fs::write(&path, pid.to_string())?;

        Ok(PidFile { dir, path, pid })
    }

    /// Path of the PID file itself.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the per-program directory holding the PID file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The process ID that was written.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Remove the whole per-program directory, recursively.
    ///
    /// Removal errors are ignored: at shutdown there is nothing useful
    /// left to do with them.
    pub fn cleanup(self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// Create `dir` with owner-only permissions, tolerating an existing one.
fn create_dir_restricted(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    match builder.create(dir) {
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        other => other,
    }
}

/// Final path component of the invocation path, falling back to the
/// executable path and then to a fixed placeholder.
fn program_name() -> String {
    env::args_os()
        .next()
        .map(PathBuf::from)
        .or_else(|| env::current_exe().ok())
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".to_string())
}
