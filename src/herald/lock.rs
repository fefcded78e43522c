use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Held for the duration of one run. Dropping the handle closes the file and
/// releases the OS lock on every exit path.
#[derive(Debug)]
pub struct RunLock {
    _file: File,
}

pub fn lock_path_for_state(state_file: &Path) -> PathBuf {
    state_file.with_extension("lock")
}

/// Try to become the single in-flight run, waiting up to `wait` for a
/// concurrent run to finish. `Ok(None)` means another run still holds the
/// lock — a clean no-op for the caller, not an error.
pub fn acquire(path: &Path, wait: Duration) -> Result<Option<RunLock>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("failed to open run lock {}", path.display()))?;

    let deadline = Instant::now() + wait;
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => break,
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
                thread::sleep(RETRY_INTERVAL);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to lock run file {}", path.display()));
            }
        }
    }

    file.set_len(0)
        .with_context(|| format!("failed to truncate run lock {}", path.display()))?;
    writeln!(&mut file, "{}", std::process::id())
        .with_context(|| format!("failed to write run lock {}", path.display()))?;

    Ok(Some(RunLock { _file: file }))
}
