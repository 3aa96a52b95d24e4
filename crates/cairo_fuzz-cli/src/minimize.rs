//! Delta-debugging crash minimizer.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum MinimizeError {
    /// The starting input does not crash, so there is nothing to shrink
    #[error("initial input does not crash")]
    NotCrashing,

    #[error("failed to run candidate: {0}")]
    Io(#[from] io::Error),
}

/// Shrinks `data` while `crashes` keeps reporting a crash.
///
/// Chunk removal first: for step sizes len/2, len/4, ..., 1, aligned chunks
/// are removed left to right, and the first removal that still crashes
/// restarts the search. A byte-by-byte deletion pass finishes.
pub fn minimize<F>(mut data: Vec<u8>, mut crashes: F) -> Result<Vec<u8>, MinimizeError>
where
    F: FnMut(&[u8]) -> io::Result<bool>,
{
    if !crashes(&data)? {
        return Err(MinimizeError::NotCrashing);
    }

    'restart: loop {
        let mut step = (data.len() / 2).max(1);
        while step > 0 && !data.is_empty() {
            tracing::debug!(step, len = data.len(), "trying chunk removals");
            let mut i = 0;
            while i + step <= data.len() {
                let candidate = without(&data, i, step);
                if crashes(&candidate)? {
                    tracing::info!(len = candidate.len(), at = i, step, "reduced");
                    data = candidate;
                    continue 'restart;
                }
                i += step;
            }
            step /= 2;
        }
        break;
    }

    tracing::debug!(len = data.len(), "byte-by-byte shrinking");
    let mut i = 0;
    while i < data.len() {
        let candidate = without(&data, i, 1);
        if crashes(&candidate)? {
            tracing::info!(len = candidate.len(), at = i, "removed byte");
            data = candidate;
        } else {
            i += 1;
        }
    }
    Ok(data)
}

fn without(data: &[u8], at: usize, len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() - len);
    out.extend_from_slice(&data[..at]);
    out.extend_from_slice(&data[at + len..]);
    out
}

/// Runs an executable on a candidate written to a temporary file.
pub struct Subprocess {
    exe: PathBuf,
    timeout: Duration,
}

impl Subprocess {
    pub fn new(exe: PathBuf, timeout: Duration) -> Self {
        Self { exe, timeout }
    }

    /// True when the run ends by signal or with an exit code above 128.
    /// A run that outlives the timeout is killed and does not count.
    pub fn crashes(&self, data: &[u8]) -> io::Result<bool> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(data)?;
        file.flush()?;

        let mut child = Command::new(&self.exe)
            .arg(file.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(is_crash(status));
            }
            if Instant::now() >= deadline {
                child.kill()?;
                child.wait()?;
                return Ok(false);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn is_crash(status: ExitStatus) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if status.signal().is_some() {
            return true;
        }
    }
    status.code().is_some_and(|code| code > 128)
}
