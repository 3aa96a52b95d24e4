//! Standalone replay of inputs outside a fuzzing engine.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use cairo_fuzz::{run_session, SessionConfig, SessionReport, Snapshot};

/// Most bytes read from stdin.
const STDIN_LIMIT: u64 = 4096;
/// Inputs above this size are skipped.
const MAX_INPUT_SIZE: u64 = 2 << 30;

#[derive(Debug, Default)]
pub struct Summary {
    pub ran: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Runner {
    config: SessionConfig,
    dump_dir: Option<PathBuf>,
}

impl Runner {
    pub fn new(config: SessionConfig, dump_dir: Option<PathBuf>) -> Self {
        Self { config, dump_dir }
    }

    pub fn run_stdin(&self) -> io::Result<Summary> {
        let mut data = Vec::new();
        io::stdin().take(STDIN_LIMIT).read_to_end(&mut data)?;
        let mut summary = Summary::default();
        self.run_one("stdin", &data, &mut summary);
        Ok(summary)
    }

    /// Runs a single file, or every regular file directly inside a directory.
    ///
    /// A `path` that cannot be inspected is an error. Failures on entries of
    /// a directory are counted in the summary instead.
    pub fn run_path(&self, path: &Path) -> io::Result<Summary> {
        let mut summary = Summary::default();
        if fs::metadata(path)?.is_dir() {
            let mut entries = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .collect::<Vec<_>>();
            entries.sort();
            for entry in entries {
                self.run_file(&entry, &mut summary);
            }
        } else {
            self.run_file(path, &mut summary);
        }
        Ok(summary)
    }

    fn run_file(&self, path: &Path, summary: &mut Summary) {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot stat input");
                summary.failed += 1;
                return;
            }
        };
        if !metadata.is_file() {
            summary.skipped += 1;
            return;
        }
        if metadata.len() > MAX_INPUT_SIZE {
            tracing::warn!(path = %path.display(), size = metadata.len(), "input too large, skipped");
            summary.skipped += 1;
            return;
        }
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read input");
                summary.failed += 1;
                return;
            }
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.run_one(&name, &data, summary);
    }

    fn run_one(&self, name: &str, data: &[u8], summary: &mut Summary) {
        tracing::info!(input = name, len = data.len(), "running");
        match run_session(data, &self.config) {
            Ok(report) => {
                summary.ran += 1;
                println!("{}", describe(name, &report));
                if let Err(e) = self.dump(name, &report) {
                    tracing::warn!(input = name, error = %e, "failed to write canvas");
                }
            }
            Err(e) => {
                summary.skipped += 1;
                tracing::info!(input = name, error = %e, "session not run");
            }
        }
    }

    fn dump(&self, name: &str, report: &SessionReport) -> Result<(), Box<dyn std::error::Error>> {
        let (Some(dir), Some(snapshot)) = (&self.dump_dir, &report.snapshot) else {
            return Ok(());
        };
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{name}.png"));
        save_png(snapshot, &path)?;
        tracing::debug!(path = %path.display(), "canvas written");
        Ok(())
    }
}

fn describe(name: &str, report: &SessionReport) -> String {
    let mut line = format!(
        "{name}: backend={:?} ops={} stop={:?} balanced={}",
        report.backend,
        report.ops_executed,
        report.stop,
        report.resources.is_balanced()
    );
    if let Some(fault) = &report.context_fault {
        line.push_str(&format!(
            " context_error=\"{}\" at op {} ({})",
            fault.status, fault.op_index, fault.opcode
        ));
    }
    line
}

fn save_png(snapshot: &Snapshot, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let img = image::RgbaImage::from_raw(snapshot.width, snapshot.height, snapshot.rgba.clone())
        .ok_or("Snapshot size does not match its pixel data")?;
    img.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_corpus(dir: &Path) {
        fs::write(dir.join("a"), [0u8, 6, 7]).unwrap();
        fs::write(dir.join("b"), [1u8, 11]).unwrap();
        fs::write(dir.join("empty"), [0u8; 0]).unwrap();
        fs::create_dir(dir.join("nested")).unwrap();
    }

    #[test]
    fn test_directory_run() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let runner = Runner::new(SessionConfig::default(), None);
        let summary = runner.run_path(dir.path()).unwrap();
        assert_eq!(summary.ran, 2);
        // the empty file is rejected and the directory is not a regular file
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn test_dump_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let input = dir.path().join("white");
        fs::write(&input, [0u8]).unwrap();

        let config = SessionConfig {
            capture: true,
            ..SessionConfig::default()
        };
        let runner = Runner::new(config, Some(out.clone()));
        let summary = runner.run_path(&input).unwrap();
        assert_eq!(summary.ran, 1);

        let img = image::open(out.join("white.png")).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (500, 500));
        assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_describe_reports_context_fault() {
        // tiny-mode scale factors underflow into an invalid matrix
        let mut data = vec![0u8, cairo_fuzz::Opcode::TransformStep.byte(), 0];
        data.extend_from_slice(&4.5f64.to_le_bytes());
        data.extend_from_slice(&4.5f64.to_le_bytes());
        let report = run_session(&data, &SessionConfig::default()).unwrap();
        let line = describe("input", &report);
        assert!(line.starts_with("input: backend=Image ops=1 stop=Exhausted"), "{line}");
        assert!(line.contains("at op 0 (TransformStep)"), "{line}");
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Runner::new(SessionConfig::default(), None);
        let err = runner.run_path(&dir.path().join("missing")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_entry_in_directory_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), [0u8, 6]).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();
        let runner = Runner::new(SessionConfig::default(), None);
        let summary = runner.run_path(dir.path()).unwrap();
        assert_eq!(summary.ran, 1);
        assert_eq!(summary.failed, 1);
    }
}
