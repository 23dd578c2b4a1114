//! External ImageMagick resize backend — the primary path.
//!
//! Round-trips the image through temp files and the `convert` binary, which
//! produces noticeably better resampling than the in-process path on large
//! downscales. The binary may be absent in some deployments; any failure here
//! (missing tool, bad exit, timeout) is reported as a [`BackendError`] and
//! the caller falls back in-process.

use super::backend::{BackendError, OutputFormat, TranscodeBackend};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Default wall-clock limit for one `convert` invocation. A hung child is
/// killed and reported as a failure, which triggers the fallback.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend shelling out to ImageMagick `convert`.
pub struct MagickBackend {
    binary: PathBuf,
    timeout: Duration,
}

impl MagickBackend {
    /// `tool_path` overrides binary resolution; when `None`, `convert` is
    /// looked up on `PATH`.
    pub fn new(tool_path: Option<&Path>) -> Self {
        Self {
            binary: tool_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("convert")),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl TranscodeBackend for MagickBackend {
    fn name(&self) -> &'static str {
        "imagemagick"
    }

    fn resize(
        &self,
        image: &[u8],
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Vec<u8>, BackendError> {
        let mut input = tempfile::Builder::new()
            .prefix("photovault-in-")
            .suffix(".img")
            .tempfile()?;
        input.write_all(image)?;
        input.flush()?;

        // The output suffix tells convert which encoder to use.
        let output = tempfile::Builder::new()
            .prefix("photovault-out-")
            .suffix(&format!(".{}", format.extension()))
            .tempfile()?;

        // `!` forces exact target dimensions; the planner has already chosen
        // aspect-preserving ones.
        let mut child = Command::new(&self.binary)
            .arg(input.path())
            .arg("-resize")
            .arg(format!("{width}x{height}!"))
            .arg(output.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() > self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(BackendError::ProcessingFailed(format!(
                    "{} timed out after {:?}",
                    self.binary.display(),
                    self.timeout
                )));
            }
            std::thread::sleep(Duration::from_millis(25));
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(BackendError::ProcessingFailed(format!(
                "{} exited with {status}: {}",
                self.binary.display(),
                stderr.trim()
            )));
        }

        let bytes = std::fs::read(output.path())?;
        if bytes.is_empty() {
            return Err(BackendError::ProcessingFailed(
                "convert produced no output".into(),
            ));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::png_bytes;

    #[test]
    fn missing_binary_is_a_backend_failure() {
        let backend = MagickBackend::new(Some(Path::new("/nonexistent/convert")));
        let result = backend.resize(&png_bytes(10, 10), 5, 5, OutputFormat::Png);
        assert!(result.is_err());
    }

    #[test]
    fn failing_tool_reports_exit_status() {
        // `false` accepts any arguments and exits non-zero, standing in for a
        // convert invocation that rejects its input.
        let backend = MagickBackend::new(Some(Path::new("/bin/false")));
        let result = backend.resize(&png_bytes(10, 10), 5, 5, OutputFormat::Png);
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
    }

    #[test]
    fn hung_tool_is_killed_after_timeout() {
        // `yes` accepts any arguments and never exits, standing in for a
        // hung convert process.
        let backend =
            MagickBackend::new(Some(Path::new("yes"))).with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        let result = backend.resize(&png_bytes(10, 10), 5, 5, OutputFormat::Png);
        assert!(matches!(result, Err(BackendError::ProcessingFailed(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
