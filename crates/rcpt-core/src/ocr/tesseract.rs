//! OCR backend driving the external `tesseract` executable.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::OcrBackend;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs `tesseract <image> <outbase> -l <language>` on a temporary PNG and
/// reads `<outbase>.txt` back.
///
/// The child process is killed when a deadline passes, so a stuck engine
/// never outlives the call.
pub struct TesseractEngine {
    binary: PathBuf,
    language: String,
}

impl TesseractEngine {
    /// Create an engine using the given executable and English.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            language: "eng".to_string(),
        }
    }

    /// Set the tesseract language pack(s).
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Create an engine from OCR configuration.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.tesseract_path.clone()).with_language(config.language.clone())
    }

    fn run(&self, image: &DynamicImage, timeout: Option<Duration>) -> Result<String, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("{}x{}", width, height)));
        }

        let temp_dir = tempfile::tempdir()
            .map_err(|e| OcrError::EngineFailed(format!("failed to create temp dir: {}", e)))?;
        let input = temp_dir.path().join("page.png");
        let output_base = temp_dir.path().join("page");
        let stderr_path = temp_dir.path().join("stderr.log");

        image
            .save_with_format(&input, image::ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(format!("failed to encode image: {}", e)))?;

        debug!(
            "Running {} on {}x{} image ({})",
            self.binary.display(),
            width,
            height,
            self.language
        );

        let stderr = File::create(&stderr_path)
            .map_err(|e| OcrError::EngineFailed(format!("failed to create log file: {}", e)))?;

        let mut child = Command::new(&self.binary)
            .arg(&input)
            .arg(&output_base)
            .arg("-l")
            .arg(&self.language)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    OcrError::EngineNotFound(self.binary.display().to_string())
                }
                _ => OcrError::EngineFailed(format!("failed to run tesseract: {}", e)),
            })?;

        let status = match timeout {
            Some(timeout) => wait_with_timeout(&mut child, timeout)?,
            None => child
                .wait()
                .map_err(|e| OcrError::EngineFailed(format!("failed to wait for tesseract: {}", e)))?,
        };

        if !status.success() {
            let stderr = fs::read(&stderr_path).unwrap_or_default();
            return Err(OcrError::EngineFailed(format!(
                "tesseract exited with {}: {}",
                status,
                String::from_utf8_lossy(&stderr).trim()
            )));
        }

        let text = read_output(&output_base.with_extension("txt"))?;

        info!(
            "Tesseract recognized {} characters in {}ms",
            text.len(),
            start.elapsed().as_millis()
        );

        Ok(text)
    }
}

impl OcrBackend for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        self.run(image, None)
    }

    fn supports_deadline(&self) -> bool {
        true
    }

    fn recognize_with_deadline(
        &self,
        image: &DynamicImage,
        timeout: Duration,
    ) -> Result<String, OcrError> {
        self.run(image, Some(timeout))
    }
}

/// Poll the child until it exits; kill and reap it once `timeout` passes.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus, OcrError> {
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if start.elapsed() >= timeout => {
                warn!("tesseract did not finish within {:?}, killing it", timeout);
                let _ = child.kill();
                let _ = child.wait();
                return Err(OcrError::Timeout {
                    millis: timeout.as_millis() as u64,
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL.min(timeout)),
            Err(e) => {
                let _ = child.kill();
                return Err(OcrError::EngineFailed(format!(
                    "failed to wait for tesseract: {}",
                    e
                )));
            }
        }
    }
}

fn read_output(path: &Path) -> Result<String, OcrError> {
    let bytes = fs::read(path).map_err(|e| {
        OcrError::EngineFailed(format!("missing output {}: {}", path.display(), e))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
