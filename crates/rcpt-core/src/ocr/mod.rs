//! OCR backends turning receipt images into raw text.

mod preprocessing;
#[cfg(feature = "onnx")]
mod pure_engine;
mod tesseract;

pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "onnx")]
pub use pure_engine::PureOcrEngine;
pub use tesseract::TesseractEngine;

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::config::{OcrConfig, OcrEngineKind};

/// An OCR engine that recognizes the text of a whole image.
///
/// Implementations are shared across worker threads. Engines that are not
/// reentrant must serialize access internally.
pub trait OcrBackend: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Recognize all text in the image, including recognition noise.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;

    /// Whether [`OcrBackend::recognize_with_deadline`] stops the engine
    /// itself when the deadline passes.
    fn supports_deadline(&self) -> bool {
        false
    }

    /// Recognize, giving up after `timeout`.
    fn recognize_with_deadline(
        &self,
        image: &DynamicImage,
        timeout: Duration,
    ) -> Result<String, OcrError> {
        let _ = timeout;
        self.recognize(image)
    }
}

/// Build the backend selected in the configuration.
pub fn create_backend(config: &OcrConfig) -> Result<Arc<dyn OcrBackend>, OcrError> {
    match config.engine {
        OcrEngineKind::Tesseract => Ok(Arc::new(TesseractEngine::from_config(config))),
        #[cfg(feature = "onnx")]
        OcrEngineKind::Onnx => Ok(Arc::new(PureOcrEngine::from_dir(&config.model_dir)?)),
        #[cfg(not(feature = "onnx"))]
        OcrEngineKind::Onnx => Err(OcrError::ModelLoad(
            "this build does not include the `onnx` feature".to_string(),
        )),
    }
}

/// Run recognition bounded by `timeout`. A zero timeout runs the call inline
/// without a bound.
///
/// Engines that support deadlines enforce the bound themselves. Otherwise the
/// call runs on a worker thread; an in-process engine cannot be interrupted,
/// so on timeout the worker finishes in the background and its result is
/// dropped.
pub fn recognize_with_timeout(
    backend: &Arc<dyn OcrBackend>,
    image: DynamicImage,
    timeout: Duration,
) -> Result<String, OcrError> {
    if timeout.is_zero() {
        return backend.recognize(&image);
    }

    if backend.supports_deadline() {
        return backend.recognize_with_deadline(&image, timeout);
    }

    let start = Instant::now();
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(backend);

    thread::Builder::new()
        .name(format!("rcpt-ocr-{}", backend.name()))
        .spawn(move || {
            // The receiver is gone if the caller already timed out.
            let _ = tx.send(worker.recognize(&image));
        })
        .map_err(|e| OcrError::EngineFailed(format!("failed to spawn OCR worker: {}", e)))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            debug!("{} finished in {}ms", backend.name(), start.elapsed().as_millis());
            result
        }
        Err(RecvTimeoutError::Timeout) => {
            warn!("{} did not finish within {:?}", backend.name(), timeout);
            Err(OcrError::Timeout {
                millis: timeout.as_millis() as u64,
            })
        }
        Err(RecvTimeoutError::Disconnected) => Err(OcrError::Recognition(format!(
            "{} worker exited without a result",
            backend.name()
        ))),
    }
}
