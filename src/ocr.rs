//! OCR (Optical Character Recognition) module using rusty-tesseract

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use image::{DynamicImage, RgbaImage};

use crate::error::RecognitionError;

/// Turns an image into text
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &RgbaImage) -> Result<String, RecognitionError>;
}

/// Tesseract through its command line binary, bounded by a timeout
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    lang: String,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(lang: impl Into<String>, timeout: Duration) -> Self {
        Self {
            lang: lang.into(),
            timeout,
        }
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, image: &RgbaImage) -> Result<String, RecognitionError> {
        use rusty_tesseract::{Args, Image};

        log::info!(
            "Running OCR ({}) on {}x{} image...",
            self.lang,
            image.width(),
            image.height()
        );

        let min_dimension = image.width().min(image.height());
        let (processed, factor) = upscale_for_ocr(image);
        if factor > 1 {
            log::info!(
                "Upscaled small image {}x to {}x{}",
                factor,
                processed.width(),
                processed.height()
            );
        }

        // Higher DPI helps tesseract with small glyphs
        let args = Args {
            lang: self.lang.clone(),
            config_variables: HashMap::new(),
            dpi: Some(if min_dimension < 200 { 300 } else { 150 }),
            psm: Some(3),
            oem: Some(3),
        };

        run_with_timeout(self.timeout, move || {
            let tess_img = Image::from_dynamic_image(&processed)
                .map_err(|e| RecognitionError::Image(e.to_string()))?;
            rusty_tesseract::image_to_string(&tess_img, &args)
                .map_err(|e| RecognitionError::Engine(e.to_string()))
        })
    }
}

/// Upscale small selections so text reaches the glyph height tesseract
/// reads reliably. Returns the image and the factor applied.
pub fn upscale_for_ocr(img: &RgbaImage) -> (DynamicImage, u32) {
    let dynamic_img = DynamicImage::ImageRgba8(img.clone());
    let factor = match img.width().min(img.height()) {
        0..100 => 4,
        100..200 => 2,
        _ => return (dynamic_img, 1),
    };
    let resized = dynamic_img.resize(
        img.width() * factor,
        img.height() * factor,
        image::imageops::FilterType::Lanczos3,
    );
    (resized, factor)
}

/// Run `job` on its own thread and give up after `timeout`.
///
/// A job that overruns is abandoned: its thread keeps running until the
/// engine returns, but the result is discarded.
pub fn run_with_timeout<F>(timeout: Duration, job: F) -> Result<String, RecognitionError>
where
    F: FnOnce() -> Result<String, RecognitionError> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded(1);
    thread::Builder::new()
        .name("snaplingo-ocr".to_string())
        .spawn(move || {
            let _ = tx.send(job());
        })
        .map_err(|e| RecognitionError::Engine(format!("failed to start recognition: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("OCR timed out after {:?}", timeout);
            Err(RecognitionError::Timeout(timeout))
        }
        Err(RecvTimeoutError::Disconnected) => Err(RecognitionError::Engine(
            "recognition thread exited without a result".to_string(),
        )),
    }
}

/// Confirm the tesseract binary can be reached, returning its version
pub fn check_engine() -> Result<String, RecognitionError> {
    rusty_tesseract::get_tesseract_version()
        .map(|v| v.trim().to_string())
        .map_err(|e| RecognitionError::Unavailable(e.to_string()))
}

/// Language packs installed for tesseract
pub fn installed_languages() -> Result<Vec<String>, RecognitionError> {
    rusty_tesseract::get_tesseract_langs().map_err(|e| RecognitionError::Unavailable(e.to_string()))
}

/// Languages in a `+` separated tesseract spec that are not installed
pub fn missing_languages(spec: &str, installed: &[String]) -> Vec<String> {
    spec.split('+')
        .map(str::trim)
        .filter(|lang| !lang.is_empty() && !installed.iter().any(|i| i == lang))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upscale_very_small_selection() {
        let (img, factor) = upscale_for_ocr(&RgbaImage::new(300, 40));
        assert_eq!(factor, 4);
        assert_eq!((img.width(), img.height()), (1200, 160));
    }

    #[test]
    fn test_upscale_small_selection() {
        let (img, factor) = upscale_for_ocr(&RgbaImage::new(150, 400));
        assert_eq!(factor, 2);
        assert_eq!((img.width(), img.height()), (300, 800));
    }

    #[test]
    fn test_large_selection_untouched() {
        let (img, factor) = upscale_for_ocr(&RgbaImage::new(640, 200));
        assert_eq!(factor, 1);
        assert_eq!((img.width(), img.height()), (640, 200));
    }

    #[test]
    fn test_run_with_timeout_returns_result() {
        let result = run_with_timeout(Duration::from_secs(5), || Ok("Hej".to_string()));
        assert_eq!(result, Ok("Hej".to_string()));
    }

    #[test]
    fn test_run_with_timeout_passes_errors_through() {
        let result = run_with_timeout(Duration::from_secs(5), || {
            Err(RecognitionError::Engine("bad image".to_string()))
        });
        assert_eq!(result, Err(RecognitionError::Engine("bad image".to_string())));
    }

    #[test]
    fn test_run_with_timeout_expires() {
        let timeout = Duration::from_millis(20);
        let result = run_with_timeout(timeout, || {
            thread::sleep(Duration::from_millis(500));
            Ok("late".to_string())
        });
        assert_eq!(result, Err(RecognitionError::Timeout(timeout)));
    }

    #[test]
    fn test_missing_languages() {
        let installed = vec!["eng".to_string(), "osd".to_string(), "dan".to_string()];
        assert!(missing_languages("dan", &installed).is_empty());
        assert_eq!(missing_languages("dan+deu", &installed), vec!["deu".to_string()]);
    }
}
