//! Crop-to-result pipeline: recognize, gate on emptiness, translate, present
//!
//! Each stage returns a `Result` and the pipeline decides explicitly what
//! reaches the user. At most one message is presented per run.

use image::RgbaImage;

use crate::error::{RecognitionError, TranslationError};
use crate::ocr::Recognizer;
use crate::translate::Translator;

pub const NOTHING_FOUND: &str = "Unable to read text from image, did not copy";

/// Shows the single result message of a session
pub trait Presenter {
    fn present(&mut self, message: String);
}

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Translated(String),
    NothingFound,
    RecognitionFailed(RecognitionError),
    TranslationFailed(TranslationError),
}

impl Outcome {
    /// Text worth putting on the clipboard
    pub fn translated_text(&self) -> Option<&str> {
        match self {
            Outcome::Translated(translated) => Some(translated),
            _ => None,
        }
    }
}

pub fn translated_message(translated: &str) -> String {
    format!("Translation is: {translated}")
}

pub fn translation_failed_message(err: &TranslationError) -> String {
    format!("Translation failed: {err}")
}

/// Builds the translator once there is text to translate
pub type TranslatorFactory =
    Box<dyn Fn() -> Result<Box<dyn Translator>, TranslationError> + Send + Sync>;

pub struct Pipeline {
    recognizer: Box<dyn Recognizer>,
    make_translator: TranslatorFactory,
    target_lang: String,
}

impl Pipeline {
    /// `make_translator` is only called after recognition produced text, so
    /// a backend that cannot be set up never masks a recognition outcome.
    pub fn new<F>(
        recognizer: Box<dyn Recognizer>,
        make_translator: F,
        target_lang: impl Into<String>,
    ) -> Self
    where
        F: Fn() -> Result<Box<dyn Translator>, TranslationError> + Send + Sync + 'static,
    {
        Self {
            recognizer,
            make_translator: Box::new(make_translator),
            target_lang: target_lang.into(),
        }
    }

    pub fn run(&self, image: &RgbaImage, presenter: &mut dyn Presenter) -> Outcome {
        let text = match self.recognizer.recognize(image) {
            Ok(text) => text,
            Err(err) => {
                log::error!("Text recognition failed: {err}");
                eprintln!("ERROR: An error occurred when trying to process the image: {err}");
                return Outcome::RecognitionFailed(err);
            }
        };

        let text = text.trim();
        if text.is_empty() {
            log::info!("No text recognized");
            presenter.present(NOTHING_FOUND.to_string());
            return Outcome::NothingFound;
        }
        log::info!("Recognized {} chars", text.len());
        log::debug!("Recognized text: {text:?}");

        let translated = (self.make_translator)()
            .inspect_err(|err| log::error!("Failed to set up translator: {err}"))
            .and_then(|translator| translator.translate(text, &self.target_lang));
        match translated {
            Ok(translated) => {
                presenter.present(translated_message(&translated));
                Outcome::Translated(translated)
            }
            Err(err) => {
                log::error!("Translation failed: {err}");
                presenter.present(translation_failed_message(&err));
                Outcome::TranslationFailed(err)
            }
        }
    }
}

/// Presenter that keeps the message for a view to show later
#[derive(Debug, Default)]
pub struct SlotPresenter {
    pub message: Option<String>,
}

impl Presenter for SlotPresenter {
    fn present(&mut self, message: String) {
        if self.message.is_some() {
            log::warn!("Result already presented, dropping {message:?}");
            return;
        }
        self.message = Some(message);
    }
}
