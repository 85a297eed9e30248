//! Translation backends
//!
//! Both backends use a blocking reqwest client; they run on the blocking
//! pool together with recognition, never on the UI thread.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{SessionConfig, TranslatorKind};
use crate::error::TranslationError;

const GOOGLE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Translates text into a target language
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError>;
}

/// Build the translator selected in `config`
pub fn from_config(config: &SessionConfig) -> Result<Box<dyn Translator>, TranslationError> {
    let client = http_client(config.http_timeout)?;
    Ok(match config.translator {
        TranslatorKind::Google => Box::new(GoogleTranslator::new(client)),
        TranslatorKind::Libre => Box::new(LibreTranslator::new(
            client,
            config.libre_url.clone(),
            config.libre_api_key.clone(),
        )),
    })
}

fn http_client(timeout: Duration) -> Result<reqwest::blocking::Client, TranslationError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("snaplingo/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| TranslationError::Network(e.to_string()))
}

fn check_status(
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, TranslationError> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        let body = resp.text().unwrap_or_default();
        Err(TranslationError::Status {
            code: status.as_u16(),
            body: body.chars().take(200).collect(),
        })
    }
}

/// Google Translate web endpoint, source language detected by the service
pub struct GoogleTranslator {
    client: reqwest::blocking::Client,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Translator for GoogleTranslator {
    fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
        log::info!("Translating {} chars to {} via Google", text.len(), target_lang);
        let resp = self
            .client
            .get(GOOGLE_ENDPOINT)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()?;
        let body = check_status(resp)?.text()?;
        parse_google_response(&body)
    }
}

/// Join the translated segments of a `translate_a/single` response.
///
/// The body is a nested array whose first element lists
/// `[translated, original, ...]` per sentence.
pub fn parse_google_response(body: &str) -> Result<String, TranslationError> {
    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| TranslationError::Parse(e.to_string()))?;
    let segments = json
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslationError::Parse("missing sentence list".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(|s| s.as_str()))
        .collect();

    if translated.trim().is_empty() {
        Err(TranslationError::Empty)
    } else {
        Ok(translated)
    }
}

#[derive(Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Deserialize)]
struct LibreResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// LibreTranslate compatible `POST /translate`
pub struct LibreTranslator {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl LibreTranslator {
    pub fn new(
        client: reqwest::blocking::Client,
        endpoint: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

impl Translator for LibreTranslator {
    fn translate(&self, text: &str, target_lang: &str) -> Result<String, TranslationError> {
        log::info!(
            "Translating {} chars to {} via {}",
            text.len(),
            target_lang,
            self.endpoint
        );
        let request = LibreRequest {
            q: text,
            source: "auto",
            target: target_lang,
            format: "text",
            api_key: self.api_key.as_deref(),
        };
        let resp = self.client.post(&self.endpoint).json(&request).send()?;
        let body = check_status(resp)?.text()?;
        parse_libre_response(&body)
    }
}

pub fn parse_libre_response(body: &str) -> Result<String, TranslationError> {
    let response: LibreResponse =
        serde_json::from_str(body).map_err(|e| TranslationError::Parse(e.to_string()))?;
    if response.translated_text.trim().is_empty() {
        Err(TranslationError::Empty)
    } else {
        Ok(response.translated_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_google_single_sentence() {
        let body = r#"[[["Hello world","Hej verden",null,null,10]],null,"da",null,null,null,1,[],[["da"],null,[1],["da"]]]"#;
        assert_eq!(parse_google_response(body).unwrap(), "Hello world");
    }

    #[test]
    fn test_parse_google_joins_sentences() {
        let body = r#"[[["Good morning. ","God morgen. ",null,null,3],["How are you?","Hvordan har du det?",null,null,3]],null,"da"]"#;
        assert_eq!(
            parse_google_response(body).unwrap(),
            "Good morning. How are you?"
        );
    }

    #[test]
    fn test_parse_google_rejects_unexpected_shape() {
        assert!(matches!(
            parse_google_response(r#"{"error":"quota"}"#),
            Err(TranslationError::Parse(_))
        ));
        assert!(matches!(
            parse_google_response("<html>"),
            Err(TranslationError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_google_empty_translation() {
        assert_eq!(
            parse_google_response(r#"[[],null,"da"]"#),
            Err(TranslationError::Empty)
        );
    }

    #[test]
    fn test_parse_libre_response() {
        let body = r#"{"detectedLanguage":{"confidence":90,"language":"da"},"translatedText":"Hello world"}"#;
        assert_eq!(parse_libre_response(body).unwrap(), "Hello world");
    }

    #[test]
    fn test_parse_libre_error_body() {
        assert!(matches!(
            parse_libre_response(r#"{"error":"Invalid API key"}"#),
            Err(TranslationError::Parse(_))
        ));
    }

    #[test]
    fn test_libre_request_omits_missing_key() {
        let request = LibreRequest {
            q: "Hej",
            source: "auto",
            target: "en",
            format: "text",
            api_key: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("api_key").is_none());
        assert_eq!(json["target"], "en");
    }
}
