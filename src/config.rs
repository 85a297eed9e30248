//! Session configuration
//!
//! Nothing is persisted. Values start from the built-in defaults, are
//! overridden by `SNAPLINGO_*` environment variables and finally by command
//! line flags.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_SOURCE_LANG: &str = "SNAPLINGO_SOURCE_LANG";
pub const ENV_TARGET_LANG: &str = "SNAPLINGO_TARGET_LANG";
pub const ENV_OCR_TIMEOUT: &str = "SNAPLINGO_OCR_TIMEOUT";
pub const ENV_TRANSLATOR: &str = "SNAPLINGO_TRANSLATOR";
pub const ENV_LIBRE_URL: &str = "SNAPLINGO_LIBRE_URL";
pub const ENV_LIBRE_API_KEY: &str = "SNAPLINGO_LIBRE_API_KEY";
pub const ENV_HTTP_TIMEOUT: &str = "SNAPLINGO_HTTP_TIMEOUT";

const DEFAULT_LIBRE_URL: &str = "https://libretranslate.com/translate";

/// Which translation service to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TranslatorKind {
    /// Public Google Translate web endpoint
    #[default]
    Google,
    /// LibreTranslate compatible server
    Libre,
}

impl FromStr for TranslatorKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(TranslatorKind::Google),
            "libre" | "libretranslate" => Ok(TranslatorKind::Libre),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Tesseract language code used as recognition hint
    pub source_lang: String,
    /// Language code the text is translated into
    pub target_lang: String,
    pub ocr_timeout: Duration,
    pub translator: TranslatorKind,
    pub libre_url: String,
    pub libre_api_key: Option<String>,
    pub http_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            source_lang: "dan".to_string(),
            target_lang: "en".to_string(),
            ocr_timeout: Duration::from_secs(5),
            translator: TranslatorKind::Google,
            libre_url: DEFAULT_LIBRE_URL.to_string(),
            libre_api_key: None,
            http_timeout: Duration::from_secs(10),
        }
    }
}

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(SessionConfig),
    Help,
    Version,
}

impl SessionConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_SOURCE_LANG) {
            self.source_lang = v;
        }
        if let Some(v) = get(ENV_TARGET_LANG) {
            self.target_lang = v;
        }
        if let Some(v) = get(ENV_OCR_TIMEOUT) {
            self.ocr_timeout = parse_secs(ENV_OCR_TIMEOUT, &v)?;
        }
        if let Some(v) = get(ENV_TRANSLATOR) {
            self.translator = parse_translator(ENV_TRANSLATOR, &v)?;
        }
        if let Some(v) = get(ENV_LIBRE_URL) {
            self.libre_url = v;
        }
        if let Some(v) = get(ENV_LIBRE_API_KEY) {
            self.libre_api_key = Some(v);
        }
        if let Some(v) = get(ENV_HTTP_TIMEOUT) {
            self.http_timeout = parse_secs(ENV_HTTP_TIMEOUT, &v)?;
        }
        Ok(self)
    }

    /// Apply command line flags. `args` excludes the program name.
    pub fn with_args<I>(mut self, args: I) -> Result<Command, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if flag.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };
            let mut value = |name: &str| {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .ok_or_else(|| ConfigError::MissingValue(name.to_string()))
            };

            match flag.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                "-V" | "--version" => return Ok(Command::Version),
                "-s" | "--source-lang" => self.source_lang = value("--source-lang")?,
                "-t" | "--target-lang" => self.target_lang = value("--target-lang")?,
                "--timeout" => self.ocr_timeout = parse_secs("--timeout", &value("--timeout")?)?,
                "--translator" => {
                    self.translator = parse_translator("--translator", &value("--translator")?)?
                }
                _ => return Err(ConfigError::UnknownArgument(arg)),
            }
        }
        Ok(Command::Run(self))
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn parse_translator(key: &str, value: &str) -> Result<TranslatorKind, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.source_lang, "dan");
        assert_eq!(config.target_lang, "en");
        assert_eq!(config.ocr_timeout, Duration::from_secs(5));
        assert_eq!(config.translator, TranslatorKind::Google);
        assert!(config.libre_api_key.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = SessionConfig::default()
            .with_env(env(&[
                (ENV_SOURCE_LANG, "deu"),
                (ENV_OCR_TIMEOUT, "12"),
                (ENV_TRANSLATOR, "libre"),
                (ENV_LIBRE_API_KEY, "secret"),
                (ENV_TARGET_LANG, "  "),
            ]))
            .unwrap();

        assert_eq!(config.source_lang, "deu");
        assert_eq!(config.target_lang, "en");
        assert_eq!(config.ocr_timeout, Duration::from_secs(12));
        assert_eq!(config.translator, TranslatorKind::Libre);
        assert_eq!(config.libre_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_env_invalid_timeout() {
        let err = SessionConfig::default()
            .with_env(env(&[(ENV_OCR_TIMEOUT, "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_OCR_TIMEOUT.to_string(),
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn test_args_override_env() {
        let base = SessionConfig::default()
            .with_env(env(&[(ENV_SOURCE_LANG, "deu")]))
            .unwrap();
        let Command::Run(config) = base
            .with_args(args(&["-s", "fra", "--target-lang=de", "--timeout", "3"]))
            .unwrap()
        else {
            panic!("expected run command");
        };

        assert_eq!(config.source_lang, "fra");
        assert_eq!(config.target_lang, "de");
        assert_eq!(config.ocr_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_help_and_version() {
        let config = SessionConfig::default();
        assert_eq!(config.clone().with_args(args(&["--help"])).unwrap(), Command::Help);
        assert_eq!(config.with_args(args(&["-V"])).unwrap(), Command::Version);
    }

    #[test]
    fn test_missing_flag_value() {
        let err = SessionConfig::default()
            .with_args(args(&["--source-lang"]))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingValue("--source-lang".to_string()));
    }

    #[test]
    fn test_unknown_argument() {
        let err = SessionConfig::default()
            .with_args(args(&["--daemon"]))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownArgument("--daemon".to_string()));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        assert!(SessionConfig::default()
            .with_args(args(&["--timeout", "0"]))
            .is_err());
    }
}
