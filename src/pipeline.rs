//! Analysis pipeline: validate, prompt, call the model, extract, render.
//!
//! Everything after the model call is pure ([`interpret`]); a request either
//! fails before producing anything or yields exactly one [`Outcome`].

use crate::agent::{AgentError, ModelCaller, OpenAiClient};
use crate::config::{Config, LanguageMode, Strategy, DEFAULT_APP_NAME};
use crate::extract::extract_json;
use crate::prompt::{build_messages, EmailAnalysisRequest};
use crate::record::{AnalysisRecord, UNKNOWN_APP};
use crate::render::{self, Export, Language};
use crate::split::{split_bilingual, SplitOutcome};
use thiserror::Error;
use tracing::{debug, info, warn};

const NOT_AN_OBJECT: &str = "model response was JSON but not an analysis object";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("the email text is empty; paste an email or pick a .txt/.eml file")]
    EmptyInput,
    #[error("no API key available; set OPENAI_API_KEY or api.openai_key in mailmind.toml")]
    MissingCredential,
    #[error("{0}")]
    Upstream(String),
}

impl From<AgentError> for AnalysisError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Upstream(message) | AgentError::Client(message) => {
                AnalysisError::Upstream(message)
            }
        }
    }
}

/// How a successful reply was interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Analysis {
    /// Mode A: a normalized record with prefixed actions
    Structured(AnalysisRecord),
    /// Mode B: free-text halves
    Split(SplitOutcome),
}

/// A displayable result, possibly degraded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub analysis: Analysis,
    /// Full pretty-text document
    pub text: String,
    /// User-visible note about reduced fidelity
    pub notice: Option<String>,
}

/// What the renderer receives for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Report(Report),
    /// The reply could not be interpreted; show it raw with the reason
    Fallback { raw: String, message: String },
}

impl Outcome {
    /// Text for display or export
    pub fn text(&self) -> &str {
        match self {
            Outcome::Report(report) => &report.text,
            Outcome::Fallback { raw, .. } => raw,
        }
    }

    /// Notice or error message to show next to the text
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Report(report) => report.notice.as_deref(),
            Outcome::Fallback { message, .. } => Some(message),
        }
    }

    pub fn export(&self) -> Export {
        Export::new(self.text())
    }

    /// Titled pages, one per language where available
    pub fn pages(&self) -> Vec<(String, String)> {
        match self {
            Outcome::Report(Report {
                analysis: Analysis::Structured(record),
                ..
            }) => {
                let mut pages = vec![(
                    Language::Spanish.name().to_string(),
                    render::render_record(record, Language::Spanish),
                )];
                if record.language_mode() == LanguageMode::Bilingual {
                    pages.push((
                        Language::English.name().to_string(),
                        render::render_record(record, Language::English),
                    ));
                }
                pages
            }
            Outcome::Report(Report {
                analysis: Analysis::Split(outcome),
                ..
            }) => {
                let (spanish, english) = outcome.parts();
                let mut pages = vec![(Language::Spanish.name().to_string(), spanish.to_string())];
                if !english.is_empty() {
                    pages.push((Language::English.name().to_string(), english.to_string()));
                }
                pages
            }
            Outcome::Fallback { raw, .. } => vec![("Raw".to_string(), raw.clone())],
        }
    }
}

/// Options that steer interpretation of a raw reply
#[derive(Debug, Clone)]
pub struct InterpretOptions<'a> {
    pub language_mode: LanguageMode,
    pub strategy: Strategy,
    pub action_prefix: Option<&'a str>,
    pub markers: &'a [String],
}

/// Turn a raw model reply into an outcome. Never fails.
pub fn interpret(raw: &str, options: &InterpretOptions<'_>) -> Outcome {
    match options.strategy {
        Strategy::Structured => interpret_structured(raw, options),
        Strategy::Split => interpret_split(raw, options),
    }
}

fn interpret_structured(raw: &str, options: &InterpretOptions<'_>) -> Outcome {
    let value = match extract_json(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("{}", e);
            return Outcome::Fallback {
                raw: e.raw().to_string(),
                message: e.to_string(),
            };
        }
    };
    if !value.is_object() {
        warn!("model response is JSON but not an object");
        return Outcome::Fallback {
            raw: raw.to_string(),
            message: NOT_AN_OBJECT.to_string(),
        };
    }

    let record = AnalysisRecord::normalize(&value, options.language_mode);
    let prefix = match options.action_prefix {
        Some(prefix) => prefix,
        None if record.main_app == UNKNOWN_APP => DEFAULT_APP_NAME,
        None => record.main_app.as_str(),
    }
    .to_string();
    let record = record.with_prefixed_actions(&prefix);

    Outcome::Report(Report {
        text: render::render_report(&record),
        analysis: Analysis::Structured(record),
        notice: None,
    })
}

fn interpret_split(raw: &str, options: &InterpretOptions<'_>) -> Outcome {
    let outcome = match options.language_mode {
        LanguageMode::Bilingual => split_bilingual(raw, options.markers),
        // Nothing to split; the whole reply is the Spanish answer.
        LanguageMode::Single => SplitOutcome::NoSplit {
            text: raw.trim().to_string(),
        },
    };

    let notice = match options.language_mode {
        LanguageMode::Bilingual => outcome.notice(),
        LanguageMode::Single => None,
    };
    debug!(split = outcome.is_split(), "free-text reply interpreted");
    let (spanish, english) = outcome.parts();
    let text = render::render_split(spanish, english);

    Outcome::Report(Report {
        analysis: Analysis::Split(outcome),
        text,
        notice,
    })
}

/// Runs requests against a model caller
pub struct Analyzer<C> {
    caller: C,
    markers: Vec<String>,
}

impl<C: ModelCaller> Analyzer<C> {
    pub fn new(caller: C, markers: Vec<String>) -> Self {
        Self { caller, markers }
    }

    /// Analyse one email. Blank input is rejected before the model is called.
    pub async fn analyze(&self, request: &EmailAnalysisRequest) -> Result<Outcome, AnalysisError> {
        if request.is_blank() {
            return Err(AnalysisError::EmptyInput);
        }

        let messages = build_messages(request);
        info!(
            chars = request.body.len(),
            strategy = ?request.strategy,
            mode = ?request.language_mode,
            "analysing email"
        );
        let raw = self.caller.complete(&messages, &request.params).await?;

        let options = InterpretOptions {
            language_mode: request.language_mode,
            strategy: request.strategy,
            action_prefix: request.action_prefix.as_deref(),
            markers: &self.markers,
        };
        Ok(interpret(&raw, &options))
    }
}

/// Validate input and credential, then analyse `body` with the configured endpoint
pub async fn analyze_email(body: &str, config: &Config) -> Result<Outcome, AnalysisError> {
    let request = EmailAnalysisRequest::from_config(body, config);
    if request.is_blank() {
        return Err(AnalysisError::EmptyInput);
    }
    let api_key = config
        .api_key()
        .map_err(|_| AnalysisError::MissingCredential)?;

    let client = OpenAiClient::from_config(config, api_key)?;
    Analyzer::new(client, config.analysis.split_markers.clone())
        .analyze(&request)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::DEFAULT_MARKERS;

    fn markers() -> Vec<String> {
        DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect()
    }

    fn structured(mode: LanguageMode, prefix: Option<&str>, raw: &str) -> Outcome {
        let markers = markers();
        interpret(
            raw,
            &InterpretOptions {
                language_mode: mode,
                strategy: Strategy::Structured,
                action_prefix: prefix,
                markers: &markers,
            },
        )
    }

    fn record_of(outcome: &Outcome) -> &AnalysisRecord {
        match outcome {
            Outcome::Report(Report {
                analysis: Analysis::Structured(record),
                ..
            }) => record,
            other => panic!("expected structured report, got {:?}", other),
        }
    }

    #[test]
    fn configured_prefix_wins_over_main_app() {
        let raw = r#"{"main_app":"Zoom","spanish":{"actions":["enviar agenda"]}}"#;
        let outcome = structured(LanguageMode::Single, Some("MailMind"), raw);
        assert_eq!(
            record_of(&outcome).spanish.actions,
            vec!["MailMind - enviar agenda"]
        );
    }

    #[test]
    fn missing_main_app_uses_default_label() {
        let raw = r#"{"spanish":{"actions":["enviar agenda"]}}"#;
        let outcome = structured(LanguageMode::Single, None, raw);
        let record = record_of(&outcome);
        assert_eq!(record.main_app, UNKNOWN_APP);
        assert_eq!(record.spanish.actions, vec!["MailMind - enviar agenda"]);
    }

    #[test]
    fn named_main_app_is_the_default_prefix() {
        let raw = r#"{"main_app":"Zoom","spanish":{"actions":["enviar agenda"]}}"#;
        let outcome = structured(LanguageMode::Single, None, raw);
        assert_eq!(
            record_of(&outcome).spanish.actions,
            vec!["Zoom - enviar agenda"]
        );
    }

    #[test]
    fn json_that_is_not_an_object_falls_back() {
        for raw in [
            "\"Lo siento, no puedo analizar este correo.\"",
            "42",
            "[\"enviar agenda\", \"llamar a Ana\"]",
            "null",
        ] {
            let outcome = structured(LanguageMode::Bilingual, None, raw);
            match &outcome {
                Outcome::Fallback { raw: kept, message } => {
                    assert_eq!(kept, raw);
                    assert_eq!(message, NOT_AN_OBJECT);
                }
                other => panic!("expected fallback for {}, got {:?}", raw, other),
            }
            assert_eq!(outcome.text(), raw);
            assert!(outcome.message().is_some());
        }
    }

    #[test]
    fn malformed_reply_falls_back_with_raw_text() {
        let outcome = structured(LanguageMode::Bilingual, None, "no json here at all");
        match &outcome {
            Outcome::Fallback { raw, message } => {
                assert_eq!(raw, "no json here at all");
                assert!(!message.is_empty());
            }
            other => panic!("expected fallback, got {:?}", other),
        }
        assert_eq!(outcome.export().content, "no json here at all");
        assert_eq!(outcome.pages().len(), 1);
    }

    #[test]
    fn structured_pages_follow_language_mode() {
        let raw = r#"{"main_app":"Slack","spanish":{},"english":{}}"#;
        let bilingual = structured(LanguageMode::Bilingual, None, raw);
        let titles: Vec<String> = bilingual.pages().into_iter().map(|(t, _)| t).collect();
        assert_eq!(titles, vec!["Español", "English"]);
        assert_eq!(structured(LanguageMode::Single, None, raw).pages().len(), 1);
    }

    #[test]
    fn split_mode_reports_missing_separator() {
        let markers = markers();
        let outcome = interpret(
            "todo en español",
            &InterpretOptions {
                language_mode: LanguageMode::Bilingual,
                strategy: Strategy::Split,
                action_prefix: None,
                markers: &markers,
            },
        );
        assert!(outcome.message().is_some());
        assert_eq!(outcome.pages().len(), 1);
        assert!(outcome.text().contains("todo en español"));
    }

    #[test]
    fn single_mode_split_never_warns() {
        let markers = markers();
        let outcome = interpret(
            "solo español",
            &InterpretOptions {
                language_mode: LanguageMode::Single,
                strategy: Strategy::Split,
                action_prefix: None,
                markers: &markers,
            },
        );
        assert!(outcome.message().is_none());
    }

    #[test]
    fn agent_errors_keep_their_message() {
        let err: AnalysisError = AgentError::Upstream("HTTP 429: quota exceeded".to_string()).into();
        assert_eq!(err.to_string(), "HTTP 429: quota exceeded");
    }

    #[tokio::test]
    async fn blank_body_is_rejected_before_credential_check() {
        let config = Config::default();
        let err = analyze_email("   \n", &config).await.unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyInput));
    }

    #[tokio::test]
    async fn missing_key_is_rejected_before_any_call() {
        let mut config = Config::default();
        config.api.openai_key = None;
        let err = analyze_email("hola", &config).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential));
    }
}
