use async_trait::async_trait;
use mailmind::agent::{AgentError, ModelCaller};
use mailmind::extract::{extract_json, ExtractError};
use mailmind::pipeline::{Analysis, Report};
use mailmind::prompt::{ChatMessage, EmailAnalysisRequest, ModelParams, Role};
use mailmind::split::{split_bilingual, SplitOutcome};
use mailmind::{AnalysisError, AnalysisSection, Analyzer, Config, LanguageMode, Outcome, Strategy};
use std::sync::Mutex;

/// Replays a canned reply and records what it was asked
struct Scripted {
    reply: Result<String, String>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl Scripted {
    fn ok(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelCaller for Scripted {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _params: &ModelParams,
    ) -> Result<String, AgentError> {
        self.seen.lock().unwrap().push(messages.to_vec());
        self.reply.clone().map_err(AgentError::Upstream)
    }
}

#[async_trait]
impl<'a> ModelCaller for &'a Scripted {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &ModelParams,
    ) -> Result<String, AgentError> {
        (**self).complete(messages, params).await
    }
}

fn request(strategy: Strategy) -> EmailAnalysisRequest {
    let mut config = Config::default();
    config.analysis.strategy = strategy;
    EmailAnalysisRequest::from_config("Hola, mañana reunión por Zoom con Ana.", &config)
}

fn analyzer(caller: Scripted) -> Analyzer<Scripted> {
    Analyzer::new(caller, Config::default().analysis.split_markers)
}

fn structured_record(outcome: Outcome) -> mailmind::AnalysisRecord {
    match outcome {
        Outcome::Report(Report {
            analysis: Analysis::Structured(record),
            ..
        }) => record,
        other => panic!("expected a structured report, got {:?}", other),
    }
}

#[tokio::test]
async fn zoom_reply_is_normalized_and_prefixed() {
    let raw = r#"{"main_app":"Zoom","spanish":{"summary":"Reunión mañana","agreements":[],"doubts":[],"actions":["enviar agenda"],"dates":["2025-01-10"],"people":["Ana"]},"english":{}}"#;
    let analyzer = analyzer(Scripted::ok(raw));

    let outcome = analyzer.analyze(&request(Strategy::Structured)).await.unwrap();
    let text = outcome.text().to_string();
    let record = structured_record(outcome);

    assert_eq!(record.main_app, "Zoom");
    assert_eq!(record.spanish.summary, "Reunión mañana");
    assert_eq!(record.spanish.actions, vec!["Zoom - enviar agenda"]);
    assert_eq!(record.spanish.dates, vec!["2025-01-10"]);
    assert_eq!(record.spanish.people, vec!["Ana"]);
    assert_eq!(record.english, Some(AnalysisSection::default()));
    assert!(text.contains("- Zoom - enviar agenda"));
}

#[tokio::test]
async fn json_wrapped_in_prose_is_recovered() {
    let raw = "Here you go:\n{\"main_app\":\"Unknown\",\"spanish\":{},\"english\":{}}\nThanks";
    let record = structured_record(
        analyzer(Scripted::ok(raw))
            .analyze(&request(Strategy::Structured))
            .await
            .unwrap(),
    );

    assert_eq!(record.main_app, "Unknown");
    assert!(record.spanish.is_empty());
    assert!(record.english.unwrap().is_empty());
}

#[tokio::test]
async fn reply_without_json_falls_back_to_raw_text() {
    let outcome = analyzer(Scripted::ok("no json here at all"))
        .analyze(&request(Strategy::Structured))
        .await
        .unwrap();

    match &outcome {
        Outcome::Fallback { raw, .. } => assert_eq!(raw, "no json here at all"),
        other => panic!("expected fallback, got {:?}", other),
    }
    assert_eq!(outcome.export().content, "no json here at all");
    assert_eq!(
        extract_json("no json here at all"),
        Err(ExtractError::Malformed {
            raw: "no json here at all".to_string()
        })
    );
}

#[tokio::test]
async fn free_text_reply_is_split_on_english_heading() {
    let raw = "Resumen en español...\n### English Version\nSummary in English...";
    let outcome = analyzer(Scripted::ok(raw))
        .analyze(&request(Strategy::Split))
        .await
        .unwrap();

    match &outcome {
        Outcome::Report(Report {
            analysis: Analysis::Split(split),
            notice,
            ..
        }) => {
            assert_eq!(
                split.parts(),
                ("Resumen en español...", "Summary in English...")
            );
            assert!(notice.is_none());
        }
        other => panic!("expected split report, got {:?}", other),
    }
    assert_eq!(
        split_bilingual(raw, &["\n### English Version"]),
        SplitOutcome::Split {
            spanish: "Resumen en español...".to_string(),
            english: "Summary in English...".to_string(),
            marker: "\n### English Version".to_string(),
        }
    );
}

#[tokio::test]
async fn apology_string_reply_falls_back_to_raw_text() {
    let raw = "\"Lo siento, no puedo analizar este correo.\"";
    let outcome = analyzer(Scripted::ok(raw))
        .analyze(&request(Strategy::Structured))
        .await
        .unwrap();

    match &outcome {
        Outcome::Fallback { raw: kept, .. } => assert_eq!(kept, raw),
        other => panic!("expected fallback, got {:?}", other),
    }
    assert!(outcome.message().is_some());
    assert_eq!(outcome.export().content, raw);
}

#[tokio::test]
async fn reply_without_main_app_prefixes_with_app_name() {
    let raw = r#"{"spanish":{"actions":["enviar agenda"]}}"#;
    let record = structured_record(
        analyzer(Scripted::ok(raw))
            .analyze(&request(Strategy::Structured))
            .await
            .unwrap(),
    );
    assert_eq!(record.main_app, "Unknown");
    assert_eq!(
        record.spanish.actions,
        vec![format!("{} - enviar agenda", mailmind::config::DEFAULT_APP_NAME)]
    );
}

#[tokio::test]
async fn rules_between_spanish_sections_do_not_break_the_split() {
    let raw = "## Resumen\nReunión mañana.\n---\n## Acciones\n- Enviar agenda\n\
               ### English Version\n## Summary\nMeeting tomorrow.";
    let outcome = analyzer(Scripted::ok(raw))
        .analyze(&request(Strategy::Split))
        .await
        .unwrap();

    assert!(outcome.message().is_none());
    let pages = outcome.pages();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[1].1, "## Summary\nMeeting tomorrow.");
}

#[tokio::test]
async fn upstream_failure_is_surfaced_verbatim() {
    let err = analyzer(Scripted::failing("HTTP 401: Incorrect API key provided"))
        .analyze(&request(Strategy::Structured))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Upstream(_)));
    assert_eq!(err.to_string(), "HTTP 401: Incorrect API key provided");
}

#[tokio::test]
async fn blank_email_never_reaches_the_model() {
    let caller = Scripted::ok("{}");
    let analyzer = Analyzer::new(&caller, Vec::new());
    let mut req = request(Strategy::Structured);
    req.body = " \n\t".to_string();

    let err = analyzer.analyze(&req).await.unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyInput));
    assert_eq!(caller.calls(), 0);
}

#[tokio::test]
async fn model_receives_directive_and_email() {
    let caller = Scripted::ok("{}");
    let analyzer = Analyzer::new(&caller, Vec::new());
    analyzer.analyze(&request(Strategy::Structured)).await.unwrap();

    assert_eq!(caller.calls(), 1);
    let seen = caller.seen.lock().unwrap();
    assert_eq!(seen[0][0].role, Role::System);
    assert!(seen[0][1].content.contains("mañana reunión por Zoom"));
}

#[tokio::test]
async fn single_mode_record_has_no_english_section() {
    let mut req = request(Strategy::Structured);
    req.language_mode = LanguageMode::Single;
    let raw = r#"{"main_app":"Teams","spanish":{"actions":["confirmar"]},"english":{"actions":["confirm"]}}"#;

    let outcome = analyzer(Scripted::ok(raw)).analyze(&req).await.unwrap();
    assert_eq!(outcome.pages().len(), 1);
    let record = structured_record(outcome);
    assert!(record.english.is_none());
    assert_eq!(record.spanish.actions, vec!["Teams - confirmar"]);
}
