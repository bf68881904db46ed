//! Canonical analysis record and the normalizer that builds it from untyped model JSON.
//!
//! The model gives no schema guarantee, so normalization is total: every field is
//! coerced to its declared shape and falls back to an empty value on mismatch.

use crate::config::LanguageMode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// `main_app` value when the model does not name one
pub const UNKNOWN_APP: &str = "Unknown";

/// Separator between the prefix and the action text
pub const ACTION_SEPARATOR: &str = " - ";

/// One language's worth of analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisSection {
    /// Short overview of the email
    pub summary: String,
    /// Agreements or commitments
    pub agreements: Vec<String>,
    /// Open questions
    pub doubts: Vec<String>,
    /// Pending tasks
    pub actions: Vec<String>,
    /// Relevant dates (meetings, deadlines)
    pub dates: Vec<String>,
    /// People mentioned
    pub people: Vec<String>,
}

/// Validated result of one structured analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisRecord {
    /// Main application or product the email is about
    pub main_app: String,
    pub spanish: AnalysisSection,
    /// Present only in bilingual mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english: Option<AnalysisSection>,
}

impl AnalysisSection {
    /// Coerce an arbitrary JSON value into a section. Non-objects yield an empty section.
    pub fn normalize(value: Option<&Value>) -> Self {
        let Some(Value::Object(map)) = value else {
            return Self::default();
        };

        Self {
            summary: coerce_string(map.get("summary")),
            agreements: coerce_list(map.get("agreements")),
            doubts: coerce_list(map.get("doubts")),
            actions: coerce_list(map.get("actions")),
            dates: coerce_list(map.get("dates")),
            people: coerce_list(map.get("people")),
        }
    }

    /// Check if the section has any content
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
            && self.agreements.is_empty()
            && self.doubts.is_empty()
            && self.actions.is_empty()
            && self.dates.is_empty()
            && self.people.is_empty()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "summary": self.summary,
            "agreements": self.agreements,
            "doubts": self.doubts,
            "actions": self.actions,
            "dates": self.dates,
            "people": self.people,
        })
    }
}

impl AnalysisRecord {
    /// Build a record from whatever the model produced.
    ///
    /// Never fails: a missing or malformed `main_app` becomes [`UNKNOWN_APP`], missing
    /// language sections become empty ones, and `english` is only kept in bilingual mode.
    pub fn normalize(value: &Value, mode: LanguageMode) -> Self {
        let empty = Map::new();
        let map = value.as_object().unwrap_or(&empty);

        let main_app = match map.get("main_app") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => UNKNOWN_APP.to_string(),
        };

        let english = match mode {
            LanguageMode::Bilingual => Some(AnalysisSection::normalize(map.get("english"))),
            LanguageMode::Single => None,
        };

        Self {
            main_app,
            spanish: AnalysisSection::normalize(map.get("spanish")),
            english,
        }
    }

    /// The canonical JSON object for this record
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("main_app".to_string(), Value::String(self.main_app.clone()));
        map.insert("spanish".to_string(), self.spanish.to_json());
        if let Some(english) = &self.english {
            map.insert("english".to_string(), english.to_json());
        }
        Value::Object(map)
    }

    /// Language mode implied by the sections present
    pub fn language_mode(&self) -> LanguageMode {
        if self.english.is_some() {
            LanguageMode::Bilingual
        } else {
            LanguageMode::Single
        }
    }

    /// Return a copy with every section's actions carrying `prefix`
    pub fn with_prefixed_actions(&self, prefix: &str) -> Self {
        let prefix_section = |section: &AnalysisSection| AnalysisSection {
            actions: prefix_actions(&section.actions, prefix),
            ..section.clone()
        };

        Self {
            main_app: self.main_app.clone(),
            spanish: prefix_section(&self.spanish),
            english: self.english.as_ref().map(prefix_section),
        }
    }

    /// JSON schema of the canonical record
    pub fn json_schema() -> Value {
        serde_json::to_value(schemars::schema_for!(AnalysisRecord)).unwrap_or(Value::Null)
    }
}

/// Render each action as `"{prefix} - {action}"`, preserving order.
///
/// Not idempotent: applying it twice prefixes twice.
pub fn prefix_actions(actions: &[String], prefix: &str) -> Vec<String> {
    actions
        .iter()
        .map(|action| format!("{}{}{}", prefix, ACTION_SEPARATOR, action))
        .collect()
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Arrays are kept; strings stay as-is, nulls are dropped, anything else becomes its JSON text.
fn coerce_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}
