//! Prompt construction for the email analysis request.
//!
//! Pure string templating: the same request always yields the same messages.

use crate::config::{Config, LanguageMode, Strategy};
use serde::{Deserialize, Serialize};

/// Heading the split-mode prompt asks the model to put before the English half
pub const ENGLISH_HEADING: &str = "### English Version";

/// Chat role of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged message for the chat endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters passed alongside the messages
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub model_id: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Everything needed to analyse one email
#[derive(Debug, Clone, PartialEq)]
pub struct EmailAnalysisRequest {
    pub body: String,
    pub language_mode: LanguageMode,
    pub strategy: Strategy,
    pub params: ModelParams,
    /// Explicit action label; `None` uses the main app the model detects
    pub action_prefix: Option<String>,
}

impl EmailAnalysisRequest {
    /// Build a request for `body` from the effective configuration
    pub fn from_config(body: impl Into<String>, config: &Config) -> Self {
        Self {
            body: body.into(),
            language_mode: config.analysis.language_mode,
            strategy: config.analysis.strategy,
            params: ModelParams {
                model_id: config.model.id.clone(),
                temperature: config.model.temperature,
                max_output_tokens: config.model.max_output_tokens,
            },
            action_prefix: config
                .analysis
                .action_prefix
                .clone()
                .filter(|p| !p.trim().is_empty()),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// Build the ordered messages for the chat endpoint
pub fn build_messages(request: &EmailAnalysisRequest) -> Vec<ChatMessage> {
    match request.strategy {
        Strategy::Structured => vec![
            ChatMessage::system(structured_directive(request.language_mode)),
            ChatMessage::user(structured_instruction(&request.body)),
        ],
        Strategy::Split => vec![ChatMessage::user(split_instruction(
            &request.body,
            request.language_mode,
        ))],
    }
}

fn section_shape(indent: &str) -> String {
    format!(
        r#"{{
{i}  "summary": "resumen breve (máx 100 palabras)",
{i}  "agreements": ["acuerdos o compromisos"],
{i}  "doubts": ["dudas o preguntas abiertas"],
{i}  "actions": ["acciones o tareas pendientes"],
{i}  "dates": ["fechas importantes (reuniones, entregas, etc.)"],
{i}  "people": ["personas mencionadas"]
{i}}}"#,
        i = indent
    )
}

fn structured_directive(mode: LanguageMode) -> String {
    let section = section_shape("  ");
    let (shape, languages) = match mode {
        LanguageMode::Bilingual => (
            format!(
                "{{\n  \"main_app\": \"aplicación o producto principal del correo, o \\\"Unknown\\\"\",\n  \"spanish\": {section},\n  \"english\": {section}\n}}",
                section = section
            ),
            "The \"spanish\" object must be written in Spanish and the \"english\" object must \
             contain the same analysis written in English.",
        ),
        LanguageMode::Single => (
            format!(
                "{{\n  \"main_app\": \"aplicación o producto principal del correo, o \\\"Unknown\\\"\",\n  \"spanish\": {section}\n}}",
                section = section
            ),
            "The \"spanish\" object must be written in Spanish.",
        ),
    };

    format!(
        r#"You are an assistant that analyses emails and extracts: a summary, agreements, doubts, actions, dates and people.

You MUST respond with exactly one valid JSON object matching this exact shape:
{shape}

{languages}
Use empty strings or empty arrays when the email has no information for a field.
Do not prefix actions with any label.
Do not include any markdown formatting, code blocks, or explanations. Only output the raw JSON object."#,
        shape = shape,
        languages = languages
    )
}

fn structured_instruction(body: &str) -> String {
    format!(
        "Analiza el siguiente correo electrónico.\n\nTexto del correo:\n---\n{}",
        body
    )
}

fn split_instruction(body: &str, mode: LanguageMode) -> String {
    let sections = "1. Resumen breve (máx 100 palabras)\n\
                    2. Acuerdos o compromisos\n\
                    3. Dudas o preguntas\n\
                    4. Acciones o tareas pendientes\n\
                    5. Fechas importantes (reuniones, entregas, etc.)\n\
                    6. Personas mencionadas";

    let layout = match mode {
        LanguageMode::Bilingual => format!(
            "Escribe primero el análisis completo en español. Después escribe en una línea \
             propia solo el encabezado \"{}\" y debajo el mismo análisis en inglés. \
             No uses ese encabezado en ningún otro lugar.",
            ENGLISH_HEADING
        ),
        LanguageMode::Single => "Escribe el análisis solo en español.".to_string(),
    };

    format!(
        "Analiza el siguiente correo electrónico y genera una salida estructurada con:\n\
         {sections}\n\n\
         {layout}\n\
         Formatea la respuesta en secciones claras con títulos y emojis adecuados.\n\n\
         Texto del correo:\n---\n{body}",
        sections = sections,
        layout = layout,
        body = body
    )
}
