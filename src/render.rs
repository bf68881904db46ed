//! Pretty-text rendering of analysis results and the downloadable export.
//!
//! Output is deterministic for identical input so exports can be compared byte for byte.

use crate::record::{AnalysisRecord, AnalysisSection};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Placeholder bullet for empty fields
pub const EMPTY_BULLET: &str = "—";

/// Default name of the exported file
pub const EXPORT_FILENAME: &str = "analisis_correo.txt";

pub const EXPORT_MIME: &str = "text/plain";

/// Output language of a rendered section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Spanish,
    English,
}

struct Labels {
    heading: &'static str,
    main_app: &'static str,
    summary: &'static str,
    agreements: &'static str,
    doubts: &'static str,
    actions: &'static str,
    dates: &'static str,
    people: &'static str,
}

impl Language {
    /// Tab/heading name of the language
    pub fn name(self) -> &'static str {
        self.labels().heading
    }

    fn labels(self) -> Labels {
        match self {
            Language::Spanish => Labels {
                heading: "Español",
                main_app: "Aplicación principal",
                summary: "Resumen",
                agreements: "Acuerdos",
                doubts: "Dudas",
                actions: "Acciones",
                dates: "Fechas importantes",
                people: "Personas mencionadas",
            },
            Language::English => Labels {
                heading: "English",
                main_app: "Main app",
                summary: "Summary",
                agreements: "Agreements",
                doubts: "Open questions",
                actions: "Action items",
                dates: "Key dates",
                people: "People mentioned",
            },
        }
    }
}

/// Render one language section without a header
pub fn render_section(section: &AnalysisSection, language: Language) -> String {
    let labels = language.labels();
    let mut out = String::new();

    let summary = if section.summary.trim().is_empty() {
        EMPTY_BULLET
    } else {
        section.summary.trim()
    };
    let _ = writeln!(out, "📝 {}:", labels.summary);
    let _ = writeln!(out, "{}", summary);

    let lists: [(&str, &str, &[String]); 5] = [
        ("🤝", labels.agreements, section.agreements.as_slice()),
        ("❓", labels.doubts, section.doubts.as_slice()),
        ("✅", labels.actions, section.actions.as_slice()),
        ("📅", labels.dates, section.dates.as_slice()),
        ("👥", labels.people, section.people.as_slice()),
    ];
    for (emoji, label, items) in lists {
        let _ = writeln!(out, "\n{} {}:", emoji, label);
        if items.is_empty() {
            let _ = writeln!(out, "- {}", EMPTY_BULLET);
        }
        for item in items {
            let _ = writeln!(out, "- {}", item);
        }
    }

    out
}

/// Render the header line and one language of a record
pub fn render_record(record: &AnalysisRecord, language: Language) -> String {
    let empty = AnalysisSection::default();
    let section = match language {
        Language::Spanish => &record.spanish,
        Language::English => record.english.as_ref().unwrap_or(&empty),
    };
    format!(
        "{}\n\n{}",
        header_line(record, language),
        render_section(section, language)
    )
}

/// Render every language present in the record, Spanish first
pub fn render_report(record: &AnalysisRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header_line(record, Language::Spanish));

    let _ = write!(
        out,
        "\n## {}\n\n{}",
        Language::Spanish.name(),
        render_section(&record.spanish, Language::Spanish)
    );
    if let Some(english) = &record.english {
        let _ = write!(
            out,
            "\n## {}\n\n{}",
            Language::English.name(),
            render_section(english, Language::English)
        );
    }

    out
}

/// Render free-text language halves produced by the splitter
pub fn render_split(spanish: &str, english: &str) -> String {
    let mut out = format!("## {}\n\n{}\n", Language::Spanish.name(), or_empty(spanish));
    if !english.trim().is_empty() {
        let _ = write!(out, "\n## {}\n\n{}\n", Language::English.name(), english.trim());
    }
    out
}

fn header_line(record: &AnalysisRecord, language: Language) -> String {
    format!("📧 {}: {}", language.labels().main_app, record.main_app)
}

fn or_empty(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        EMPTY_BULLET
    } else {
        trimmed
    }
}

/// A file the user can download or save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub filename: String,
    pub content: String,
    pub mime: &'static str,
}

impl Export {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            filename: EXPORT_FILENAME.to_string(),
            content: content.into(),
            mime: EXPORT_MIME,
        }
    }

    /// Write the export into `dir`, returning the full path
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.content)?;
        Ok(path)
    }
}
