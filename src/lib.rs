//! # MailMind
//!
//! Structured email analysis using LLMs.
//!
//! ## Features
//!
//! - **Structured Extraction**: recovers a JSON analysis from free-form model output and
//!   normalizes it into a typed `AnalysisRecord` without ever failing on bad shapes
//! - **Bilingual**: Spanish and English sections, from JSON or by splitting free text on markers
//! - **Deterministic Output**: stable pretty-text rendering and `.txt` export
//! - **Terminal Viewer**: tabbed ratatui view of each language

pub mod agent;
pub mod config;
pub mod extract;
pub mod input;
pub mod pipeline;
pub mod prompt;
pub mod record;
pub mod render;
pub mod split;
pub mod ui;

pub use config::{Config, LanguageMode, Strategy};
pub use pipeline::{analyze_email, AnalysisError, Analyzer, Outcome};
pub use record::{AnalysisRecord, AnalysisSection};
