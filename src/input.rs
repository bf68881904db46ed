//! Email input: pasted text, `.txt`/`.eml` files, piped stdin or an editor buffer.
//!
//! Bytes that are not valid UTF-8 are replaced; nothing downstream re-validates encoding.

use mail_parser::MessageParser;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read email input: {0}")]
    Io(#[from] std::io::Error),
    #[error("no email text provided")]
    Empty,
    #[error("editor failed: {0}")]
    Editor(String),
}

/// Where the email text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailSource {
    Text(String),
    File(PathBuf),
    Stdin,
    Editor,
}

/// Read the email body from `source`, rejecting blank input
pub fn read_email(source: &EmailSource) -> Result<String, InputError> {
    let text = match source {
        EmailSource::Text(text) => text.clone(),
        EmailSource::File(path) => read_file(path)?,
        EmailSource::Stdin => {
            let mut bytes = Vec::new();
            std::io::stdin().read_to_end(&mut bytes)?;
            String::from_utf8_lossy(&bytes).into_owned()
        }
        EmailSource::Editor => edit::edit(EDITOR_TEMPLATE)
            .map(|text| strip_template(&text))
            .map_err(|e| InputError::Editor(e.to_string()))?,
    };

    if text.trim().is_empty() {
        return Err(InputError::Empty);
    }
    Ok(text)
}

const EDITOR_TEMPLATE: &str = "# Paste the email below. Lines starting with '#' are ignored.\n";

fn strip_template(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read a text or `.eml` file
pub fn read_file(path: &Path) -> Result<String, InputError> {
    let bytes = std::fs::read(path)?;
    let is_eml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("eml"));

    if is_eml {
        if let Some(text) = parse_eml(&bytes) {
            debug!(path = %path.display(), "parsed MIME message");
            return Ok(text);
        }
        debug!(path = %path.display(), "not a parsable MIME message, reading as text");
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Subject and plain-text body of a MIME message
pub fn parse_eml(bytes: &[u8]) -> Option<String> {
    let message = MessageParser::default().parse(bytes)?;
    let body = message.body_text(0)?;

    let mut text = String::new();
    if let Some(from) = message.from().and_then(|addr| addr.first()) {
        let sender = match (from.name(), from.address()) {
            (Some(name), Some(address)) => format!("{} <{}>", name, address),
            (None, Some(address)) => address.to_string(),
            (Some(name), None) => name.to_string(),
            (None, None) => String::new(),
        };
        if !sender.is_empty() {
            text.push_str(&format!("From: {}\n", sender));
        }
    }
    if let Some(subject) = message.subject() {
        text.push_str(&format!("Subject: {}\n", subject));
    }
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(body.trim());
    Some(text)
}
