//! Marker-based split of a free-text bilingual reply into Spanish and English halves.
//!
//! This is a heuristic: markers are tried in priority order, the first one found wins,
//! and the reply is cut once at that marker's first occurrence.

use tracing::{debug, warn};

/// Separator candidates, highest priority first
pub const DEFAULT_MARKERS: &[&str] = &[
    "\n### English Version",
    "\n## English Version",
    "\n**English Version**",
    "\n### Versión en inglés",
    "\n---\n",
];

/// Shown when no marker was found and the whole reply is treated as Spanish
pub const NO_SPLIT_NOTICE: &str =
    "No language separator found in the reply; showing the full text as the Spanish version.";

/// Result of a split attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    /// The first matching marker occurs exactly once
    Split {
        spanish: String,
        english: String,
        marker: String,
    },
    /// The first matching marker occurs several times; cut at the first one
    Ambiguous {
        spanish: String,
        english: String,
        marker: String,
        occurrences: usize,
    },
    /// No marker present; the whole reply is Spanish
    NoSplit { text: String },
}

impl SplitOutcome {
    /// `(spanish, english)`; English is empty when nothing was split
    pub fn parts(&self) -> (&str, &str) {
        match self {
            SplitOutcome::Split {
                spanish, english, ..
            }
            | SplitOutcome::Ambiguous {
                spanish, english, ..
            } => (spanish.as_str(), english.as_str()),
            SplitOutcome::NoSplit { text } => (text.as_str(), ""),
        }
    }

    /// User-visible note for degraded results
    pub fn notice(&self) -> Option<String> {
        match self {
            SplitOutcome::Split { .. } => None,
            SplitOutcome::Ambiguous {
                marker,
                occurrences,
                ..
            } => Some(format!(
                "Separator {:?} appears {} times; split at the first occurrence.",
                marker, occurrences
            )),
            SplitOutcome::NoSplit { .. } => Some(NO_SPLIT_NOTICE.to_string()),
        }
    }

    pub fn is_split(&self) -> bool {
        !matches!(self, SplitOutcome::NoSplit { .. })
    }
}

/// Split `raw` on the first marker (by priority) that literally occurs in it
pub fn split_bilingual<S: AsRef<str>>(raw: &str, markers: &[S]) -> SplitOutcome {
    let found = markers
        .iter()
        .map(AsRef::<str>::as_ref)
        .filter(|marker| !marker.is_empty())
        .find(|marker| raw.contains(marker));

    let Some(marker) = found else {
        debug!("no split marker found in {} chars", raw.len());
        return SplitOutcome::NoSplit {
            text: raw.trim().to_string(),
        };
    };

    let (before, after) = raw.split_once(marker).unwrap_or((raw, ""));
    let spanish = before.trim().to_string();
    let english = after.trim().to_string();

    let occurrences = raw.matches(marker).count();
    if occurrences > 1 {
        warn!(marker, occurrences, "split marker is ambiguous");
        return SplitOutcome::Ambiguous {
            spanish,
            english,
            marker: marker.to_string(),
            occurrences,
        };
    }

    SplitOutcome::Split {
        spanish,
        english,
        marker: marker.to_string(),
    }
}
