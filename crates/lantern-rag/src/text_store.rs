//! Ordered store of the texts behind each index entry
//!
//! The persisted form is plain UTF-8: every entry is written as its text, a
//! newline, and the `<|END|>` delimiter line. Entries are normalized before
//! they are stored so a text can never contain the delimiter or break the
//! one-entry-per-record layout.

use std::path::Path;
use tracing::debug;

use lantern_core::{Error, Result};

/// Record delimiter of the persisted text store
pub const DELIMITER: &str = "<|END|>\n";

const DELIMITER_TOKEN: &str = "<|END|>";
const SANITIZED_TOKEN: &str = "<END>";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStore {
    texts: Vec<String>,
}

impl TextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut store = Self::new();
        for text in texts {
            store.push(text.as_ref());
        }
        store
    }

    /// Append a normalized copy of `text`, returning its position
    pub fn push(&mut self, text: &str) -> usize {
        self.texts.push(Self::normalize(text));
        self.texts.len() - 1
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.texts.get(position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.texts.iter().map(String::as_str)
    }

    /// Collapse line breaks to spaces and defuse the delimiter token
    pub fn normalize(text: &str) -> String {
        text.replace("\r\n", " ")
            .replace(['\n', '\r'], " ")
            .replace(DELIMITER_TOKEN, SANITIZED_TOKEN)
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for text in &self.texts {
            out.push_str(text);
            out.push('\n');
            out.push_str(DELIMITER);
        }
        out
    }

    /// Parse the persisted form
    ///
    /// A single trailing empty segment (left after the final delimiter) is
    /// dropped, and one trailing newline is stripped from each entry.
    pub fn parse(raw: &str) -> Self {
        let mut segments: Vec<&str> = raw.split(DELIMITER).collect();
        if segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        }

        let texts = segments
            .into_iter()
            .map(|s| s.strip_suffix('\n').unwrap_or(s).to_string())
            .collect();
        Self { texts }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.serialize())?;
        debug!(path = %path.display(), entries = self.len(), "text store saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Index(format!("cannot read text store {}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&raw))
    }
}
