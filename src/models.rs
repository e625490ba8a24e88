//! Data models for generated articles.
//!
//! This module defines the decoded, render-ready representation of the model
//! output:
//! - [`Article`]: one generated DSA topic
//! - [`Approach`]: one algorithmic variant inside an article
//! - [`Language`]: the fixed set of languages every approach is implemented in
//! - [`FieldEncoding`]: the wire convention the model is asked to use
//!
//! The wire shapes themselves live in [`crate::response`]; everything here is
//! already plain UTF-8 text.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Title (and slug) used when the model returns an empty title.
pub const PLACEHOLDER_TITLE: &str = "topic";

/// A single generated article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Article {
    /// Display name of the algorithm or data structure. Never empty.
    pub title: String,
    /// One or two paragraphs introducing the topic.
    pub intro: String,
    /// Real-world or interview scenarios where the topic applies.
    pub use_cases: String,
    /// ASCII-art or schematic of the structure or process.
    pub ascii_diagram: String,
    /// Variants in rendering order.
    pub approaches: Vec<Approach>,
    /// Time and space complexity discussion.
    pub complexity: String,
}

impl Article {
    /// Set the title, falling back to [`PLACEHOLDER_TITLE`] when it is blank.
    pub fn with_title(mut self, title: &str) -> Self {
        let trimmed = title.trim();
        self.title = if trimmed.is_empty() {
            PLACEHOLDER_TITLE.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }
}

/// One approach to solving the topic, with code in every [`Language`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Approach {
    /// Label such as "Brute Force" or "Two Pointers". Empty means "skip".
    pub name: String,
    pub explanation: String,
    pub code_by_language: BTreeMap<Language, String>,
}

impl Approach {
    /// Source for `lang`, or an empty string when the model omitted it.
    pub fn code(&self, lang: Language) -> &str {
        self.code_by_language
            .get(&lang)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Whether the renderer should drop this approach.
    pub fn is_unnamed(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Languages every approach ships code for, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Language {
    Cpp,
    Java,
    Python,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Cpp, Language::Java, Language::Python];

    /// Key used in the wire format and as the Markdown fence tag.
    pub fn key(self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Python => "python",
        }
    }

    /// Human-readable label for the collapsible code block.
    pub fn label(self) -> &'static str {
        match self {
            Language::Cpp => "C++",
            Language::Java => "Java",
            Language::Python => "Python",
        }
    }
}

/// How text fields are encoded in the model response.
///
/// Exactly one convention is in effect for a run; the prompt asks for it and
/// the parser expects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldEncoding {
    /// Every text field is standard base64 of UTF-8 text, named `<field>_b64`.
    #[default]
    Base64,
    /// Fields are sent as ordinary JSON strings.
    Plain,
}

impl fmt::Display for FieldEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldEncoding::Base64 => f.write_str("base64"),
            FieldEncoding::Plain => f.write_str("plain"),
        }
    }
}

impl FromStr for FieldEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "base64" | "b64" => Ok(FieldEncoding::Base64),
            "plain" | "text" => Ok(FieldEncoding::Plain),
            other => Err(format!(
                "unknown field encoding '{other}' (expected 'base64' or 'plain')"
            )),
        }
    }
}
