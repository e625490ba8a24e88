//! Normalization and parsing of raw model output.
//!
//! Generative output is only *nearly* JSON. Before parsing, the text goes
//! through two pure transforms:
//!
//! 1. [`strip_code_fence`]: removes a surrounding ```` ```json ... ``` ```` wrapper.
//! 2. [`repair_json`]: drops BOM/replacement characters, escapes stray
//!    backslashes (raw backslashes inside embedded source code are the most
//!    common corruption), and removes trailing commas before `}` / `]`.
//!
//! Nothing beyond those two repair classes is attempted. Anything still
//! broken surfaces as [`GeneratorError::MalformedResponse`] for the whole
//! batch.
//!
//! Decoding of individual fields is lenient: a field that is not valid base64
//! falls back to its raw string, and a field of the wrong JSON type (a number
//! where text belongs, an object where a list belongs) degrades to empty
//! instead of failing the batch.

use crate::error::{GeneratorError, Result};
use crate::models::{Approach, Article, FieldEncoding, Language};
use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Standard alphabet, padding optional, trailing bits tolerated.
const LENIENT_B64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// One or more commas (whitespace allowed between them) directly before a closing `}` or `]`.
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(?:\s*,)*(\s*[}\]])").expect("valid trailing comma regex"));

/// Wire shape of one article in the base64 convention.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Base64Article {
    #[serde(deserialize_with = "lenient")]
    title_b64: Option<String>,
    #[serde(deserialize_with = "lenient")]
    intro_b64: Option<String>,
    #[serde(deserialize_with = "lenient")]
    use_cases_b64: Option<String>,
    #[serde(deserialize_with = "lenient")]
    ascii_diagram_b64: Option<String>,
    #[serde(deserialize_with = "lenient_seq")]
    approaches: Option<Vec<Base64Approach>>,
    #[serde(deserialize_with = "lenient")]
    complexity_b64: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Base64Approach {
    #[serde(deserialize_with = "lenient")]
    name_b64: Option<String>,
    #[serde(deserialize_with = "lenient")]
    explanation_b64: Option<String>,
    #[serde(deserialize_with = "lenient")]
    cpp_b64: Option<String>,
    #[serde(deserialize_with = "lenient")]
    java_b64: Option<String>,
    #[serde(deserialize_with = "lenient")]
    python_b64: Option<String>,
}

/// Wire shape of one article in the plain-text convention.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlainArticle {
    #[serde(deserialize_with = "lenient")]
    title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    intro: Option<String>,
    #[serde(deserialize_with = "lenient")]
    use_cases: Option<String>,
    #[serde(deserialize_with = "lenient")]
    ascii_diagram: Option<String>,
    #[serde(deserialize_with = "lenient_seq")]
    approaches: Option<Vec<PlainApproach>>,
    #[serde(deserialize_with = "lenient")]
    complexity: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlainApproach {
    #[serde(deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    explanation: Option<String>,
    #[serde(deserialize_with = "lenient")]
    code: Option<PlainCode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlainCode {
    #[serde(deserialize_with = "lenient")]
    cpp: Option<String>,
    #[serde(deserialize_with = "lenient")]
    java: Option<String>,
    #[serde(deserialize_with = "lenient")]
    python: Option<String>,
}

impl Base64Article {
    fn into_article(self) -> Article {
        Article {
            intro: decode_b64_field(self.intro_b64),
            use_cases: decode_b64_field(self.use_cases_b64),
            ascii_diagram: decode_b64_field(self.ascii_diagram_b64),
            approaches: self
                .approaches
                .unwrap_or_default()
                .into_iter()
                .map(Base64Approach::into_approach)
                .collect(),
            complexity: decode_b64_field(self.complexity_b64),
            ..Default::default()
        }
        .with_title(&decode_b64_field(self.title_b64))
    }
}

impl Base64Approach {
    fn into_approach(self) -> Approach {
        let code_by_language = code_map([
            (Language::Cpp, decode_b64_field(self.cpp_b64)),
            (Language::Java, decode_b64_field(self.java_b64)),
            (Language::Python, decode_b64_field(self.python_b64)),
        ]);
        Approach {
            name: decode_b64_field(self.name_b64),
            explanation: decode_b64_field(self.explanation_b64),
            code_by_language,
        }
    }
}

impl PlainArticle {
    fn into_article(self) -> Article {
        Article {
            intro: self.intro.unwrap_or_default(),
            use_cases: self.use_cases.unwrap_or_default(),
            ascii_diagram: self.ascii_diagram.unwrap_or_default(),
            approaches: self
                .approaches
                .unwrap_or_default()
                .into_iter()
                .map(PlainApproach::into_approach)
                .collect(),
            complexity: self.complexity.unwrap_or_default(),
            ..Default::default()
        }
        .with_title(self.title.as_deref().unwrap_or_default())
    }
}

impl PlainApproach {
    fn into_approach(self) -> Approach {
        let code = self.code.unwrap_or_default();
        Approach {
            name: self.name.unwrap_or_default(),
            explanation: self.explanation.unwrap_or_default(),
            code_by_language: code_map([
                (Language::Cpp, code.cpp.unwrap_or_default()),
                (Language::Java, code.java.unwrap_or_default()),
                (Language::Python, code.python.unwrap_or_default()),
            ]),
        }
    }
}

/// Accept any JSON value, keeping it only if it has the expected type.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value)
        .inspect_err(|e| debug!(error = %e, "Field has the wrong type; using empty value"))
        .ok())
}

/// Like [`lenient`] for lists: a non-array becomes `None` and elements of the
/// wrong shape are dropped.
fn lenient_seq<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(None),
        other => {
            debug!(kind = json_kind(&other), "List field is not an array; using empty list");
            return Ok(None);
        }
    };
    Ok(Some(
        items
            .into_iter()
            .filter_map(|item| {
                serde_json::from_value(item)
                    .inspect_err(|e| debug!(error = %e, "Dropping list element of the wrong shape"))
                    .ok()
            })
            .collect(),
    ))
}

fn code_map(entries: [(Language, String); 3]) -> BTreeMap<Language, String> {
    entries
        .into_iter()
        .filter(|(_, code)| !code.is_empty())
        .collect()
}

/// Remove a Markdown code fence wrapping the whole response.
///
/// A leading run of backticks plus an optional language tag (```` ```json ````)
/// is removed, and, if the opening fence was present, a closing run of
/// backticks at the end too. Text without an opening fence is only trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    if !text.starts_with('`') {
        return text;
    }

    let body = text
        .trim_start_matches('`')
        .trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        .trim();

    body.trim_end_matches('`').trim()
}

/// Best-effort repair of near-JSON model output.
///
/// - byte-order marks and U+FFFD replacement characters are dropped
/// - a backslash that does not start a valid JSON escape is doubled
/// - commas directly before `}` or `]` are removed
///
/// The transform is idempotent.
pub fn repair_json(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '\u{feff}' && *c != '\u{fffd}')
        .collect();
    let escaped = escape_stray_backslashes(&cleaned);
    TRAILING_COMMA.replace_all(&escaped, "$1").into_owned()
}

fn escape_stray_backslashes(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\\' {
            i += 1;
            continue;
        }
        match json_escape_len(&bytes[i + 1..]) {
            0 => {
                out.push_str(&text[last..i]);
                out.push_str("\\\\");
                i += 1;
                last = i;
            }
            n => i += 1 + n,
        }
    }
    out.push_str(&text[last..]);
    out
}

/// Length of the escape body following a backslash, or 0 if it is not a JSON escape.
fn json_escape_len(rest: &[u8]) -> usize {
    match rest.first() {
        Some(b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't') => 1,
        Some(b'u') if rest.len() >= 5 && rest[1..5].iter().all(u8::is_ascii_hexdigit) => 5,
        _ => 0,
    }
}

/// Decode a base64 text field, falling back to the raw string on failure.
///
/// Whitespace inside the value is ignored and padding is optional. Bytes that
/// are not valid UTF-8 are replaced rather than rejected.
pub fn decode_b64_lenient(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    match LENIENT_B64.decode(compact.as_bytes()) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            debug!(error = %e, "Field is not valid base64; using raw text");
            value.to_string()
        }
    }
}

fn decode_b64_field(value: Option<String>) -> String {
    value.as_deref().map(decode_b64_lenient).unwrap_or_default()
}

fn decode_article(item: Value, encoding: FieldEncoding) -> serde_json::Result<Article> {
    match encoding {
        FieldEncoding::Base64 => serde_json::from_value::<Base64Article>(item).map(Base64Article::into_article),
        FieldEncoding::Plain => serde_json::from_value::<PlainArticle>(item).map(PlainArticle::into_article),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Turn a raw completion into exactly `expected` articles.
///
/// # Errors
///
/// [`GeneratorError::MalformedResponse`] when the repaired text is not JSON,
/// is not an array, has a length other than `expected`, or contains an element
/// that does not match the article shape. The batch is all-or-nothing.
#[instrument(level = "info", skip_all, fields(expected = expected, encoding = %encoding, raw_len = raw.len()))]
pub fn parse_batch(raw: &str, expected: usize, encoding: FieldEncoding) -> Result<Vec<Article>> {
    let repaired = repair_json(strip_code_fence(raw));

    let value: Value = serde_json::from_str(&repaired).map_err(|e| {
        warn!(error = %e, "Response is not valid JSON after repair");
        GeneratorError::malformed(format!("response is not valid JSON: {e}"))
    })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(GeneratorError::malformed(format!(
                "expected a JSON array, got {}",
                json_kind(&other)
            )));
        }
    };

    if items.len() != expected {
        return Err(GeneratorError::malformed(format!(
            "expected {expected} articles, got {}",
            items.len()
        )));
    }

    let articles = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            decode_article(item, encoding)
                .map_err(|e| GeneratorError::malformed(format!("article {i} has the wrong shape: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    info!(count = articles.len(), "Parsed article batch");
    Ok(articles)
}
