//! Support for the HII `.uni` string resource format.
//!
//! A `.uni` file is a sequence of `#string` declarations, each with one or more
//! `#language` variants:
//!
//! ```text
//! #string STR_BOOT_MODE          #language en-US "Boot Mode"
//!                                #language fr-FR "Mode de démarrage"
//! #string STR_BOOT_MODE          #language uqi   "x0042"
//! ```
//!
//! The `uqi` pseudo-language carries the question identifier code for the string.

use serde::{Deserialize, Serialize};

use crate::patterns::{LANGUAGE_VARIANT, STRING_BLOCK, UQI_DEFINITION, UQI_LINE};

/// Column at which emitted `#language` keywords line up, counted from the identifier.
pub const ALIGN_COLUMN: usize = 47;

/// Prefix used for new codes when the target file has no definition to copy it from.
pub const DEFAULT_PREFIX: &str = "x";

/// Language tags kept by [`strip_foreign_languages`].
pub const KEPT_LANGUAGES: &[&str] = &["en", "en-US", "eng", "uqi"];

/// A single `#string <ID> #language uqi "<prefix><code>"` definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UqiDefinition {
    pub identifier: String,
    /// Characters between the opening quote and the hex digits, e.g. `x` or `\x`.
    pub prefix: String,
    pub code: u16,
}

impl UqiDefinition {
    /// Renders the definition as a column-aligned, CRLF-terminated line.
    pub fn to_line(&self) -> String {
        format_uqi_line(&self.identifier, &self.prefix, self.code)
    }
}

/// Parses every UQI definition in `text`, in order of appearance.
///
/// Codes wider than 16 bits are skipped with a warning.
pub fn uqi_definitions(text: &str) -> Vec<UqiDefinition> {
    UQI_DEFINITION
        .captures_iter(text)
        .filter_map(|caps| {
            let identifier = caps["id"].to_string();
            match u16::from_str_radix(&caps["code"], 16) {
                Ok(code) => Some(UqiDefinition {
                    identifier,
                    prefix: caps["prefix"].to_string(),
                    code,
                }),
                Err(_) => {
                    tracing::warn!(
                        identifier = %identifier,
                        code = &caps["code"],
                        "UQI code does not fit in 16 bits; ignoring definition"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Returns the identifier of every `#string` block in `text`, in order of appearance.
pub fn defined_strings(text: &str) -> Vec<String> {
    STRING_BLOCK
        .captures_iter(text)
        .map(|caps| caps["id"].to_string())
        .collect()
}

/// Returns the code prefix used by the first UQI definition in `text`.
pub fn detect_prefix(text: &str) -> Option<String> {
    UQI_DEFINITION
        .captures(text)
        .map(|caps| caps["prefix"].to_string())
}

/// Formats one UQI definition line.
///
/// The identifier is padded so that `#language` starts [`ALIGN_COLUMN`] characters after the
/// identifier's first character; longer identifiers get no padding.
pub fn format_uqi_line(identifier: &str, prefix: &str, code: u16) -> String {
    let padding = " ".repeat(ALIGN_COLUMN.saturating_sub(identifier.len()));
    format!("#string {identifier}{padding} #language uqi \"{prefix}{code:04x}\"\r\n")
}

/// Appends a line to a file buffer, separating it from unterminated trailing content.
pub fn append_line(buffer: &mut String, line: &str) {
    if !buffer.is_empty() && !buffer.ends_with('\n') {
        buffer.push_str("\r\n");
    }
    buffer.push_str(line);
}

/// Removes every UQI definition line from `text` and returns them, terminators included.
pub fn take_uqi_lines(text: &mut String) -> Vec<String> {
    let lines: Vec<String> = UQI_LINE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    if !lines.is_empty() {
        *text = UQI_LINE.replace_all(text, "").into_owned();
    }
    lines
}

/// Removes every string block that has a variant in a language other than
/// [`KEPT_LANGUAGES`].
///
/// Returns the offending language tags, one per removed variant, in order found.
pub fn strip_foreign_languages(text: &mut String) -> Vec<String> {
    let mut removed_tags = Vec::new();
    let mut doomed_blocks: Vec<String> = Vec::new();

    for block in STRING_BLOCK.find_iter(text) {
        let block = block.as_str();
        let foreign: Vec<String> = LANGUAGE_VARIANT
            .captures_iter(block)
            .map(|caps| caps["tag"].to_string())
            .filter(|tag| !KEPT_LANGUAGES.contains(&tag.as_str()))
            .collect();
        if !foreign.is_empty() {
            removed_tags.extend(foreign);
            doomed_blocks.push(block.to_string());
        }
    }

    for block in &doomed_blocks {
        *text = text.replace(block.as_str(), "");
    }
    removed_tags
}
