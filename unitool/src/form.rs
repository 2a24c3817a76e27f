//! Extraction of prompt-string references from HII form sources (`.vfr`, `.vfi`, `.hfr`,
//! `.sd`, `.sdi`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::patterns::{PROMPT_TOKEN, QUESTION_BLOCK, VARIABLE_ID};

/// Prompt tokens that stand for "no string" and never need a definition or a code.
pub const PLACEHOLDER_TOKENS: &[&str] = &["0", "STR_EMPTY", "STR_NULL"];

/// A prompt string referenced by a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringReference {
    pub token: String,
    /// `Store.Field` the question is bound to, if the block declares one.
    pub var_id: Option<String>,
    pub path: PathBuf,
}

/// Returns true when `token` is a placeholder such as `STRING_TOKEN(0)`.
pub fn is_placeholder(token: &str) -> bool {
    PLACEHOLDER_TOKENS.contains(&token)
}

/// Collects every non-placeholder prompt token referenced inside a question block.
pub fn scan_questions(text: &str, path: &Path) -> Vec<StringReference> {
    let mut references = Vec::new();
    for block in QUESTION_BLOCK.find_iter(text) {
        let block = block.as_str();
        let var_id = VARIABLE_ID
            .captures(block)
            .map(|caps| caps["varid"].to_string());
        for caps in PROMPT_TOKEN.captures_iter(block) {
            let token = &caps["token"];
            if is_placeholder(token) {
                continue;
            }
            references.push(StringReference {
                token: token.to_string(),
                var_id: var_id.clone(),
                path: path.to_path_buf(),
            });
        }
    }
    references
}
