//! Named matchers for the two semi-structured text formats the tool reads.
//!
//! These are line-oriented regexes, not parsers. Nested or unterminated blocks are not
//! balanced: a question block ends at the first end keyword after it starts, and a string
//! block ends at the first line that is not a `#language` variant. Anything the grammars
//! below do not describe is undefined input and may be matched partially or not at all.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// One UQI definition.
    ///
    /// ```text
    /// ^#string <ID> #language uqi "<PREFIX><HEX>"
    /// ID     = [A-Za-z_0-9]+, the same identifiers a prompt token may use
    /// PREFIX = 1-2 chars of [x\S], the shortest that lets HEX match
    /// HEX    = 4-5 hex digits
    /// ```
    ///
    /// Captures: `id`, `prefix`, `code`.
    pub static ref UQI_DEFINITION: Regex = Regex::new(
        r#"(?m)^#string[ \t]+(?P<id>[A-Za-z_0-9]+)[ \t]+#language[ \t]+uqi[ \t\r\n]+"(?P<prefix>[x\S]{1,2}?)(?P<code>[0-9a-fA-F]{4,5})""#
    )
    .unwrap();

    /// A whole UQI definition line, including its line terminator, for relocation.
    pub static ref UQI_LINE: Regex = Regex::new(
        r#"(?m)^#string[ \t]+[A-Za-z_0-9]+[ \t]+#language[ \t]+uqi[ \t\r\n]+".*"[ \t]*\r?\n?"#
    )
    .unwrap();

    /// A string block: `#string <ID>` followed by zero or more language variants.
    ///
    /// ```text
    /// ^#string <ID> ( <ws> #language <TAG> <ws> "<text>" )*
    /// TAG = [a-zA-Z-]{2,5}
    /// ```
    ///
    /// Captures: `id`. The whole match is the block.
    pub static ref STRING_BLOCK: Regex = Regex::new(
        r#"(?m)^#string[ \t]+(?P<id>[A-Za-z_0-9]+)(?:[ \t\r\n]+#language[ \t]+[a-zA-Z-]{2,5}[ \t\r\n]+".*"[ \t]*\r?\n?)*"#
    )
    .unwrap();

    /// One language variant inside a string block. Captures: `tag`.
    pub static ref LANGUAGE_VARIANT: Regex = Regex::new(
        r#"[ \t\r\n]+#language[ \t]+(?P<tag>[a-zA-Z-]{2,5})[ \t\r\n]+".*"[ \t]*\r?\n?"#
    )
    .unwrap();

    /// A question block in a form file.
    ///
    /// ```text
    /// ^<ws>* (oneof|numeric|checkbox|orderedlist) <ws> varid ... (endoneof|endnumeric|endcheckbox|endorderedlist);
    /// ```
    ///
    /// The body is matched non-greedily across lines.
    pub static ref QUESTION_BLOCK: Regex = Regex::new(
        r"(?ms)^[ \t]*(?:oneof|numeric|checkbox|orderedlist)[ \t]+varid.+?(?:endoneof|endnumeric|endcheckbox|endorderedlist);"
    )
    .unwrap();

    /// `varid = Store.Field` at the head of a question block. Captures: `varid`.
    pub static ref VARIABLE_ID: Regex = Regex::new(
        r"[ \t]*(?:oneof|numeric|checkbox|orderedlist)[ \t]+varid[ \t]*=[ \t]*(?P<varid>[a-zA-Z_0-9]+\.[a-zA-Z_0-9]+)"
    )
    .unwrap();

    /// `prompt = STRING_TOKEN(<TOKEN>)`. Captures: `token`.
    pub static ref PROMPT_TOKEN: Regex = Regex::new(
        r"prompt[ \t]*=[ \t]*STRING_TOKEN[ \t]*\((?P<token>[a-zA-Z_0-9]+)\)"
    )
    .unwrap();
}
