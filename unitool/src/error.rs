//! All error types for the unitool crate.
//!
//! These are returned from operations that cannot continue at all. Problems found while
//! validating a tree (duplicates, missing definitions, unreadable files) are not errors in
//! this sense; they are collected as [`crate::report::Issue`]s on the report instead.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot read root directory `{}`: {reason}", path.display())]
    RootUnreadable { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("UQI code space exhausted: cannot assign a code to `{0}` above 0xFFFF")]
    CodeSpaceExhausted(String),

    #[error("BIOS ID config error: {0}")]
    BiosConfig(String),
}

impl Error {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }

    pub fn bios_config(message: impl Into<String>) -> Self {
        Error::BiosConfig(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_mentions_path() {
        let error = Error::io(
            "/tmp/UqiList.uni",
            io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied"),
        );
        let display = error.to_string();
        assert!(display.contains("I/O error"));
        assert!(display.contains("UqiList.uni"));
        assert!(display.contains("Permission denied"));
    }

    #[test]
    fn test_root_unreadable_error() {
        let error = Error::RootUnreadable {
            path: PathBuf::from("Platform"),
            reason: "not a directory".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "cannot read root directory `Platform`: not a directory"
        );
    }

    #[test]
    fn test_invalid_config_error() {
        let error = Error::invalid_config("excluded directory equals root");
        assert_eq!(
            error.to_string(),
            "invalid configuration: excluded directory equals root"
        );
    }

    #[test]
    fn test_code_space_exhausted_error() {
        let error = Error::CodeSpaceExhausted("STR_LAST".to_string());
        assert!(error.to_string().contains("STR_LAST"));
        assert!(error.to_string().contains("0xFFFF"));
    }

    #[test]
    fn test_bios_config_error() {
        let error = Error::bios_config("Item BOARD_ID is missing");
        assert_eq!(
            error.to_string(),
            "BIOS ID config error: Item BOARD_ID is missing"
        );
    }

    #[test]
    fn test_error_debug() {
        let error = Error::InvalidConfig("test".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("InvalidConfig"));
        assert!(debug.contains("test"));
    }
}
