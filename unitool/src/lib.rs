#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
//! Build-support tooling for UEFI firmware trees.
//!
//! The main job is keeping UQI (Universal Question Identifier) codes in sync with the HII
//! questions that need them: every prompt string referenced by a `oneof`, `numeric`,
//! `checkbox` or `orderedlist` question in a form source must have exactly one
//! `#language uqi` definition with a code no other string uses.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use unitool::{SyncOptions, Strictness, run};
//!
//! let options = SyncOptions::new("Platform/Strings/UqiList.uni")
//!     .with_root("Platform")
//!     .with_update(true)
//!     .with_strictness(Strictness::Warn);
//! let report = run(&options)?;
//! for issue in &report.issues {
//!     println!("{issue}");
//! }
//! assert!(report.is_success());
//! # Ok::<(), unitool::Error>(())
//! ```
//!
//! Also included: BIOS identifier blob generation ([`bios_id`]) and reversed-hex UTC stamps
//! ([`timestamp`]).

pub mod bios_id;
pub mod encoding;
pub mod error;
pub mod form;
pub mod patterns;
pub mod report;
pub mod sync;
pub mod timestamp;
pub mod uni;
pub mod walk;

// Re-export most used types for easy consumption
pub use crate::{
    encoding::{EncodedText, TextEncoding},
    error::Error,
    form::StringReference,
    report::{Issue, IssueKind, Severity, SyncReport, UqiEntry},
    sync::{Strictness, SyncContext, SyncOptions, UQI_FILE_NAME, run},
};
