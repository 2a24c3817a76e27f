//! Directory traversal and file classification for a scan.

use std::{
    fs,
    path::{Path, PathBuf},
};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::error::Error;

const RESOURCE_GLOBS: &[&str] = &["*.uni"];
const FORM_GLOBS: &[&str] = &["*.vf*", "*.hfr", "*.sd", "*.sdi"];

/// What a scanned file contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// String resource (`.uni`).
    Resource,
    /// Form source with question blocks.
    Form,
}

/// Matches file names against the resource and form globs.
#[derive(Debug, Clone)]
pub struct FileClassifier {
    resource: GlobSet,
    form: GlobSet,
}

impl FileClassifier {
    pub fn new() -> Result<Self, Error> {
        Ok(Self {
            resource: build_set(RESOURCE_GLOBS)?,
            form: build_set(FORM_GLOBS)?,
        })
    }

    /// Classifies `path` by its file name; directories in the path are not considered.
    pub fn classify(&self, path: &Path) -> Option<FileKind> {
        let name = path.file_name()?;
        if self.resource.is_match(name) {
            Some(FileKind::Resource)
        } else if self.form.is_match(name) {
            Some(FileKind::Form)
        } else {
            None
        }
    }
}

fn build_set(patterns: &[&str]) -> Result<GlobSet, Error> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// One result of walking a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Walked {
    File(PathBuf),
    /// A directory or entry below the root that could not be read.
    Unreadable { reason: String },
}

/// Lists every file under `root` depth first, sorted by name within each directory.
///
/// Directories whose path equals one of `excluded` are skipped with everything below them.
/// Nothing is filtered by hidden-file or ignore-file rules. A root that cannot be listed is
/// an error; anything unreadable below it is reported as [`Walked::Unreadable`].
pub fn walk_files(root: &Path, excluded: &[PathBuf]) -> Result<Vec<Walked>, Error> {
    let metadata = fs::metadata(root).map_err(|e| Error::RootUnreadable {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;
    if !metadata.is_dir() {
        return Err(Error::RootUnreadable {
            path: root.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    fs::read_dir(root).map_err(|e| Error::RootUnreadable {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let excluded = excluded.to_vec();
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |dent| !excluded.iter().any(|ex| dent.path() == ex.as_path()))
        .build();

    let mut out = Vec::new();
    for dent in walker {
        let dent = match dent {
            Ok(d) => d,
            Err(e) => {
                out.push(Walked::Unreadable {
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if dent.file_type().is_some_and(|t| t.is_file()) {
            out.push(Walked::File(dent.into_path()));
        }
    }
    Ok(out)
}
