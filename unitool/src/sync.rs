//! UQI synchronization: scan a firmware tree, validate UQI assignments, and optionally
//! allocate new codes or strip non-English strings.
//!
//! All state lives in a [`SyncContext`] owned by the caller. [`run`] drives the passes in
//! order: scan, strip languages, index, validate, allocate, flush.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    encoding::{self, EncodedText},
    error::Error,
    form::{self, StringReference},
    report::{Issue, IssueKind, LanguageRemoval, Severity, SyncReport, UqiEntry},
    uni,
    walk::{self, FileClassifier, FileKind, Walked},
};

/// File name used when the output path is a directory.
pub const UQI_FILE_NAME: &str = "UqiList.uni";

/// How to treat one string token prompted by questions bound to different variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    #[default]
    Off,
    Warn,
    Error,
}

impl FromStr for Strictness {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Strictness::Off),
            "w" | "warn" | "warning" => Ok(Strictness::Warn),
            "e" | "error" => Ok(Strictness::Error),
            other => Err(Error::invalid_config(format!(
                "unknown strictness `{other}`, expected off, warn or error"
            ))),
        }
    }
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strictness::Off => write!(f, "off"),
            Strictness::Warn => write!(f, "warn"),
            Strictness::Error => write!(f, "error"),
        }
    }
}

/// Options controlling a synchronization run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncOptions {
    /// Directories to scan.
    pub roots: Vec<PathBuf>,
    /// UQI list file, or a directory holding [`UQI_FILE_NAME`].
    pub output: PathBuf,
    /// Subdirectories skipped under every root.
    pub excluded: Vec<PathBuf>,
    /// Assign codes to referenced strings that have none.
    pub update: bool,
    /// Move UQI lines into the UQI list and drop non-English strings from other files.
    pub strip_languages: bool,
    pub strictness: Strictness,
    /// Code prefix for new lines when the UQI list has no definition to copy it from.
    pub default_prefix: Option<String>,
}

impl SyncOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    pub fn with_excluded(mut self, dir: impl Into<PathBuf>) -> Self {
        self.excluded.push(dir.into());
        self
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn with_strip_languages(mut self, strip: bool) -> Self {
        self.strip_languages = strip;
        self
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_default_prefix(mut self, prefix: Option<String>) -> Self {
        self.default_prefix = prefix;
        self
    }

    /// The UQI list file this run reads and amends.
    pub fn target_file(&self) -> PathBuf {
        if self.output.is_dir() {
            self.output.join(UQI_FILE_NAME)
        } else {
            self.output.clone()
        }
    }

    /// Every `root/excluded` combination.
    pub fn excluded_paths(&self) -> Result<Vec<PathBuf>, Error> {
        let mut paths = Vec::with_capacity(self.excluded.len() * self.roots.len());
        for dir in &self.excluded {
            for root in &self.roots {
                if dir == root {
                    return Err(Error::invalid_config(format!(
                        "excluded directory `{}` is the same as a root directory",
                        dir.display()
                    )));
                }
                paths.push(root.join(dir));
            }
        }
        Ok(paths)
    }
}

/// A scanned `.uni` file and its possibly modified content.
#[derive(Debug, Clone)]
pub struct ResourceFile {
    pub path: PathBuf,
    pub content: EncodedText,
    pub dirty: bool,
}

/// Mutable state of one run.
#[derive(Debug)]
pub struct SyncContext {
    strictness: Strictness,
    classifier: FileClassifier,
    target: ResourceFile,
    target_canonical: Option<PathBuf>,
    target_exists: bool,
    /// Cleared when the existing target could not be read, so it is never overwritten.
    target_writable: bool,
    resources: Vec<ResourceFile>,
    form_files: usize,
    entries: Vec<UqiEntry>,
    defined: HashSet<String>,
    /// First reference to each token, in the order tokens were first seen.
    references: Vec<StringReference>,
    reference_index: HashMap<String, usize>,
    pending: Vec<String>,
    report: SyncReport,
}

impl SyncContext {
    /// Creates a context and loads the target UQI list if it exists.
    pub fn new(options: &SyncOptions) -> Result<Self, Error> {
        let target_path = options.target_file();
        let mut report = SyncReport {
            target: target_path.clone(),
            ..SyncReport::default()
        };

        let target_exists = target_path.exists();
        let mut target_writable = true;
        let content = if target_exists {
            match encoding::read_text(&target_path) {
                Ok(content) => content,
                Err(e) => {
                    target_writable = false;
                    report.issues.push(
                        Issue::new(
                            IssueKind::FileReadFailure,
                            Severity::Error,
                            target_path.display().to_string(),
                            format!("Cannot read UQI file: {e}"),
                        )
                        .with_path(&target_path),
                    );
                    EncodedText::default()
                }
            }
        } else {
            EncodedText::default()
        };
        tracing::debug!(uqi_file = %target_path.display(), encoding = %content.encoding, "loaded UQI file");

        Ok(Self {
            strictness: options.strictness,
            classifier: FileClassifier::new()?,
            target_canonical: fs::canonicalize(&target_path).ok(),
            target: ResourceFile {
                path: target_path,
                content,
                dirty: false,
            },
            target_exists,
            target_writable,
            resources: Vec::new(),
            form_files: 0,
            entries: Vec::new(),
            defined: HashSet::new(),
            references: Vec::new(),
            reference_index: HashMap::new(),
            pending: Vec::new(),
            report,
        })
    }

    /// Walks `root` and loads every resource and form file under it.
    ///
    /// Fails only if `root` itself cannot be read.
    pub fn scan(&mut self, root: &Path, excluded: &[PathBuf]) -> Result<(), Error> {
        tracing::debug!(root = %root.display(), "scanning");
        for walked in walk::walk_files(root, excluded)? {
            match walked {
                Walked::File(path) => match self.classifier.classify(&path) {
                    Some(FileKind::Resource) => self.load_resource(path),
                    Some(FileKind::Form) => self.load_form(path),
                    None => {}
                },
                Walked::Unreadable { reason } => {
                    tracing::warn!(root = %root.display(), %reason, "skipping unreadable entry");
                    self.report.issues.push(
                        Issue::new(
                            IssueKind::FileReadFailure,
                            Severity::Warning,
                            root.display().to_string(),
                            format!("Skipped unreadable entry: {reason}"),
                        )
                        .with_path(root),
                    );
                }
            }
        }
        Ok(())
    }

    fn is_target(&self, path: &Path) -> bool {
        match &self.target_canonical {
            Some(target) => fs::canonicalize(path).is_ok_and(|p| &p == target),
            None => path == self.target.path,
        }
    }

    fn load_resource(&mut self, path: PathBuf) {
        if self.is_target(&path) {
            return;
        }
        match encoding::read_text(&path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), encoding = %content.encoding, "read resource file");
                self.resources.push(ResourceFile {
                    path,
                    content,
                    dirty: false,
                });
            }
            Err(e) => self.read_failure(path, e),
        }
    }

    fn load_form(&mut self, path: PathBuf) {
        let text = match fs::read(&path)
            .and_then(|bytes| encoding::decode(&bytes))
            .map_err(|e| Error::io(&path, e))
        {
            Ok(content) => content.text,
            Err(e) => return self.read_failure(path, e),
        };
        self.form_files += 1;
        let references = form::scan_questions(&text, &path);
        tracing::debug!(path = %path.display(), references = references.len(), "read form file");
        for reference in references {
            self.record_reference(reference);
        }
    }

    fn read_failure(&mut self, path: PathBuf, error: Error) {
        tracing::warn!(path = %path.display(), %error, "cannot read file; skipping");
        self.report.issues.push(
            Issue::new(
                IssueKind::FileReadFailure,
                Severity::Warning,
                path.display().to_string(),
                format!("Error opening {} for reading", path.display()),
            )
            .with_path(path),
        );
    }

    /// Records a prompt reference, flagging a token already bound to another variable.
    pub fn record_reference(&mut self, reference: StringReference) {
        let Some(&index) = self.reference_index.get(&reference.token) else {
            self.reference_index
                .insert(reference.token.clone(), self.references.len());
            self.references.push(reference);
            return;
        };

        let first = &self.references[index];
        let (Some(first_var), Some(this_var)) = (&first.var_id, &reference.var_id) else {
            return;
        };
        if first_var == this_var {
            return;
        }

        let severity = match self.strictness {
            Strictness::Off => return,
            Strictness::Warn => Severity::Warning,
            Strictness::Error => Severity::Error,
        };
        let issue = Issue::new(
            IssueKind::ConflictingReference,
            severity,
            reference.token.clone(),
            format!(
                "{} referred by different HII questions({} and {})",
                reference.token, first_var, this_var
            ),
        )
        .with_path(first.path.clone())
        .with_path(reference.path);
        self.report.issues.push(issue);
    }

    /// Moves UQI lines out of every scanned resource file into the target, and removes string
    /// blocks in languages other than English.
    pub fn strip_languages(&mut self) {
        for resource in &mut self.resources {
            let moved = uni::take_uqi_lines(&mut resource.content.text);
            if !moved.is_empty() {
                for line in &moved {
                    uni::append_line(&mut self.target.content.text, line);
                }
                self.target.dirty = true;
                resource.dirty = true;
                self.report.relocated_definitions += moved.len();
                tracing::info!(path = %resource.path.display(), count = moved.len(), "deleted uqis");
            }

            let removed = uni::strip_foreign_languages(&mut resource.content.text);
            if !removed.is_empty() {
                resource.dirty = true;
                for language in removed {
                    tracing::info!(path = %resource.path.display(), %language, "deleted language");
                    self.report.removed_languages.push(LanguageRemoval {
                        path: resource.path.clone(),
                        language,
                    });
                }
            }
        }
    }

    /// Collects UQI entries and string definitions from the (possibly stripped) buffers.
    ///
    /// Strings defined in the target do not count as definitions.
    pub fn index(&mut self) {
        self.entries.clear();
        self.defined.clear();
        for resource in &self.resources {
            self.entries
                .extend(uni::uqi_definitions(&resource.content.text).into_iter().map(|d| {
                    UqiEntry {
                        identifier: d.identifier,
                        code: d.code,
                        path: resource.path.clone(),
                    }
                }));
            self.defined
                .extend(uni::defined_strings(&resource.content.text));
        }
        self.entries.extend(
            uni::uqi_definitions(&self.target.content.text)
                .into_iter()
                .map(|d| UqiEntry {
                    identifier: d.identifier,
                    code: d.code,
                    path: self.target.path.clone(),
                }),
        );

        self.report.resource_files = self.resources.len() + usize::from(self.target_exists);
        self.report.form_files = self.form_files;
        self.report.existing_entries = self.entries.len();
        self.report.referenced_tokens = self.references.len();
    }

    /// Checks for duplicates, missing definitions and missing codes.
    ///
    /// With `update`, tokens without a code are queued for [`SyncContext::allocate`] instead
    /// of being errors, and missing definitions are only warnings.
    pub fn validate(&mut self, update: bool) {
        let mut by_identifier: HashMap<&str, &UqiEntry> = HashMap::new();
        let mut by_code: HashMap<u16, &UqiEntry> = HashMap::new();
        let mut issues = Vec::new();

        for entry in &self.entries {
            if let Some(first) = by_identifier.get(entry.identifier.as_str()) {
                issues.push(
                    Issue::new(
                        IssueKind::DuplicateIdentifier,
                        Severity::Error,
                        entry.identifier.clone(),
                        format!(
                            "UQI string {} was assigned more than once and will cause corruption",
                            entry.identifier
                        ),
                    )
                    .with_path(first.path.clone())
                    .with_path(entry.path.clone()),
                );
            } else {
                by_identifier.insert(&entry.identifier, entry);
            }

            if let Some(first) = by_code.get(&entry.code) {
                issues.push(
                    Issue::new(
                        IssueKind::DuplicateCode,
                        Severity::Error,
                        format!("{:04x}", entry.code),
                        format!(
                            "UQI value {:04x} was assigned more than once and will cause corruption",
                            entry.code
                        ),
                    )
                    .with_path(first.path.clone())
                    .with_path(entry.path.clone()),
                );
            } else {
                by_code.insert(entry.code, entry);
            }
        }

        let mut pending = Vec::new();
        for reference in &self.references {
            if !self.defined.contains(&reference.token) {
                let severity = if update {
                    Severity::Warning
                } else {
                    Severity::Error
                };
                issues.push(
                    Issue::new(
                        IssueKind::MissingDefinition,
                        severity,
                        reference.token.clone(),
                        format!(
                            "No definition for {} referred by HII question",
                            reference.token
                        ),
                    )
                    .with_path(reference.path.clone()),
                );
            }

            if !by_identifier.contains_key(reference.token.as_str()) {
                if update {
                    pending.push(reference.token.clone());
                } else {
                    issues.push(
                        Issue::new(
                            IssueKind::MissingCode,
                            Severity::Error,
                            reference.token.clone(),
                            format!("No UQI for {} referred by HII question", reference.token),
                        )
                        .with_path(reference.path.clone()),
                    );
                }
            }
        }

        self.report.issues.extend(issues);
        self.pending = pending;
    }

    /// True when a fatal issue has been recorded so far.
    pub fn has_errors(&self) -> bool {
        !self.report.is_success()
    }

    /// Assigns consecutive codes above the highest existing code to every queued token and
    /// appends their definitions to the target buffer.
    ///
    /// If the queue does not fit below `0xFFFF`, nothing is assigned and the first token that
    /// would overflow is returned in [`Error::CodeSpaceExhausted`].
    pub fn allocate(&mut self, default_prefix: Option<&str>) -> Result<(), Error> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let prefix = uni::detect_prefix(&self.target.content.text)
            .or_else(|| default_prefix.map(str::to_string))
            .unwrap_or_else(|| uni::DEFAULT_PREFIX.to_string());
        let mut next: u32 = self
            .entries
            .iter()
            .map(|e| u32::from(e.code) + 1)
            .max()
            .unwrap_or(0);
        let room = (u32::from(u16::MAX) + 1).saturating_sub(next) as usize;
        if let Some(token) = self.pending.get(room) {
            return Err(Error::CodeSpaceExhausted(token.clone()));
        }

        for token in std::mem::take(&mut self.pending) {
            let code = u16::try_from(next).map_err(|_| Error::CodeSpaceExhausted(token.clone()))?;
            let line = uni::format_uqi_line(&token, &prefix, code);
            tracing::info!(token = %token, code = %format!("{code:04x}"), "assigned new UQI value");
            uni::append_line(&mut self.target.content.text, &line);
            let entry = UqiEntry {
                identifier: token,
                code,
                path: self.target.path.clone(),
            };
            self.entries.push(entry.clone());
            self.report.allocated.push(entry);
            next += 1;
        }
        self.target.dirty = true;
        Ok(())
    }

    /// Rewrites every modified file in full. Write failures become issues.
    ///
    /// The target goes first; if relocated UQI lines cannot be saved there, the files they
    /// were taken from are left untouched.
    pub fn flush(&mut self) {
        let mut target_saved = true;
        if self.target.dirty {
            target_saved = self.write_target();
        }

        let keep_sources = !target_saved && self.report.relocated_definitions > 0;
        for resource in self.resources.iter().filter(|r| r.dirty) {
            if keep_sources {
                self.report.issues.push(
                    Issue::new(
                        IssueKind::FileWriteFailure,
                        Severity::Error,
                        resource.path.display().to_string(),
                        format!(
                            "{} not rewritten because its UQIs could not be moved",
                            resource.path.display()
                        ),
                    )
                    .with_path(resource.path.clone()),
                );
                continue;
            }
            match encoding::write_text(&resource.path, &resource.content) {
                Ok(()) => {
                    tracing::info!(path = %resource.path.display(), "rewrote resource file");
                    self.report.rewritten.push(resource.path.clone());
                }
                Err(e) => self.report.issues.push(write_failure(&resource.path, &e)),
            }
        }
    }

    fn write_target(&mut self) -> bool {
        let path = self.target.path.clone();
        if !self.target_writable {
            self.report.issues.push(
                Issue::new(
                    IssueKind::FileWriteFailure,
                    Severity::Error,
                    path.display().to_string(),
                    format!("{} was not readable and is left unchanged", path.display()),
                )
                .with_path(&path),
            );
            return false;
        }
        if !self.target_exists {
            tracing::info!(path = %path.display(), "UQI file did not exist; creating new file");
        }
        match encoding::write_text(&path, &self.target.content) {
            Ok(()) => {
                self.report.rewritten.push(path);
                true
            }
            Err(e) => {
                self.report.issues.push(write_failure(&path, &e));
                false
            }
        }
    }

    /// Entries known so far, in scan order followed by allocations.
    pub fn entries(&self) -> &[UqiEntry] {
        &self.entries
    }

    /// First reference to every token, in the order they were first seen.
    pub fn references(&self) -> &[StringReference] {
        &self.references
    }

    pub fn target(&self) -> &ResourceFile {
        &self.target
    }

    pub fn into_report(self) -> SyncReport {
        self.report
    }
}

fn write_failure(path: &Path, error: &Error) -> Issue {
    tracing::warn!(path = %path.display(), %error, "cannot write file");
    Issue::new(
        IssueKind::FileWriteFailure,
        Severity::Error,
        path.display().to_string(),
        format!("Error opening {} for writing: {error}", path.display()),
    )
    .with_path(path)
}

/// Runs a full synchronization as described by `options`.
///
/// Returns `Err` only for bad options or an unreadable root. Everything else, exhausted code
/// space included, is reported through [`SyncReport::issues`] and the remaining files are
/// still written.
pub fn run(options: &SyncOptions) -> Result<SyncReport, Error> {
    if options.roots.is_empty() {
        return Err(Error::invalid_config("at least one root directory is required"));
    }
    let excluded = options.excluded_paths()?;

    let mut ctx = SyncContext::new(options)?;
    for root in &options.roots {
        ctx.scan(root, &excluded)?;
    }
    if options.strip_languages {
        ctx.strip_languages();
    }
    ctx.index();
    ctx.validate(options.update);
    if options.update && !ctx.has_errors() {
        if let Err(error) = ctx.allocate(options.default_prefix.as_deref()) {
            tracing::warn!(%error, "no new UQI values assigned");
            let subject = match &error {
                Error::CodeSpaceExhausted(token) => token.clone(),
                other => other.to_string(),
            };
            let issue = Issue::new(
                IssueKind::CodeSpaceExhausted,
                Severity::Error,
                subject,
                error.to_string(),
            )
            .with_path(ctx.target.path.clone());
            ctx.report.issues.push(issue);
        }
    }
    ctx.flush();
    Ok(ctx.into_report())
}
