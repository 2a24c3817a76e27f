use std::path::{Path, PathBuf};

use serde_json::json;
use unitool::{Strictness, SyncOptions, SyncReport};

use crate::config::{UqiConfig, load_config};

#[derive(Debug, Clone, Default)]
pub struct UqiCommandOptions {
    pub dirs: Vec<PathBuf>,
    pub output: Option<PathBuf>,
    pub exclude: Vec<PathBuf>,
    /// Accepted for compatibility with older build scripts; validation always runs.
    pub build: bool,
    pub update: bool,
    pub lang: bool,
    pub strictness: Option<Strictness>,
    pub prefix: Option<String>,
    pub config: Option<PathBuf>,
    pub report_json: Option<PathBuf>,
    /// `ROOT UQI_FILE [EXCLUDED...]`
    pub legacy: Vec<PathBuf>,
}

/// Merges flags, legacy positionals and the config file into library options.
///
/// Explicit flags win over positionals, which win over the config file. `--build` only
/// names the default validate mode; `--update` still applies alongside it.
pub fn resolve_options(opts: &UqiCommandOptions) -> Result<SyncOptions, String> {
    let config = match &opts.config {
        Some(path) => load_config(path)?.uqi,
        None => UqiConfig::default(),
    };

    let mut legacy = opts.legacy.iter();
    let legacy_root = legacy.next();
    let legacy_output = legacy.next();
    let legacy_excluded: Vec<PathBuf> = legacy.cloned().collect();

    if opts.output.is_some() && legacy_output.is_some() {
        return Err("UQI file given both with --output and as a positional argument".to_string());
    }

    let mut roots = opts.dirs.clone();
    roots.extend(legacy_root.cloned());
    if roots.is_empty() {
        roots = config.roots;
    }
    if roots.is_empty() {
        return Err("No root directory given; use -d DIR or pass ROOT UQI_FILE".to_string());
    }

    let output = opts
        .output
        .clone()
        .or_else(|| legacy_output.cloned())
        .or(config.output)
        .ok_or_else(|| "No UQI file given; use -o FILE".to_string())?;

    let mut excluded = opts.exclude.clone();
    excluded.extend(legacy_excluded);
    if excluded.is_empty() {
        excluded = config.exclude;
    }

    Ok(SyncOptions {
        roots,
        output,
        excluded,
        update: opts.update,
        strip_languages: opts.lang,
        strictness: opts.strictness.or(config.strictness).unwrap_or_default(),
        default_prefix: opts.prefix.clone().or(config.prefix),
    })
}

fn print_report(report: &SyncReport) {
    for removal in &report.removed_languages {
        println!(
            "Removed language {} from {}",
            removal.language,
            removal.path.display()
        );
    }
    if report.relocated_definitions > 0 {
        println!(
            "Moved {} UQI definition(s) into {}",
            report.relocated_definitions,
            report.target.display()
        );
    }
    for issue in &report.issues {
        println!("{}", issue);
    }
    for entry in &report.allocated {
        println!("{} assigned UQI {:04x}", entry.identifier, entry.code);
    }
    for path in &report.rewritten {
        println!("Updated {}", path.display());
    }
}

fn write_report(path: &Path, options: &SyncOptions, report: &SyncReport) -> Result<(), String> {
    let payload = json!({
        "roots": options.roots,
        "output": report.target,
        "excluded": options.excluded,
        "update": options.update,
        "strip_languages": options.strip_languages,
        "strictness": options.strictness,
        "success": report.is_success(),
        "summary": {
            "resource_files": report.resource_files,
            "form_files": report.form_files,
            "existing_entries": report.existing_entries,
            "referenced_tokens": report.referenced_tokens,
            "allocated": report.allocated.len(),
            "relocated_definitions": report.relocated_definitions,
            "errors": report.errors().count(),
            "warnings": report.warnings().count()
        },
        "allocated": report.allocated,
        "removed_languages": report.removed_languages,
        "rewritten": report.rewritten,
        "issues": report.issues
    });

    let text = serde_json::to_string_pretty(&payload)
        .map_err(|e| format!("Failed to serialize report JSON: {}", e))?;
    std::fs::write(path, text)
        .map_err(|e| format!("Failed to write report JSON '{}': {}", path.display(), e))
}

pub fn run_uqi_command(opts: UqiCommandOptions) -> Result<(), String> {
    let options = resolve_options(&opts)?;
    println!("UQI file: {}", options.target_file().display());
    tracing::debug!(
        roots = ?options.roots,
        excluded = ?options.excluded,
        update = options.update,
        strictness = %options.strictness,
        "resolved uqi options"
    );

    let report = unitool::run(&options).map_err(|e| e.to_string())?;
    print_report(&report);

    if let Some(report_path) = &opts.report_json {
        write_report(report_path, &options, &report)?;
        println!("Report JSON written: {}", report_path.display());
    }

    if report.is_success() {
        println!("No UQI issues detected");
        Ok(())
    } else {
        Err("Please fix UQI ERROR(s) above before proceeding.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_legacy_positionals_fill_root_output_and_exclusions() {
        let opts = UqiCommandOptions {
            legacy: vec!["Platform".into(), "UqiList.uni".into(), "Build".into()],
            ..Default::default()
        };
        let options = resolve_options(&opts).unwrap();
        assert_eq!(options.roots, vec![PathBuf::from("Platform")]);
        assert_eq!(options.output, PathBuf::from("UqiList.uni"));
        assert_eq!(options.excluded, vec![PathBuf::from("Build")]);
        assert_eq!(options.strictness, Strictness::Off);
    }

    #[test]
    fn test_flags_and_single_positional_root() {
        let opts = UqiCommandOptions {
            dirs: vec!["Silicon".into()],
            output: Some("Out".into()),
            legacy: vec!["Platform".into()],
            strictness: Some(Strictness::Warn),
            ..Default::default()
        };
        let options = resolve_options(&opts).unwrap();
        assert_eq!(
            options.roots,
            vec![PathBuf::from("Silicon"), PathBuf::from("Platform")]
        );
        assert_eq!(options.output, PathBuf::from("Out"));
        assert_eq!(options.strictness, Strictness::Warn);
    }

    #[test]
    fn test_output_given_twice_is_rejected() {
        let opts = UqiCommandOptions {
            output: Some("A.uni".into()),
            legacy: vec!["Platform".into(), "B.uni".into()],
            ..Default::default()
        };
        assert!(resolve_options(&opts).unwrap_err().contains("both"));
    }

    #[test]
    fn test_missing_root_and_output_are_rejected() {
        let err = resolve_options(&UqiCommandOptions::default()).unwrap_err();
        assert!(err.contains("No root directory"));

        let opts = UqiCommandOptions {
            dirs: vec!["Platform".into()],
            ..Default::default()
        };
        assert!(resolve_options(&opts).unwrap_err().contains("No UQI file"));
    }

    #[test]
    fn test_build_does_not_disable_update() {
        let opts = UqiCommandOptions {
            dirs: vec!["Platform".into()],
            output: Some("UqiList.uni".into()),
            build: true,
            update: true,
            ..Default::default()
        };
        assert!(resolve_options(&opts).unwrap().update);
    }

    #[test]
    fn test_config_fills_gaps_but_flags_win() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("unitool.toml");
        fs::write(
            &config_path,
            "[uqi]\nroots = [\"Platform\"]\noutput = \"UqiList.uni\"\nstrictness = \"error\"\nprefix = \"q\"\n",
        )
        .unwrap();

        let opts = UqiCommandOptions {
            config: Some(config_path.clone()),
            strictness: Some(Strictness::Warn),
            ..Default::default()
        };
        let options = resolve_options(&opts).unwrap();
        assert_eq!(options.roots, vec![temp_dir.path().join("Platform")]);
        assert_eq!(options.output, temp_dir.path().join("UqiList.uni"));
        assert_eq!(options.strictness, Strictness::Warn);
        assert_eq!(options.default_prefix.as_deref(), Some("q"));
    }
}
