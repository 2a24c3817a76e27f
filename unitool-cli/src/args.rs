//! Command-line normalization shared by all subcommands.
//!
//! The older tools accepted some spellings clap cannot express directly, such as the
//! two-letter short flag `-ob`. They are rewritten to their long forms before parsing so
//! both styles reach the same clap definitions.

/// Legacy spellings and the long option each one stands for.
const LEGACY_FLAGS: &[(&str, &str)] = &[
    ("-ob", "--batch"),
    ("--int", "--input"),
    ("--out", "--output"),
    ("--updata", "--update"),
];

/// Rewrites legacy flags in `args` (program name included) to their long forms.
pub fn normalize_legacy_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            LEGACY_FLAGS
                .iter()
                .find(|(legacy, _)| *legacy == arg)
                .map(|(_, long)| long.to_string())
                .unwrap_or(arg)
        })
        .collect()
}
