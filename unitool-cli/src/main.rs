use std::path::PathBuf;

use clap::{Parser, Subcommand};
use unitool::Strictness;
use unitool_cli::args::normalize_legacy_args;
use unitool_cli::bios::{BiosIdOptions, run_bios_id_command, run_utc_stamp_command};
use unitool_cli::logging;
use unitool_cli::uqi::{UqiCommandOptions, run_uqi_command};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check UQI assignments across a firmware tree and optionally assign new ones.
    Uqi {
        /// Root directory to scan (repeatable)
        #[arg(short = 'd', long = "dir", value_name = "DIR")]
        dirs: Vec<PathBuf>,

        /// UQI list file, or a directory holding UqiList.uni
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Subdirectory of every root to skip (repeatable)
        #[arg(short = 'x', long = "exclude", value_name = "DIR")]
        exclude: Vec<PathBuf>,

        /// Validate only; report problems and fail on errors (default mode)
        #[arg(short, long)]
        build: bool,

        /// Assign UQIs to prompt strings that lack one
        #[arg(short, long)]
        update: bool,

        /// Move UQIs into the output file and keep only English strings in resources
        #[arg(short, long)]
        lang: bool,

        /// How to treat one prompt string shared by different variables: off, warn (w), error (e)
        #[arg(short = 'q', long = "question", value_name = "LEVEL", value_parser = parse_strictness)]
        question: Option<Strictness>,

        /// Prefix for new UQI values when none can be detected (default: x)
        #[arg(long)]
        prefix: Option<String>,

        /// TOML file with default roots, output, exclusions, strictness and prefix
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the full report as JSON
        #[arg(long, value_name = "FILE")]
        report_json: Option<PathBuf>,

        /// Legacy form: ROOT UQI_FILE [EXCLUDED...]
        #[arg(value_name = "LEGACY")]
        legacy: Vec<PathBuf>,
    },

    /// Generate a BIOS ID binary from a config file.
    BiosId {
        /// Input config file
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output binary file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Shell file exporting BIOS_ID
        #[arg(long, value_name = "FILE")]
        batch: Option<PathBuf>,
    },

    /// Print the current UTC year, date (MMDD) or time (HHMM) as reversed ASCII hex.
    UtcStamp {
        /// year, date or time
        #[arg(allow_hyphen_values = true)]
        kind: String,
    },
}

fn parse_strictness(value: &str) -> Result<Strictness, String> {
    value.parse().map_err(|e: unitool::Error| e.to_string())
}

fn main() {
    let args = Args::parse_from(normalize_legacy_args(std::env::args()));
    logging::init(args.verbose);

    let result = match args.commands {
        Commands::Uqi {
            dirs,
            output,
            exclude,
            build,
            update,
            lang,
            question,
            prefix,
            config,
            report_json,
            legacy,
        } => run_uqi_command(UqiCommandOptions {
            dirs,
            output,
            exclude,
            build,
            update,
            lang,
            strictness: question,
            prefix,
            config,
            report_json,
            legacy,
        }),
        Commands::BiosId {
            input,
            output,
            batch,
        } => run_bios_id_command(BiosIdOptions {
            input,
            output,
            batch,
        }),
        Commands::UtcStamp { kind } => run_utc_stamp_command(&kind),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
