use std::path::PathBuf;

use chrono::Utc;
use unitool::bios_id;
use unitool::timestamp::{StampKind, utc_stamp};

#[derive(Debug, Clone)]
pub struct BiosIdOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub batch: Option<PathBuf>,
}

pub fn run_bios_id_command(opts: BiosIdOptions) -> Result<(), String> {
    let id = bios_id::generate(&opts.input, &opts.output, opts.batch.as_deref(), Utc::now())
        .map_err(|e| e.to_string())?;
    println!("BIOS ID: {}", id);
    println!("Written: {}", opts.output.display());
    if let Some(batch) = &opts.batch {
        println!("Batch file written: {}", batch.display());
    }
    Ok(())
}

pub fn run_utc_stamp_command(kind: &str) -> Result<(), String> {
    let kind: StampKind = kind.parse().map_err(|e: unitool::Error| e.to_string())?;
    println!("{}", utc_stamp(kind, Utc::now()));
    Ok(())
}
