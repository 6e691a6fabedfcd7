use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use indicatif::MultiProgress;
use log::{error, info};
use vmi_dump::{
    config::DumpConfig,
    dump::{dump_target, parse_output_path, DumpError, DumpOptions, DumpSummary},
    target::Target,
    util::init_logging_with_progress,
};

/// Dump the physical memory of a guest to a flat file.
///
/// Every page from address 0 up to the guest memory size is written in
/// order. Pages that cannot be read are written as zeros.
#[derive(Debug, Parser)]
struct CliArgs {
    /// Domain ID of the running guest, or `file:<path>` to read a raw memory image.
    domain: Target,
    /// Output file (at most 50 characters). Created or truncated.
    #[arg(value_parser = parse_output_path)]
    output: PathBuf,
    /// JSON file with dump options.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Pause the guest while dumping.
    #[arg(long)]
    pause: bool,
    /// Write a JSON summary of the dump to this file.
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Do not show a progress bar.
    #[arg(long)]
    no_progress: bool,
}

fn write_summary(path: &Path, summary: &DumpSummary) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create summary {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer
        .flush()
        .with_context(|| format!("failed to write summary {}", path.display()))?;
    info!("wrote summary to {}", path.display());
    Ok(())
}

fn run(args: CliArgs, progress: MultiProgress) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => DumpConfig::from_jsonfile(path)?,
        None => DumpConfig::default(),
    };
    config.pause |= args.pause;
    config.progress &= !args.no_progress;

    let options = DumpOptions {
        pause: config.pause,
        sync: config.sync,
        progress: config.progress.then_some(progress),
    };
    let summary = dump_target(&args.domain, &args.output, &options)?;
    if let Some(path) = &args.summary {
        write_summary(path, &summary)?;
    }
    Ok(())
}

/// Dump failures carry their own exit code, everything else exits 1.
fn exit_status(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<DumpError>() {
        Some(e) => e.exit_code(),
        None => 1,
    }
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let progress = match init_logging_with_progress() {
        Ok(progress) => progress,
        Err(e) => {
            eprintln!("failed to initialize logging: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    match run(args, progress) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_status(&e))
        }
    }
}
