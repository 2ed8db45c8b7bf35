//! Commandline utility to match the slices of a sparse MRI scan to an atlas.
//!
//! Every MRI slice is paired with the atlas slice closest to it in physical
//! space, using only the two files' affines. Adjustments and confirmations
//! found by inspecting the pairs (see `slicepair`) can be applied on top
//! before the mapping is exported as JSON or CSV.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use rbsync::logging::{init_logging, LogConfig, LogFormat};
use rbsync::volume::load_geometry;
use rbsync::{ExportFormat, MatchStatus, Session, SliceAxis};

// use clap to create commandline interface
#[derive(Parser, Debug)]
#[command(author, about, version, long_about)]
struct Args {
    /// the sparse MRI nifti file (DTI, T2, parametric map, ...)
    #[arg(short, long)]
    mri: PathBuf,

    /// the reference atlas nifti file
    #[arg(short, long)]
    atlas: PathBuf,

    /// Axis to slice along:
    ///     AP or 0, LR or 1, SI or 2.
    #[arg(short = 'x', long, default_value = "SI", value_parser = parse_axis)]
    axis: SliceAxis,

    /// Shift the atlas slice of an MRI slice, e.g. `--adjust 5:-2`.
    /// Applied after auto-matching; may be repeated.
    #[arg(long = "adjust", value_name = "IDX:DELTA", value_parser = parse_adjustment)]
    adjustments: Vec<(usize, i64)>,

    /// Accept the automatic match of an MRI slice; may be repeated.
    #[arg(long = "confirm", value_name = "IDX")]
    confirm: Vec<usize>,

    /// Accept every remaining automatic match.
    #[arg(long)]
    confirm_all: bool,

    /// where to write the mapping; the extension picks the format (.json or .csv)
    #[arg(short, long, default_value = "slice_mapping.json")]
    output: PathBuf,

    /// -v for debug output, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn parse_axis(val: &str) -> Result<SliceAxis, String> {
    val.parse::<SliceAxis>().map_err(|e| e.to_string())
}

fn parse_adjustment(val: &str) -> Result<(usize, i64), String> {
    let (idx, delta) = val
        .split_once(':')
        .ok_or_else(|| format!("expected IDX:DELTA, got '{val}'"))?;
    let idx = idx
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("bad slice index '{idx}': {e}"))?;
    let delta = delta
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("bad delta '{delta}': {e}"))?;
    Ok((idx, delta))
}

fn run(cli: Args) -> anyhow::Result<()> {
    let format = ExportFormat::from_path(&cli.output)?;
    let source = load_geometry(&cli.mri)
        .with_context(|| format!("could not load MRI {}", cli.mri.display()))?;
    let target = load_geometry(&cli.atlas)
        .with_context(|| format!("could not load atlas {}", cli.atlas.display()))?;

    let mut session = Session::new(source, target, cli.axis);
    session.auto_match_all()?;

    for &(idx, delta) in &cli.adjustments {
        session.select(idx)?;
        session
            .adjust_current(delta)
            .with_context(|| format!("could not adjust MRI slice {idx}"))?;
    }
    for &idx in &cli.confirm {
        session.select(idx)?;
        session.confirm_current()?;
    }
    if cli.confirm_all {
        for idx in 0..session.slice_count() {
            if session.store().status(idx) == MatchStatus::Auto {
                session.select(idx)?;
                session.confirm_current()?;
            }
        }
    }

    for idx in 0..session.slice_count() {
        session.select(idx)?;
        println!("{}", session.correspondence_label());
    }

    let record = session.export()?;
    record
        .write_to_path(&cli.output, format)
        .with_context(|| format!("could not write {}", cli.output.display()))?;
    println!(
        "Exported {} correspondences ({} confirmed) to {}",
        record.mapping.len(),
        session.store().confirmed_count(),
        cli.output.display()
    );
    Ok(())
}

fn main() {
    let cli = Args::parse();
    let config = LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format);
    if let Err(e) = init_logging(&config) {
        eprintln!("Warning! {}", e);
    }
    if let Err(e) = run(cli) {
        eprintln!("Error! {:#}", e);
        std::process::exit(-2);
    }
}
