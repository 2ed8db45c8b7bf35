//! Quick commandline utility to pull out an MRI slice and its matching atlas slice.
//!
//! Both slices are written as single-slice nifti files whose affines keep
//! them in the original world space, so they can be overlaid in any viewer
//! to check a correspondence before adjusting or confirming it with `rbsync`.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};

use rbsync::logging::{init_logging, LogConfig, LogFormat};
use rbsync::preview::write_slice_pair;
use rbsync::volume::load_volume;
use rbsync::{Session, SliceAxis};

// use clap to create commandline interface
#[derive(Parser, Debug)]
#[command(author, about, version, long_about)]
struct Args {
    /// the sparse MRI nifti file
    #[arg(short, long)]
    mri: PathBuf,

    /// the reference atlas nifti file
    #[arg(short, long)]
    atlas: PathBuf,

    /// Axis to slice along:
    ///     AP or 0, LR or 1, SI or 2.
    #[arg(short = 'x', long, default_value = "SI", value_parser = parse_axis)]
    axis: SliceAxis,

    /// index of the MRI slice
    #[arg(short, long, default_value_t = 0)]
    slice: usize,

    /// atlas slice to pair with instead of the automatic match
    #[arg(long)]
    atlas_slice: Option<usize>,

    /// an output path where a directory will be created to store the pair
    #[arg(short, long, default_value = "./")]
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

/// File name without `.nii` / `.nii.gz`.
fn basename(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "volume".to_string());
    name.strip_suffix(".gz")
        .unwrap_or(&name)
        .strip_suffix(".nii")
        .map(str::to_string)
        .unwrap_or_else(|| name.clone())
}

/// Atlas slice to write for the session's current MRI slice, and the line
/// describing the pair.
fn pair_label(session: &Session, atlas_slice: Option<usize>) -> rbsync::Result<(usize, String)> {
    match atlas_slice {
        Some(index) => Ok((
            index,
            format!(
                "MRI slice {} → Atlas slice {} (manual)",
                session.current(),
                index
            ),
        )),
        None => {
            let index = session.preview_current()?.index;
            Ok((index, session.correspondence_label()))
        }
    }
}

fn run(cli: Args) -> anyhow::Result<()> {
    let mri = load_volume(&cli.mri)
        .with_context(|| format!("could not load MRI {}", cli.mri.display()))?;
    let atlas = load_volume(&cli.atlas)
        .with_context(|| format!("could not load atlas {}", cli.atlas.display()))?;

    let mut session = Session::new(mri.geometry.clone(), atlas.geometry.clone(), cli.axis);
    session.select(cli.slice)?;
    let (atlas_index, label) = pair_label(&session, cli.atlas_slice)?;
    println!("{label}");

    let mri_name = basename(&cli.mri);
    let atlas_name = basename(&cli.atlas);
    let save_dir = cli.output.join(format!("{mri_name}_pairs"));
    let (mri_path, atlas_path) = write_slice_pair(
        (&mri, &mri_name),
        (&atlas, &atlas_name),
        cli.slice,
        atlas_index,
        cli.axis,
        &save_dir,
    )?;
    println!("MRI:   {}", mri_path.display());
    println!("Atlas: {}", atlas_path.display());
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

#[cfg(test)]
mod tests {
    use super::*;
    use rbsync::VolumeGeometry;

    #[test]
    fn strips_nifti_extensions() {
        assert_eq!(basename(Path::new("/data/dti.nii.gz")), "dti");
        assert_eq!(basename(Path::new("atlas.nii")), "atlas");
        assert_eq!(basename(Path::new("raw")), "raw");
    }

    fn session() -> Session {
        let mut affine = nalgebra::Matrix4::identity();
        affine[(2, 2)] = 2.0;
        let mri = VolumeGeometry::new([8, 8, 5], affine).unwrap();
        affine[(2, 2)] = 0.5;
        let atlas = VolumeGeometry::new([8, 8, 20], affine).unwrap();
        Session::new(mri, atlas, SliceAxis::SI)
    }

    #[test]
    fn label_follows_automatic_match() {
        let mut s = session();
        s.select(2).unwrap();
        let (index, label) = pair_label(&s, None).unwrap();
        assert_eq!(index, 8);
        assert_eq!(label, "MRI slice 2 → Atlas slice 8 ?");
    }

    #[test]
    fn label_follows_atlas_override() {
        let mut s = session();
        s.select(2).unwrap();
        let (index, label) = pair_label(&s, Some(11)).unwrap();
        assert_eq!(index, 11);
        assert_eq!(label, "MRI slice 2 → Atlas slice 11 (manual)");
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
