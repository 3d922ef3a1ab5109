//! smd2ibw — Convert SMD hyperspectral scan files to Igor Binary Wave format.

use clap::Parser;
use std::path::{Path, PathBuf};

use smd2ibw::{IbwConverter, SimpleCubeParser, SpectralUnit};

#[derive(Parser)]
#[command(
    name = "smd2ibw",
    version,
    about = "Convert SMD hyperspectral scan files to Igor Binary Wave format"
)]
struct Cli {
    /// Input SMD file
    #[arg(short, long)]
    r#in: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Output wave name (default: derived from the input file name)
    #[arg(short, long)]
    name: Option<String>,

    /// Detector to convert
    #[arg(short, long, default_value_t = 0)]
    detector: usize,

    /// Also write the spectral axis wave in this unit (nm, cm-1, GHz)
    #[arg(short, long)]
    axis: Option<String>,

    /// Verbose mode
    #[arg(short, long, default_value_t = false)]
    verb: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // resolve the axis unit up front so bad unit strings fail early
    let axis_unit: Option<SpectralUnit> = match &cli.axis {
        Some(unit) => Some(unit.parse()?),
        None => None,
    };

    let smd_data = SimpleCubeParser::read_file(&cli.r#in)?;
    let converter = IbwConverter::new(&smd_data);

    let name = match &cli.name {
        Some(name) => name.clone(),
        None => default_wave_name(&cli.r#in),
    };

    if cli.verb {
        let [z, y, x] = smd_data.spatial_size();
        eprintln!("Parsed: {}", cli.r#in.display());
        eprintln!("  Spatial size (Z, Y, X): {} x {} x {}", z, y, x);
        eprintln!("  Detectors: {:?}", smd_data.detector_names());
        eprintln!("  Spectral sizes: {:?}", smd_data.detector_sizes());
    }

    let body = converter.make_body(&name, cli.detector)?;
    let body_path = cli.out.join(format!("{name}.ibw"));
    ibw_io::write_ibw_file(&body_path, &body)?;
    if cli.verb {
        eprintln!("Saved: {} {:?}", body_path.display(), body.shape());
    }

    if let Some(unit) = axis_unit {
        let axis_name = format!("{name}_{}", axis_name_suffix(unit));
        let axis = converter.make_spectral_axis(&axis_name, cli.detector, unit)?;
        let axis_path = cli.out.join(format!("{axis_name}.ibw"));
        ibw_io::write_ibw_file(&axis_path, &axis)?;
        if cli.verb {
            eprintln!("Saved: {} {:?}", axis_path.display(), axis.shape());
        }
    }

    Ok(())
}

fn axis_name_suffix(unit: SpectralUnit) -> &'static str {
    match unit {
        SpectralUnit::Nm => "nm",
        SpectralUnit::InvCm => "cm1",
        SpectralUnit::GigaHz => "GHz",
    }
}

/// Derive a legal wave name from the input file stem: spaces become
/// underscores, other illegal characters are dropped, and a name that does
/// not start with a letter gets a "wave" prefix.
fn default_wave_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name: String = stem
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if !name.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        name = format!("wave{name}");
    }
    name.truncate(ibw_core::MAX_WAVE_NAME);
    name
}
