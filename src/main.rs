use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use geosolid::config::{OutputKind, PipelineConfig};
use geosolid::pipeline::Pipeline;

/// Converts a GeoJSON polygon layer into fused 3D solids in a DXF file.
#[derive(Parser, Debug)]
#[command(name = "geosolid", version)]
struct Cli {
    /// Path to the GeoJSON polygon layer.
    in_file: PathBuf,

    /// Feature property holding the extrusion height.
    height_field: String,

    /// Feature property holding the vertical offset of each footprint.
    #[arg(short = 'z', long)]
    z_level_field: Option<String>,

    /// Output entity type: 'mesh' (fast) or 'solid'.
    #[arg(short = 't', long = "output-type", default_value = "mesh")]
    output_type: OutputKind,

    /// Distance used to close gaps between footprints and to grow each footprint.
    #[arg(short, long, default_value_t = 0.1)]
    buffer_tolerance: f64,

    /// Maximum deviation when simplifying grown footprints.
    #[arg(short, long, default_value_t = 0.1)]
    simplify_tolerance: f64,

    /// Move the layer so its minimum x/y corner is at the origin.
    #[arg(short, long, default_value_t = true, action = ArgAction::Set)]
    normalize: bool,

    /// Output path; defaults to the input path with a .dxf extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Process clusters one after another instead of in parallel.
    #[arg(long)]
    sequential: bool,

    /// Log debug output for geosolid.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> PipelineConfig {
        let config = PipelineConfig::new(self.height_field.clone())
            .with_buffer_tolerance(self.buffer_tolerance)
            .with_simplify_tolerance(self.simplify_tolerance)
            .with_output_kind(self.output_type)
            .with_normalize(self.normalize)
            .with_parallel(!self.sequential);
        match &self.z_level_field {
            Some(field) => config.with_z_level_field(field.clone()),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Default: WARN for everything, INFO for geosolid.
    // Override with RUST_LOG (e.g. RUST_LOG=geosolid=trace).
    let level = if cli.verbose { "geosolid=debug" } else { "geosolid=info" };
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive(level.parse().unwrap_or_default());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let report = Pipeline::new(cli.config())
        .run(&cli.in_file, cli.output.as_deref())
        .with_context(|| format!("failed to convert {}", cli.in_file.display()))?;

    println!("{}", report.output_path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["geosolid", "blocks.geojson", "height"]).unwrap();
        let config = cli.config();
        assert_eq!(config, PipelineConfig::new("height"));
        assert!(cli.output.is_none());
    }

    #[test]
    fn flags_reach_config() {
        let cli = Cli::try_parse_from([
            "geosolid", "blocks.geojson", "h", "-z", "base", "-t", "solid", "-b", "0.5", "-s", "0", "-n", "false",
            "--sequential",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.z_level_field.as_deref(), Some("base"));
        assert_eq!(config.output_kind, OutputKind::Solid);
        assert!((config.buffer_tolerance - 0.5).abs() < f64::EPSILON);
        assert!(config.simplify_tolerance.abs() < f64::EPSILON);
        assert!(!config.normalize);
        assert!(!config.parallel);
    }

    #[test]
    fn rejects_unknown_output_type() {
        assert!(Cli::try_parse_from(["geosolid", "a.geojson", "h", "-t", "brep"]).is_err());
    }
}
