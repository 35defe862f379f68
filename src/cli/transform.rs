//! Transform command handler
//!
//! Reprojects a GeoJSON FeatureCollection between the projected grid and
//! geographic coordinates.

use crate::config::Config;
use crate::crs::{CoordinateSystem, TransformMode};
use crate::error::{Error, Result};
use crate::input::load_collection;
use clap::Args;
use std::path::PathBuf;

/// Transform command arguments
#[derive(Args)]
pub struct TransformArgs {
    /// GeoJSON FeatureCollection to transform
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Source coordinate system (detected when omitted)
    #[arg(long)]
    pub from: Option<String>,

    /// Target coordinate system
    #[arg(long, default_value = "geographic")]
    pub to: String,

    /// Fail on coordinates outside the projected grid
    #[arg(long)]
    pub strict: bool,

    /// Write output to file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Run the transform command
pub fn run(args: TransformArgs) -> Result<()> {
    let config = Config::load()?;

    let from = args
        .from
        .as_deref()
        .map(str::parse::<CoordinateSystem>)
        .transpose()
        .map_err(Error::InvalidParameter)?;
    let to: CoordinateSystem = args.to.parse().map_err(Error::InvalidParameter)?;

    let mut transformer = config.transformer();
    if args.strict {
        transformer = transformer.with_mode(TransformMode::Strict);
    }

    let collection = load_collection(&args.input)?;
    let transformed = transformer.transform_feature_collection(&collection, from, to)?;
    let output = serde_json::to_string_pretty(&transformed)?;

    if let Some(path) = args.output {
        std::fs::write(&path, &output)?;
        eprintln!("Output written to {}", path.display());
    } else {
        println!("{}", output);
    }

    Ok(())
}
