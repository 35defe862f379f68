//! Analyze command handler
//!
//! Loads points from a file, runs one analysis and prints the report.

use crate::analysis::{self, Analysis, AnalysisRequest};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::{available_formats, get_formatter};
use crate::geometry::{Bounds, Coordinates};
use crate::input::load_points;
use crate::weights::WeightType;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Analyses available from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AnalysisKind {
    /// k nearest neighbors of one point
    Knn,
    /// k-neighbor weight matrix
    Weights,
    /// K-means clustering
    Kmeans,
    /// Density clustering
    Dbscan,
    /// Global Moran's I
    Morans,
    /// Local Moran's I
    Lisa,
    /// High/low cluster classification
    Clusters,
    /// Nearest neighbor index
    Nni,
    /// Kernel density grid
    Heatmap,
    /// Inverse distance weighted interpolation
    Idw,
}

/// Analyze command arguments
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Analysis to run
    #[arg(value_enum, required_unless_present = "list_formats")]
    pub analysis: Option<AnalysisKind>,

    /// Point file: GeoJSON FeatureCollection or JSON array of points
    #[arg(long, short = 'i', required_unless_present = "list_formats")]
    pub input: Option<PathBuf>,

    /// Neighbor or cluster count
    #[arg(long, short = 'k')]
    pub k: Option<usize>,

    /// Query point index (knn)
    #[arg(long)]
    pub index: Option<usize>,

    /// Neighbor weighting: equal, distance or inverse_distance
    #[arg(long)]
    pub weight_type: Option<String>,

    /// K-means iteration cap
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// K-means random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// DBSCAN neighborhood radius in kilometers
    #[arg(long)]
    pub eps: Option<f64>,

    /// DBSCAN core point threshold
    #[arg(long)]
    pub min_pts: Option<usize>,

    /// Minimum |local Moran's I| for a significant cluster
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Heatmap cells per side
    #[arg(long)]
    pub grid_size: Option<usize>,

    /// Heatmap kernel radius in kilometers
    #[arg(long, short = 'r')]
    pub radius: Option<f64>,

    /// Heatmap extent: min_lng,min_lat,max_lng,max_lat
    #[arg(long, value_delimiter = ',')]
    pub bounds: Option<Vec<f64>>,

    /// IDW target longitude
    #[arg(long, requires = "lat")]
    pub lng: Option<f64>,

    /// IDW target latitude
    #[arg(long, requires = "lng")]
    pub lat: Option<f64>,

    /// IDW distance exponent
    #[arg(long)]
    pub power: Option<f64>,

    /// Output format
    #[arg(long, short = 'f')]
    pub format: Option<String>,

    /// Write output to file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// List available formats
    #[arg(short = 'F', long = "list-formats")]
    pub list_formats: bool,
}

impl AnalyzeArgs {
    /// Build the analysis these arguments describe
    pub fn to_analysis(&self, kind: AnalysisKind) -> Result<Analysis> {
        let analysis = match kind {
            AnalysisKind::Knn => Analysis::Knn {
                index: self
                    .index
                    .ok_or_else(|| Error::InvalidParameter("knn requires --index".to_string()))?,
                k: self.k,
            },
            AnalysisKind::Weights => Analysis::Weights {
                k: self.k,
                weight_type: self
                    .weight_type
                    .as_deref()
                    .map(str::parse::<WeightType>)
                    .transpose()
                    .map_err(Error::InvalidParameter)?,
            },
            AnalysisKind::Kmeans => Analysis::Kmeans {
                k: self.k,
                max_iterations: self.max_iterations,
                seed: self.seed,
            },
            AnalysisKind::Dbscan => Analysis::Dbscan {
                eps_km: self.eps,
                min_pts: self.min_pts,
            },
            AnalysisKind::Morans => Analysis::Morans,
            AnalysisKind::Lisa => Analysis::Lisa { k: self.k },
            AnalysisKind::Clusters => Analysis::Clusters {
                k: self.k,
                threshold: self.threshold,
            },
            AnalysisKind::Nni => Analysis::Nni,
            AnalysisKind::Heatmap => Analysis::Heatmap {
                grid_size: self.grid_size,
                radius_km: self.radius,
                bounds: self.bounds.as_deref().map(parse_bounds).transpose()?,
            },
            AnalysisKind::Idw => match (self.lng, self.lat) {
                (Some(lng), Some(lat)) => Analysis::Idw {
                    target: Coordinates::new(lng, lat),
                    power: self.power,
                },
                _ => {
                    return Err(Error::InvalidParameter(
                        "idw requires --lng and --lat".to_string(),
                    ))
                }
            },
        };

        Ok(analysis)
    }
}

fn parse_bounds(values: &[f64]) -> Result<Bounds> {
    match values {
        [min_lng, min_lat, max_lng, max_lat] if min_lng <= max_lng && min_lat <= max_lat => Ok(Bounds {
            min_lng: *min_lng,
            min_lat: *min_lat,
            max_lng: *max_lng,
            max_lat: *max_lat,
        }),
        _ => Err(Error::InvalidParameter(
            "--bounds expects min_lng,min_lat,max_lng,max_lat".to_string(),
        )),
    }
}

/// Run the analyze command
pub fn run(args: AnalyzeArgs) -> Result<()> {
    if args.list_formats {
        list_formats();
        return Ok(());
    }

    run_with_config(&args, &Config::load()?)
}

/// Run the analyze command against an already loaded config
fn run_with_config(args: &AnalyzeArgs, config: &Config) -> Result<()> {
    let (Some(kind), Some(input)) = (args.analysis, args.input.as_ref()) else {
        return Err(Error::InvalidParameter(
            "An analysis and --input are required".to_string(),
        ));
    };

    let analysis = args.to_analysis(kind)?;

    let format = args.format.clone().unwrap_or_else(|| config.defaults.format.clone());
    let formatter =
        get_formatter(&format).ok_or_else(|| Error::Config(format!("Unknown format: {}", format)))?;

    let points = load_points(input, &config.transformer())?;
    let response = analysis::run(&AnalysisRequest { points, analysis }, config)?;
    let output = formatter.format(&response)?;

    if let Some(path) = &args.output {
        std::fs::write(path, &output)?;
        eprintln!("Output written to {}", path.display());
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// Print available output formats
fn list_formats() {
    println!("Available output formats:");
    for format in available_formats() {
        println!("  {:6} - {}", format.name, format.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> AnalyzeArgs {
        let mut argv = vec!["care-atlas", "analyze"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Analyze(args) => args,
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_dbscan() {
        let args = parse(&["dbscan", "-i", "points.json", "--eps", "0.5", "--min-pts", "4"]);
        assert_eq!(args.analysis, Some(AnalysisKind::Dbscan));
        assert_eq!(
            args.to_analysis(AnalysisKind::Dbscan).unwrap(),
            Analysis::Dbscan {
                eps_km: Some(0.5),
                min_pts: Some(4)
            }
        );
    }

    #[test]
    fn test_knn_requires_index() {
        let args = parse(&["knn", "-i", "points.json"]);
        assert!(args.to_analysis(AnalysisKind::Knn).is_err());

        let args = parse(&["knn", "-i", "points.json", "--index", "3", "-k", "2"]);
        assert_eq!(
            args.to_analysis(AnalysisKind::Knn).unwrap(),
            Analysis::Knn { index: 3, k: Some(2) }
        );
    }

    #[test]
    fn test_parse_heatmap_bounds() {
        let args = parse(&["heatmap", "-i", "p.json", "--bounds", "120.0,23.0,120.5,23.5"]);
        match args.to_analysis(AnalysisKind::Heatmap).unwrap() {
            Analysis::Heatmap { bounds: Some(b), .. } => {
                assert_eq!(b.min_lng, 120.0);
                assert_eq!(b.max_lat, 23.5);
            }
            other => panic!("unexpected analysis {:?}", other),
        }

        let args = parse(&["heatmap", "-i", "p.json", "--bounds", "121.0,23.0,120.5,23.5"]);
        assert!(args.to_analysis(AnalysisKind::Heatmap).is_err());
    }

    #[test]
    fn test_parse_idw_and_weights() {
        let args = parse(&["idw", "-i", "p.json", "--lng", "120.2", "--lat", "23.0"]);
        assert!(matches!(
            args.to_analysis(AnalysisKind::Idw).unwrap(),
            Analysis::Idw { power: None, .. }
        ));

        let args = parse(&["weights", "-i", "p.json", "--weight-type", "cubic"]);
        assert!(args.to_analysis(AnalysisKind::Weights).is_err());
    }

    #[test]
    fn test_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("points.json");
        let output = dir.path().join("report.json");
        std::fs::write(
            &input,
            r#"[[120.20, 22.99], [120.21, 22.99], [120.20, 23.00], [120.25, 23.05]]"#,
        )
        .unwrap();

        let args = parse(&[
            "nni",
            "-i",
            input.to_str().unwrap(),
            "-f",
            "json",
            "-o",
            output.to_str().unwrap(),
        ]);
        run_with_config(&args, &Config::default()).unwrap();

        let report: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(report["analysis"]["type"], "nni");
        assert_eq!(report["metadata"]["point_count"], 4);
        assert!(report["result"]["z_score"].is_number());
    }

    #[test]
    fn test_run_reports_analysis_errors() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("points.json");
        std::fs::write(&input, r#"[[120.20, 22.99], [120.21, 22.99]]"#).unwrap();

        let args = parse(&["knn", "-i", input.to_str().unwrap(), "--index", "5"]);
        assert!(matches!(
            run_with_config(&args, &Config::default()),
            Err(Error::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_list_formats_needs_no_input() {
        let args = parse(&["--list-formats"]);
        assert!(run(args).is_ok());
    }

    #[test]
    fn test_unknown_analysis_rejected() {
        assert!(Cli::try_parse_from(["care-atlas", "analyze", "voronoi", "-i", "p.json"]).is_err());
    }
}
