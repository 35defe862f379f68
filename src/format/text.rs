//! Human-readable text output formatter

use crate::analysis::{Analysis, AnalysisResponse, AnalysisResult};
use crate::error::Result;
use crate::format::OutputFormatter;
use std::fmt::Write;

/// Text formatter - outputs human-readable summary
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable text"
    }

    fn format(&self, response: &AnalysisResponse) -> Result<String> {
        let mut output = String::new();
        write_report(&mut output, response).map_err(std::io::Error::other)?;
        Ok(output)
    }
}

fn write_report(out: &mut String, response: &AnalysisResponse) -> std::fmt::Result {
    // Header
    writeln!(out, "care-atlas {} ({})", response.analysis, response.id)?;
    writeln!(out, "Points: {}", response.metadata.point_count)?;
    writeln!(out, "Timestamp: {}", response.metadata.timestamp)?;
    if let Some(source) = &response.metadata.random_source {
        writeln!(out, "Random source: {}", source)?;
    }
    writeln!(out)?;

    match &response.result {
        AnalysisResult::Knn { neighbors } => {
            writeln!(out, "Nearest neighbors:")?;
            for n in neighbors {
                writeln!(
                    out,
                    "  #{:<5} {:>10.4} km  ({:.6}, {:.6})  value {}",
                    n.index, n.distance, n.point.lng, n.point.lat, n.point.value
                )?;
            }
        }
        AnalysisResult::Weights { matrix } => {
            writeln!(out, "Weight matrix ({0}x{0}):", matrix.len())?;
            for row in matrix {
                let cells: Vec<String> = row.iter().map(|w| format!("{:.4}", w)).collect();
                writeln!(out, "  {}", cells.join(" "))?;
            }
        }
        AnalysisResult::Kmeans(result) => {
            writeln!(
                out,
                "{} after {} iterations",
                if result.converged { "Converged" } else { "Stopped" },
                result.iterations
            )?;
            for (i, members) in result.clusters.iter().enumerate() {
                match result.centroids.get(i) {
                    Some(c) => writeln!(
                        out,
                        "  Cluster {}: {} points, centroid ({:.6}, {:.6})",
                        i,
                        members.len(),
                        c.lng,
                        c.lat
                    )?,
                    None => writeln!(out, "  Cluster {}: {} points", i, members.len())?,
                }
            }
        }
        AnalysisResult::Dbscan { labels, summary } => {
            writeln!(out, "Clusters: {}", summary.cluster_count)?;
            writeln!(out, "Noise points: {}", summary.noise_count)?;
            let labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
            writeln!(out, "Labels: {}", labels.join(" "))?;
        }
        AnalysisResult::Morans { morans_i } => {
            writeln!(out, "Global Moran's I: {:.6}", morans_i)?;
        }
        AnalysisResult::Lisa { local } => {
            writeln!(out, "Local Moran's I:")?;
            for (i, l) in local.iter().enumerate() {
                writeln!(
                    out,
                    "  #{:<5} I = {:>10.4}  lag = {:>10.4}  z = {:>10.4}",
                    i, l.local_morans_i, l.spatial_lag, l.standardized_value
                )?;
            }
        }
        AnalysisResult::Clusters(clusters) => {
            writeln!(out, "Cluster classification:")?;
            for (label, members) in [
                ("high-high", &clusters.high_high),
                ("low-low", &clusters.low_low),
                ("high-low", &clusters.high_low),
                ("low-high", &clusters.low_high),
                ("not-significant", &clusters.not_significant),
            ] {
                writeln!(out, "  {:<16} {}", label, members.len())?;
            }
        }
        AnalysisResult::Nni(nni) => {
            writeln!(out, "Average nearest neighbor distance: {:.4} km", nni.average_distance)?;
            writeln!(out, "Expected (random): {:.4} km", nni.random_expectation)?;
            writeln!(out, "Ratio: {:.4}", nni.ratio())?;
            writeln!(out, "Z-score: {:.4}", nni.z_score)?;
            writeln!(out, "Pattern: {}", nni.interpretation)?;
        }
        AnalysisResult::Heatmap { cells } => {
            let max = cells.iter().map(|c| c.weight).fold(0.0, f64::max);
            writeln!(out, "Cells: {}", cells.len())?;
            writeln!(out, "Peak density: {:.4}", max)?;
            for cell in cells.iter().filter(|c| c.weight > 0.0) {
                writeln!(out, "  ({:.6}, {:.6})  {:.4}", cell.lng, cell.lat, cell.weight)?;
            }
        }
        AnalysisResult::Idw { value } => match &response.analysis {
            Analysis::Idw { target, .. } => {
                writeln!(out, "Interpolated value at ({:.6}, {:.6}): {:.6}", target.lng, target.lat, value)?
            }
            _ => writeln!(out, "Interpolated value: {:.6}", value)?,
        },
    }

    Ok(())
}
