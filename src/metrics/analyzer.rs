use super::StepSnapshot;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub name: String,
    pub agent_type: String,
    pub num_agents: u32,
    pub steps: u64,
    pub avg_polarization: f64,
    pub final_polarization: f64,
    pub avg_mean_distance: f64,
    pub avg_speed: f64,
    pub total_collisions: u64,
}

pub fn analyze(
    snapshots: &[StepSnapshot],
    name: &str,
    agent_type: &str,
    num_agents: u32,
) -> AnalysisReport {
    let n = snapshots.len().max(1) as f64;
    let mean = |f: fn(&StepSnapshot) -> f64| snapshots.iter().map(f).sum::<f64>() / n;

    AnalysisReport {
        name: name.to_string(),
        agent_type: agent_type.to_string(),
        num_agents,
        steps: snapshots.len() as u64,
        avg_polarization: mean(|s| s.polarization),
        final_polarization: snapshots.last().map(|s| s.polarization).unwrap_or(0.0),
        avg_mean_distance: mean(|s| s.mean_distance),
        avg_speed: mean(|s| s.mean_speed),
        total_collisions: snapshots.iter().map(|s| s.collisions as u64).sum(),
    }
}

/// Averages repeated runs of the same setup; `None` for an empty slice.
pub fn average_reports(reports: &[AnalysisReport]) -> Option<AnalysisReport> {
    let first = reports.first()?;
    let n = reports.len() as f64;
    let mean = |f: fn(&AnalysisReport) -> f64| reports.iter().map(f).sum::<f64>() / n;

    Some(AnalysisReport {
        name: first.name.clone(),
        agent_type: first.agent_type.clone(),
        num_agents: first.num_agents,
        steps: (reports.iter().map(|r| r.steps).sum::<u64>() as f64 / n).round() as u64,
        avg_polarization: mean(|r| r.avg_polarization),
        final_polarization: mean(|r| r.final_polarization),
        avg_mean_distance: mean(|r| r.avg_mean_distance),
        avg_speed: mean(|r| r.avg_speed),
        total_collisions: (reports.iter().map(|r| r.total_collisions).sum::<u64>() as f64 / n).round() as u64,
    })
}

/// Reads every `*summary*.json` report in `dir`, ordered by file name.
pub fn load_summaries(dir: impl AsRef<Path>) -> Result<Vec<AnalysisReport>> {
    let dir = dir.as_ref();
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let is_summary = path.extension().and_then(|s| s.to_str()) == Some("json")
            && path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().contains("summary"));
        if is_summary {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .iter()
        .map(|path| -> Result<AnalysisReport> {
            let content = std::fs::read_to_string(path)?;
            let report = serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(report)
        })
        .collect()
}

pub fn comparison_table(reports: &[AnalysisReport]) {
    println!("\n╔════════════════╦═══════╦═════════════╦═════════════╦═════════════╦════════════╗");
    println!("║ Agent type     ║ Steps ║ Polarization║ Final pol.  ║ Mean dist.  ║ Collisions ║");
    println!("╠════════════════╬═══════╬═════════════╬═════════════╬═════════════╬════════════╣");

    for report in reports {
        println!(
            "║ {:<14} ║ {:>5} ║ {:>11.3} ║ {:>11.3} ║ {:>11.1} ║ {:>10} ║",
            report.agent_type,
            report.steps,
            report.avg_polarization,
            report.final_polarization,
            report.avg_mean_distance,
            report.total_collisions,
        );
    }

    println!("╚════════════════╩═══════╩═════════════╩═════════════╩═════════════╩════════════╝\n");

    if let Some(most_ordered) = reports
        .iter()
        .max_by(|a, b| a.avg_polarization.total_cmp(&b.avg_polarization))
    {
        println!("Most ordered: {} ({:.3})", most_ordered.agent_type, most_ordered.avg_polarization);
    }

    if let Some(fewest) = reports.iter().min_by_key(|r| r.total_collisions) {
        println!("Fewest collisions: {} ({})", fewest.agent_type, fewest.total_collisions);
    }

    println!();
}
