use super::StepSnapshot;
use crate::simulation::memory::Memory;
use anyhow::Result;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::Path;

pub struct MetricsLogger {
    writer: Writer<File>,
}

impl MetricsLogger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let writer = Writer::from_path(path)?;
        Ok(Self { writer })
    }

    pub fn log_batch(&mut self, snapshots: &[StepSnapshot]) -> Result<()> {
        for snapshot in snapshots {
            self.writer.serialize(snapshot)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct TrajectoryRow {
    agent: usize,
    /// Steps back from the newest sample.
    lag: usize,
    orientation: f64,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
}

/// Dumps the recorded agent histories, one row per agent and sample.
pub fn write_trajectories(memory: &Memory, path: impl AsRef<Path>) -> Result<usize> {
    let mut writer = Writer::from_path(path)?;
    let mut rows = 0;
    for (agent, history) in memory.histories().enumerate() {
        for (lag, s) in history.iter().enumerate() {
            writer.serialize(TrajectoryRow {
                agent,
                lag,
                orientation: s.orientation,
                x: s.x,
                y: s.y,
                vx: s.vx,
                vy: s.vy,
            })?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_land_in_csv_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.csv");
        let mut logger = MetricsLogger::new(&path).unwrap();
        logger
            .log_batch(&[StepSnapshot {
                t: 0,
                wall_time: 0.5,
                collisions: 1,
                mean_speed: 1.0,
                polarization: 0.25,
                mean_distance: 12.0,
            }])
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("t,wall_time,collisions,mean_speed,polarization,mean_distance")
        );
        assert_eq!(lines.next(), Some("0,0.5,1,1.0,0.25,12.0"));
    }
}
