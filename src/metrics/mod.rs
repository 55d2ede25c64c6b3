pub mod logger;
pub mod analyzer;

use crate::agent::Agent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use parking_lot::RwLock;
use rayon::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub t: u64,
    pub wall_time: f64,
    pub collisions: usize,
    pub mean_speed: f64,
    /// Length of the mean heading vector: 1 when everyone flies the same way, ~0 when random.
    pub polarization: f64,
    pub mean_distance: f64,
}

impl StepSnapshot {
    pub fn measure(t: u64, wall_time: f64, agents: &[Agent], collisions: usize) -> Self {
        let n = agents.len();
        if n == 0 {
            return Self {
                t,
                wall_time,
                collisions,
                mean_speed: 0.0,
                polarization: 0.0,
                mean_distance: 0.0,
            };
        }

        let mean_speed = agents.iter().map(|a| a.velocity).sum::<f64>() / n as f64;
        let (sx, sy) = agents
            .iter()
            .fold((0.0, 0.0), |(sx, sy), a| (sx + a.orientation.cos(), sy + a.orientation.sin()));
        let polarization = sx.hypot(sy) / n as f64;

        let mean_distance = if n > 1 {
            let total: f64 = iid_matrix(agents).iter().flatten().sum();
            total / (n * (n - 1)) as f64
        } else {
            0.0
        };

        Self {
            t,
            wall_time,
            collisions,
            mean_speed,
            polarization,
            mean_distance,
        }
    }
}

/// Inter-agent distance matrix on agent positions.
pub fn iid_matrix(agents: &[Agent]) -> Vec<Vec<f64>> {
    agents
        .par_iter()
        .map(|a| agents.iter().map(|b| a.position.distance(&b.position)).collect())
        .collect()
}

#[derive(Debug, Clone)]
pub struct MetricsCollector {
    inner: Arc<RwLock<MetricsInner>>,
    start_time: Instant,
}

#[derive(Debug, Default)]
struct MetricsInner {
    total_collisions: u64,
    snapshots: Vec<StepSnapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsInner::default())),
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    pub fn record_step(&self, t: u64, agents: &[Agent], collisions: usize) {
        let snapshot = StepSnapshot::measure(t, self.elapsed(), agents, collisions);
        let mut inner = self.inner.write();
        inner.total_collisions += collisions as u64;
        inner.snapshots.push(snapshot);
    }

    pub fn latest(&self) -> Option<StepSnapshot> {
        self.inner.read().snapshots.last().cloned()
    }

    pub fn total_collisions(&self) -> u64 {
        self.inner.read().total_collisions
    }

    pub fn get_snapshots(&self) -> Vec<StepSnapshot> {
        self.inner.read().snapshots.clone()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Arena, Point};
    use crate::behavior::Ballistic;
    use crate::color;
    use std::f64::consts::PI;

    fn agent(id: u32, x: f64, y: f64, orientation: f64) -> Agent {
        Agent::new(
            id,
            10.0,
            Point::new(x, y),
            orientation,
            Arena::new(500, 500, 30),
            color::BLUE,
            Box::new(Ballistic),
        )
    }

    #[test]
    fn distance_matrix_is_symmetric_with_zero_diagonal() {
        let agents = vec![agent(0, 0.0, 0.0, 0.0), agent(1, 3.0, 4.0, 0.0), agent(2, 6.0, 8.0, 0.0)];
        let m = iid_matrix(&agents);
        assert_eq!(m[0][1], 5.0);
        assert_eq!(m[1][0], 5.0);
        assert_eq!(m[0][2], 10.0);
        assert!((0..3).all(|i| m[i][i] == 0.0));
    }

    #[test]
    fn aligned_group_is_fully_polarized() {
        let agents = vec![agent(0, 0.0, 0.0, 1.0), agent(1, 30.0, 40.0, 1.0)];
        let s = StepSnapshot::measure(3, 0.0, &agents, 0);
        assert!((s.polarization - 1.0).abs() < 1e-12);
        assert_eq!(s.mean_distance, 50.0);
        assert_eq!(s.mean_speed, 1.0);
    }

    #[test]
    fn opposed_pair_cancels_out() {
        let agents = vec![agent(0, 0.0, 0.0, 0.0), agent(1, 0.0, 0.0, PI)];
        let s = StepSnapshot::measure(0, 0.0, &agents, 2);
        assert!(s.polarization < 1e-12);
    }

    #[test]
    fn collector_sums_collisions() {
        let metrics = MetricsCollector::new();
        let agents = vec![agent(0, 0.0, 0.0, 0.0)];
        metrics.record_step(0, &agents, 2);
        metrics.record_step(1, &agents, 3);
        assert_eq!(metrics.total_collisions(), 5);
        assert_eq!(metrics.get_snapshots().len(), 2);
        assert_eq!(metrics.latest().unwrap().t, 1);
    }
}
