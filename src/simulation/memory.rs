use crate::agent::{Agent, Point};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub orientation: f64,
    /// Agent centre.
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

impl Sample {
    pub fn of(agent: &Agent) -> Self {
        let center = agent.center();
        Self {
            orientation: agent.orientation,
            x: center.x,
            y: center.y,
            vx: agent.vx,
            vy: agent.vy,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Rolling per-agent history, newest sample first.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    length: usize,
    histories: Vec<VecDeque<Sample>>,
}

impl Memory {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            histories: Vec::new(),
        }
    }

    pub fn record(&mut self, agents: &[Agent]) {
        if self.length == 0 {
            return;
        }
        if self.histories.len() != agents.len() {
            // agent count changed, old rows no longer line up
            self.histories = vec![VecDeque::with_capacity(self.length); agents.len()];
        }
        for (history, agent) in self.histories.iter_mut().zip(agents) {
            history.push_front(Sample::of(agent));
            history.truncate(self.length);
        }
    }

    pub fn history(&self, agent_index: usize) -> Option<&VecDeque<Sample>> {
        self.histories.get(agent_index)
    }

    pub fn histories(&self) -> impl Iterator<Item = &VecDeque<Sample>> {
        self.histories.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.iter().all(|h| h.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Arena;
    use crate::behavior::Ballistic;
    use crate::color;

    fn agents(n: u32) -> Vec<Agent> {
        (0..n)
            .map(|i| {
                Agent::new(
                    i,
                    10.0,
                    Point::new(50.0 * i as f64, 0.0),
                    0.0,
                    Arena::new(500, 500, 30),
                    color::BLUE,
                    Box::new(Ballistic),
                )
            })
            .collect()
    }

    #[test]
    fn newest_first_and_bounded() {
        let mut agents = agents(2);
        let mut memory = Memory::new(3);
        for step in 0..5 {
            agents[0].orientation = step as f64;
            memory.record(&agents);
        }

        let history = memory.history(0).unwrap();
        assert_eq!(history.len(), 3);
        let orientations: Vec<f64> = history.iter().map(|s| s.orientation).collect();
        assert_eq!(orientations, vec![4.0, 3.0, 2.0]);
        assert_eq!(history[0].point(), Point::new(10.0, 10.0));
        assert_eq!(memory.history(1).unwrap()[0].x, 60.0);
    }

    #[test]
    fn disabled_memory_records_nothing() {
        let mut memory = Memory::new(0);
        memory.record(&agents(3));
        assert!(memory.is_empty());
        assert!(memory.history(0).is_none());
    }

    #[test]
    fn agent_count_change_resets() {
        let mut memory = Memory::new(4);
        memory.record(&agents(2));
        memory.record(&agents(2));
        memory.record(&agents(3));
        assert_eq!(memory.history(0).unwrap().len(), 1);
        assert_eq!(memory.history(2).unwrap().len(), 1);
    }
}
