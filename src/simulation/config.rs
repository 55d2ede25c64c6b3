use crate::agent::Boundary;
use crate::behavior::BehaviorRegistry;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    /// Number of agents.
    pub num_agents: u32,
    /// Number of timesteps to simulate.
    pub duration: u64,
    /// Arena size, not window size.
    pub width: u32,
    pub height: u32,
    pub framerate: u32,
    /// Padding of the arena inside the window, in pixels.
    pub window_pad: u32,
    /// Off for batch runs: no drawing and no frame pacing.
    pub with_visualization: bool,
    pub agent_radius: u32,
    pub physical_collision_avoidance: bool,
    pub agent_type: String,
    pub boundary: Boundary,
    pub memory_length: usize,
    pub save_agent_data: bool,
    pub show_agent_trails: bool,
    pub seed: Option<u64>,
    /// Write every n-th drawn frame as PNG, 0 disables.
    pub frame_every: u64,
    pub save_results: bool,
    pub output_dir: PathBuf,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "default_sim".to_string(),
            num_agents: 10,
            duration: 1000,
            width: 500,
            height: 500,
            framerate: 25,
            window_pad: 30,
            with_visualization: true,
            agent_radius: 10,
            physical_collision_avoidance: false,
            agent_type: "ballistic".to_string(),
            boundary: Boundary::Infinite,
            memory_length: 0,
            save_agent_data: false,
            show_agent_trails: false,
            seed: None,
            frame_every: 0,
            save_results: false,
            output_dir: PathBuf::from("results"),
        }
    }
}

impl SimConfig {
    pub const MIN_FRAMERATE: u32 = 1;
    pub const MAX_FRAMERATE: u32 = 60;

    /// `n` agents for `t` timesteps, everything else default.
    pub fn new(n: u32, t: u64) -> Self {
        Self {
            num_agents: n,
            duration: t,
            ..Self::default()
        }
    }

    /// The notebook smoke run: 15 agents, 150 timesteps, drawn on screen.
    pub fn smoke() -> Self {
        Self::new(15, 150).with_name("smoke")
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SimConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("Arena must be non-empty, got {}x{}", self.width, self.height);
        }
        if self.framerate == 0 {
            bail!("Framerate must be positive");
        }
        if self.agent_radius == 0 {
            bail!("Agent radius must be positive");
        }
        if !BehaviorRegistry::global().contains(&self.agent_type) {
            bail!(
                "Unknown agent type: {} (available: {})",
                self.agent_type,
                BehaviorRegistry::global().list().join(", ")
            );
        }
        if (self.save_agent_data || self.show_agent_trails) && self.memory_length == 0 {
            bail!("Recording or showing agent trails needs memory_length > 0");
        }
        Ok(())
    }

    pub fn headless(mut self) -> Self {
        self.with_visualization = false;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = agent_type.into();
        self
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_collisions(mut self, enabled: bool) -> Self {
        self.physical_collision_avoidance = enabled;
        self
    }

    /// Records `length` samples per agent and draws them as trails.
    pub fn with_trails(mut self, length: usize) -> Self {
        self.memory_length = length;
        self.save_agent_data = length > 0;
        self.show_agent_trails = length > 0;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self.save_results = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        assert_eq!(config.num_agents, 10);
        assert_eq!(config.duration, 1000);
        assert!(config.validate().is_ok());
        assert!(SimConfig::new(0, 0).validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = SimConfig::default();
        config.width = 0;
        assert!(config.validate().is_err());

        let config = SimConfig::default().with_agent_type("3zones");
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("3zones"), "{}", err);

        let mut config = SimConfig::default();
        config.save_agent_data = true;
        assert!(config.validate().is_err());
        assert!(config.with_trails(20).validate().is_ok());
    }

    #[test]
    fn smoke_run_setup() {
        let config = SimConfig::smoke();
        assert_eq!((config.num_agents, config.duration), (15, 150));
        assert_eq!(config.name, "smoke");
        assert!(config.with_visualization);
        assert!(!config.save_results);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: SimConfig =
            serde_json::from_str(r#"{"num_agents": 15, "duration": 150, "boundary": "bounce-back"}"#).unwrap();
        assert_eq!(config.num_agents, 15);
        assert_eq!(config.duration, 150);
        assert_eq!(config.boundary, Boundary::BounceBack);
        assert_eq!(config.framerate, 25);
    }
}
